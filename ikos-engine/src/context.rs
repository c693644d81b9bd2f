//! Ties a [`Bundle`] together with the factories every analysis run shares
//! (memory locations, call contexts) and drives one entry point's fixpoint
//! to completion (spec §4.7, §4.8).
//!
//! Grounded on `fuel-vm`'s `Interpreter`, which owns exactly this kind of
//! shared, long-lived state (its memory and receipt machinery) across a
//! whole execution rather than recreating it per instruction.
//!
//! ## The two failure channels (spec §7)
//!
//! A [`crate::error::AnalysisError`] aborts [`AnalysisContext::analyze_entry_point`]
//! outright: malformed AR, an unresolved callee, recursion past the
//! configured depth. It never represents something the analyzed program
//! itself can do.
//!
//! Everything the analyzed program *can* do — a branch that's locally
//! infeasible, a division by a divisor that's always exactly zero along some
//! path — is folded into the returned [`AbstractState`] instead: its
//! `normal` component goes to bottom on that path, and the join at the next
//! merge point quietly drops it. `analyze_entry_point` returning `Ok` with a
//! bottom `normal` means the entry point provably never returns normally
//! along any path the analysis could feasibly take, not that analysis
//! failed.

use ikos_ar::{
    Bundle, CallArguments, CallContextFactory, CallContextId, CallSiteId, Function, FunctionId,
    MemoryLocationFactory, Statement, ValueOperand,
};
use ikos_domains::{AbstractDomain, NumericalDomain};

use crate::call_engine::{CallExecutionEngine, CallStrategy};
use crate::error::{AnalysisError, AnalysisResult};
use crate::fixpoint::{FixpointParameters, InterleavedFwdFixpointIterator};
use crate::transfer::{AbstractState, NumericalExecutionEngine};

pub struct AnalysisContext {
    bundle: Bundle,
    locations: MemoryLocationFactory,
    contexts: CallContextFactory,
    strategy: CallStrategy,
    params: FixpointParameters,
}

impl AnalysisContext {
    pub fn new(bundle: Bundle, strategy: CallStrategy, params: FixpointParameters) -> Self {
        AnalysisContext {
            bundle,
            locations: MemoryLocationFactory::new(),
            contexts: CallContextFactory::new(),
            strategy,
            params,
        }
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    /// Runs the fixpoint for `entry_name` from an unconstrained entry state
    /// (the analysis makes no assumption about what a caller outside the
    /// bundle might pass in) and returns the invariant at its exit block.
    #[tracing::instrument(name = "analyze_entry_point", skip(self))]
    pub fn analyze_entry_point<N: NumericalDomain>(&self, entry_name: &str) -> AnalysisResult<AbstractState<N>> {
        let function = self
            .bundle
            .find_function(entry_name)
            .ok_or_else(|| AnalysisError::UnknownEntryPoint(entry_name.to_string()))?;
        if function.is_declaration() {
            return Err(AnalysisError::FunctionIsDeclaration(function.id));
        }
        tracing::debug!(entry = entry_name, "entering fixpoint for entry point");
        self.analyze_function(function.id, CallContextId::ROOT, AbstractState::top())
    }

    /// Drives `id`'s body to a fixpoint under `context`, routing its
    /// `Call`/`Invoke` statements back through this same method when the
    /// configured [`CallStrategy`] decides to inline (spec §4.7).
    ///
    /// `id` must already be known to resolve to a function with a body:
    /// `analyze_entry_point` checks this before the first call, and
    /// `CallExecutionEngine::call` checks it before ever handing back a
    /// callee id through the `analyze_callee` closure this method supplies.
    fn analyze_function<N: NumericalDomain>(
        &self,
        id: FunctionId,
        context: CallContextId,
        entry_state: AbstractState<N>,
    ) -> AnalysisResult<AbstractState<N>> {
        let function = self.bundle.function(id);
        let code = function
            .code
            .as_ref()
            .ok_or(AnalysisError::FunctionIsDeclaration(id))?;

        let transfer = NumericalExecutionEngine::with_max_cycles(
            &self.bundle.data_layout,
            &self.locations,
            self.params.solver_max_cycles,
        );
        let call_engine = CallExecutionEngine::new(&self.bundle, &self.contexts, self.strategy);

        let hook = |site: CallSiteId, call: &CallArguments, state: AbstractState<N>| -> AnalysisResult<AbstractState<N>> {
            call_engine.call(site, call, context, state, &transfer, function, |callee_id, child_context, callee_entry| {
                let result_state = self.analyze_function(callee_id, child_context, callee_entry)?;
                let callee_fn = self.bundle.function(callee_id);
                let return_operand = return_operand(callee_fn);
                transfer.match_up(call.result, return_operand, result_state, callee_fn)
            })
        };

        let mut iter = InterleavedFwdFixpointIterator::new(code, function, &transfer, self.params);
        iter.set_call_hook(&hook);
        iter.run(entry_state)?;
        Ok(iter.exit_invariant())
    }
}

/// The operand of a function's `ReturnValue` statement, read off its exit
/// block's last statement (the unified-return-block shape `Code` assumes).
/// `None` covers a void return, a function with no declared exit, or an
/// exit whose last statement isn't `ReturnValue` at all (e.g. it always
/// diverges through `Unreachable`).
fn return_operand(function: &Function) -> Option<&ValueOperand> {
    let code = function.code.as_ref()?;
    let exit = code.exit()?;
    match code.block(exit).statements.last()? {
        Statement::ReturnValue { operand } => operand.as_ref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_ar::{
        BasicBlockId, Code, Constant, DataLayout, Endianness, GlobalVariable, IntrinsicId, TypeId,
        Variable, VariableId, VariableKind,
    };
    use ikos_domains::IntervalDomain;
    use ikos_num::{MachineInt, Sign, Width, Z};

    fn caller_calling_callee() -> Function {
        let mut code = Code::new(BasicBlockId(0));
        code.set_exit(BasicBlockId(0));
        code.block_mut(BasicBlockId(0)).statements.push(Statement::Call {
            site: CallSiteId(0),
            call: CallArguments {
                callee: FunctionId(1),
                arguments: Vec::new(),
                result: Some(VariableId(0)),
            },
        });
        Function {
            id: FunctionId(0),
            name: "main".into(),
            parameters: Vec::new(),
            locals: vec![Variable {
                id: VariableId(0),
                name: "r".into(),
                kind: VariableKind::Integer(Width::W32),
                ty: TypeId(0),
            }],
            return_type: None,
            code: Some(code),
            intrinsic_id: IntrinsicId::NotIntrinsic,
        }
    }

    fn callee_returning_42() -> Function {
        let mut code = Code::new(BasicBlockId(0));
        code.set_exit(BasicBlockId(0));
        code.block_mut(BasicBlockId(0)).statements.push(Statement::ReturnValue {
            operand: Some(ValueOperand::Constant(Constant::Integer(MachineInt::from_u128(
                42,
                Width::W32,
                Sign::Unsigned,
            )))),
        });
        Function {
            id: FunctionId(1),
            name: "callee".into(),
            parameters: Vec::new(),
            locals: Vec::new(),
            return_type: None,
            code: Some(code),
            intrinsic_id: IntrinsicId::NotIntrinsic,
        }
    }

    fn bundle() -> Bundle {
        Bundle {
            data_layout: DataLayout::new(Endianness::Little, Width::W64),
            functions: vec![caller_calling_callee(), callee_returning_42()],
            globals: Vec::<GlobalVariable>::new(),
        }
    }

    #[test]
    fn inlining_binds_the_callees_constant_return_into_the_callers_result_slot() {
        let ctx = AnalysisContext::new(bundle(), CallStrategy::Inlining { max_depth: 4 }, FixpointParameters::default());
        let state = ctx.analyze_entry_point::<IntervalDomain>("main").unwrap();
        let numerical = state.normal.pointers().unwrap().numerical().unwrap();
        let interval = numerical.to_interval(&VariableId(0));
        assert_eq!(interval.as_singleton(), Some(&Z::from_i64(42)));
    }

    #[test]
    fn context_insensitive_strategy_leaves_the_result_unconstrained() {
        let ctx = AnalysisContext::new(bundle(), CallStrategy::ContextInsensitive, FixpointParameters::default());
        let state = ctx.analyze_entry_point::<IntervalDomain>("main").unwrap();
        let numerical = state.normal.pointers().unwrap().numerical().unwrap();
        let interval = numerical.to_interval(&VariableId(0));
        assert!(interval.is_top());
    }

    #[test]
    fn unknown_entry_point_is_a_structural_error() {
        let ctx = AnalysisContext::new(bundle(), CallStrategy::ContextInsensitive, FixpointParameters::default());
        let result = ctx.analyze_entry_point::<IntervalDomain>("does_not_exist");
        assert!(matches!(result, Err(AnalysisError::UnknownEntryPoint(_))));
    }
}
