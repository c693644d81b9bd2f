//! The interleaved forward fixpoint iterator (spec §4.6): walks a
//! function's [`Wto`] in order, widening at each cycle head until the
//! increasing sequence stabilises, then narrowing for a bounded number of
//! iterations to recover precision lost to widening.
//!
//! Grounded on Bourdoncle's algorithm (as `wto.rs` already is) and on
//! `fuel-vm`'s interpreter loop for how this corpus structures a "drive a
//! CFG to completion, one basic block at a time" driver in Rust — a plain
//! `HashMap`-backed table rather than a mutable visitor trait, so the
//! borrow checker never has to reconcile a recursive visit with `&mut
//! self` callbacks.

use std::collections::HashMap;

use ikos_ar::{BasicBlockId, CallArguments, CallSiteId, Code, Function, Statement};
use ikos_domains::{AbstractDomain, NumericalDomain, DEFAULT_SOLVER_CYCLES};

use crate::error::AnalysisResult;
use crate::transfer::{AbstractState, NumericalExecutionEngine};
use crate::wto::{Wto, WtoComponent};

/// Number of narrowing iterations run after a cycle head's widening
/// sequence stabilises, bounding how long the decreasing phase can run
/// before giving up and keeping whatever precision narrowing reached so far
/// (spec §4.6: narrowing is not guaranteed to terminate on its own). This is
/// the **required** default — `FixpointParameters::narrowing_iterations` has
/// no "unspecified" state, resolving spec §9's Open Question on narrowing
/// budget in favor of a bounded-by-budget policy over the legacy
/// stop-after-one-iteration behaviour.
pub const DEFAULT_NARROWING_ITERATIONS: usize = 10;

/// Which widening operator a cycle head uses once the delay has elapsed.
/// `Standard` is the only variant implemented: `InterleavedFwdFixpointIterator`
/// is generic over any `N: NumericalDomain`, so it can only call the
/// `AbstractDomain::widen` every domain provides, never a domain-specific
/// thresholds set (`Interval::widen_with_thresholds` has no seam in the
/// generic `NumericalDomain` trait to be reached through here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WideningStrategy {
    #[default]
    Standard,
}

/// Which narrowing operator a cycle head uses during the decreasing phase.
/// `Standard` is the only variant implemented, for the same reason
/// [`WideningStrategy`] has only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NarrowingStrategy {
    #[default]
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixpointParameters {
    /// Number of increasing iterations at a cycle head allowed to use plain
    /// join before the iterator switches to widening (spec §4.6's "a couple
    /// of iterations before forcing termination" allowance).
    pub widening_delay: usize,
    /// After the delay, widen every `widening_period`-th round and join on
    /// the rounds in between — `1` (the default) widens every round.
    /// Raising it trades slower convergence for precision kept a little
    /// longer before a cycle head is forced to an over-approximation.
    pub widening_period: usize,
    pub widening_strategy: WideningStrategy,
    pub narrowing_strategy: NarrowingStrategy,
    pub narrowing_iterations: usize,
    /// Budget handed to every `NumericalDomain::add_with_cycles` call the
    /// transfer function makes while this function's fixpoint runs
    /// (`NumericalExecutionEngine::with_max_cycles`).
    pub solver_max_cycles: usize,
}

impl Default for FixpointParameters {
    fn default() -> Self {
        FixpointParameters {
            widening_delay: 1,
            widening_period: 1,
            widening_strategy: WideningStrategy::Standard,
            narrowing_strategy: NarrowingStrategy::Standard,
            narrowing_iterations: DEFAULT_NARROWING_ITERATIONS,
            solver_max_cycles: DEFAULT_SOLVER_CYCLES,
        }
    }
}

/// Per-function fixpoint parameters; a distinct type from
/// [`FixpointParameters`] so a future per-call-site override (spec §4.7's
/// call-context-sensitive widening delay) has somewhere to live without
/// widening the plain iteration knobs every caller has to thread through.
pub type CodeFixpointParameters = FixpointParameters;

/// Drives one function body's [`Code`] to a fixpoint, recording the
/// invariant before (`pre`) and after (`post`) every basic block.
pub struct InterleavedFwdFixpointIterator<'a, N: NumericalDomain> {
    code: &'a Code,
    function: &'a Function,
    transfer: &'a NumericalExecutionEngine<'a>,
    params: CodeFixpointParameters,
    pre: HashMap<BasicBlockId, AbstractState<N>>,
    post: HashMap<BasicBlockId, AbstractState<N>>,
    /// Intercepts `Call`/`Invoke` statements ahead of
    /// [`NumericalExecutionEngine::execute`]'s own opaque fallback, so
    /// `crate::context::AnalysisContext` can route them through
    /// `crate::call_engine::CallExecutionEngine` instead (spec §4.7's
    /// bounded-inlining strategy). `None` leaves every call opaque, which is
    /// exactly `execute`'s built-in behaviour.
    call_hook: Option<&'a dyn Fn(CallSiteId, &CallArguments, AbstractState<N>) -> AnalysisResult<AbstractState<N>>>,
}

impl<'a, N: NumericalDomain> InterleavedFwdFixpointIterator<'a, N> {
    pub fn new(
        code: &'a Code,
        function: &'a Function,
        transfer: &'a NumericalExecutionEngine<'a>,
        params: CodeFixpointParameters,
    ) -> Self {
        InterleavedFwdFixpointIterator {
            code,
            function,
            transfer,
            params,
            pre: HashMap::new(),
            post: HashMap::new(),
            call_hook: None,
        }
    }

    pub fn set_call_hook(
        &mut self,
        hook: &'a dyn Fn(CallSiteId, &CallArguments, AbstractState<N>) -> AnalysisResult<AbstractState<N>>,
    ) {
        self.call_hook = Some(hook);
    }

    pub fn run(&mut self, entry_state: AbstractState<N>) -> AnalysisResult<()> {
        self.pre.insert(self.code.entry(), entry_state);
        let wto = Wto::compute(self.code);
        self.visit_all(wto.components())
    }

    pub fn pre(&self, block: BasicBlockId) -> Option<&AbstractState<N>> {
        self.pre.get(&block)
    }

    pub fn post(&self, block: BasicBlockId) -> Option<&AbstractState<N>> {
        self.post.get(&block)
    }

    /// The invariant at the function's exit block, or `bottom` if the
    /// function has no declared exit (spec §4.6 treats that as "never
    /// returns normally").
    pub fn exit_invariant(&self) -> AbstractState<N> {
        match self.code.exit() {
            Some(exit) => self.post.get(&exit).cloned().unwrap_or_else(AbstractState::bottom),
            None => AbstractState::bottom(),
        }
    }

    fn visit_all(&mut self, components: &[WtoComponent]) -> AnalysisResult<()> {
        for c in components {
            match c {
                WtoComponent::Vertex(v) => self.visit_vertex(*v)?,
                WtoComponent::Cycle { head, body } => self.visit_cycle(*head, body)?,
            }
        }
        Ok(())
    }

    /// Join of every predecessor's post-state, each refined across its edge
    /// to `v` (spec §4.7's edge-level `Comparison` refinement), plus
    /// whatever is already recorded at `v` (so a cycle head accumulates
    /// both its outside-the-cycle and back-edge contributions).
    fn incoming(&self, v: BasicBlockId) -> AbstractState<N> {
        let mut acc = self.pre.get(&v).cloned().unwrap_or_else(AbstractState::bottom);
        for &p in self.code.predecessors(v) {
            if let Some(post_p) = self.post.get(&p) {
                acc = acc.join(&self.edge_state(p, v, post_p));
            }
        }
        acc
    }

    fn edge_state(&self, from: BasicBlockId, to: BasicBlockId, post_from: &AbstractState<N>) -> AbstractState<N> {
        let block = self.code.block(from);
        let Some(Statement::Comparison { op, left, right }) = block.statements.last() else {
            return post_from.clone();
        };
        let branch_taken = block.successors.first() == Some(&to);
        self.transfer
            .analyze_edge(*op, left, right, branch_taken, post_from.clone(), self.function)
            .unwrap_or_else(|_| post_from.clone())
    }

    fn execute_block(&self, v: BasicBlockId, pre: AbstractState<N>) -> AnalysisResult<AbstractState<N>> {
        let block = self.code.block(v);
        let mut state = pre;
        for stmt in &block.statements {
            state = match stmt {
                Statement::Call { site, call } | Statement::Invoke { site, call, .. } if self.call_hook.is_some() => {
                    self.call_hook.unwrap()(*site, call, state)?
                }
                _ => self.transfer.execute(stmt, state, self.function)?,
            };
        }
        Ok(state)
    }

    fn visit_vertex(&mut self, v: BasicBlockId) -> AnalysisResult<()> {
        let pre = self.incoming(v);
        self.pre.insert(v, pre.clone());
        let post = self.execute_block(v, pre)?;
        self.post.insert(v, post);
        Ok(())
    }

    /// Increasing iterations at `head` (join for the first `widening_delay`
    /// rounds, widen afterward) until the recomputed entry state is no more
    /// precise than the last one, then a bounded narrowing phase.
    fn visit_cycle(&mut self, head: BasicBlockId, body: &[WtoComponent]) -> AnalysisResult<()> {
        let mut pre_head = self.incoming(head);
        let mut iteration = 0usize;
        loop {
            self.pre.insert(head, pre_head.clone());
            let post = self.execute_block(head, pre_head.clone())?;
            self.post.insert(head, post);
            self.visit_all(body)?;
            let refreshed = self.incoming(head);
            if refreshed.leq(&pre_head) {
                break;
            }
            iteration += 1;
            pre_head = if iteration <= self.params.widening_delay {
                pre_head.join(&refreshed)
            } else {
                match self.params.widening_strategy {
                    WideningStrategy::Standard => {}
                }
                let period = self.params.widening_period.max(1);
                let rounds_since_delay = iteration - self.params.widening_delay;
                if rounds_since_delay % period == 0 {
                    pre_head.widen(&refreshed)
                } else {
                    pre_head.join(&refreshed)
                }
            };
        }
        tracing::trace!(?head, iterations = iteration, "cycle head stabilised, entering narrowing");
        self.narrow_cycle(head, body, pre_head)
    }

    fn narrow_cycle(&mut self, head: BasicBlockId, body: &[WtoComponent], mut pre_head: AbstractState<N>) -> AnalysisResult<()> {
        match self.params.narrowing_strategy {
            NarrowingStrategy::Standard => {}
        }
        for _ in 0..self.params.narrowing_iterations {
            self.pre.insert(head, pre_head.clone());
            let post = self.execute_block(head, pre_head.clone())?;
            self.post.insert(head, post);
            self.visit_all(body)?;
            let refreshed = self.incoming(head);
            let narrowed = pre_head.narrow(&refreshed);
            let converged = narrowed.leq(&pre_head);
            pre_head = narrowed;
            if converged {
                break;
            }
        }
        self.pre.insert(head, pre_head);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_ar::{
        BinaryOp, CompareOp, Constant, DataLayout, Endianness, FunctionId, IntrinsicId,
        MemoryLocationFactory, TypeId, Variable, VariableId, VariableKind,
    };
    use ikos_domains::IntervalDomain;
    use ikos_num::{MachineInt, Sign, Width, Z};

    type State = AbstractState<IntervalDomain>;

    fn function_with(locals: Vec<Variable>, code: Code) -> Function {
        Function {
            id: FunctionId(0),
            name: "f".into(),
            parameters: Vec::new(),
            locals,
            return_type: None,
            code: Some(code),
            intrinsic_id: IntrinsicId::NotIntrinsic,
        }
    }

    fn int_var(id: u32) -> Variable {
        Variable { id: VariableId(id), name: format!("v{id}"), kind: VariableKind::Integer(Width::W32), ty: TypeId(0) }
    }

    fn cst(v: u128) -> ikos_ar::ValueOperand {
        ikos_ar::ValueOperand::Constant(Constant::Integer(MachineInt::from_u128(v, Width::W32, Sign::Unsigned)))
    }

    /// `x = 0; while (x <= 10) { x = x + 1; }` (spec §8's widening example).
    fn loop_code() -> Code {
        let mut code = Code::new(BasicBlockId(0));
        let header = code.add_block();
        let body = code.add_block();
        let exit = code.add_block();
        code.add_edge(BasicBlockId(0), header);
        code.add_edge(header, body);
        code.add_edge(body, header);
        code.add_edge(header, exit);
        code.set_exit(exit);

        code.block_mut(BasicBlockId(0)).statements.push(Statement::Assignment {
            result: VariableId(0),
            operand: cst(0),
        });
        code.block_mut(header).statements.push(Statement::Comparison {
            op: CompareOp::UnsignedLe,
            left: ikos_ar::ValueOperand::Variable(VariableId(0)),
            right: cst(10),
        });
        code.block_mut(body).statements.push(Statement::BinaryOperation {
            result: VariableId(0),
            op: BinaryOp::Add,
            left: ikos_ar::ValueOperand::Variable(VariableId(0)),
            right: cst(1),
        });
        code
    }

    #[test]
    fn widening_loop_converges_and_narrowing_recovers_the_upper_bound() {
        let code = loop_code();
        let function = function_with(vec![int_var(0)], code.clone());
        let layout = DataLayout::new(Endianness::Little, Width::W64);
        let locations = MemoryLocationFactory::new();
        let transfer = NumericalExecutionEngine::new(&layout, &locations);
        let mut iter = InterleavedFwdFixpointIterator::new(&code, &function, &transfer, FixpointParameters::default());
        iter.run(State::top()).unwrap();

        let header = BasicBlockId(1);
        let exit = BasicBlockId(3);
        let pre_header = iter.pre(header).unwrap();
        let n = pre_header.normal.pointers().unwrap().numerical().unwrap();
        assert_eq!(n.to_interval(&VariableId(0)).lb(), Some(&ikos_num::Bound::finite(Z::from_i64(0))));

        let exit_state = iter.post(exit).unwrap();
        let n = exit_state.normal.pointers().unwrap().numerical().unwrap();
        let exited = n.to_interval(&VariableId(0));
        assert_eq!(exited.lb(), Some(&ikos_num::Bound::finite(Z::from_i64(11))));
    }

    #[test]
    fn widening_period_greater_than_one_still_reaches_a_fixpoint() {
        let code = loop_code();
        let function = function_with(vec![int_var(0)], code.clone());
        let layout = DataLayout::new(Endianness::Little, Width::W64);
        let locations = MemoryLocationFactory::new();
        let transfer = NumericalExecutionEngine::new(&layout, &locations);
        let params = FixpointParameters {
            widening_period: 3,
            ..FixpointParameters::default()
        };
        let mut iter = InterleavedFwdFixpointIterator::new(&code, &function, &transfer, params);
        iter.run(State::top()).unwrap();

        let exit = BasicBlockId(3);
        let exit_state = iter.post(exit).unwrap();
        let n = exit_state.normal.pointers().unwrap().numerical().unwrap();
        let exited = n.to_interval(&VariableId(0));
        assert_eq!(exited.lb(), Some(&ikos_num::Bound::finite(Z::from_i64(11))));
    }
}
