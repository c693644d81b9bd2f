//! Call execution (spec §4.7): decides whether a `Call`/`Invoke` statement's
//! effect on the caller comes from the context-insensitive opaque transfer
//! or from inlining the callee's own fixpoint, and performs the `match_down`
//! argument binding `ikos_ar::CallArguments`'s doc comment names.
//!
//! Grounded on `fuel-vm`'s call-frame machinery for the shape of a bounded,
//! context-tracked call stack (`CallContextFactory` plays the role
//! `fuel-vm`'s frame stack does, recursion depth standing in for its stack
//! height limit).

use std::cell::RefCell;

use ikos_ar::{Bundle, CallArguments, CallContextFactory, CallContextId, CallSiteId, Function, FunctionId};
use ikos_domains::{AbstractDomain, NumericalDomain};

use crate::error::{AnalysisError, AnalysisResult};
use crate::transfer::{AbstractState, NumericalExecutionEngine};

/// How `Call`/`Invoke` is resolved (spec §4.7's Open Question on
/// interprocedural precision).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStrategy {
    /// Always takes the opaque fallback; the fastest, least precise option.
    ContextInsensitive,
    /// Re-enters the callee's own fixpoint up to `max_depth` nested call
    /// contexts, falling back to the opaque transfer past that bound or for
    /// a callee the analysis can't descend into (a declaration or an
    /// intrinsic).
    Inlining { max_depth: usize },
}

/// One memoized inlining result: a callee re-entered under an identical
/// `(FunctionId, CallContextId)` pair with an entry state equal to one
/// already analyzed doesn't need its fixpoint re-run, since the fixpoint is
/// a pure function of its entry state (spec §4.7's per-callee cache). Keyed
/// by equality on the entry state rather than a true hash: `NumericalDomain`
/// only requires `Clone + PartialEq` (`ikos_domains::AbstractDomain`'s
/// bound), so there's no generic hash to reach through here — a linear scan
/// over a small per-function cache is the honest equivalent.
type CacheEntry<N> = (FunctionId, CallContextId, AbstractState<N>, AbstractState<N>);

pub struct CallExecutionEngine<'a, N: NumericalDomain> {
    bundle: &'a Bundle,
    contexts: &'a CallContextFactory,
    strategy: CallStrategy,
    cache: RefCell<Vec<CacheEntry<N>>>,
}

impl<'a, N: NumericalDomain> CallExecutionEngine<'a, N> {
    pub fn new(bundle: &'a Bundle, contexts: &'a CallContextFactory, strategy: CallStrategy) -> Self {
        CallExecutionEngine {
            bundle,
            contexts,
            strategy,
            cache: RefCell::new(Vec::new()),
        }
    }

    fn cached(&self, callee: FunctionId, context: CallContextId, entry: &AbstractState<N>) -> Option<AbstractState<N>> {
        self.cache
            .borrow()
            .iter()
            .find(|(f, c, e, _)| *f == callee && *c == context && e == entry)
            .map(|(.., result)| result.clone())
    }

    /// Resolves one `Call`/`Invoke` at `site` under the caller's current
    /// `context`. `analyze_callee` is supplied by
    /// `crate::context::AnalysisContext`: running a callee's fixpoint needs
    /// the whole `FixpointTable`/`Wto` machinery this engine doesn't own,
    /// and is expected to already fold the callee's return value into the
    /// state it hands back (`match_up`) before returning it here.
    pub fn call(
        &self,
        site: CallSiteId,
        call: &CallArguments,
        context: CallContextId,
        state: AbstractState<N>,
        transfer: &NumericalExecutionEngine,
        caller: &Function,
        analyze_callee: impl FnOnce(FunctionId, CallContextId, AbstractState<N>) -> AnalysisResult<AbstractState<N>>,
    ) -> AnalysisResult<AbstractState<N>> {
        if state.normal.is_bottom() {
            return Ok(state);
        }
        if call.callee.0 as usize >= self.bundle.functions.len() {
            return Err(AnalysisError::UnresolvedCallee(call.callee));
        }
        let callee = self.bundle.function(call.callee);
        let max_depth = match self.strategy {
            CallStrategy::ContextInsensitive => return Ok(transfer.opaque_call(call.result, state)),
            CallStrategy::Inlining { max_depth } => max_depth,
        };
        if callee.is_declaration() || callee.is_intrinsic() {
            return Ok(transfer.opaque_call(call.result, state));
        }
        if self.contexts.contains_callee(context, call.callee) {
            return Err(AnalysisError::RecursionDepthExceeded(call.callee));
        }
        if self.contexts.depth(context) >= max_depth {
            return Ok(transfer.opaque_call(call.result, state));
        }
        let state = transfer.match_down(callee, call, state, caller)?;
        let child_context = self.contexts.extend(context, site, call.callee);
        if let Some(cached) = self.cached(call.callee, child_context, &state) {
            return Ok(cached);
        }
        let result = analyze_callee(call.callee, child_context, state.clone())?;
        self.cache.borrow_mut().push((call.callee, child_context, state, result.clone()));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_ar::{
        DataLayout, Endianness, FunctionId, GlobalVariable, IntrinsicId, MemoryLocationFactory,
        Variable, VariableId, VariableKind,
    };
    use ikos_domains::IntervalDomain;
    use ikos_num::Width;

    type State = AbstractState<IntervalDomain>;

    fn bundle_with(functions: Vec<Function>) -> Bundle {
        Bundle {
            data_layout: DataLayout::new(Endianness::Little, Width::W64),
            functions,
            globals: Vec::<GlobalVariable>::new(),
        }
    }

    fn declaration(id: u32) -> Function {
        Function {
            id: FunctionId(id),
            name: format!("f{id}"),
            parameters: Vec::new(),
            locals: Vec::new(),
            return_type: None,
            code: None,
            intrinsic_id: IntrinsicId::NotIntrinsic,
        }
    }

    fn caller_function() -> Function {
        Function {
            id: FunctionId(0),
            name: "caller".into(),
            parameters: Vec::new(),
            locals: vec![Variable {
                id: VariableId(0),
                name: "r".into(),
                kind: VariableKind::Integer(Width::W32),
                ty: ikos_ar::TypeId(0),
            }],
            return_type: None,
            code: None,
            intrinsic_id: IntrinsicId::NotIntrinsic,
        }
    }

    #[test]
    fn context_insensitive_strategy_never_calls_the_callee_closure() {
        let bundle = bundle_with(vec![caller_function(), declaration(1)]);
        let contexts = CallContextFactory::new();
        let layout = DataLayout::new(Endianness::Little, Width::W64);
        let locations = MemoryLocationFactory::new();
        let transfer = NumericalExecutionEngine::new(&layout, &locations);
        let engine = CallExecutionEngine::new(&bundle, &contexts, CallStrategy::ContextInsensitive);
        let call = CallArguments { callee: FunctionId(1), arguments: Vec::new(), result: None };
        let caller = caller_function();
        let result = engine.call(
            CallSiteId(0),
            &call,
            CallContextId::ROOT,
            State::top(),
            &transfer,
            &caller,
            |_, _, _| panic!("context-insensitive strategy must not inline"),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn unresolved_callee_is_a_structural_error() {
        let bundle = bundle_with(vec![caller_function()]);
        let contexts = CallContextFactory::new();
        let layout = DataLayout::new(Endianness::Little, Width::W64);
        let locations = MemoryLocationFactory::new();
        let transfer = NumericalExecutionEngine::new(&layout, &locations);
        let engine = CallExecutionEngine::new(&bundle, &contexts, CallStrategy::Inlining { max_depth: 4 });
        let call = CallArguments { callee: FunctionId(99), arguments: Vec::new(), result: None };
        let caller = caller_function();
        let result = engine.call(
            CallSiteId(0),
            &call,
            CallContextId::ROOT,
            State::top(),
            &transfer,
            &caller,
            |_, _, s| Ok(s),
        );
        assert!(matches!(result, Err(AnalysisError::UnresolvedCallee(_))));
    }

    #[test]
    fn direct_recursion_is_rejected_before_inlining() {
        let f = declaration(1);
        let mut recursive = f.clone();
        recursive.code = Some(ikos_ar::Code::new(ikos_ar::BasicBlockId(0)));
        let bundle = bundle_with(vec![caller_function(), recursive]);
        let contexts = CallContextFactory::new();
        let layout = DataLayout::new(Endianness::Little, Width::W64);
        let locations = MemoryLocationFactory::new();
        let transfer = NumericalExecutionEngine::new(&layout, &locations);
        let engine = CallExecutionEngine::new(&bundle, &contexts, CallStrategy::Inlining { max_depth: 8 });
        let call = CallArguments { callee: FunctionId(1), arguments: Vec::new(), result: None };
        let caller = caller_function();
        let context = contexts.extend(CallContextId::ROOT, CallSiteId(0), FunctionId(1));
        let result = engine.call(
            CallSiteId(1),
            &call,
            context,
            State::top(),
            &transfer,
            &caller,
            |_, _, s| Ok(s),
        );
        assert!(matches!(result, Err(AnalysisError::RecursionDepthExceeded(_))));
    }

    #[test]
    fn repeated_call_with_an_identical_entry_state_hits_the_cache() {
        let mut callee = declaration(1);
        callee.code = Some(ikos_ar::Code::new(ikos_ar::BasicBlockId(0)));
        let bundle = bundle_with(vec![caller_function(), callee]);
        let contexts = CallContextFactory::new();
        let layout = DataLayout::new(Endianness::Little, Width::W64);
        let locations = MemoryLocationFactory::new();
        let transfer = NumericalExecutionEngine::new(&layout, &locations);
        let engine = CallExecutionEngine::new(&bundle, &contexts, CallStrategy::Inlining { max_depth: 4 });
        let call = CallArguments { callee: FunctionId(1), arguments: Vec::new(), result: None };
        let caller = caller_function();
        let analyze_callee_calls = std::cell::Cell::new(0);
        for _ in 0..2 {
            let result = engine.call(
                CallSiteId(0),
                &call,
                CallContextId::ROOT,
                State::top(),
                &transfer,
                &caller,
                |_, _, s| {
                    analyze_callee_calls.set(analyze_callee_calls.get() + 1);
                    Ok(s)
                },
            );
            assert!(result.is_ok());
        }
        assert_eq!(analyze_callee_calls.get(), 1);
    }
}
