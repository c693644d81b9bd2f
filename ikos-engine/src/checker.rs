//! The query surface a property checker runs against once a fixpoint has
//! settled (spec §6): given the statement the checker cares about and the
//! invariant just before it, classify the statement. No concrete checker
//! lives here — buffer-overflow, null-dereference, division-by-zero and the
//! rest are explicitly out of scope; this module is only the seam they would
//! plug into.
//!
//! Grounded on `fuel-vm`'s `Interpreter::instruction` dispatch, which is the
//! closest thing the teacher has to "run a per-statement check against
//! current state and report an outcome" — adapted here from an execution
//! step into a read-only query over an already-computed invariant.

use ikos_ar::{CallContextId, Statement};
use ikos_domains::NumericalDomain;

use crate::transfer::AbstractState;

/// How a checked statement classifies, from "nothing to report" through the
/// two outcomes that matter for triage (spec §6, §7).
///
/// `Unreachable` is deliberately distinct from `Ok`: a statement whose
/// pre-invariant's normal-flow component is already ⊥ never executes along
/// any feasible path, which can mask a genuine bug upstream rather than
/// prove the statement itself safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckSeverity {
    Ok,
    Warning,
    Error,
    Unreachable,
}

/// The outcome of one [`Checker::check`] call. `kind` names the property
/// being checked (e.g. `"division-by-zero"`); `operands` holds whichever
/// operand strings the checker wants attributed to this finding; `info` is
/// the free-form key/value detail a results database would persist
/// alongside the finding (out of scope here, per the interface's own
/// doc comment in spec §6 — this type only carries what a database would
/// later read).
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub kind: String,
    pub severity: CheckSeverity,
    pub operands: Vec<String>,
    pub info: Vec<(String, String)>,
}

impl CheckResult {
    pub fn ok(kind: impl Into<String>) -> Self {
        CheckResult {
            kind: kind.into(),
            severity: CheckSeverity::Ok,
            operands: Vec::new(),
            info: Vec::new(),
        }
    }

    pub fn with_operand(mut self, operand: impl Into<String>) -> Self {
        self.operands.push(operand.into());
        self
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.push((key.into(), value.into()));
        self
    }
}

/// Implemented by a property checker: given a statement and the invariant
/// holding just before it under a given call context, decide whether the
/// property it watches holds there. `N` is left generic over the same
/// numerical domain the fixpoint that produced `pre` was run with, so a
/// checker can query intervals, pointer provenance, or whatever else the
/// domain exposes through [`AbstractState`].
pub trait Checker<N: NumericalDomain> {
    /// Name of the property this checker watches (e.g.
    /// `"division-by-zero"`), used to tag every [`CheckResult`] it produces.
    fn name(&self) -> &str;

    fn check(
        &self,
        statement: &Statement,
        pre: &AbstractState<N>,
        call_context: CallContextId,
    ) -> CheckResult;
}
