//! Structural errors (spec §7, channel 1): malformed AR or an unsupported
//! construct the engine refuses to guess at. Distinct from the
//! abstract-semantics outcomes channel, which never raises a Rust error —
//! see [`crate::context::AnalysisContext::analyze_entry_point`]'s doc
//! comment for how that channel is folded into the domain value itself.
//!
//! Grounded on `fuel-vm`'s `InterpreterError`: a flat `thiserror` enum the
//! driver logs and recovers from, one entry point's failure never poisoning
//! the rest of the bundle.

use ikos_ar::{BasicBlockId, FunctionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("function {0:?} has no body to analyze")]
    FunctionIsDeclaration(FunctionId),

    #[error("entry point {0:?} not found in the bundle")]
    UnknownEntryPoint(String),

    #[error("basic block {1:?} in function {0:?} has no statements but is not the exit block")]
    MalformedBlock(FunctionId, BasicBlockId),

    #[error("statement references a variable not resolvable by the literal factory: {0}")]
    UnexpectedOperand(String),

    #[error("comparison or constraint could not be translated into a linear constraint: {0}")]
    MalformedConstraint(String),

    #[error("call to {0:?} could not be resolved: callee index out of bounds")]
    UnresolvedCallee(FunctionId),

    #[error("recursive inlining exceeded the configured call-context depth at {0:?}")]
    RecursionDepthExceeded(FunctionId),

    #[error("internal invariant violated: {0}")]
    LogicError(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
