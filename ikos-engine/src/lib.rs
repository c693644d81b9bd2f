//! WTO-driven fixpoint engine, transfer function, and call-execution
//! strategies for the IKOS abstract-interpretation core (spec §4).
//!
//! A typical driver: build a [`context::AnalysisContext`] around a parsed
//! [`ikos_ar::Bundle`], then call
//! [`context::AnalysisContext::analyze_entry_point`] once per function the
//! checkers care about. Everything below `context` is the machinery that
//! call goes through: [`wto`] orders a function's basic blocks,
//! [`fixpoint`] drives them to a fixpoint along that order,
//! [`transfer`] gives each statement its abstract-semantics effect, and
//! [`call_engine`] decides what a `Call`/`Invoke` statement does to the
//! caller.

pub mod call_engine;
pub mod checker;
pub mod context;
pub mod error;
pub mod fixpoint;
pub mod literal;
pub mod transfer;
pub mod wto;

pub use call_engine::{CallExecutionEngine, CallStrategy};
pub use checker::{CheckResult, CheckSeverity, Checker};
pub use context::AnalysisContext;
pub use error::{AnalysisError, AnalysisResult};
pub use fixpoint::{
    CodeFixpointParameters, FixpointParameters, InterleavedFwdFixpointIterator, NarrowingStrategy,
    WideningStrategy,
};
pub use literal::{AggregateLit, LiteralFactory, ScalarLit};
pub use transfer::{AbstractState, NumericalExecutionEngine};
pub use wto::{Wto, WtoComponent};
