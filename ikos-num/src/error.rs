//! Structural errors raised by the number kernel.

use thiserror::Error;

/// Errors that indicate a malformed request to the number kernel rather than
/// an abstract-semantics outcome. Never produced by sound over-approximation;
/// callers cannot recover a value from these, only abort the current
/// operation (see spec §7, "structural errors").
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumError {
    /// Division or remainder by a concrete zero.
    #[error("division by zero")]
    DivisionByZero,
    /// A bit-width outside the supported set `{1, 8, 16, 32, 64}` was
    /// requested. 128-bit machine integers are explicitly unsupported; see
    /// the Open Question in spec §9 about 128-bit widening.
    #[error("unsupported machine integer bit-width")]
    UnsupportedWidth,
    /// A `sext`/`zext`/`trunc` was requested from a wider type to a narrower
    /// one where the operation is undefined (e.g. `sext` used to shrink).
    #[error("invalid integer conversion between incompatible widths")]
    InvalidConversion,
}

/// Result type for number-kernel operations that may hit a structural error.
pub type NumResult<T> = Result<T, NumError>;
