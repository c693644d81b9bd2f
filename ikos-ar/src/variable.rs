//! Internal, local and global variables.

use ikos_num::Width;

use crate::ids::{TypeId, VariableId};

/// Coarse classification needed by the literal factory (spec §6) to decide
/// which `ScalarLit`/`AggregateLit` variant a variable's value resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableKind {
    /// A scalar integer of the given bit-width.
    Integer(Width),
    /// A floating-point scalar (tracked only as "dummy", spec §1 Non-goals).
    Float,
    /// A pointer-typed variable.
    Pointer,
    /// A vector/array/struct aggregate.
    Aggregate,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    pub kind: VariableKind,
    pub ty: TypeId,
}
