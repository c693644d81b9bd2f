//! Value operands: the closed set of things a statement can read from
//! (spec §6, "Value operands resolve to either constants ... or variables").

use ikos_num::{MachineInt, Z};

use crate::ids::{FunctionId, TypeId, VariableId};

/// A compile-time constant operand. Closed over the variants spec §6 names.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    Integer(MachineInt),
    /// Dummy-tracked floating point (spec §1 Non-goals): only the bit
    /// pattern is preserved, never interpreted arithmetically.
    Float(u64),
    Null,
    Undefined,
    AggregateZero(TypeId),
    Struct(Vec<Constant>),
    Array(Vec<Constant>),
    Vector(Vec<Constant>),
    FunctionPointer(FunctionId),
    /// Opaque inline assembly blob; never a precise value, collapses to top
    /// wherever it is used.
    InlineAsm,
    /// An arbitrary-precision integer constant, used by AR passes operating
    /// before a concrete machine width has been picked (e.g. array indices).
    UnboundedInteger(Z),
}

/// A value operand as read by a statement.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueOperand {
    Constant(Constant),
    Variable(VariableId),
}

impl ValueOperand {
    pub fn as_variable(&self) -> Option<VariableId> {
        match self {
            ValueOperand::Variable(v) => Some(*v),
            ValueOperand::Constant(_) => None,
        }
    }
}
