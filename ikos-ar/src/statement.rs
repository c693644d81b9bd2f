//! The closed set of AR statement kinds (spec §4.7, §6).

use ikos_num::Width;

use crate::ids::{CallSiteId, FunctionId, VariableId};
use crate::value::ValueOperand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Trunc(Width),
    ZExt(Width),
    SExt(Width),
    Neg,
    Not,
    Bitcast,
    PtrToInt(Width),
    IntToPtr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    SignedLt,
    SignedLe,
    SignedGt,
    SignedGe,
    UnsignedLt,
    UnsignedLe,
    UnsignedGt,
    UnsignedGe,
    /// Pointer equality/nullity predicate (spec §4.7, guards refine nullity
    /// and points-to instead of adding a linear constraint).
    PointerEq,
    PointerNe,
}

/// An ordered list of `(actual, formal-slot)` pairs, resolved by the
/// call-execution engine's `match_down`/`match_up` (spec §4.7).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallArguments {
    pub callee: FunctionId,
    pub arguments: Vec<ValueOperand>,
    pub result: Option<VariableId>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    Assignment {
        result: VariableId,
        operand: ValueOperand,
    },
    UnaryOperation {
        result: VariableId,
        op: UnaryOp,
        operand: ValueOperand,
    },
    BinaryOperation {
        result: VariableId,
        op: BinaryOp,
        left: ValueOperand,
        right: ValueOperand,
    },
    /// Adds a linear constraint (or pointer refinement) on the taken edge;
    /// does not itself mutate the invariant at the statement point (spec
    /// §4.7).
    Comparison {
        op: CompareOp,
        left: ValueOperand,
        right: ValueOperand,
    },
    Allocate {
        result: VariableId,
        /// Number of elements times element size, in bytes; `None` if not
        /// statically known (the memory domain then treats the region as
        /// unbounded).
        size: Option<ValueOperand>,
    },
    /// `result = pointer + offset`.
    PointerShift {
        result: VariableId,
        pointer: ValueOperand,
        offset: ValueOperand,
    },
    Load {
        result: VariableId,
        pointer: ValueOperand,
        access_size: u64,
    },
    Store {
        pointer: ValueOperand,
        value: ValueOperand,
        access_size: u64,
    },
    InsertElement {
        result: VariableId,
        aggregate: ValueOperand,
        index: ValueOperand,
        element: ValueOperand,
    },
    ExtractElement {
        result: VariableId,
        aggregate: ValueOperand,
        index: ValueOperand,
    },
    ShuffleVector {
        result: VariableId,
        first: ValueOperand,
        second: ValueOperand,
        mask: Vec<u32>,
    },
    Call {
        site: CallSiteId,
        call: CallArguments,
    },
    Invoke {
        site: CallSiteId,
        call: CallArguments,
        normal_dest: crate::ids::BasicBlockId,
        exception_dest: crate::ids::BasicBlockId,
    },
    ReturnValue {
        operand: Option<ValueOperand>,
    },
    LandingPad {
        result: VariableId,
    },
    Resume {
        operand: ValueOperand,
    },
    Unreachable,
}
