//! Functions and global variables (spec §3, §6).

use crate::code::Code;
use crate::ids::{FunctionId, GlobalVariableId, TypeId, VariableId};
use crate::intrinsic::IntrinsicId;
use crate::variable::Variable;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub parameters: Vec<VariableId>,
    pub locals: Vec<Variable>,
    pub return_type: Option<TypeId>,
    pub code: Option<Code>,
    /// `NotIntrinsic` for ordinary (non-LLVM-builtin) functions; the call
    /// engine dispatches on this rather than on `name` (spec §6).
    pub intrinsic_id: IntrinsicId,
}

impl Function {
    pub fn is_declaration(&self) -> bool {
        self.code.is_none()
    }

    pub fn is_intrinsic(&self) -> bool {
        self.intrinsic_id != IntrinsicId::NotIntrinsic
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalVariable {
    pub id: GlobalVariableId,
    pub name: String,
    pub ty: TypeId,
    /// A global's initialiser is itself a `Code` (a degenerate one-block
    /// function that stores into the global), per spec §3.
    pub initializer: Option<Code>,
}
