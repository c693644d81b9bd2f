//! The top-level unit the front-end hands to the core (spec §6).

use crate::data_layout::DataLayout;
use crate::function::{Function, GlobalVariable};
use crate::ids::FunctionId;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bundle {
    pub data_layout: DataLayout,
    pub functions: Vec<Function>,
    pub globals: Vec<GlobalVariable>,
}

impl Bundle {
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}
