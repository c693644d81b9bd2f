//! Target data layout: endianness, pointer width, per-type size/alignment.
//!
//! `Load`/`Store`/`Allocate` need this to compute an access size in bytes
//! (spec §4.7); it is otherwise opaque data produced by the (out-of-scope)
//! LLVM front-end.

use std::collections::HashMap;

use ikos_num::Width;

use crate::ids::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endianness {
    Little,
    Big,
}

/// Size and alignment of one AR type, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeLayout {
    pub size: u64,
    pub align: u64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataLayout {
    pub endianness: Endianness,
    pub pointer_width: Width,
    layouts: HashMap<TypeId, TypeLayout>,
}

impl DataLayout {
    pub fn new(endianness: Endianness, pointer_width: Width) -> Self {
        DataLayout {
            endianness,
            pointer_width,
            layouts: HashMap::new(),
        }
    }

    pub fn set_layout(&mut self, ty: TypeId, layout: TypeLayout) {
        self.layouts.insert(ty, layout);
    }

    pub fn layout_of(&self, ty: TypeId) -> Option<TypeLayout> {
        self.layouts.get(&ty).copied()
    }

    /// Size in bytes of a pointer on the target.
    pub fn pointer_size(&self) -> u64 {
        u64::from(self.pointer_width.bits()) / 8
    }
}
