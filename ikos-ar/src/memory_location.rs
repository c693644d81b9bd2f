//! Interned memory locations: canonical abstract objects representing
//! allocation sites (spec §3, §9 "arena + index" redesign).

use std::collections::HashMap;
use std::sync::RwLock;

use crate::call_context::CallContextId;
use crate::ids::{CallSiteId, FunctionId, GlobalVariableId, TypeId, VariableId};

/// A canonical abstract allocation site. `DynAlloc` is parameterised by the
/// call site and call context it was allocated under, so that two calls to
/// `malloc` from different contexts are distinguished (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryLocation {
    Local(VariableId, FunctionId),
    Global(GlobalVariableId),
    Function(FunctionId),
    Aggregate(TypeId, u32),
    VaArg(FunctionId),
    AbsoluteZero,
    Argv,
    LibcErrno,
    DynAlloc(CallSiteId, CallContextId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryLocationId(u32);

impl MemoryLocationId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Append-only interning arena for [`MemoryLocation`]s (spec §5: a single
/// writer at a time; readers never block each other).
#[derive(Debug, Default)]
pub struct MemoryLocationFactory {
    locations: RwLock<Vec<MemoryLocation>>,
    index: RwLock<HashMap<MemoryLocation, MemoryLocationId>>,
}

impl MemoryLocationFactory {
    pub fn new() -> Self {
        MemoryLocationFactory {
            locations: RwLock::new(Vec::new()),
            index: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, location: MemoryLocation) -> MemoryLocationId {
        if let Some(id) = self.index.read().unwrap().get(&location) {
            return *id;
        }
        let mut locations = self.locations.write().unwrap();
        let mut index = self.index.write().unwrap();
        if let Some(id) = index.get(&location) {
            return *id;
        }
        let id = MemoryLocationId(locations.len() as u32);
        locations.push(location);
        index.insert(location, id);
        id
    }

    pub fn get(&self, id: MemoryLocationId) -> MemoryLocation {
        self.locations.read().unwrap()[id.0 as usize]
    }

    /// `true` for memory locations whose extent is statically known to be a
    /// single object the analysis tracks with strong updates by default
    /// (`Local`/`Global`/`Aggregate`); `DynAlloc` sites may alias across
    /// summarised heap regions and should default to weak updates until a
    /// singleton points-to set proves otherwise (spec §4.5).
    pub fn is_singleton_shaped(&self, id: MemoryLocationId) -> bool {
        matches!(
            self.get(id),
            MemoryLocation::Local(..) | MemoryLocation::Global(..) | MemoryLocation::Aggregate(..)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_locations_intern_to_the_same_id() {
        let factory = MemoryLocationFactory::new();
        let a = factory.get_or_create(MemoryLocation::Global(GlobalVariableId(1)));
        let b = factory.get_or_create(MemoryLocation::Global(GlobalVariableId(1)));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_locations_intern_to_distinct_ids() {
        let factory = MemoryLocationFactory::new();
        let a = factory.get_or_create(MemoryLocation::Global(GlobalVariableId(1)));
        let b = factory.get_or_create(MemoryLocation::Global(GlobalVariableId(2)));
        assert_ne!(a, b);
    }
}
