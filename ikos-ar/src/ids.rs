//! Opaque handles into AR arenas.
//!
//! Basic blocks, functions, globals and call sites are owned by their
//! containing `Code`/`Bundle` arena; the engine only ever holds these
//! `Copy`able indices, following the "arena + index" redesign note in
//! spec §9 (stable identity for hashing/equality without shared-pointer
//! graphs).

use core::fmt;

macro_rules! id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

id_type!(BasicBlockId, "Index of a basic block within its owning `Code`.");
id_type!(FunctionId, "Index of a function within its owning `Bundle`.");
id_type!(
    GlobalVariableId,
    "Index of a global variable within its owning `Bundle`."
);
id_type!(VariableId, "Index of an internal/local variable.");
id_type!(
    CallSiteId,
    "Identity of a `Call`/`Invoke` statement, stable across a fixpoint run."
);
id_type!(TypeId, "Index into the bundle's type table.");
