//! Intrinsic function identifiers.
//!
//! Recovered beyond spec.md's truncated `{…}` from
//! `examples/original_source/ar/include/ikos/ar/semantic/function.hpp` and
//! the memory-location variants in spec §3 that only make sense if the
//! `VaArg`/`LibcErrno` intrinsics producing them exist (SPEC_FULL.md,
//! `ikos-ar` module section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntrinsicId {
    NotIntrinsic,
    IkosAssert,
    IkosAssume,
    IkosPrintInvariant,
    IkosPrintValues,
    IkosPartitioningVar,
    IkosWatchMemory,
    IkosNondetSiUInt32,
    Memcpy,
    Memmove,
    Memset,
    Malloc,
    Calloc,
    Realloc,
    Free,
    VaStart,
    VaEnd,
    VaCopy,
    LibcErrnoLocation,
    Abs,
}

impl IntrinsicId {
    /// `true` for intrinsics whose effect on the memory domain is scrubbing
    /// (the call-execution engine dispatches these without inlining; spec
    /// §4.5 `mem_forget_reachable`/`mem_abstract_reachable`).
    pub fn is_memory_intrinsic(self) -> bool {
        matches!(
            self,
            IntrinsicId::Memcpy
                | IntrinsicId::Memmove
                | IntrinsicId::Memset
                | IntrinsicId::Malloc
                | IntrinsicId::Calloc
                | IntrinsicId::Realloc
                | IntrinsicId::Free
        )
    }
}
