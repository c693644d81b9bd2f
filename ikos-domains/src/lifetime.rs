//! The lifetime domain (spec §4.5 `lifetime_assign_allocated/deallocated`):
//! tracks whether a memory location is definitely live, definitely freed,
//! either, or neither — the basis a use-after-free/double-free checker
//! queries.
//!
//! Same bitmask-flat-lattice shape as [`crate::nullity`].

use core::fmt;

use crate::lattice::AbstractDomain;

const ALLOCATED: u8 = 0b01;
const DEALLOCATED: u8 = 0b10;
const ALL: u8 = ALLOCATED | DEALLOCATED;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lifetime(u8);

impl Lifetime {
    pub fn allocated() -> Self {
        Lifetime(ALLOCATED)
    }

    pub fn deallocated() -> Self {
        Lifetime(DEALLOCATED)
    }

    pub fn is_allocated(&self) -> bool {
        self.0 == ALLOCATED
    }

    pub fn is_deallocated(&self) -> bool {
        self.0 == DEALLOCATED
    }

    pub fn may_be_deallocated(&self) -> bool {
        self.0 & DEALLOCATED != 0
    }
}

impl AbstractDomain for Lifetime {
    fn top() -> Self {
        Lifetime(ALL)
    }

    fn bottom() -> Self {
        Lifetime(0)
    }

    fn is_top(&self) -> bool {
        self.0 == ALL
    }

    fn is_bottom(&self) -> bool {
        self.0 == 0
    }

    fn leq(&self, other: &Self) -> bool {
        self.0 & !other.0 == 0
    }

    fn join(&self, other: &Self) -> Self {
        Lifetime(self.0 | other.0)
    }

    fn meet(&self, other: &Self) -> Self {
        Lifetime(self.0 & other.0)
    }

    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }
}

impl fmt::Debug for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "_|_"),
            ALLOCATED => write!(f, "Allocated"),
            DEALLOCATED => write!(f, "Deallocated"),
            _ => write!(f, "T"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_after_free_is_detectable_via_may_be_deallocated() {
        let merged = Lifetime::allocated().join(&Lifetime::deallocated());
        assert!(merged.may_be_deallocated());
    }

    #[test]
    fn double_free_meet_of_disjoint_states_is_bottom() {
        assert!(Lifetime::allocated().meet(&Lifetime::deallocated()).is_bottom());
    }
}
