//! The uninitialized-variable domain (spec §4.2): tracks whether a value is
//! definitely initialized, definitely uninitialized, either, or neither.
//!
//! Same bitmask-flat-lattice shape as [`crate::nullity`]; kept as a distinct
//! type rather than a type alias since the basis ({Initialized,
//! Uninitialized}) is semantically unrelated to nullity's.

use core::fmt;

use crate::lattice::AbstractDomain;

const INITIALIZED: u8 = 0b01;
const UNINITIALIZED: u8 = 0b10;
const ALL: u8 = INITIALIZED | UNINITIALIZED;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uninitialized(u8);

impl Uninitialized {
    pub fn initialized() -> Self {
        Uninitialized(INITIALIZED)
    }

    pub fn uninitialized() -> Self {
        Uninitialized(UNINITIALIZED)
    }

    pub fn is_initialized(&self) -> bool {
        self.0 == INITIALIZED
    }

    pub fn is_uninitialized(&self) -> bool {
        self.0 == UNINITIALIZED
    }

    pub fn may_be_uninitialized(&self) -> bool {
        self.0 & UNINITIALIZED != 0
    }
}

impl AbstractDomain for Uninitialized {
    fn top() -> Self {
        Uninitialized(ALL)
    }

    fn bottom() -> Self {
        Uninitialized(0)
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
        Uninitialized(self.0 | other.0)
    }

    fn meet(&self, other: &Self) -> Self {
        Uninitialized(self.0 & other.0)
    }

    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }
}

impl fmt::Debug for Uninitialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "_|_"),
            INITIALIZED => write!(f, "Init"),
            UNINITIALIZED => write!(f, "Uninit"),
            _ => write!(f, "T"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_of_both_states_is_top() {
        let j = Uninitialized::initialized().join(&Uninitialized::uninitialized());
        assert!(j.is_top());
        assert!(j.may_be_uninitialized());
    }

    #[test]
    fn meet_of_both_states_is_bottom() {
        assert!(Uninitialized::initialized()
            .meet(&Uninitialized::uninitialized())
            .is_bottom());
    }
}
