//! The nullity domain (spec §4.2): tracks whether a pointer is definitely
//! null, definitely non-null, either, or neither (bottom).
//!
//! A three-valued flat lattice represented as a 2-bit bitset over the basis
//! `{NULL, NON_NULL}`, joined/met by bitwise or/and — the "bitmask-style"
//! representation the spec calls for, mirrored by [`crate::uninitialized`]
//! and [`crate::lifetime`].

use core::fmt;

use crate::lattice::AbstractDomain;

const NULL: u8 = 0b01;
const NON_NULL: u8 = 0b10;
const ALL: u8 = NULL | NON_NULL;

/// `bottom < {Null, NonNull} < top`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nullity(u8);

impl Nullity {
    pub fn null() -> Self {
        Nullity(NULL)
    }

    pub fn non_null() -> Self {
        Nullity(NON_NULL)
    }

    pub fn is_null(&self) -> bool {
        self.0 == NULL
    }

    pub fn is_non_null(&self) -> bool {
        self.0 == NON_NULL
    }

    /// `true` if this value admits the null case (`Null` or `top`).
    pub fn may_be_null(&self) -> bool {
        self.0 & NULL != 0
    }

    /// `true` if this value admits the non-null case (`NonNull` or `top`).
    pub fn may_be_non_null(&self) -> bool {
        self.0 & NON_NULL != 0
    }
}

impl AbstractDomain for Nullity {
    fn top() -> Self {
        Nullity(ALL)
    }

    fn bottom() -> Self {
        Nullity(0)
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
        Nullity(self.0 | other.0)
    }

    fn meet(&self, other: &Self) -> Self {
        Nullity(self.0 & other.0)
    }

    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }
}

impl fmt::Debug for Nullity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "_|_"),
            NULL => write!(f, "Null"),
            NON_NULL => write!(f, "NonNull"),
            _ => write!(f, "T"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_of_null_and_non_null_is_top() {
        let j = Nullity::null().join(&Nullity::non_null());
        assert!(j.is_top());
        assert!(j.may_be_null());
        assert!(j.may_be_non_null());
    }

    #[test]
    fn meet_of_null_and_non_null_is_bottom() {
        assert!(Nullity::null().meet(&Nullity::non_null()).is_bottom());
    }

    #[test]
    fn leq_orders_definite_values_under_top() {
        let top = Nullity::top();
        assert!(Nullity::null().leq(&top));
        assert!(Nullity::non_null().leq(&top));
        assert!(!top.leq(&Nullity::null()));
    }
}
