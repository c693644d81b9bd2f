//! `DummyDomain` (spec §4.5): the two-element `{bottom, top}` lattice used
//! for an experimental sub-domain or one disabled via configuration —
//! tracks nothing beyond reachability.

use core::fmt;

use crate::lattice::AbstractDomain;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum DummyDomain {
    Bottom,
    Top,
}

impl AbstractDomain for DummyDomain {
    fn top() -> Self {
        DummyDomain::Top
    }

    fn bottom() -> Self {
        DummyDomain::Bottom
    }

    fn is_top(&self) -> bool {
        matches!(self, DummyDomain::Top)
    }

    fn is_bottom(&self) -> bool {
        matches!(self, DummyDomain::Bottom)
    }

    fn leq(&self, other: &Self) -> bool {
        matches!(self, DummyDomain::Bottom) || matches!(other, DummyDomain::Top)
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_bottom() {
            *other
        } else if other.is_bottom() {
            *self
        } else {
            DummyDomain::Top
        }
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_top() {
            *other
        } else if other.is_top() {
            *self
        } else {
            DummyDomain::Bottom
        }
    }
}

impl fmt::Debug for DummyDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DummyDomain::Bottom => write!(f, "_|_"),
            DummyDomain::Top => write!(f, "T"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_and_meet_are_boolean_or_and_and() {
        assert!(DummyDomain::Bottom.join(&DummyDomain::Top).is_top());
        assert!(DummyDomain::Bottom.meet(&DummyDomain::Top).is_bottom());
    }
}
