//! `PointerAbsValue` (spec §4.2): the triple a pointer variable's abstract
//! state is made of — where it may point, what offset from the start of the
//! pointed-to object it carries, and whether it may be null.

use core::fmt;

use ikos_ar::MemoryLocationId;
use ikos_num::MachineInt;

use crate::interval::Interval;
use crate::lattice::AbstractDomain;
use crate::nullity::Nullity;
use crate::points_to::PointsToSet;

#[derive(Clone, PartialEq)]
pub struct PointerAbsValue {
    points_to: PointsToSet,
    offset: Interval<MachineInt>,
    nullity: Nullity,
}

impl PointerAbsValue {
    /// Builds a value from its three components, applying the reduction
    /// rule: an empty/bottom points-to set, a bottom offset, or a bottom
    /// nullity collapses the whole triple to bottom (spec §4.2).
    pub fn new(points_to: PointsToSet, offset: Interval<MachineInt>, nullity: Nullity) -> Self {
        reduce(points_to, offset, nullity)
    }

    /// The null pointer: points-to is the singleton `{absolute_zero}` (spec
    /// §4.2 "null nullity with singleton points-to = {absolute-zero}
    /// admitted"). `absolute_zero` is the id the caller's
    /// `MemoryLocationFactory` interned for `MemoryLocation::AbsoluteZero`.
    pub fn null(absolute_zero: MemoryLocationId, offset_width: ikos_num::Width) -> Self {
        PointerAbsValue::new(
            PointsToSet::singleton(absolute_zero),
            Interval::singleton(MachineInt::zero(offset_width, ikos_num::Sign::Unsigned)),
            Nullity::null(),
        )
    }

    pub fn points_to(&self) -> &PointsToSet {
        &self.points_to
    }

    pub fn offset(&self) -> &Interval<MachineInt> {
        &self.offset
    }

    pub fn nullity(&self) -> &Nullity {
        &self.nullity
    }

    /// Pointer arithmetic: shifts the offset, the points-to set is
    /// unchanged (spec §4.2 "Arithmetic on pointers shifts the offset").
    pub fn shift(&self, delta: &Interval<MachineInt>) -> Self {
        PointerAbsValue::new(
            self.points_to.clone(),
            self.offset.add(delta),
            self.nullity,
        )
    }

    pub fn refine_points_to(&self, refined: PointsToSet) -> Self {
        PointerAbsValue::new(self.points_to.meet(&refined), self.offset.clone(), self.nullity)
    }

    pub fn assert_null(&self) -> Self {
        PointerAbsValue::new(
            self.points_to.clone(),
            self.offset.clone(),
            self.nullity.meet(&Nullity::null()),
        )
    }

    pub fn assert_non_null(&self) -> Self {
        PointerAbsValue::new(
            self.points_to.clone(),
            self.offset.clone(),
            self.nullity.meet(&Nullity::non_null()),
        )
    }
}

fn reduce(points_to: PointsToSet, offset: Interval<MachineInt>, nullity: Nullity) -> PointerAbsValue {
    if points_to.is_bottom() || points_to.is_empty() || offset.is_bottom() || nullity.is_bottom() {
        return PointerAbsValue {
            points_to: PointsToSet::bottom(),
            offset: Interval::bottom(),
            nullity: Nullity::bottom(),
        };
    }
    PointerAbsValue {
        points_to,
        offset,
        nullity,
    }
}

impl AbstractDomain for PointerAbsValue {
    fn top() -> Self {
        PointerAbsValue {
            points_to: PointsToSet::top(),
            offset: Interval::top(),
            nullity: Nullity::top(),
        }
    }

    fn bottom() -> Self {
        PointerAbsValue {
            points_to: PointsToSet::bottom(),
            offset: Interval::bottom(),
            nullity: Nullity::bottom(),
        }
    }

    fn is_top(&self) -> bool {
        self.points_to.is_top() && self.offset.is_top() && self.nullity.is_top()
    }

    fn is_bottom(&self) -> bool {
        self.points_to.is_bottom() || self.points_to.is_empty()
    }

    fn leq(&self, other: &Self) -> bool {
        self.points_to.leq(&other.points_to)
            && self.offset.leq(&other.offset)
            && self.nullity.leq(&other.nullity)
    }

    fn join(&self, other: &Self) -> Self {
        reduce(
            self.points_to.join(&other.points_to),
            self.offset.join(&other.offset),
            self.nullity.join(&other.nullity),
        )
    }

    fn meet(&self, other: &Self) -> Self {
        reduce(
            self.points_to.meet(&other.points_to),
            self.offset.meet(&other.offset),
            self.nullity.meet(&other.nullity),
        )
    }

    fn widen(&self, other: &Self) -> Self {
        reduce(
            self.points_to.widen(&other.points_to),
            self.offset.widen(&other.offset),
            self.nullity.widen(&other.nullity),
        )
    }

    fn narrow(&self, other: &Self) -> Self {
        reduce(
            self.points_to.meet(&other.points_to),
            self.offset.narrow(&other.offset),
            self.nullity.meet(&other.nullity),
        )
    }
}

impl fmt::Debug for PointerAbsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(pt={:?}, off={:?}, null={:?})",
            self.points_to, self.offset, self.nullity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_ar::{MemoryLocation, MemoryLocationFactory};
    use ikos_num::{Sign, Width};

    #[test]
    fn empty_points_to_collapses_to_bottom() {
        let v = PointerAbsValue::new(
            PointsToSet::from_iter(Vec::<MemoryLocationId>::new()),
            Interval::singleton(MachineInt::zero(Width::W64, Sign::Unsigned)),
            Nullity::non_null(),
        );
        assert!(v.is_bottom());
    }

    #[test]
    fn null_pointer_points_to_absolute_zero() {
        let factory = MemoryLocationFactory::new();
        let az = factory.get_or_create(MemoryLocation::AbsoluteZero);
        let v = PointerAbsValue::null(az, Width::W64);
        assert!(v.nullity().is_null());
        assert_eq!(v.points_to().as_singleton(), Some(az));
    }

    #[test]
    fn shift_preserves_points_to_and_moves_offset() {
        let factory = MemoryLocationFactory::new();
        let loc = factory.get_or_create(MemoryLocation::Global(ikos_ar::GlobalVariableId(0)));
        let base = PointerAbsValue::new(
            PointsToSet::singleton(loc),
            Interval::singleton(MachineInt::zero(Width::W64, Sign::Unsigned)),
            Nullity::non_null(),
        );
        let delta = Interval::singleton(MachineInt::from_u128(4, Width::W64, Sign::Unsigned));
        let shifted = base.shift(&delta);
        assert_eq!(shifted.points_to().as_singleton(), Some(loc));
        assert_eq!(
            shifted.offset().as_singleton(),
            Some(&MachineInt::from_u128(4, Width::W64, Sign::Unsigned))
        );
    }
}
