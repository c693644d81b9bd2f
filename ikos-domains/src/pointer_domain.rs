//! The pointer domain (spec §4.5): a numerical domain over plain integer
//! variables, products with a per-variable points-to/offset/nullity triple
//! for pointer variables.
//!
//! Grounded on [`crate::interval_congruence::IntervalCongruence`]'s
//! "separate components, recombine on read" shape: `numerical` and
//! `pointers` evolve independently and are only cross-checked when a caller
//! asks, via [`PointerDomain::normalize`] (spec §4.5 "normalisation is
//! lazy: callers invoke `normalize()` before observing bottomness").

use core::fmt;

use ikos_ar::{MemoryLocationId, VariableId};
use ikos_num::{MachineInt, Width};

use crate::lattice::AbstractDomain;
use crate::nullity::Nullity;
use crate::numerical::NumericalDomain;
use crate::pointer_value::PointerAbsValue;
use crate::points_to::PointsToSet;
use crate::separate_domain::SeparateDomain;
use crate::Interval;

enum Repr<N> {
    Bottom,
    Live {
        numerical: N,
        pointers: SeparateDomain<VariableId, PointerAbsValue>,
    },
}

impl<N: Clone> Clone for Repr<N> {
    fn clone(&self) -> Self {
        match self {
            Repr::Bottom => Repr::Bottom,
            Repr::Live { numerical, pointers } => Repr::Live {
                numerical: numerical.clone(),
                pointers: pointers.clone(),
            },
        }
    }
}

/// `numerical: N` tracks plain integer variables (and any expression
/// scratch values the engine evaluates offsets through); `pointers` tracks
/// the points-to/offset/nullity triple of pointer-typed variables (spec
/// §4.5's `PointerAbsValue`, keyed by variable rather than folded into
/// `numerical`'s environment — see DESIGN.md for why offsets aren't
/// multiplexed into the shared numerical map the way the original does).
pub struct PointerDomain<N: NumericalDomain> {
    repr: Repr<N>,
}

impl<N: NumericalDomain> Clone for PointerDomain<N> {
    fn clone(&self) -> Self {
        PointerDomain {
            repr: self.repr.clone(),
        }
    }
}

impl<N: NumericalDomain> PointerDomain<N> {
    /// Collapses to the domain's own `bottom` if either component already
    /// is, without having done so eagerly on every intermediate operation
    /// (spec §4.5's lazy normalisation).
    pub fn normalize(&self) -> Self {
        match &self.repr {
            Repr::Bottom => PointerDomain::bottom(),
            Repr::Live { numerical, pointers } => {
                if numerical.is_bottom() || pointers.is_bottom() {
                    PointerDomain::bottom()
                } else {
                    self.clone()
                }
            }
        }
    }

    pub fn numerical(&self) -> Option<&N> {
        match &self.repr {
            Repr::Bottom => None,
            Repr::Live { numerical, .. } => Some(numerical),
        }
    }

    /// Replaces the numerical component wholesale, for callers (the
    /// engine's transfer function) that maintain it via [`NumericalDomain`]
    /// operations and write the result back.
    pub fn with_numerical(&self, numerical: N) -> Self {
        match &self.repr {
            Repr::Bottom => PointerDomain::bottom(),
            Repr::Live { pointers, .. } => PointerDomain {
                repr: Repr::Live {
                    numerical,
                    pointers: pointers.clone(),
                },
            },
        }
    }

    /// `p = &addr` at offset zero (spec §4.5 `assign_address(p, addr,
    /// nullity)`; the fresh pointer's nullity is supplied by the caller
    /// since taking the address of a variable is always non-null, but
    /// `DynAlloc` under a failing allocator may be modelled as `top`).
    pub fn assign_address(
        &self,
        p: VariableId,
        addr: MemoryLocationId,
        nullity: Nullity,
        offset_width: Width,
    ) -> Self {
        let value = PointerAbsValue::new(
            PointsToSet::singleton(addr),
            Interval::singleton(MachineInt::zero(offset_width, ikos_num::Sign::Unsigned)),
            nullity,
        );
        self.set_pointer(p, value)
    }

    /// Spec §4.5 `assign_null`.
    pub fn assign_null(&self, p: VariableId, absolute_zero: MemoryLocationId, offset_width: Width) -> Self {
        self.set_pointer(p, PointerAbsValue::null(absolute_zero, offset_width))
    }

    /// Spec §4.5 `assign(p, q)`.
    pub fn assign(&self, p: VariableId, q: &VariableId) -> Self {
        match &self.repr {
            Repr::Bottom => PointerDomain::bottom(),
            Repr::Live { pointers, .. } => self.set_pointer(p, pointers.get(q)),
        }
    }

    /// Spec §4.5 `assign(p, q, offset-expr)`: `p = q + delta`, `delta`
    /// already evaluated by the caller against `numerical`/a literal
    /// (spec §4.7 `PointerShift`).
    pub fn assign_shifted(&self, p: VariableId, q: &VariableId, delta: &Interval<MachineInt>) -> Self {
        match &self.repr {
            Repr::Bottom => PointerDomain::bottom(),
            Repr::Live { pointers, .. } => self.set_pointer(p, pointers.get(q).shift(delta)),
        }
    }

    pub fn assert_null(&self, p: &VariableId) -> Self {
        self.update_pointer(p, |v| v.assert_null())
    }

    pub fn assert_non_null(&self, p: &VariableId) -> Self {
        self.update_pointer(p, |v| v.assert_non_null())
    }

    /// Spec §4.5 `refine(p, points-to-set[, offset])`.
    pub fn refine(&self, p: &VariableId, points_to: PointsToSet) -> Self {
        self.update_pointer(p, |v| v.refine_points_to(points_to.clone()))
    }

    pub fn refine_with_offset(&self, p: &VariableId, points_to: PointsToSet, offset: Interval<MachineInt>) -> Self {
        match &self.repr {
            Repr::Bottom => PointerDomain::bottom(),
            Repr::Live { pointers, .. } => {
                let refined = pointers.get(p).refine_points_to(points_to);
                let refined = PointerAbsValue::new(
                    refined.points_to().clone(),
                    refined.offset().meet(&offset),
                    *refined.nullity(),
                );
                self.set_pointer(*p, refined)
            }
        }
    }

    pub fn points_to(&self, p: &VariableId) -> PointsToSet {
        match &self.repr {
            Repr::Bottom => PointsToSet::bottom(),
            Repr::Live { pointers, .. } => pointers.get(p).points_to().clone(),
        }
    }

    pub fn get(&self, p: &VariableId) -> PointerAbsValue {
        match &self.repr {
            Repr::Bottom => PointerAbsValue::bottom(),
            Repr::Live { pointers, .. } => pointers.get(p),
        }
    }

    pub fn forget(&self, p: &VariableId) -> Self {
        self.set_pointer(*p, PointerAbsValue::top())
    }

    fn set_pointer(&self, p: VariableId, value: PointerAbsValue) -> Self {
        match &self.repr {
            Repr::Bottom => PointerDomain::bottom(),
            Repr::Live { numerical, pointers } => PointerDomain {
                repr: Repr::Live {
                    numerical: numerical.clone(),
                    pointers: pointers.set(p, value),
                },
            },
        }
    }

    fn update_pointer(&self, p: &VariableId, f: impl FnOnce(&PointerAbsValue) -> PointerAbsValue) -> Self {
        match &self.repr {
            Repr::Bottom => PointerDomain::bottom(),
            Repr::Live { pointers, .. } => {
                let current = pointers.get(p);
                let updated = f(&current);
                self.set_pointer(*p, updated)
            }
        }
    }
}

impl<N: NumericalDomain> AbstractDomain for PointerDomain<N> {
    fn top() -> Self {
        PointerDomain {
            repr: Repr::Live {
                numerical: N::top(),
                pointers: SeparateDomain::top(),
            },
        }
    }

    fn bottom() -> Self {
        PointerDomain { repr: Repr::Bottom }
    }

    /// Lazy: does not check whether `numerical`/`pointers` have
    /// individually collapsed to bottom. Call [`PointerDomain::normalize`]
    /// first if that matters.
    fn is_top(&self) -> bool {
        matches!(&self.repr, Repr::Live { numerical, pointers } if numerical.is_top() && pointers.is_top())
    }

    fn is_bottom(&self) -> bool {
        matches!(self.repr, Repr::Bottom)
    }

    fn leq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => true,
            (_, Repr::Bottom) => false,
            (
                Repr::Live { numerical: n1, pointers: p1 },
                Repr::Live { numerical: n2, pointers: p2 },
            ) => n1.leq(n2) && p1.leq(p2),
        }
    }

    fn join(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => other.clone(),
            (_, Repr::Bottom) => self.clone(),
            (
                Repr::Live { numerical: n1, pointers: p1 },
                Repr::Live { numerical: n2, pointers: p2 },
            ) => PointerDomain {
                repr: Repr::Live {
                    numerical: n1.join(n2),
                    pointers: p1.join(p2),
                },
            },
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) | (_, Repr::Bottom) => PointerDomain::bottom(),
            (
                Repr::Live { numerical: n1, pointers: p1 },
                Repr::Live { numerical: n2, pointers: p2 },
            ) => PointerDomain {
                repr: Repr::Live {
                    numerical: n1.meet(n2),
                    pointers: p1.meet(p2),
                },
            },
        }
    }

    fn widen(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => other.clone(),
            (_, Repr::Bottom) => self.clone(),
            (
                Repr::Live { numerical: n1, pointers: p1 },
                Repr::Live { numerical: n2, pointers: p2 },
            ) => PointerDomain {
                repr: Repr::Live {
                    numerical: n1.widen(n2),
                    pointers: p1.widen(p2),
                },
            },
        }
    }

    fn narrow(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) | (_, Repr::Bottom) => PointerDomain::bottom(),
            (
                Repr::Live { numerical: n1, pointers: p1 },
                Repr::Live { numerical: n2, pointers: p2 },
            ) => PointerDomain {
                repr: Repr::Live {
                    numerical: n1.narrow(n2),
                    pointers: p1.narrow(p2),
                },
            },
        }
    }
}

impl<N: NumericalDomain> PartialEq for PointerDomain<N> {
    fn eq(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }
}

impl<N: NumericalDomain + fmt::Debug> fmt::Debug for PointerDomain<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Bottom => write!(f, "_|_"),
            Repr::Live { numerical, pointers } => {
                write!(f, "(num={numerical:?}, ptr={pointers:?})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::IntervalDomain;
    use ikos_ar::{MemoryLocation, MemoryLocationFactory};
    use ikos_num::Sign;

    type PD = PointerDomain<IntervalDomain>;

    const P: VariableId = VariableId(0);
    const Q: VariableId = VariableId(1);

    #[test]
    fn assign_address_is_non_null_and_points_at_the_target() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(ikos_ar::GlobalVariableId(0)));
        let d = PD::top().assign_address(P, a, Nullity::non_null(), Width::W64);
        assert_eq!(d.points_to(&P).as_singleton(), Some(a));
        assert!(d.get(&P).nullity().is_non_null());
    }

    #[test]
    fn assign_copies_the_full_pointer_value() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(ikos_ar::GlobalVariableId(0)));
        let d = PD::top()
            .assign_address(P, a, Nullity::non_null(), Width::W64)
            .assign(Q, &P);
        assert_eq!(d.points_to(&Q).as_singleton(), Some(a));
    }

    #[test]
    fn assign_shifted_moves_the_offset_and_keeps_points_to() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(ikos_ar::GlobalVariableId(0)));
        let delta = Interval::singleton(MachineInt::from_u128(4, Width::W64, Sign::Unsigned));
        let d = PD::top()
            .assign_address(P, a, Nullity::non_null(), Width::W64)
            .assign_shifted(Q, &P, &delta);
        assert_eq!(d.points_to(&Q).as_singleton(), Some(a));
        assert_eq!(
            d.get(&Q).offset().as_singleton(),
            Some(&MachineInt::from_u128(4, Width::W64, Sign::Unsigned))
        );
    }

    #[test]
    fn refine_narrows_the_points_to_set() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(ikos_ar::GlobalVariableId(0)));
        let b = f.get_or_create(MemoryLocation::Global(ikos_ar::GlobalVariableId(1)));
        let d = PD::top()
            .refine(&P, PointsToSet::from_iter([a, b]))
            .refine(&P, PointsToSet::singleton(a));
        assert_eq!(d.points_to(&P).as_singleton(), Some(a));
    }

    #[test]
    fn normalize_is_required_to_observe_a_component_going_bottom() {
        let d = PD::top().refine(&P, PointsToSet::from_iter(Vec::<MemoryLocationId>::new()));
        assert!(!d.is_bottom());
        assert!(d.normalize().is_bottom());
    }

    #[test]
    fn assert_null_then_assert_non_null_drives_nullity_to_bottom() {
        let f = MemoryLocationFactory::new();
        let az = f.get_or_create(MemoryLocation::AbsoluteZero);
        let d = PD::top()
            .assign_null(P, az, Width::W64)
            .assert_non_null(&P);
        assert!(d.normalize().is_bottom());
    }
}
