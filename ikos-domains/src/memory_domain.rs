//! The memory domain (spec §4.5): a byte-addressable store layered on top
//! of the pointer domain, plus per-location lifetime tracking for
//! use-after-free/double-free checks.
//!
//! Grounded on [`crate::pointer_domain::PointerDomain`]'s reduced-product
//! shape, extended with two more [`SeparateDomain`] components keyed by
//! [`MemoryLocationId`] rather than [`VariableId`] — the store and the
//! lifetime map.

use core::fmt;

use ikos_ar::{MemoryLocationFactory, MemoryLocationId, VariableId};
use ikos_num::{MachineInt, Width};

use crate::interval::Interval;
use crate::lattice::AbstractDomain;
use crate::lifetime::Lifetime;
use crate::nullity::Nullity;
use crate::numerical::NumericalDomain;
use crate::pointer_domain::PointerDomain;
use crate::pointer_value::PointerAbsValue;
use crate::points_to::PointsToSet;
use crate::separate_domain::SeparateDomain;

/// A single location's stored content, approximated as one `[offset, offset
/// + size)` range and one value. Two `Known` cells only combine directly
/// when their range matches exactly; otherwise a write with a different
/// shape collapses the cell to `Top` ("weak update... top for summarised
/// ranges", spec §4.5) rather than tracking multiple overlapping ranges
/// per location. This is coarser than byte-precise tracking but keeps the
/// store itself a flat lattice — see DESIGN.md.
#[derive(Clone, PartialEq)]
enum Cell {
    Bottom,
    Top,
    Known {
        offset: Interval<MachineInt>,
        size: u64,
        value: Interval<MachineInt>,
    },
}

impl Cell {
    fn known(offset: Interval<MachineInt>, size: u64, value: Interval<MachineInt>) -> Self {
        if offset.is_bottom() || value.is_bottom() {
            Cell::Bottom
        } else {
            Cell::Known { offset, size, value }
        }
    }

    fn same_shape(&self, offset: &Interval<MachineInt>, size: u64) -> bool {
        matches!(self, Cell::Known { offset: o, size: s, .. } if o == offset && *s == size)
    }

    fn value(&self) -> Interval<MachineInt> {
        match self {
            Cell::Known { value, .. } => value.clone(),
            Cell::Bottom => Interval::bottom(),
            Cell::Top => Interval::top(),
        }
    }
}

impl AbstractDomain for Cell {
    fn top() -> Self {
        Cell::Top
    }

    fn bottom() -> Self {
        Cell::Bottom
    }

    fn is_top(&self) -> bool {
        matches!(self, Cell::Top)
    }

    fn is_bottom(&self) -> bool {
        matches!(self, Cell::Bottom)
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Bottom, _) => true,
            (_, Cell::Top) => true,
            (Cell::Top, _) => false,
            (_, Cell::Bottom) => false,
            (
                Cell::Known { offset: o1, size: s1, value: v1 },
                Cell::Known { offset: o2, size: s2, value: v2 },
            ) => s1 == s2 && o1.leq(o2) && v1.leq(v2),
        }
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Cell::Bottom, _) => other.clone(),
            (_, Cell::Bottom) => self.clone(),
            (Cell::Top, _) | (_, Cell::Top) => Cell::Top,
            (
                Cell::Known { offset: o1, size: s1, value: v1 },
                Cell::Known { offset: o2, size: s2, value: v2 },
            ) => {
                if s1 == s2 {
                    Cell::known(o1.join(o2), *s1, v1.join(v2))
                } else {
                    Cell::Top
                }
            }
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Cell::Bottom, _) | (_, Cell::Bottom) => Cell::Bottom,
            (Cell::Top, _) => other.clone(),
            (_, Cell::Top) => self.clone(),
            (
                Cell::Known { offset: o1, size: s1, value: v1 },
                Cell::Known { offset: o2, size: s2, value: v2 },
            ) => {
                if s1 == s2 {
                    Cell::known(o1.meet(o2), *s1, v1.meet(v2))
                } else {
                    Cell::Bottom
                }
            }
        }
    }

    fn widen(&self, other: &Self) -> Self {
        match (self, other) {
            (Cell::Bottom, _) => other.clone(),
            (_, Cell::Bottom) => self.clone(),
            (Cell::Top, _) | (_, Cell::Top) => Cell::Top,
            (
                Cell::Known { offset: o1, size: s1, value: v1 },
                Cell::Known { offset: o2, size: s2, value: v2 },
            ) => {
                if s1 == s2 {
                    Cell::known(o1.widen(o2), *s1, v1.widen(v2))
                } else {
                    Cell::Top
                }
            }
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Bottom => write!(f, "_|_"),
            Cell::Top => write!(f, "T"),
            Cell::Known { offset, size, value } => {
                write!(f, "[{offset:?}+{size}]={value:?}")
            }
        }
    }
}

enum Repr<N: NumericalDomain> {
    Bottom,
    Live {
        pointers: PointerDomain<N>,
        store: SeparateDomain<MemoryLocationId, Cell>,
        lifetimes: SeparateDomain<MemoryLocationId, Lifetime>,
    },
}

impl<N: NumericalDomain> Clone for Repr<N> {
    fn clone(&self) -> Self {
        match self {
            Repr::Bottom => Repr::Bottom,
            Repr::Live { pointers, store, lifetimes } => Repr::Live {
                pointers: pointers.clone(),
                store: store.clone(),
                lifetimes: lifetimes.clone(),
            },
        }
    }
}

/// Composes [`PointerDomain`] with a byte-addressable store and a lifetime
/// tracker, both keyed by [`MemoryLocationId`] (spec §4.5).
pub struct MemoryDomain<N: NumericalDomain> {
    repr: Repr<N>,
}

impl<N: NumericalDomain> Clone for MemoryDomain<N> {
    fn clone(&self) -> Self {
        MemoryDomain { repr: self.repr.clone() }
    }
}

impl<N: NumericalDomain> MemoryDomain<N> {
    pub fn pointers(&self) -> Option<&PointerDomain<N>> {
        match &self.repr {
            Repr::Bottom => None,
            Repr::Live { pointers, .. } => Some(pointers),
        }
    }

    pub fn with_pointers(&self, pointers: PointerDomain<N>) -> Self {
        match &self.repr {
            Repr::Bottom => MemoryDomain::bottom(),
            Repr::Live { store, lifetimes, .. } => MemoryDomain {
                repr: Repr::Live {
                    pointers,
                    store: store.clone(),
                    lifetimes: lifetimes.clone(),
                },
            },
        }
    }

    /// Spec §4.5 `mem_write(p, v, size)`: strong update iff `p`'s points-to
    /// set and offset are both singletons and that single location is
    /// singleton-shaped (`MemoryLocationFactory::is_singleton_shaped`) —
    /// `DynAlloc` sites default to weak updates even when they happen to
    /// resolve to one location and one offset, since a summarised
    /// allocation may stand for more than one runtime object. A `top`
    /// points-to (or one naming a non-singleton-shaped, summarised
    /// allocation) abstracts the whole store to `top`.
    pub fn mem_write(
        &self,
        p: &VariableId,
        value: &Interval<MachineInt>,
        size: u64,
        locations_factory: &MemoryLocationFactory,
    ) -> Self {
        let Repr::Live { pointers, store, lifetimes } = &self.repr else {
            return MemoryDomain::bottom();
        };
        let ptr = pointers.get(p);
        let points_to = ptr.points_to();
        if points_to.is_top() {
            return MemoryDomain {
                repr: Repr::Live {
                    pointers: pointers.clone(),
                    store: SeparateDomain::top(),
                    lifetimes: lifetimes.clone(),
                },
            };
        }
        let Some(locations) = points_to.iter() else {
            return self.clone();
        };
        let locations: Vec<MemoryLocationId> = locations.collect();
        let offset = ptr.offset().clone();
        let strong = locations.len() == 1
            && offset.as_singleton().is_some()
            && locations_factory.is_singleton_shaped(locations[0]);
        let mut new_store = store.clone();
        for loc in locations {
            let cell = Cell::known(offset.clone(), size, value.clone());
            new_store = if strong {
                new_store.set(loc, cell)
            } else {
                let existing = new_store.get(&loc);
                let widened = if existing.same_shape(&offset, size) {
                    existing.join(&cell)
                } else if existing.is_bottom() {
                    cell
                } else {
                    Cell::Top
                };
                new_store.set(loc, widened)
            };
        }
        MemoryDomain {
            repr: Repr::Live {
                pointers: pointers.clone(),
                store: new_store,
                lifetimes: lifetimes.clone(),
            },
        }
    }

    /// Spec §4.5 `mem_read(x, p, size)`: the join of the cells at every
    /// location `p` may point to, `top` if `p` may point anywhere or the
    /// location's cell doesn't match the read's shape.
    pub fn mem_read(&self, p: &VariableId, size: u64) -> Interval<MachineInt> {
        let Repr::Live { pointers, store, .. } = &self.repr else {
            return Interval::bottom();
        };
        let ptr = pointers.get(p);
        let points_to = ptr.points_to();
        if points_to.is_top() {
            return Interval::top();
        }
        let Some(locations) = points_to.iter() else {
            return Interval::bottom();
        };
        let offset = ptr.offset().clone();
        let mut result = Interval::bottom();
        for loc in locations {
            let cell = store.get(&loc);
            let matched = if cell.same_shape(&offset, size) {
                cell.value()
            } else if cell.is_top() {
                Interval::top()
            } else if cell.is_bottom() {
                continue;
            } else {
                Interval::top()
            };
            result = result.join(&matched);
        }
        result
    }

    /// Spec §4.5 `mem_copy(dst, src, size)`: abstracts to `top` at every
    /// destination location on any possible aliasing between `dst` and
    /// `src`'s points-to sets (a sound, coarse scope cut rather than
    /// reasoning about partial overlap shapes).
    pub fn mem_copy(
        &self,
        dst: &VariableId,
        src: &VariableId,
        size: u64,
        locations_factory: &MemoryLocationFactory,
    ) -> Self {
        let Repr::Live { pointers, store, lifetimes } = &self.repr else {
            return MemoryDomain::bottom();
        };
        let dst_ptr = pointers.get(dst);
        let src_ptr = pointers.get(src);
        let may_alias = dst_ptr.points_to().is_top()
            || src_ptr.points_to().is_top()
            || !dst_ptr.points_to().meet(src_ptr.points_to()).is_bottom();
        if may_alias {
            let Some(locations) = dst_ptr.points_to().iter() else {
                return MemoryDomain {
                    repr: Repr::Live {
                        pointers: pointers.clone(),
                        store: SeparateDomain::top(),
                        lifetimes: lifetimes.clone(),
                    },
                };
            };
            let mut new_store = store.clone();
            for loc in locations {
                new_store = new_store.set(loc, Cell::top());
            }
            return MemoryDomain {
                repr: Repr::Live {
                    pointers: pointers.clone(),
                    store: new_store,
                    lifetimes: lifetimes.clone(),
                },
            };
        }
        let value = self.mem_read(src, size);
        self.mem_write(dst, &value, size, locations_factory)
    }

    /// Spec §4.5 `mem_set(dst, value, size)`.
    pub fn mem_set(
        &self,
        dst: &VariableId,
        value: &Interval<MachineInt>,
        size: u64,
        locations_factory: &MemoryLocationFactory,
    ) -> Self {
        self.mem_write(dst, value, size, locations_factory)
    }

    /// Spec §4.5 `mem_forget(addr[, range])`: unconditionally widens the
    /// location's cell to `top`, ignoring points-to precision.
    pub fn mem_forget(&self, addr: MemoryLocationId) -> Self {
        let Repr::Live { pointers, store, lifetimes } = &self.repr else {
            return MemoryDomain::bottom();
        };
        MemoryDomain {
            repr: Repr::Live {
                pointers: pointers.clone(),
                store: store.set(addr, Cell::top()),
                lifetimes: lifetimes.clone(),
            },
        }
    }

    /// Spec §4.5 `mem_forget_reachable(p[, size])`: forgets every location
    /// `p` may point to; `top` points-to forgets the whole store.
    pub fn mem_forget_reachable(&self, p: &VariableId) -> Self {
        let Repr::Live { pointers, store, lifetimes } = &self.repr else {
            return MemoryDomain::bottom();
        };
        let points_to = pointers.get(p).points_to().clone();
        if points_to.is_top() {
            return MemoryDomain {
                repr: Repr::Live {
                    pointers: pointers.clone(),
                    store: SeparateDomain::top(),
                    lifetimes: lifetimes.clone(),
                },
            };
        }
        let Some(locations) = points_to.iter() else {
            return self.clone();
        };
        let mut new_store = store.clone();
        for loc in locations {
            new_store = new_store.set(loc, Cell::top());
        }
        MemoryDomain {
            repr: Repr::Live {
                pointers: pointers.clone(),
                store: new_store,
                lifetimes: lifetimes.clone(),
            },
        }
    }

    /// Spec §4.5 `mem_abstract_reachable(p[, size])`: same widening as
    /// `mem_forget_reachable` (this domain doesn't distinguish "value
    /// unknown but typed" from "value unknown", so both collapse a cell to
    /// the same `Cell::Top`).
    pub fn mem_abstract_reachable(&self, p: &VariableId) -> Self {
        self.mem_forget_reachable(p)
    }

    /// Spec §4.5 `mem_zero_reachable(p)`: every reachable location's cell
    /// becomes the singleton zero value at its current shape, or `0` over
    /// an unshaped/unknown cell.
    pub fn mem_zero_reachable(&self, p: &VariableId, width: Width) -> Self {
        let Repr::Live { pointers, store, lifetimes } = &self.repr else {
            return MemoryDomain::bottom();
        };
        let points_to = pointers.get(p).points_to().clone();
        if points_to.is_top() {
            return self.clone();
        }
        let Some(locations) = points_to.iter() else {
            return self.clone();
        };
        let zero = Interval::singleton(MachineInt::zero(width, ikos_num::Sign::Unsigned));
        let mut new_store = store.clone();
        for loc in locations {
            new_store = match new_store.get(&loc) {
                Cell::Known { offset, size, .. } => {
                    new_store.set(loc, Cell::known(offset, size, zero.clone()))
                }
                _ => new_store,
            };
        }
        MemoryDomain {
            repr: Repr::Live {
                pointers: pointers.clone(),
                store: new_store,
                lifetimes: lifetimes.clone(),
            },
        }
    }

    /// Spec §4.5 `mem_uninitialize_reachable(p)`: same shape as
    /// `mem_forget_reachable`; uninitialized-byte tracking is carried by a
    /// separate [`crate::uninitialized::Uninitialized`] component the
    /// engine's transfer function maintains per variable, not by this
    /// domain's store.
    pub fn mem_uninitialize_reachable(&self, p: &VariableId) -> Self {
        self.mem_forget_reachable(p)
    }

    /// Spec §4.5 `lifetime_assign_allocated(addr)`.
    pub fn lifetime_assign_allocated(&self, addr: MemoryLocationId) -> Self {
        self.set_lifetime(addr, Lifetime::allocated())
    }

    /// Spec §4.5 `lifetime_assign_deallocated(addr)`.
    pub fn lifetime_assign_deallocated(&self, addr: MemoryLocationId) -> Self {
        self.set_lifetime(addr, Lifetime::deallocated())
    }

    pub fn lifetime(&self, addr: &MemoryLocationId) -> Lifetime {
        match &self.repr {
            Repr::Bottom => Lifetime::bottom(),
            Repr::Live { lifetimes, .. } => lifetimes.get(addr),
        }
    }

    fn set_lifetime(&self, addr: MemoryLocationId, lifetime: Lifetime) -> Self {
        let Repr::Live { pointers, store, lifetimes } = &self.repr else {
            return MemoryDomain::bottom();
        };
        MemoryDomain {
            repr: Repr::Live {
                pointers: pointers.clone(),
                store: store.clone(),
                lifetimes: lifetimes.set(addr, lifetime),
            },
        }
    }

    // Pointer-domain passthroughs so callers don't need to reach into
    // `pointers()` for the common cases (spec §4.5's pointer ops are part
    // of the same reduced product as the memory ops above).

    pub fn assign_address(&self, p: VariableId, addr: MemoryLocationId, nullity: Nullity, offset_width: Width) -> Self {
        match self.pointers() {
            None => MemoryDomain::bottom(),
            Some(ptrs) => self.with_pointers(ptrs.assign_address(p, addr, nullity, offset_width)),
        }
    }

    pub fn assign_null(&self, p: VariableId, absolute_zero: MemoryLocationId, offset_width: Width) -> Self {
        match self.pointers() {
            None => MemoryDomain::bottom(),
            Some(ptrs) => self.with_pointers(ptrs.assign_null(p, absolute_zero, offset_width)),
        }
    }

    pub fn assign(&self, p: VariableId, q: &VariableId) -> Self {
        match self.pointers() {
            None => MemoryDomain::bottom(),
            Some(ptrs) => self.with_pointers(ptrs.assign(p, q)),
        }
    }

    pub fn points_to(&self, p: &VariableId) -> PointsToSet {
        self.pointers().map(|ptrs| ptrs.points_to(p)).unwrap_or_else(PointsToSet::bottom)
    }

    pub fn get_pointer(&self, p: &VariableId) -> PointerAbsValue {
        self.pointers().map(|ptrs| ptrs.get(p)).unwrap_or_else(PointerAbsValue::bottom)
    }
}

impl<N: NumericalDomain> AbstractDomain for MemoryDomain<N> {
    fn top() -> Self {
        MemoryDomain {
            repr: Repr::Live {
                pointers: PointerDomain::top(),
                store: SeparateDomain::top(),
                lifetimes: SeparateDomain::top(),
            },
        }
    }

    fn bottom() -> Self {
        MemoryDomain { repr: Repr::Bottom }
    }

    fn is_top(&self) -> bool {
        matches!(&self.repr, Repr::Live { pointers, store, lifetimes }
            if pointers.is_top() && store.is_top() && lifetimes.is_top())
    }

    fn is_bottom(&self) -> bool {
        matches!(self.repr, Repr::Bottom)
    }

    fn leq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => true,
            (_, Repr::Bottom) => false,
            (
                Repr::Live { pointers: p1, store: s1, lifetimes: l1 },
                Repr::Live { pointers: p2, store: s2, lifetimes: l2 },
            ) => p1.leq(p2) && s1.leq(s2) && l1.leq(l2),
        }
    }

    fn join(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => other.clone(),
            (_, Repr::Bottom) => self.clone(),
            (
                Repr::Live { pointers: p1, store: s1, lifetimes: l1 },
                Repr::Live { pointers: p2, store: s2, lifetimes: l2 },
            ) => MemoryDomain {
                repr: Repr::Live {
                    pointers: p1.join(p2),
                    store: s1.join(s2),
                    lifetimes: l1.join(l2),
                },
            },
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) | (_, Repr::Bottom) => MemoryDomain::bottom(),
            (
                Repr::Live { pointers: p1, store: s1, lifetimes: l1 },
                Repr::Live { pointers: p2, store: s2, lifetimes: l2 },
            ) => MemoryDomain {
                repr: Repr::Live {
                    pointers: p1.meet(p2),
                    store: s1.meet(s2),
                    lifetimes: l1.meet(l2),
                },
            },
        }
    }

    fn widen(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => other.clone(),
            (_, Repr::Bottom) => self.clone(),
            (
                Repr::Live { pointers: p1, store: s1, lifetimes: l1 },
                Repr::Live { pointers: p2, store: s2, lifetimes: l2 },
            ) => MemoryDomain {
                repr: Repr::Live {
                    pointers: p1.widen(p2),
                    store: s1.widen(s2),
                    lifetimes: l1.widen(l2),
                },
            },
        }
    }
}

impl<N: NumericalDomain> PartialEq for MemoryDomain<N> {
    fn eq(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }
}

impl<N: NumericalDomain + fmt::Debug> fmt::Debug for MemoryDomain<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Bottom => write!(f, "_|_"),
            Repr::Live { pointers, store, lifetimes } => {
                write!(f, "(ptr={pointers:?}, mem={store:?}, life={lifetimes:?})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::IntervalDomain;
    use ikos_ar::{GlobalVariableId, MemoryLocation, MemoryLocationFactory};
    use ikos_num::Sign;

    type MD = MemoryDomain<IntervalDomain>;

    const P: VariableId = VariableId(0);

    fn z(n: u64) -> Interval<MachineInt> {
        Interval::singleton(MachineInt::from_u128(n as u128, Width::W32, Sign::Unsigned))
    }

    #[test]
    fn write_then_read_through_a_singleton_pointer_recovers_the_value() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(GlobalVariableId(0)));
        let d = MD::top()
            .assign_address(P, a, Nullity::non_null(), Width::W64)
            .mem_write(&P, &z(0), 4, &f);
        let value = d.mem_read(&P, 4);
        assert_eq!(value, z(0));
    }

    #[test]
    fn forget_reachable_widens_the_read_back_to_top() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(GlobalVariableId(0)));
        let d = MD::top()
            .assign_address(P, a, Nullity::non_null(), Width::W64)
            .mem_write(&P, &z(0), 4, &f)
            .mem_forget_reachable(&P);
        assert!(d.mem_read(&P, 4).is_top());
    }

    #[test]
    fn write_through_a_non_singleton_pointer_is_a_weak_join() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(GlobalVariableId(0)));
        let b = f.get_or_create(MemoryLocation::Global(GlobalVariableId(1)));
        let d = MD::top()
            .assign_address(P, a, Nullity::non_null(), Width::W64)
            .mem_write(&P, &z(0), 4, &f);
        let d = d.with_pointers(
            d.pointers()
                .unwrap()
                .refine(&P, PointsToSet::from_iter([a, b])),
        );
        let d = d.mem_write(&P, &z(7), 4, &f);
        assert!(!d.mem_read(&P, 4).is_bottom());
    }

    #[test]
    fn write_through_a_singleton_dyn_alloc_pointer_is_still_a_weak_join() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::DynAlloc(
            ikos_ar::CallSiteId(0),
            ikos_ar::CallContextId::ROOT,
        ));
        let d = MD::top()
            .assign_address(P, a, Nullity::non_null(), Width::W64)
            .mem_write(&P, &z(0), 4, &f);
        let d = d.mem_write(&P, &z(7), 4, &f);
        assert!(!d.mem_read(&P, 4).is_bottom() && d.mem_read(&P, 4) != z(7));
    }

    #[test]
    fn mem_copy_between_provably_disjoint_pointers_copies_the_value() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(GlobalVariableId(0)));
        let b = f.get_or_create(MemoryLocation::Global(GlobalVariableId(1)));
        let src = VariableId(2);
        let dst = VariableId(3);
        let d = MD::top()
            .assign_address(src, a, Nullity::non_null(), Width::W64)
            .assign_address(dst, b, Nullity::non_null(), Width::W64)
            .mem_write(&src, &z(9), 4, &f)
            .mem_copy(&dst, &src, 4, &f);
        assert_eq!(d.mem_read(&dst, 4), z(9));
    }

    #[test]
    fn lifetime_tracks_allocation_and_deallocation() {
        let f = MemoryLocationFactory::new();
        let a = f.get_or_create(MemoryLocation::Global(GlobalVariableId(0)));
        let d = MD::top()
            .lifetime_assign_allocated(a)
            .lifetime_assign_deallocated(a);
        assert!(d.lifetime(&a).is_deallocated());
    }
}
