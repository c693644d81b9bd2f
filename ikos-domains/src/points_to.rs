//! The points-to domain (spec §4.2): the set of memory locations a pointer
//! may reference, tagged `{bottom, top, finite}` and backed by the same
//! patricia tree [`PersistentMap`] uses, for the structural sharing a join
//! across many program points needs.

use core::fmt;

use ikos_ar::MemoryLocationId;

use crate::lattice::AbstractDomain;
use crate::persistent_map::PersistentMap;

#[derive(Clone)]
enum Repr {
    Bottom,
    Top,
    Finite(PersistentMap<MemoryLocationId, ()>),
}

/// `{bottom}` for "provably points nowhere" (unreachable code or a
/// not-yet-initialised pointer); `{top}` for "may point anywhere"; a finite
/// set otherwise.
#[derive(Clone)]
pub struct PointsToSet(Repr);

/// Lattice equality rather than representation equality: an empty finite
/// set and `bottom` compare equal, matching the reduction
/// [`crate::pointer_value::PointerAbsValue`] applies to both.
impl PartialEq for PointsToSet {
    fn eq(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }
}

impl PointsToSet {
    pub fn singleton(location: MemoryLocationId) -> Self {
        PointsToSet(Repr::Finite(
            PersistentMap::new().insert(location, ()),
        ))
    }

    pub fn from_iter(locations: impl IntoIterator<Item = MemoryLocationId>) -> Self {
        let mut map = PersistentMap::new();
        for loc in locations {
            map = map.insert(loc, ());
        }
        PointsToSet(Repr::Finite(map))
    }

    /// `true` for the empty finite set ("points to no known location"),
    /// distinct from [`AbstractDomain::is_bottom`]'s tag check but treated
    /// the same way by [`crate::pointer_value::PointerAbsValue`]'s
    /// reduction.
    pub fn is_empty(&self) -> bool {
        matches!(&self.0, Repr::Finite(m) if m.is_empty())
    }

    pub fn contains(&self, location: MemoryLocationId) -> bool {
        match &self.0 {
            Repr::Bottom => false,
            Repr::Top => true,
            Repr::Finite(m) => m.get(&location).is_some(),
        }
    }

    pub fn as_singleton(&self) -> Option<MemoryLocationId> {
        match &self.0 {
            Repr::Finite(m) if m.len() == 1 => m.iter().next().map(|(k, _)| *k),
            _ => None,
        }
    }

    pub fn iter(&self) -> Option<impl Iterator<Item = MemoryLocationId> + '_> {
        match &self.0 {
            Repr::Finite(m) => Some(m.iter().map(|(k, _)| *k)),
            _ => None,
        }
    }

    /// Locations in `self` but not in `other`; `top` on either side
    /// over-approximates to `top` (spec §4.2 "Difference ... provided").
    pub fn difference(&self, other: &Self) -> Self {
        match (&self.0, &other.0) {
            (Repr::Bottom, _) => PointsToSet::bottom(),
            (_, Repr::Top) => PointsToSet::bottom(),
            (Repr::Top, _) => PointsToSet::top(),
            (Repr::Finite(m), Repr::Bottom) => PointsToSet(Repr::Finite((*m).clone())),
            (Repr::Finite(m), Repr::Finite(n)) => {
                PointsToSet(Repr::Finite(m.intersect_merge(n, |_, _| None)))
            }
        }
    }
}

impl AbstractDomain for PointsToSet {
    fn top() -> Self {
        PointsToSet(Repr::Top)
    }

    fn bottom() -> Self {
        PointsToSet(Repr::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self.0, Repr::Top)
    }

    fn is_bottom(&self) -> bool {
        matches!(self.0, Repr::Bottom)
    }

    fn leq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Bottom, _) => true,
            (_, Repr::Top) => true,
            (Repr::Top, _) => false,
            (_, Repr::Bottom) => self.is_empty(),
            (Repr::Finite(m), Repr::Finite(n)) => {
                m.iter().all(|(k, _)| n.get(k).is_some())
            }
        }
    }

    /// Union; `top` absorbs either side (spec §4.2).
    fn join(&self, other: &Self) -> Self {
        match (&self.0, &other.0) {
            (Repr::Top, _) | (_, Repr::Top) => PointsToSet::top(),
            (Repr::Bottom, _) => other.clone(),
            (_, Repr::Bottom) => self.clone(),
            (Repr::Finite(m), Repr::Finite(n)) => {
                PointsToSet(Repr::Finite(m.union_merge(n, |(), ()| Some(()))))
            }
        }
    }

    /// Intersection; `bottom` absorbs either side (spec §4.2).
    fn meet(&self, other: &Self) -> Self {
        match (&self.0, &other.0) {
            (Repr::Bottom, _) | (_, Repr::Bottom) => PointsToSet::bottom(),
            (Repr::Top, _) => other.clone(),
            (_, Repr::Top) => self.clone(),
            (Repr::Finite(m), Repr::Finite(n)) => {
                PointsToSet(Repr::Finite(m.intersect_merge(n, |(), ()| Some(()))))
            }
        }
    }

    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }
}

impl fmt::Debug for PointsToSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Bottom => write!(f, "_|_"),
            Repr::Top => write!(f, "T"),
            Repr::Finite(m) => {
                write!(f, "{{")?;
                for (i, (k, _)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_ar::{MemoryLocation, MemoryLocationFactory};

    fn loc(factory: &MemoryLocationFactory, n: u32) -> MemoryLocationId {
        factory.get_or_create(MemoryLocation::Aggregate(ikos_ar::TypeId(0), n))
    }

    #[test]
    fn join_is_union() {
        let f = MemoryLocationFactory::new();
        let a = PointsToSet::singleton(loc(&f, 1));
        let b = PointsToSet::singleton(loc(&f, 2));
        let j = a.join(&b);
        assert!(j.contains(loc(&f, 1)));
        assert!(j.contains(loc(&f, 2)));
    }

    #[test]
    fn meet_is_intersection() {
        let f = MemoryLocationFactory::new();
        let shared = loc(&f, 1);
        let a = PointsToSet::from_iter([shared, loc(&f, 2)]);
        let b = PointsToSet::from_iter([shared, loc(&f, 3)]);
        let m = a.meet(&b);
        assert!(m.contains(shared));
        assert!(!m.contains(loc(&f, 2)));
        assert!(!m.contains(loc(&f, 3)));
    }

    #[test]
    fn top_absorbs_join_and_is_absorbed_by_meet() {
        let f = MemoryLocationFactory::new();
        let a = PointsToSet::singleton(loc(&f, 1));
        assert!(a.join(&PointsToSet::top()).is_top());
        assert!(a.meet(&PointsToSet::top()).contains(loc(&f, 1)));
    }

    #[test]
    fn difference_removes_shared_locations() {
        let f = MemoryLocationFactory::new();
        let shared = loc(&f, 1);
        let a = PointsToSet::from_iter([shared, loc(&f, 2)]);
        let b = PointsToSet::singleton(shared);
        let d = a.difference(&b);
        assert!(!d.contains(shared));
        assert!(d.contains(loc(&f, 2)));
    }
}
