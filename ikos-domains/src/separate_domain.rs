//! `SeparateDomain<K, V>` (spec §4.3): a generic variable-to-value map whose
//! value type is itself an abstract domain. Represented as a persistent
//! patricia tree keyed by `K`'s stable index, with a global bottom flag:
//! any variable reduced to `V::bottom()` collapses the whole map.

use core::fmt;

use crate::lattice::AbstractDomain;
use crate::persistent_map::{PersistentMap, StableIndex};

#[derive(Clone)]
enum Repr<K, V> {
    Bottom,
    Map(PersistentMap<K, V>),
}

/// `K -> V`, implicitly `top` for any key not present (spec §4.3: `set(k,
/// top)` drops `k`).
#[derive(Clone)]
pub struct SeparateDomain<K, V> {
    repr: Repr<K, V>,
}

impl<K: StableIndex, V: AbstractDomain> SeparateDomain<K, V> {
    pub fn top() -> Self {
        SeparateDomain {
            repr: Repr::Map(PersistentMap::new()),
        }
    }

    pub fn bottom() -> Self {
        SeparateDomain { repr: Repr::Bottom }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self.repr, Repr::Bottom)
    }

    /// Every key absent from the map is implicitly `top`.
    pub fn get(&self, key: &K) -> V {
        match &self.repr {
            Repr::Bottom => V::bottom(),
            Repr::Map(m) => m.get(key).cloned().unwrap_or_else(V::top),
        }
    }

    /// Binds `key` to `value`. `top` drops the key (the implicit default);
    /// `bottom` collapses the whole map to global bottom (spec §4.3).
    pub fn set(&self, key: K, value: V) -> Self {
        if value.is_bottom() {
            return SeparateDomain::bottom();
        }
        match &self.repr {
            Repr::Bottom => SeparateDomain::bottom(),
            Repr::Map(m) => {
                let updated = if value.is_top() {
                    m.remove(&key)
                } else {
                    m.insert(key, value)
                };
                SeparateDomain {
                    repr: Repr::Map(updated),
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        match &self.repr {
            Repr::Bottom => Either::Left(core::iter::empty()),
            Repr::Map(m) => Either::Right(m.iter()),
        }
    }
}

impl<K: StableIndex, V: AbstractDomain> AbstractDomain for SeparateDomain<K, V> {
    fn top() -> Self {
        SeparateDomain::top()
    }

    fn bottom() -> Self {
        SeparateDomain::bottom()
    }

    fn is_top(&self) -> bool {
        matches!(&self.repr, Repr::Map(m) if m.is_empty())
    }

    fn is_bottom(&self) -> bool {
        SeparateDomain::is_bottom(self)
    }

    fn leq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => true,
            (_, Repr::Bottom) => false,
            // A key explicit in `other` is a non-top constraint; `self`
            // must have an equally-or-more-precise explicit value for it
            // (an implicit `top` on `self`'s side never satisfies `<=`
            // against a non-top value).
            (Repr::Map(m), Repr::Map(n)) => n.iter().all(|(k, v)| match m.get(k) {
                Some(mv) => mv.leq(v),
                None => false,
            }),
        }
    }

    /// Tree merge that joins matching keys and drops any key whose result
    /// becomes `top` (spec §4.3).
    fn join(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => other.clone(),
            (_, Repr::Bottom) => self.clone(),
            (Repr::Map(m), Repr::Map(n)) => SeparateDomain {
                repr: Repr::Map(m.intersect_merge(n, |a, b| {
                    let joined = a.join(b);
                    if joined.is_top() {
                        None
                    } else {
                        Some(joined)
                    }
                })),
            },
        }
    }

    /// Tree merge that meets matching keys; any pointwise meet becoming
    /// `bottom` sets the whole map to global bottom (spec §4.3).
    fn meet(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) | (_, Repr::Bottom) => SeparateDomain::bottom(),
            (Repr::Map(m), Repr::Map(n)) => {
                let went_bottom = core::cell::Cell::new(false);
                let merged = m.union_merge(n, |a, b| {
                    let met = a.meet(b);
                    if met.is_bottom() {
                        went_bottom.set(true);
                    }
                    Some(met)
                });
                if went_bottom.get() {
                    SeparateDomain::bottom()
                } else {
                    SeparateDomain {
                        repr: Repr::Map(merged),
                    }
                }
            }
        }
    }

    /// A key unmatched on either side is implicitly `top` there, and
    /// `widen(_, top)`/`widen(top, _)` must itself be `top` (the result has
    /// to stay an upper bound of `other`) — so unmatched keys are dropped,
    /// exactly like [`AbstractDomain::join`].
    fn widen(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) => other.clone(),
            (_, Repr::Bottom) => self.clone(),
            (Repr::Map(m), Repr::Map(n)) => SeparateDomain {
                repr: Repr::Map(m.intersect_merge(n, |a, b| {
                    let widened = a.widen(b);
                    if widened.is_top() {
                        None
                    } else {
                        Some(widened)
                    }
                })),
            },
        }
    }

    fn narrow(&self, other: &Self) -> Self {
        match (&self.repr, &other.repr) {
            (Repr::Bottom, _) | (_, Repr::Bottom) => SeparateDomain::bottom(),
            (Repr::Map(m), Repr::Map(n)) => SeparateDomain {
                repr: Repr::Map(m.union_merge(n, |a, b| Some(a.narrow(b)))),
            },
        }
    }
}

impl<K: StableIndex, V: AbstractDomain> Default for SeparateDomain<K, V> {
    fn default() -> Self {
        SeparateDomain::top()
    }
}

impl<K, V> PartialEq for SeparateDomain<K, V>
where
    K: StableIndex,
    V: AbstractDomain,
{
    fn eq(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }
}

impl<K, V> fmt::Debug for SeparateDomain<K, V>
where
    K: StableIndex + fmt::Debug,
    V: AbstractDomain + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Bottom => write!(f, "_|_"),
            Repr::Map(m) => f.debug_map().entries(m.iter()).finish(),
        }
    }
}

/// Local stand-in for `either::Either`, just enough to let [`SeparateDomain::
/// iter`] return one of two iterator shapes without boxing.
enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<'a, K: 'a, V: 'a, L, R> Iterator for Either<L, R>
where
    L: Iterator<Item = (&'a K, &'a V)>,
    R: Iterator<Item = (&'a K, &'a V)>,
{
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Either::Left(it) => it.next(),
            Either::Right(it) => it.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use ikos_num::{Bound, Z};

    fn z(v: i64) -> Z {
        Z::from_i64(v)
    }

    fn iv(lb: i64, ub: i64) -> Interval<Z> {
        Interval::new(Bound::finite(z(lb)), Bound::finite(z(ub)))
    }

    #[test]
    fn absent_key_is_implicitly_top() {
        let d = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top();
        assert!(d.get(&ikos_ar::VariableId(0)).is_top());
    }

    #[test]
    fn set_top_drops_the_key() {
        let d = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(0), iv(0, 5))
            .set(ikos_ar::VariableId(0), Interval::top());
        assert!(d.get(&ikos_ar::VariableId(0)).is_top());
    }

    #[test]
    fn set_bottom_collapses_the_whole_map() {
        let d = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(0), iv(0, 5))
            .set(ikos_ar::VariableId(1), Interval::bottom());
        assert!(d.is_bottom());
    }

    #[test]
    fn join_widens_non_matching_keys_to_top() {
        let a = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(0), iv(0, 5))
            .set(ikos_ar::VariableId(1), iv(0, 5));
        let b = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(0), iv(3, 8));
        let j = a.join(&b);
        assert_eq!(j.get(&ikos_ar::VariableId(0)).lb(), Some(&Bound::finite(z(0))));
        assert_eq!(j.get(&ikos_ar::VariableId(0)).ub(), Some(&Bound::finite(z(8))));
        assert!(j.get(&ikos_ar::VariableId(1)).is_top());
    }

    #[test]
    fn meet_keeps_both_sides_keys() {
        let a = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(0), iv(0, 10));
        let b = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(0), iv(5, 20))
            .set(ikos_ar::VariableId(1), iv(1, 1));
        let m = a.meet(&b);
        assert_eq!(m.get(&ikos_ar::VariableId(0)).lb(), Some(&Bound::finite(z(5))));
        assert_eq!(m.get(&ikos_ar::VariableId(0)).ub(), Some(&Bound::finite(z(10))));
        assert_eq!(m.get(&ikos_ar::VariableId(1)).lb(), Some(&Bound::finite(z(1))));
    }
}
