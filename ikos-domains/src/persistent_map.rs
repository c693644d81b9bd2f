//! A persistent (structure-sharing) map backed by a big-endian Patricia
//! trie over a stable `u64` key index, the substrate `SeparateDomain` and
//! `PointsToSet`'s finite-set representation are built on (spec §3
//! "patricia-tree-backed", §4.3, §5 "persistent data structures").
//!
//! The algorithm (branching-bit tries à la Okasaki / GHC's `Data.IntMap`)
//! mirrors the design `examples/original_source/core/include/ikos/core/
//! domain/separate_domain.hpp` is built on (`ikos::core::PatriciaTreeMap`,
//! itself filtered out of the retrieval pack but referenced by that header's
//! `#include`). `Arc` gives every join/meet/widen structural sharing with
//! its operands for free: unmodified subtrees are never copied.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A key usable in a [`PersistentMap`]: anything with a stable, injective
/// `u64` projection. Interned ids (`VariableId`, `MemoryLocationId`, ...)
/// implement this via their raw index.
pub trait StableIndex: Clone + Eq {
    fn stable_index(&self) -> u64;
}

macro_rules! stable_index_via_u32_field {
    ($ty:ty) => {
        impl StableIndex for $ty {
            fn stable_index(&self) -> u64 {
                self.0 as u64
            }
        }
    };
}

stable_index_via_u32_field!(ikos_ar::VariableId);
stable_index_via_u32_field!(ikos_ar::BasicBlockId);
stable_index_via_u32_field!(ikos_ar::FunctionId);
stable_index_via_u32_field!(ikos_ar::GlobalVariableId);
stable_index_via_u32_field!(ikos_ar::CallSiteId);
stable_index_via_u32_field!(ikos_ar::TypeId);

impl StableIndex for ikos_ar::MemoryLocationId {
    fn stable_index(&self) -> u64 {
        self.index() as u64
    }
}

impl StableIndex for ikos_ar::CallContextId {
    fn stable_index(&self) -> u64 {
        self.index() as u64
    }
}

type Mask = u64;

#[derive(Clone)]
enum Node<K, V> {
    Empty,
    Leaf(Arc<(K, V)>),
    Branch {
        prefix: u64,
        mask: Mask,
        left: Arc<Node<K, V>>,
        right: Arc<Node<K, V>>,
    },
}

fn highest_bit(x: u64) -> u64 {
    if x == 0 {
        0
    } else {
        1u64 << (63 - x.leading_zeros())
    }
}

fn branching_bit(p1: u64, p2: u64) -> u64 {
    highest_bit(p1 ^ p2)
}

fn mask_of(key: u64, m: Mask) -> u64 {
    if m == 0 {
        0
    } else {
        key & (!(m - 1) ^ m)
    }
}

fn zero_bit(key: u64, m: Mask) -> bool {
    key & m == 0
}

fn matches_prefix(key: u64, prefix: u64, m: Mask) -> bool {
    mask_of(key, m) == prefix
}

impl<K: StableIndex, V: Clone> Node<K, V> {
    fn join(p1: u64, t1: Arc<Node<K, V>>, p2: u64, t2: Arc<Node<K, V>>) -> Node<K, V> {
        let m = branching_bit(p1, p2);
        let prefix = mask_of(p1, m);
        if zero_bit(p1, m) {
            Node::Branch {
                prefix,
                mask: m,
                left: t1,
                right: t2,
            }
        } else {
            Node::Branch {
                prefix,
                mask: m,
                left: t2,
                right: t1,
            }
        }
    }

    fn get(&self, key: u64) -> Option<&V> {
        match self {
            Node::Empty => None,
            Node::Leaf(kv) => {
                if kv.0.stable_index() == key {
                    Some(&kv.1)
                } else {
                    None
                }
            }
            Node::Branch {
                prefix,
                mask,
                left,
                right,
            } => {
                if !matches_prefix(key, *prefix, *mask) {
                    None
                } else if zero_bit(key, *mask) {
                    left.get(key)
                } else {
                    right.get(key)
                }
            }
        }
    }

    fn insert(self: &Arc<Self>, k: K, v: V) -> Arc<Node<K, V>> {
        let key = k.stable_index();
        match self.as_ref() {
            Node::Empty => Arc::new(Node::Leaf(Arc::new((k, v)))),
            Node::Leaf(kv) => {
                if kv.0.stable_index() == key {
                    Arc::new(Node::Leaf(Arc::new((k, v))))
                } else {
                    Arc::new(Node::join(
                        key,
                        Arc::new(Node::Leaf(Arc::new((k, v)))),
                        kv.0.stable_index(),
                        Arc::clone(self),
                    ))
                }
            }
            Node::Branch {
                prefix,
                mask,
                left,
                right,
            } => {
                if matches_prefix(key, *prefix, *mask) {
                    if zero_bit(key, *mask) {
                        Arc::new(Node::Branch {
                            prefix: *prefix,
                            mask: *mask,
                            left: left.insert(k, v),
                            right: Arc::clone(right),
                        })
                    } else {
                        Arc::new(Node::Branch {
                            prefix: *prefix,
                            mask: *mask,
                            left: Arc::clone(left),
                            right: right.insert(k, v),
                        })
                    }
                } else {
                    Arc::new(Node::join(
                        key,
                        Arc::new(Node::Leaf(Arc::new((k, v)))),
                        *prefix,
                        Arc::clone(self),
                    ))
                }
            }
        }
    }

    fn remove(self: &Arc<Self>, key: u64) -> Arc<Node<K, V>> {
        match self.as_ref() {
            Node::Empty => Arc::clone(self),
            Node::Leaf(kv) => {
                if kv.0.stable_index() == key {
                    Arc::new(Node::Empty)
                } else {
                    Arc::clone(self)
                }
            }
            Node::Branch {
                prefix,
                mask,
                left,
                right,
            } => {
                if !matches_prefix(key, *prefix, *mask) {
                    Arc::clone(self)
                } else if zero_bit(key, *mask) {
                    branch(*prefix, *mask, left.remove(key), Arc::clone(right))
                } else {
                    branch(*prefix, *mask, Arc::clone(left), right.remove(key))
                }
            }
        }
    }

    fn for_each<'a>(&'a self, out: &mut Vec<(&'a K, &'a V)>) {
        match self {
            Node::Empty => {}
            Node::Leaf(kv) => out.push((&kv.0, &kv.1)),
            Node::Branch { left, right, .. } => {
                left.for_each(out);
                right.for_each(out);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Node::Empty => 0,
            Node::Leaf(_) => 1,
            Node::Branch { left, right, .. } => left.len() + right.len(),
        }
    }
}

/// Collapse a branch with an empty child back down, keeping the invariant
/// that `Empty` never appears as a child of a `Branch`.
fn branch<K: Clone, V: Clone>(
    prefix: u64,
    mask: Mask,
    left: Arc<Node<K, V>>,
    right: Arc<Node<K, V>>,
) -> Arc<Node<K, V>> {
    match (left.as_ref(), right.as_ref()) {
        (Node::Empty, _) => right,
        (_, Node::Empty) => left,
        _ => Arc::new(Node::Branch {
            prefix,
            mask,
            left,
            right,
        }),
    }
}

/// Merge two tries. `combine` is applied to the value at every key present
/// in *both* tries; returning `None` drops that key from the result. Keys
/// present in only one trie are carried over to `on_left_only`/
/// `on_right_only` respectively — `Keep` to copy them unchanged, `Drop` to
/// remove them.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedPolicy {
    Keep,
    Drop,
}

fn merge<K, V>(
    t1: &Arc<Node<K, V>>,
    t2: &Arc<Node<K, V>>,
    combine: &impl Fn(&V, &V) -> Option<V>,
    on_left_only: UnmatchedPolicy,
    on_right_only: UnmatchedPolicy,
) -> Arc<Node<K, V>>
where
    K: StableIndex,
    V: Clone,
{
    match (t1.as_ref(), t2.as_ref()) {
        (Node::Empty, _) => {
            if on_right_only == UnmatchedPolicy::Keep {
                Arc::clone(t2)
            } else {
                Arc::new(Node::Empty)
            }
        }
        (_, Node::Empty) => {
            if on_left_only == UnmatchedPolicy::Keep {
                Arc::clone(t1)
            } else {
                Arc::new(Node::Empty)
            }
        }
        (Node::Leaf(kv1), _) => merge_leaf(kv1, t1, t2, combine, on_left_only, on_right_only, true),
        (_, Node::Leaf(kv2)) => {
            merge_leaf(kv2, t2, t1, combine, on_right_only, on_left_only, false)
        }
        (
            Node::Branch {
                prefix: p1,
                mask: m1,
                left: l1,
                right: r1,
            },
            Node::Branch {
                prefix: p2,
                mask: m2,
                left: l2,
                right: r2,
            },
        ) => {
            match m1.cmp(m2) {
                Ordering::Equal if p1 == p2 => branch(
                    *p1,
                    *m1,
                    merge(l1, l2, combine, on_left_only, on_right_only),
                    merge(r1, r2, combine, on_left_only, on_right_only),
                ),
                Ordering::Greater if matches_prefix(*p2, *p1, *m1) => {
                    // t1's mask is coarser: p2's key falls entirely within
                    // one side of t1.
                    if zero_bit(*p2, *m1) {
                        branch(
                            *p1,
                            *m1,
                            merge(l1, t2, combine, on_left_only, on_right_only),
                            prune(r1, on_left_only),
                        )
                    } else {
                        branch(
                            *p1,
                            *m1,
                            prune(l1, on_left_only),
                            merge(r1, t2, combine, on_left_only, on_right_only),
                        )
                    }
                }
                Ordering::Less if matches_prefix(*p1, *p2, *m2) => {
                    if zero_bit(*p1, *m2) {
                        branch(
                            *p2,
                            *m2,
                            merge(t1, l2, combine, on_left_only, on_right_only),
                            prune(r2, on_right_only),
                        )
                    } else {
                        branch(
                            *p2,
                            *m2,
                            prune(l2, on_right_only),
                            merge(t1, r2, combine, on_left_only, on_right_only),
                        )
                    }
                }
                _ => {
                    // Disjoint prefixes.
                    let joined = Node::join(*p1, Arc::clone(t1), *p2, Arc::clone(t2));
                    let pruned_left = matches!(on_left_only, UnmatchedPolicy::Drop);
                    let pruned_right = matches!(on_right_only, UnmatchedPolicy::Drop);
                    if !pruned_left && !pruned_right {
                        Arc::new(joined)
                    } else {
                        branch(
                            *p1,
                            0,
                            prune(t1, on_left_only),
                            prune(t2, on_right_only),
                        )
                        .pipe(|_| {
                            // Disjoint subtrees with a drop policy on either
                            // side reduce to whichever side survives.
                            match (pruned_left, pruned_right) {
                                (true, true) => Arc::new(Node::Empty),
                                (true, false) => Arc::clone(t2),
                                (false, true) => Arc::clone(t1),
                                (false, false) => unreachable!(),
                            }
                        })
                    }
                }
            }
        }
    }
}

/// Remove every key of a subtree when `policy` is `Drop`; otherwise leave it
/// unchanged.
fn prune<K: Clone, V: Clone>(t: &Arc<Node<K, V>>, policy: UnmatchedPolicy) -> Arc<Node<K, V>> {
    match policy {
        UnmatchedPolicy::Keep => Arc::clone(t),
        UnmatchedPolicy::Drop => Arc::new(Node::Empty),
    }
}

trait Pipe: Sized {
    fn pipe<R>(self, f: impl FnOnce(Self) -> R) -> R {
        f(self)
    }
}
impl<T> Pipe for T {}

#[allow(clippy::too_many_arguments)]
fn merge_leaf<K, V>(
    leaf: &Arc<(K, V)>,
    leaf_tree: &Arc<Node<K, V>>,
    other: &Arc<Node<K, V>>,
    combine: &impl Fn(&V, &V) -> Option<V>,
    leaf_side_policy: UnmatchedPolicy,
    other_side_policy: UnmatchedPolicy,
    leaf_is_left: bool,
) -> Arc<Node<K, V>>
where
    K: StableIndex,
    V: Clone,
{
    match other.get(leaf.0.stable_index()) {
        Some(other_value) => match combine(&leaf.1, other_value) {
            Some(v) => Arc::new(Node::Leaf(Arc::new((leaf.0.clone(), v)))),
            None => other.remove(leaf.0.stable_index()).pipe(|rest| {
                // key removed from both sides: fold in whichever
                // unmatched-key policy applies to `other`'s remainder.
                prune(&rest, other_side_policy)
            }),
        },
        None => {
            let other_kept = prune(other, other_side_policy);
            match leaf_side_policy {
                UnmatchedPolicy::Drop => other_kept,
                UnmatchedPolicy::Keep => {
                    if leaf_is_left {
                        other_kept.insert(leaf.0.clone(), leaf.1.clone())
                    } else {
                        other_kept.insert(leaf.0.clone(), leaf.1.clone())
                    }
                }
            }
        }
    }
}

/// A persistent map `K -> V`. Cloning is `O(1)`: clones share structure with
/// the original until one of them is mutated.
pub struct PersistentMap<K, V> {
    root: Arc<Node<K, V>>,
}

impl<K, V> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        PersistentMap {
            root: self.root.clone(),
        }
    }
}

impl<K: StableIndex, V: Clone> Default for PersistentMap<K, V> {
    fn default() -> Self {
        PersistentMap {
            root: Arc::new(Node::Empty),
        }
    }
}

impl<K: StableIndex, V: Clone> PersistentMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.root.as_ref(), Node::Empty)
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.root.get(key.stable_index())
    }

    pub fn insert(&self, key: K, value: V) -> Self {
        PersistentMap {
            root: self.root.insert(key, value),
        }
    }

    pub fn remove(&self, key: &K) -> Self {
        PersistentMap {
            root: self.root.remove(key.stable_index()),
        }
    }

    /// Entries in ascending key-index order (canonical, so pretty-printing
    /// is deterministic — spec §6 "Persisted state").
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        let mut out = Vec::with_capacity(self.len());
        self.root.for_each(&mut out);
        out.sort_by_key(|(k, _)| k.stable_index());
        out.into_iter()
    }

    /// Union of key sets, combining overlapping keys with `combine`
    /// (returning `None` drops that key). Used by `SeparateDomain::meet`.
    pub fn union_merge(&self, other: &Self, combine: impl Fn(&V, &V) -> Option<V>) -> Self {
        PersistentMap {
            root: merge(
                &self.root,
                &other.root,
                &combine,
                UnmatchedPolicy::Keep,
                UnmatchedPolicy::Keep,
            ),
        }
    }

    /// Intersection of key sets, combining overlapping keys with `combine`.
    /// Used by `SeparateDomain::join` (a key only known on one side becomes
    /// implicit top, i.e. is dropped).
    pub fn intersect_merge(&self, other: &Self, combine: impl Fn(&V, &V) -> Option<V>) -> Self {
        PersistentMap {
            root: merge(
                &self.root,
                &other.root,
                &combine,
                UnmatchedPolicy::Drop,
                UnmatchedPolicy::Drop,
            ),
        }
    }
}

impl<K, V: fmt::Debug + Clone> fmt::Debug for PersistentMap<K, V>
where
    K: StableIndex + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Key(u64);
    impl StableIndex for Key {
        fn stable_index(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let m = PersistentMap::<Key, i32>::new()
            .insert(Key(1), 10)
            .insert(Key(2), 20)
            .insert(Key(1_000_000), 30);
        assert_eq!(m.get(&Key(1)), Some(&10));
        assert_eq!(m.get(&Key(2)), Some(&20));
        assert_eq!(m.get(&Key(1_000_000)), Some(&30));
        assert_eq!(m.get(&Key(3)), None);
    }

    #[test]
    fn clone_is_independent_after_insert() {
        let a = PersistentMap::<Key, i32>::new().insert(Key(1), 1);
        let b = a.insert(Key(1), 2);
        assert_eq!(a.get(&Key(1)), Some(&1));
        assert_eq!(b.get(&Key(1)), Some(&2));
    }

    #[test]
    fn remove_drops_key() {
        let a = PersistentMap::<Key, i32>::new().insert(Key(5), 1);
        let b = a.remove(&Key(5));
        assert_eq!(a.get(&Key(5)), Some(&1));
        assert_eq!(b.get(&Key(5)), None);
    }

    #[test]
    fn intersect_merge_drops_keys_present_on_only_one_side() {
        let a = PersistentMap::<Key, i32>::new()
            .insert(Key(1), 1)
            .insert(Key(2), 2);
        let b = PersistentMap::<Key, i32>::new()
            .insert(Key(2), 20)
            .insert(Key(3), 30);
        let merged = a.intersect_merge(&b, |x, y| Some(x + y));
        assert_eq!(merged.get(&Key(1)), None);
        assert_eq!(merged.get(&Key(2)), Some(&22));
        assert_eq!(merged.get(&Key(3)), None);
    }

    #[test]
    fn union_merge_keeps_keys_present_on_either_side() {
        let a = PersistentMap::<Key, i32>::new()
            .insert(Key(1), 1)
            .insert(Key(2), 2);
        let b = PersistentMap::<Key, i32>::new()
            .insert(Key(2), 20)
            .insert(Key(3), 30);
        let merged = a.union_merge(&b, |x, y| Some(x + y));
        assert_eq!(merged.get(&Key(1)), Some(&1));
        assert_eq!(merged.get(&Key(2)), Some(&22));
        assert_eq!(merged.get(&Key(3)), Some(&30));
    }

    #[test]
    fn union_merge_drops_key_when_combine_returns_none() {
        let a = PersistentMap::<Key, i32>::new().insert(Key(1), 1);
        let b = PersistentMap::<Key, i32>::new().insert(Key(1), 1);
        let merged = a.union_merge(&b, |_, _| None);
        assert_eq!(merged.get(&Key(1)), None);
    }

    #[test]
    fn iteration_is_key_ordered() {
        let m = PersistentMap::<Key, i32>::new()
            .insert(Key(5), 0)
            .insert(Key(1), 0)
            .insert(Key(3), 0);
        let keys: Vec<u64> = m.iter().map(|(k, _)| k.0).collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn many_keys_stress() {
        let mut m = PersistentMap::<Key, i64>::new();
        for i in 0..500u64 {
            m = m.insert(Key(i), i as i64 * 2);
        }
        for i in 0..500u64 {
            assert_eq!(m.get(&Key(i)), Some(&(i as i64 * 2)));
        }
        assert_eq!(m.len(), 500);
    }
}
