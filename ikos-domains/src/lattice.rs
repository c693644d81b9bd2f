//! The common interface every abstract domain implements.
//!
//! This is the Rust expression of the "CRTP + virtual abstract-domain
//! hierarchy" redesign note (spec §9): a trait rather than a C++ CRTP base,
//! composed via generic type parameters; the one place spec.md allows a
//! dynamically-chosen domain (a CLI-level sub-domain switch) is out of
//! scope here, so nothing in this crate needs `dyn AbstractDomain`.

/// A bounded lattice with widening and narrowing, the shared vocabulary of
/// every value lattice and every variable-to-value map in spec §3/§4.
pub trait AbstractDomain: Clone + PartialEq {
    /// The greatest element.
    fn top() -> Self;
    /// The least element.
    fn bottom() -> Self;
    fn is_top(&self) -> bool;
    fn is_bottom(&self) -> bool;
    /// `self <= other` in the lattice order.
    fn leq(&self, other: &Self) -> bool;
    fn join(&self, other: &Self) -> Self;
    fn meet(&self, other: &Self) -> Self;
    /// Over-approximating join, applied on increasing fixpoint iterations to
    /// force termination (spec §4.6). Defaults to `join`; domains with
    /// infinite ascending chains must override it.
    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }
    /// Refines a widened fixpoint on decreasing iterations (spec §4.6).
    /// Defaults to `meet`.
    fn narrow(&self, other: &Self) -> Self {
        self.meet(other)
    }
}
