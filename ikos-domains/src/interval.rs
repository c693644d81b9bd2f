//! The interval abstract domain `Interval<N>` (spec §4.1 "Value lattices").
//!
//! Grounded on `examples/original_source/core/include/ikos/core/domain/
//! numeric/interval.hpp` (filtered out of the retrieval pack but referenced
//! by the `separate_domain.hpp`/`linear_interval_solver.hpp` headers that
//! survived filtering) for the join/widen/narrow contract, and on
//! `ikos_num::Bound`'s saturating arithmetic for the endpoint algebra.

use core::fmt;

use ikos_num::{Bound, Number};

use crate::lattice::AbstractDomain;

/// Numbers usable as `Interval` endpoints: besides the base [`Number`]
/// algebra, interval arithmetic needs a total order and multiplication/
/// division. `Z`, `Q` and `MachineInt` all satisfy this.
pub trait IntervalNumber: Number + Clone + PartialOrd + core::ops::Mul<Output = Self> {
    /// `None` iff `other` is zero.
    fn checked_div(&self, other: &Self) -> Option<Self>;

    /// The smallest positive representable increment "of the same shape" as
    /// `self` (same bit-width/sign for `MachineInt`), used to exclude zero
    /// when a divisor interval straddles it without being the exact
    /// singleton `{0}`. `None` for types with no such minimal step (`Q`),
    /// in which case division over a zero-crossing divisor falls back to
    /// `top`.
    fn unit_step(&self) -> Option<Self>;
}

impl IntervalNumber for ikos_num::Z {
    fn checked_div(&self, other: &Self) -> Option<Self> {
        ikos_num::Z::checked_div(self, other).ok()
    }

    fn unit_step(&self) -> Option<Self> {
        Some(ikos_num::Z::one())
    }
}

impl IntervalNumber for ikos_num::Q {
    fn checked_div(&self, other: &Self) -> Option<Self> {
        if other.is_zero() {
            None
        } else {
            Some((*self).clone() / (*other).clone())
        }
    }

    fn unit_step(&self) -> Option<Self> {
        None
    }
}

impl IntervalNumber for ikos_num::MachineInt {
    fn checked_div(&self, other: &Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        match self.sign() {
            ikos_num::Sign::Signed => self.sdiv(other).ok(),
            ikos_num::Sign::Unsigned => self.udiv(other).ok(),
        }
    }

    fn unit_step(&self) -> Option<Self> {
        Some(ikos_num::MachineInt::one(self.width(), self.sign()))
    }
}

/// `[lb, ub]` over `Bound<N>`, or bottom when no such pair exists.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Interval<N: IntervalNumber> {
    bounds: Option<(Bound<N>, Bound<N>)>,
}

impl<N: IntervalNumber> Interval<N> {
    pub fn new(lb: Bound<N>, ub: Bound<N>) -> Self {
        if lb <= ub {
            Interval {
                bounds: Some((lb, ub)),
            }
        } else {
            Interval { bounds: None }
        }
    }

    pub fn singleton(n: N) -> Self {
        Interval::new(Bound::finite(n.clone()), Bound::finite(n))
    }

    pub fn lb(&self) -> Option<&Bound<N>> {
        self.bounds.as_ref().map(|(lb, _)| lb)
    }

    pub fn ub(&self) -> Option<&Bound<N>> {
        self.bounds.as_ref().map(|(_, ub)| ub)
    }

    pub fn as_singleton(&self) -> Option<&N> {
        match &self.bounds {
            Some((lb, ub)) if lb == ub => lb.as_finite(),
            _ => None,
        }
    }

    fn sample_value(&self) -> Option<N> {
        let (lb, ub) = self.bounds.as_ref()?;
        lb.as_finite().or_else(|| ub.as_finite()).cloned()
    }

    /// Widening with a set of thresholds (spec §4.1): jump to the tightest
    /// threshold that still over-approximates the growing bound, instead of
    /// straight to infinity.
    pub fn widen_with_thresholds(&self, other: &Self, thresholds: &[N]) -> Self {
        let (Some((lb1, ub1)), Some((lb2, ub2))) = (&self.bounds, &other.bounds) else {
            return self.widen(other);
        };
        let new_lb = if lb1 <= lb2 {
            (*lb1).clone()
        } else {
            let mut best: Option<N> = None;
            for t in thresholds {
                let candidate: N = (*t).clone();
                if Bound::finite(candidate.clone()) <= *lb2 {
                    best = match best {
                        Some(cur) if cur >= candidate => Some(cur),
                        _ => Some(candidate),
                    };
                }
            }
            best.map(Bound::finite).unwrap_or(Bound::NegInf)
        };
        let new_ub = if ub1 >= ub2 {
            (*ub1).clone()
        } else {
            let mut best: Option<N> = None;
            for t in thresholds {
                let candidate: N = (*t).clone();
                if Bound::finite(candidate.clone()) >= *ub2 {
                    best = match best {
                        Some(cur) if cur <= candidate => Some(cur),
                        _ => Some(candidate),
                    };
                }
            }
            best.map(Bound::finite).unwrap_or(Bound::PosInf)
        };
        Interval::new(new_lb, new_ub)
    }

    pub fn add(&self, other: &Self) -> Self {
        match (&self.bounds, &other.bounds) {
            (Some((lb1, ub1)), Some((lb2, ub2))) => Interval::new(lb1.add(lb2), ub1.add(ub2)),
            _ => Interval::bottom(),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> Self {
        match &self.bounds {
            Some((lb, ub)) => Interval::new(ub.neg(), lb.neg()),
            None => Interval::bottom(),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        let (Some((lb1, ub1)), Some((lb2, ub2))) = (&self.bounds, &other.bounds) else {
            return Interval::bottom();
        };
        let products = [
            lb1.mul(lb2),
            lb1.mul(ub2),
            ub1.mul(lb2),
            ub1.mul(ub2),
        ];
        let lb = products
            .iter()
            .cloned()
            .reduce(|a, b| a.min(&b))
            .expect("four products always present");
        let ub = products
            .into_iter()
            .reduce(|a, b| a.max(&b))
            .expect("four products always present");
        Interval::new(lb, ub)
    }

    /// Interval division (spec §4.1): when the divisor's range straddles
    /// zero without being the exact singleton `{0}`, splits it at zero into
    /// its strictly-negative and strictly-positive halves, divides by each,
    /// and joins the two results — rather than over-approximating to `top`
    /// outright. Falls back to `top` only when the element type has no
    /// minimal step to exclude zero with (`Q`).
    pub fn div(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Interval::bottom();
        }
        let zero = match other.sample_value().or_else(|| self.sample_value()) {
            Some(v) => v.zero_like(),
            None => return Interval::top(),
        };
        let zero_bound = Bound::finite(zero.clone());
        if other.as_singleton().is_some_and(|v| *v == zero) {
            return Interval::bottom();
        }
        let (lb2, ub2) = other.bounds.as_ref().expect("checked not bottom above");
        let strictly_negative = *ub2 < zero_bound;
        let strictly_positive = *lb2 > zero_bound;
        if !strictly_negative && !strictly_positive {
            return match zero.unit_step() {
                Some(step) => {
                    let mut result = Interval::bottom();
                    if *lb2 < zero_bound {
                        let neg = Interval::new((*lb2).clone(), Bound::finite(zero.sub(&step)));
                        result = result.join(&self.div(&neg));
                    }
                    if *ub2 > zero_bound {
                        let pos = Interval::new(Bound::finite(zero.add(&step)), (*ub2).clone());
                        result = result.join(&self.div(&pos));
                    }
                    result
                }
                None => Interval::top(),
            };
        }
        let (lb1, ub1) = self.bounds.as_ref().expect("checked not bottom above");
        let corners = [
            divide_bound(lb1, lb2, &zero),
            divide_bound(lb1, ub2, &zero),
            divide_bound(ub1, lb2, &zero),
            divide_bound(ub1, ub2, &zero),
        ];
        let lb = corners
            .iter()
            .cloned()
            .reduce(|a, b| a.min(&b))
            .expect("four corners always present");
        let ub = corners
            .into_iter()
            .reduce(|a, b| a.max(&b))
            .expect("four corners always present");
        Interval::new(lb, ub)
    }

    /// Removes a boundary singleton used by disequation (`x != k`) handling
    /// (spec §4.1): when `self` is `[k, ub]` or `[lb, k]`, tightens by one
    /// unit toward the interior. `step` is `1` for the integral domains and
    /// a no-op is expected for `Q` (callers of the rational instantiation
    /// simply never call this).
    pub fn trim_bound(&self, point: &N, step: impl Fn(&N) -> N, step_down: impl Fn(&N) -> N) -> Self {
        match &self.bounds {
            None => Interval::bottom(),
            Some((lb, ub)) => {
                let new_lb = match lb.as_finite() {
                    Some(l) if l == point => Bound::finite(step(l)),
                    _ => (*lb).clone(),
                };
                let new_ub = match ub.as_finite() {
                    Some(u) if u == point => Bound::finite(step_down(u)),
                    _ => (*ub).clone(),
                };
                Interval::new(new_lb, new_ub)
            }
        }
    }
}

fn divide_bound<N: IntervalNumber>(n: &Bound<N>, d: &Bound<N>, zero: &N) -> Bound<N> {
    match (n, d) {
        (Bound::Finite(nv), Bound::Finite(dv)) => match nv.checked_div(dv) {
            Some(v) => Bound::finite(v),
            None => Bound::finite((*zero).clone()),
        },
        (Bound::Finite(_), Bound::PosInf) | (Bound::Finite(_), Bound::NegInf) => {
            Bound::finite((*zero).clone())
        }
        (_, _) => {
            let d_positive = match d {
                Bound::Finite(dv) => *dv > *zero,
                Bound::PosInf => true,
                Bound::NegInf => false,
            };
            let n_pos_inf = matches!(n, Bound::PosInf);
            if n_pos_inf == d_positive {
                Bound::PosInf
            } else {
                Bound::NegInf
            }
        }
    }
}

impl<N: IntervalNumber> AbstractDomain for Interval<N> {
    fn top() -> Self {
        Interval {
            bounds: Some((Bound::NegInf, Bound::PosInf)),
        }
    }

    fn bottom() -> Self {
        Interval { bounds: None }
    }

    fn is_top(&self) -> bool {
        matches!(&self.bounds, Some((Bound::NegInf, Bound::PosInf)))
    }

    fn is_bottom(&self) -> bool {
        self.bounds.is_none()
    }

    fn leq(&self, other: &Self) -> bool {
        match (&self.bounds, &other.bounds) {
            (None, _) => true,
            (_, None) => false,
            (Some((lb1, ub1)), Some((lb2, ub2))) => lb2 <= lb1 && ub1 <= ub2,
        }
    }

    fn join(&self, other: &Self) -> Self {
        match (&self.bounds, &other.bounds) {
            (None, _) => (*other).clone(),
            (_, None) => (*self).clone(),
            (Some((lb1, ub1)), Some((lb2, ub2))) => {
                Interval::new(lb1.min(lb2), ub1.max(ub2))
            }
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (&self.bounds, &other.bounds) {
            (None, _) | (_, None) => Interval::bottom(),
            (Some((lb1, ub1)), Some((lb2, ub2))) => {
                Interval::new(lb1.max(lb2), ub1.min(ub2))
            }
        }
    }

    fn widen(&self, other: &Self) -> Self {
        match (&self.bounds, &other.bounds) {
            (None, _) => (*other).clone(),
            (_, None) => (*self).clone(),
            (Some((lb1, ub1)), Some((lb2, ub2))) => {
                let new_lb = if lb1 <= lb2 {
                    (*lb1).clone()
                } else {
                    Bound::NegInf
                };
                let new_ub = if ub1 >= ub2 {
                    (*ub1).clone()
                } else {
                    Bound::PosInf
                };
                Interval::new(new_lb, new_ub)
            }
        }
    }

    fn narrow(&self, other: &Self) -> Self {
        match (&self.bounds, &other.bounds) {
            (None, _) | (_, None) => Interval::bottom(),
            (Some((lb1, ub1)), Some((lb2, ub2))) => {
                let new_lb = if matches!(lb1, Bound::NegInf) {
                    (*lb2).clone()
                } else {
                    (*lb1).clone()
                };
                let new_ub = if matches!(ub1, Bound::PosInf) {
                    (*ub2).clone()
                } else {
                    (*ub1).clone()
                };
                Interval::new(new_lb, new_ub)
            }
        }
    }
}

impl<N: IntervalNumber + fmt::Debug> fmt::Debug for Interval<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bounds {
            None => write!(f, "_|_"),
            Some((lb, ub)) => write!(f, "[{lb:?}, {ub:?}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_num::Z;

    fn iv(lb: i64, ub: i64) -> Interval<Z> {
        Interval::new(Bound::finite(Z::from_i64(lb)), Bound::finite(Z::from_i64(ub)))
    }

    #[test]
    fn construction_bottoms_out_when_lb_exceeds_ub() {
        let i = Interval::new(Bound::finite(Z::from_i64(5)), Bound::finite(Z::from_i64(1)));
        assert!(i.is_bottom());
    }

    #[test]
    fn join_is_the_convex_hull() {
        let a = iv(0, 3);
        let b = iv(5, 10);
        let j = a.join(&b);
        assert_eq!(j.lb(), Some(&Bound::finite(Z::from_i64(0))));
        assert_eq!(j.ub(), Some(&Bound::finite(Z::from_i64(10))));
    }

    #[test]
    fn meet_of_disjoint_intervals_is_bottom() {
        let a = iv(0, 3);
        let b = iv(5, 10);
        assert!(a.meet(&b).is_bottom());
    }

    #[test]
    fn widening_loop_converges_to_unbounded_above() {
        // x = 0; while (x <= 10) x = x + 1;  -- spec §8 example 1.
        let mut before = Interval::singleton(Z::from_i64(0));
        for _ in 0..3 {
            let after = before.join(&before.add(&Interval::singleton(Z::from_i64(1))));
            before = before.widen(&after);
        }
        assert_eq!(before.lb(), Some(&Bound::finite(Z::from_i64(0))));
        assert!(matches!(before.ub(), Some(Bound::PosInf)));
    }

    #[test]
    fn narrowing_refines_an_infinite_bound() {
        let widened = Interval::new(Bound::finite(Z::from_i64(0)), Bound::PosInf);
        let refined = iv(0, 11);
        let narrowed = widened.narrow(&refined);
        assert_eq!(narrowed.ub(), Some(&Bound::finite(Z::from_i64(11))));
    }

    #[test]
    fn widening_over_approximates_join() {
        let a = iv(0, 5);
        let b = iv(0, 7);
        assert!(a.join(&b).leq(&a.widen(&b)));
    }

    #[test]
    fn multiplication_spans_the_four_corner_products() {
        let a = iv(-2, 3);
        let b = iv(-1, 4);
        let p = a.mul(&b);
        // extremes are -2*4=-8 and 3*4=12
        assert_eq!(p.lb(), Some(&Bound::finite(Z::from_i64(-8))));
        assert_eq!(p.ub(), Some(&Bound::finite(Z::from_i64(12))));
    }

    #[test]
    fn division_by_interval_straddling_zero_splits_and_joins() {
        let a = iv(1, 10);
        let b = iv(-1, 1);
        // b splits into {-1} and {1}: a/{-1} = [-10,-1], a/{1} = [1,10].
        let q = a.div(&b);
        assert_eq!(q.lb(), Some(&Bound::finite(Z::from_i64(-10))));
        assert_eq!(q.ub(), Some(&Bound::finite(Z::from_i64(10))));
    }

    #[test]
    fn division_by_wider_interval_straddling_zero_is_still_bounded() {
        let a = iv(1, 10);
        let b = iv(-4, 4);
        // b splits into [-4,-1] and [1,4]: a/[-4,-1] = [-10,-1], a/[1,4] = [0,10].
        let q = a.div(&b);
        assert_eq!(q.lb(), Some(&Bound::finite(Z::from_i64(-10))));
        assert_eq!(q.ub(), Some(&Bound::finite(Z::from_i64(10))));
    }

    #[test]
    fn division_by_strictly_positive_interval() {
        let a = iv(10, 20);
        let b = iv(2, 5);
        let q = a.div(&b);
        assert_eq!(q.lb(), Some(&Bound::finite(Z::from_i64(2))));
        assert_eq!(q.ub(), Some(&Bound::finite(Z::from_i64(10))));
    }

    #[test]
    fn division_by_exact_zero_is_bottom() {
        let a = iv(1, 10);
        let zero = Interval::singleton(Z::zero());
        assert!(a.div(&zero).is_bottom());
    }
}
