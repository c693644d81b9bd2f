//! `OctagonDomain` (spec §4.4): tracks constraints of the form
//! `+-xi +-xj <= c`, one step more relational than `SeparateDomain<_,
//! Interval<_>>` while staying polynomial (Miné, "The Octagon Abstract
//! Domain"). Represented as a sparse difference-bound matrix (DBM) over
//! `Bound<Q>`, closed by all-pairs shortest paths plus the octagon
//! strengthening step on every query.
//!
//! Deliberately NOT incrementally maintained: `add_binary`/`add_unary`
//! just record a constraint, and `close` recomputes the full O(n^3)
//! shortest-path closure from scratch whenever a query needs the
//! normalized form. A production analyzer would maintain the closure
//! incrementally per Miné §7; that optimization is out of proportion to
//! what this crate's call sites need and is recorded as a scope cut here
//! rather than implemented.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ikos_ar::VariableId;
use ikos_num::{Bound, Q, Z};

use crate::interval::Interval;
use crate::lattice::AbstractDomain;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Sign {
    Pos,
    Neg,
}

impl Sign {
    fn flip(self) -> Sign {
        match self {
            Sign::Pos => Sign::Neg,
            Sign::Neg => Sign::Pos,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Dim {
    var: VariableId,
    sign: Sign,
}

impl Dim {
    fn bar(self) -> Dim {
        Dim {
            var: self.var,
            sign: self.sign.flip(),
        }
    }

    /// The signed dimension a coefficient of `+-1` on `var` denotes:
    /// `dim_of(var, 1)` has value `var`, `dim_of(var, -1)` has value
    /// `-var`.
    fn of(var: VariableId, coefficient: i8) -> Dim {
        Dim {
            var,
            sign: if coefficient >= 0 { Sign::Pos } else { Sign::Neg },
        }
    }
}

type Matrix = BTreeMap<(Dim, Dim), Q>;

#[derive(Clone, PartialEq)]
enum Repr {
    Bottom,
    Matrix(Matrix),
}

/// `+-xi +-xj <= c` constraints over a sparse DBM; missing `(a, b)` means
/// `a - b <= +inf`, i.e. no constraint.
#[derive(Clone)]
pub struct OctagonDomain {
    repr: Repr,
}

/// Records `m[a][b] = min(m[a][b], c)` and its mirror `m[bar(b)][bar(a)]`
/// (the same inequality restated with both signs flipped), which a DBM
/// must keep in sync for closure to be meaningful.
fn set_min(m: &mut Matrix, a: Dim, b: Dim, c: Q) {
    let slot = m.entry((a, b)).or_insert_with(|| c.clone());
    if c < *slot {
        *slot = c.clone();
    }
    let (ba, bb) = (b.bar(), a.bar());
    let mirror = m.entry((ba, bb)).or_insert_with(|| c.clone());
    if c < *mirror {
        *mirror = c;
    }
}

impl OctagonDomain {
    /// `sa*var_a + sb*var_b <= c` (spec §4.4 octagon constraint shape).
    pub fn add_binary(&self, sa: i8, var_a: VariableId, sb: i8, var_b: VariableId, c: Q) -> Self {
        match &self.repr {
            Repr::Bottom => OctagonDomain::bottom(),
            Repr::Matrix(m) => {
                let mut m = (*m).clone();
                set_min(&mut m, Dim::of(var_a, sa), Dim::of(var_b, -sb), c);
                OctagonDomain { repr: Repr::Matrix(m) }
            }
        }
    }

    /// `s*var <= c`, encoded as the doubled self-relation `2*s*var <= 2c`
    /// (spec §4.4 "unary bounds via the diagonal trick").
    pub fn add_unary(&self, s: i8, var: VariableId, c: Q) -> Self {
        match &self.repr {
            Repr::Bottom => OctagonDomain::bottom(),
            Repr::Matrix(m) => {
                let mut m = (*m).clone();
                let two_c = c.clone() + c;
                let (a, b) = if s >= 0 {
                    (Dim::of(var, 1), Dim::of(var, -1))
                } else {
                    (Dim::of(var, -1), Dim::of(var, 1))
                };
                set_min(&mut m, a, b, two_c);
                OctagonDomain { repr: Repr::Matrix(m) }
            }
        }
    }

    pub fn forget(&self, var: VariableId) -> Self {
        match &self.repr {
            Repr::Bottom => OctagonDomain::bottom(),
            Repr::Matrix(m) => {
                let filtered: Matrix = m
                    .iter()
                    .filter(|((a, b), _)| a.var != var && b.var != var)
                    .map(|(k, v)| (*k, (*v).clone()))
                    .collect();
                OctagonDomain {
                    repr: Repr::Matrix(filtered),
                }
            }
        }
    }

    /// Full shortest-path closure plus octagon strengthening (Miné §3.2).
    /// Detects infeasibility (a negative self-loop) and collapses to
    /// bottom.
    pub fn close(&self) -> Self {
        let m = match &self.repr {
            Repr::Bottom => return OctagonDomain::bottom(),
            Repr::Matrix(m) => m,
        };
        let mut vars: BTreeSet<VariableId> = BTreeSet::new();
        for (a, b) in m.keys() {
            vars.insert(a.var);
            vars.insert(b.var);
        }
        let dims: Vec<Dim> = vars
            .into_iter()
            .flat_map(|v| [Dim::of(v, 1), Dim::of(v, -1)])
            .collect();
        let n = dims.len();
        if n == 0 {
            return OctagonDomain::top();
        }
        let index: BTreeMap<Dim, usize> = dims.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let zero = Bound::finite(Q::zero());
        let mut d: Vec<Vec<Bound<Q>>> = vec![vec![Bound::PosInf; n]; n];
        for (i, row) in d.iter_mut().enumerate() {
            row[i] = zero.clone();
        }
        for ((a, b), c) in m {
            let i = index[a];
            let j = index[b];
            let bound = Bound::finite((*c).clone());
            if bound < d[i][j] {
                d[i][j] = bound;
            }
        }

        for k in 0..n {
            for i in 0..n {
                if matches!(d[i][k], Bound::PosInf) {
                    continue;
                }
                for j in 0..n {
                    if matches!(d[k][j], Bound::PosInf) {
                        continue;
                    }
                    let via = d[i][k].add(&d[k][j]);
                    if via < d[i][j] {
                        d[i][j] = via;
                    }
                }
            }
        }

        let bar_index: Vec<usize> = dims.iter().map(|dim| index[&dim.bar()]).collect();
        for i in 0..n {
            for j in 0..n {
                let ibar = bar_index[i];
                let jbar = bar_index[j];
                if matches!(d[i][ibar], Bound::PosInf) || matches!(d[jbar][j], Bound::PosInf) {
                    continue;
                }
                let candidate = half(d[i][ibar].add(&d[jbar][j]));
                if candidate < d[i][j] {
                    d[i][j] = candidate;
                }
            }
        }

        for (i, row) in d.iter().enumerate() {
            if row[i] < zero {
                return OctagonDomain::bottom();
            }
        }

        let mut out = Matrix::new();
        for (i, a) in dims.iter().enumerate() {
            for (j, b) in dims.iter().enumerate() {
                if i == j {
                    continue;
                }
                if let Bound::Finite(c) = &d[i][j] {
                    out.insert((*a, *b), (*c).clone());
                }
            }
        }
        OctagonDomain {
            repr: Repr::Matrix(out),
        }
    }

    /// The tightest `[lb, ub]` the closed constraints imply for `var`
    /// (spec §4.4 "project to an interval for callers that only need
    /// single-variable bounds").
    pub fn get_interval(&self, var: VariableId) -> Interval<Z> {
        let closed = self.close();
        let m = match &closed.repr {
            Repr::Bottom => return Interval::bottom(),
            Repr::Matrix(m) => m,
        };
        let two = Q::from_z(Z::from_i64(2));
        let ub = m
            .get(&(Dim::of(var, 1), Dim::of(var, -1)))
            .map(|c| Bound::finite(((*c).clone() / two.clone()).trunc()))
            .unwrap_or(Bound::PosInf);
        let lb = m
            .get(&(Dim::of(var, -1), Dim::of(var, 1)))
            .map(|c| Bound::finite(-(((*c).clone() / two.clone()).trunc())))
            .unwrap_or(Bound::NegInf);
        Interval::new(lb, ub)
    }
}

fn half(b: Bound<Q>) -> Bound<Q> {
    match b {
        Bound::Finite(q) => Bound::Finite(q / Q::from_z(Z::from_i64(2))),
        other => other,
    }
}

impl AbstractDomain for OctagonDomain {
    fn top() -> Self {
        OctagonDomain {
            repr: Repr::Matrix(Matrix::new()),
        }
    }

    fn bottom() -> Self {
        OctagonDomain { repr: Repr::Bottom }
    }

    fn is_top(&self) -> bool {
        matches!(&self.close().repr, Repr::Matrix(m) if m.is_empty())
    }

    fn is_bottom(&self) -> bool {
        matches!(self.close().repr, Repr::Bottom)
    }

    fn leq(&self, other: &Self) -> bool {
        let a = self.close();
        let b = other.close();
        match (&a.repr, &b.repr) {
            (Repr::Bottom, _) => true,
            (_, Repr::Bottom) => false,
            (Repr::Matrix(ma), Repr::Matrix(mb)) => {
                mb.iter().all(|(k, v)| ma.get(k).is_some_and(|av| av <= v))
            }
        }
    }

    fn join(&self, other: &Self) -> Self {
        let a = self.close();
        let b = other.close();
        match (&a.repr, &b.repr) {
            (Repr::Bottom, _) => b,
            (_, Repr::Bottom) => a,
            (Repr::Matrix(ma), Repr::Matrix(mb)) => {
                let joined: Matrix = ma
                    .iter()
                    .filter_map(|(k, v)| {
                        mb.get(k).map(|bv| (*k, (*v).clone().max((*bv).clone())))
                    })
                    .collect();
                OctagonDomain {
                    repr: Repr::Matrix(joined),
                }
            }
        }
    }

    fn meet(&self, other: &Self) -> Self {
        let (ma, mb) = match (&self.repr, &other.repr) {
            (Repr::Bottom, _) | (_, Repr::Bottom) => return OctagonDomain::bottom(),
            (Repr::Matrix(ma), Repr::Matrix(mb)) => (ma, mb),
        };
        let mut merged = (*ma).clone();
        for (k, v) in mb {
            match merged.get(k) {
                Some(existing) if existing <= v => {}
                _ => {
                    merged.insert(*k, (*v).clone());
                }
            }
        }
        OctagonDomain {
            repr: Repr::Matrix(merged),
        }
        .close()
    }

    /// Drops any constraint that grew looser in `other` (spec §4.4, same
    /// "keep if stable, else go to infinity" rule as `Interval::widen`).
    fn widen(&self, other: &Self) -> Self {
        let a = self.close();
        let b = other.close();
        match (&a.repr, &b.repr) {
            (Repr::Bottom, _) => b,
            (_, Repr::Bottom) => a,
            (Repr::Matrix(ma), Repr::Matrix(mb)) => {
                let widened: Matrix = ma
                    .iter()
                    .filter(|(k, v)| mb.get(k).is_some_and(|bv| bv <= *v))
                    .map(|(k, v)| (*k, (*v).clone()))
                    .collect();
                OctagonDomain {
                    repr: Repr::Matrix(widened),
                }
            }
        }
    }

    /// Fills in constraints `self` left unconstrained using `other`'s
    /// (same "only refine an infinite bound" rule as `Interval::narrow`).
    fn narrow(&self, other: &Self) -> Self {
        let (ma, mb) = match (&self.repr, &other.repr) {
            (Repr::Bottom, _) | (_, Repr::Bottom) => return OctagonDomain::bottom(),
            (Repr::Matrix(ma), Repr::Matrix(mb)) => (ma, mb),
        };
        let mut merged = (*mb).clone();
        for (k, v) in ma {
            merged.insert(*k, (*v).clone());
        }
        OctagonDomain {
            repr: Repr::Matrix(merged),
        }
    }
}

impl PartialEq for OctagonDomain {
    fn eq(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }
}

impl fmt::Debug for OctagonDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.close().repr {
            Repr::Bottom => write!(f, "_|_"),
            Repr::Matrix(m) => write!(f, "octagon({} constraints)", m.len()),
        }
    }
}

/// Octagon coefficients only ever take `+-1` (spec §4.4's constraint
/// shape); `None` means `coefficient` doesn't fit and the row is skipped.
fn unit_sign(coefficient: &Z) -> Option<i8> {
    if *coefficient == Z::one() {
        Some(1)
    } else if *coefficient == -Z::one() {
        Some(-1)
    } else {
        None
    }
}

impl crate::numerical::NumericalDomain for OctagonDomain {
    /// Rows outside the `+-xi +-xj <= c` shape (more than two variables, a
    /// non-unit coefficient, or an `=`/`!=` constraint) are skipped: sound,
    /// just less precise, same scope cut as the congruence solver's
    /// unit-coefficient-only residual propagation. `max_cycles` is unused —
    /// unlike the interval/congruence solvers this isn't an iterative
    /// fixpoint, each row is a direct DBM insertion.
    fn add_with_cycles(
        &self,
        system: &[crate::linear::LinearConstraint<Z, VariableId>],
        _max_cycles: usize,
    ) -> Self {
        let mut result = self.clone();
        for row in system {
            if row.kind() != crate::linear::ConstraintKind::LessEqual {
                continue;
            }
            match row.terms() {
                [(c, v)] => {
                    let Some(s) = unit_sign(c) else { continue };
                    result = result.add_unary(s, *v, Q::from_z((*row.constant()).clone()));
                }
                [(ca, va), (cb, vb)] => {
                    let (Some(sa), Some(sb)) = (unit_sign(ca), unit_sign(cb)) else {
                        continue;
                    };
                    result = result.add_binary(sa, *va, sb, *vb, Q::from_z((*row.constant()).clone()));
                }
                _ => continue,
            }
        }
        result
    }

    fn forget(&self, var: &VariableId) -> Self {
        OctagonDomain::forget(self, *var)
    }

    fn to_interval(&self, var: &VariableId) -> Interval<Z> {
        OctagonDomain::get_interval(self, *var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(v: i64) -> Q {
        Q::from_z(Z::from_i64(v))
    }

    const X: VariableId = VariableId(0);
    const Y: VariableId = VariableId(1);

    #[test]
    fn equality_implies_equal_intervals() {
        // x = y, x >= 0 -- y's interval should also become [0, +inf).
        let d = OctagonDomain::top()
            .add_binary(1, X, -1, Y, q(0))
            .add_binary(-1, X, 1, Y, q(0))
            .add_unary(-1, X, q(0));
        let iv = d.get_interval(Y);
        assert_eq!(iv.lb(), Some(&Bound::finite(Z::from_i64(0))));
    }

    #[test]
    fn unary_bound_round_trips_through_interval() {
        let d = OctagonDomain::top().add_unary(1, X, q(10)).add_unary(-1, X, q(0));
        let iv = d.get_interval(X);
        assert_eq!(iv.lb(), Some(&Bound::finite(Z::from_i64(0))));
        assert_eq!(iv.ub(), Some(&Bound::finite(Z::from_i64(10))));
    }

    #[test]
    fn contradictory_bounds_close_to_bottom() {
        let d = OctagonDomain::top().add_unary(1, X, q(0)).add_unary(-1, X, q(-5));
        assert!(d.is_bottom());
    }

    #[test]
    fn forget_drops_every_constraint_on_the_variable() {
        let d = OctagonDomain::top()
            .add_unary(1, X, q(5))
            .add_binary(1, X, -1, Y, q(0));
        let forgotten = d.forget(X);
        assert!(forgotten.get_interval(X).is_top());
    }

    #[test]
    fn join_keeps_only_agreeing_constraints() {
        let a = OctagonDomain::top().add_unary(1, X, q(5));
        let b = OctagonDomain::top().add_unary(1, X, q(10));
        let j = a.join(&b);
        assert_eq!(j.get_interval(X).ub(), Some(&Bound::finite(Z::from_i64(10))));
    }

    #[test]
    fn numerical_domain_add_accepts_unit_rows_and_skips_the_rest() {
        use crate::linear::{ConstraintKind, LinearConstraint};
        use crate::numerical::NumericalDomain;

        let system = vec![
            LinearConstraint::new(vec![(Z::one(), X)], ConstraintKind::LessEqual, Z::from_i64(5)),
            LinearConstraint::new(
                vec![(Z::from_i64(2), X), (Z::from_i64(3), Y)],
                ConstraintKind::LessEqual,
                Z::from_i64(100),
            ),
        ];
        let d = NumericalDomain::add(&OctagonDomain::top(), &system);
        assert_eq!(
            NumericalDomain::to_interval(&d, &X).ub(),
            Some(&Bound::finite(Z::from_i64(5)))
        );
        assert!(NumericalDomain::to_interval(&d, &Y).is_top());
    }
}
