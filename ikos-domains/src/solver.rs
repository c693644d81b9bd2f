//! Linear constraint solvers (spec §4.4): a Harvey & Stuckey-style residual
//! propagation loop that refines a [`SeparateDomain`] against a system of
//! [`LinearConstraint`]s until no row can tighten any variable further, or a
//! variable is refined to bottom.
//!
//! Grounded on `separate_domain.rs`'s fixpoint-by-repeated-pointwise-refine
//! shape and on `examples/original_source`'s `linear_interval_solver.hpp`
//! (filtered from the pack, but its two-phase "small system: flat sweep /
//! large system: trigger-table worklist" scheduling survives in comments in
//! the headers that remained). This implementation always uses the flat
//! sweep: both strategies converge to the same fixpoint (the propagation
//! rule per row is unchanged, only the visiting order differs), and the
//! trigger-table path is a pure performance optimization out of proportion
//! to what a handful of per-function linear systems need. Recorded as an
//! explicit scope cut in the design notes rather than silently dropped.

use crate::congruence::{Congruence, CongruenceNumber};
use crate::interval::{Interval, IntervalNumber};
use crate::lattice::AbstractDomain;
use crate::linear::{ConstraintKind, LinearConstraint};
use crate::persistent_map::StableIndex;
use crate::separate_domain::SeparateDomain;

/// Sweeps `system` over `env` until a full pass refines nothing, or
/// `max_cycles` passes have run. A variable refined to bottom collapses the
/// whole environment to bottom immediately (spec §4.4 "refining a variable
/// to bottom sets the invariant to bottom").
pub fn solve_intervals<N, V>(
    env: SeparateDomain<V, Interval<N>>,
    system: &[LinearConstraint<N, V>],
    max_cycles: usize,
) -> SeparateDomain<V, Interval<N>>
where
    N: IntervalNumber,
    V: StableIndex,
{
    let rows: Vec<&LinearConstraint<N, V>> = system
        .iter()
        .filter(|c| !c.is_tautology())
        .collect();
    if rows.iter().any(|c| c.is_contradiction()) {
        return SeparateDomain::bottom();
    }

    let mut current = env;
    for _ in 0..max_cycles {
        if current.is_bottom() {
            return current;
        }
        let mut changed = false;
        for row in rows.iter().copied() {
            match propagate_row(&current, row) {
                None => return SeparateDomain::bottom(),
                Some(refined) => {
                    if refined != current {
                        changed = true;
                        current = refined;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
    current
}

/// Refines every variable `row` touches by one residual-propagation step.
/// Returns `None` the moment a variable collapses to bottom.
fn propagate_row<N, V>(
    env: &SeparateDomain<V, Interval<N>>,
    row: &LinearConstraint<N, V>,
) -> Option<SeparateDomain<V, Interval<N>>>
where
    N: IntervalNumber,
    V: StableIndex,
{
    let mut current = (*env).clone();
    for (j, (cj, xj)) in row.terms().iter().enumerate() {
        let mut residual = Interval::singleton((*row.constant()).clone());
        for (i, (ci, xi)) in row.terms().iter().enumerate() {
            if i == j {
                continue;
            }
            let term = Interval::singleton((*ci).clone()).mul(&current.get(xi));
            residual = residual.sub(&term);
        }
        let rhs = residual.div(&Interval::singleton((*cj).clone()));
        let refined = match row.kind() {
            ConstraintKind::Equal => current.get(xj).meet(&rhs),
            ConstraintKind::LessEqual => {
                let half_line = if *cj > cj.zero_like() {
                    upper_half_line(&rhs)
                } else {
                    lower_half_line(&rhs)
                };
                current.get(xj).meet(&half_line)
            }
            ConstraintKind::NotEqual => match rhs.as_singleton() {
                Some(point) => current
                    .get(xj)
                    .trim_bound(point, |n| n.add(&one_like(n)), |n| n.sub(&one_like(n))),
                None => current.get(xj),
            },
        };
        if refined.is_bottom() {
            return None;
        }
        current = current.set((*xj).clone(), refined);
    }
    Some(current)
}

/// `NotEqual` trimming only ever runs against integral domains in practice
/// (the rational instantiation never produces a point-disequation worth
/// trimming), so this just needs *some* additive unit. `Number` doesn't
/// expose one directly; `n / n` gives "one of the same shape" for a
/// non-zero `n`, and falls back to `zero_like` (a no-op trim) when `n` is
/// zero.
fn one_like<N: IntervalNumber>(n: &N) -> N {
    if n.is_zero() {
        return n.zero_like();
    }
    n.checked_div(n).unwrap_or_else(|| n.zero_like())
}

fn upper_half_line<N: IntervalNumber>(rhs: &Interval<N>) -> Interval<N> {
    match rhs.ub() {
        Some(ub) => Interval::new(ikos_num::Bound::NegInf, (*ub).clone()),
        None => Interval::bottom(),
    }
}

fn lower_half_line<N: IntervalNumber>(rhs: &Interval<N>) -> Interval<N> {
    match rhs.lb() {
        Some(lb) => Interval::new((*lb).clone(), ikos_num::Bound::PosInf),
        None => Interval::bottom(),
    }
}

/// Same sweep as [`solve_intervals`] but over [`Congruence`] values, driving
/// reductions between equalities only (spec §4.4): `<=`/`!=` rows carry no
/// congruence information and are dropped up front.
///
/// Only unit (`+-1`) coefficients are inverted. A coefficient outside
/// `{1, -1}` would need a full linear-congruence solve (`c*x = r (mod m)`
/// can have zero, one, or `gcd(c, m)` solutions forming their own class);
/// skipping those rows is always sound, just less precise, and is recorded
/// as a scope cut in the design notes rather than implemented.
pub fn solve_congruences<N, V>(
    env: SeparateDomain<V, Congruence<N>>,
    system: &[LinearConstraint<N, V>],
    max_cycles: usize,
) -> SeparateDomain<V, Congruence<N>>
where
    N: CongruenceNumber + core::ops::Mul<Output = N> + IntervalNumber,
    V: StableIndex,
{
    let rows: Vec<&LinearConstraint<N, V>> = system
        .iter()
        .filter(|c| matches!(c.kind(), ConstraintKind::Equal) && !c.is_tautology())
        .collect();
    if rows.iter().any(|c| c.is_contradiction()) {
        return SeparateDomain::bottom();
    }

    let mut current = env;
    for _ in 0..max_cycles {
        if current.is_bottom() {
            return current;
        }
        let mut changed = false;
        for row in rows.iter().copied() {
            match propagate_congruence_row(&current, row) {
                None => return SeparateDomain::bottom(),
                Some(refined) => {
                    if refined != current {
                        changed = true;
                        current = refined;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
    current
}

fn propagate_congruence_row<N, V>(
    env: &SeparateDomain<V, Congruence<N>>,
    row: &LinearConstraint<N, V>,
) -> Option<SeparateDomain<V, Congruence<N>>>
where
    N: CongruenceNumber + core::ops::Mul<Output = N> + IntervalNumber,
    V: StableIndex,
{
    let one = N::one();
    let minus_one = N::one().neg();
    let mut current = (*env).clone();
    for (j, (cj, xj)) in row.terms().iter().enumerate() {
        if *cj != one && *cj != minus_one {
            continue;
        }
        let mut residual = Congruence::singleton((*row.constant()).clone());
        for (i, (ci, xi)) in row.terms().iter().enumerate() {
            if i == j {
                continue;
            }
            let term = scale(&current.get(xi), ci);
            residual = sub_congruence(&residual, &term);
        }
        let rhs = if *cj == minus_one {
            scale(&residual, &minus_one)
        } else {
            residual
        };
        let refined = current.get(xj).meet(&rhs);
        if refined.is_bottom() {
            return None;
        }
        current = current.set((*xj).clone(), refined);
    }
    Some(current)
}

fn scale<N>(c: &Congruence<N>, k: &N) -> Congruence<N>
where
    N: CongruenceNumber + core::ops::Mul<Output = N> + IntervalNumber,
{
    match (c.modulus(), c.representative()) {
        (Some(m), Some(r)) => {
            let k_abs = if k.is_negative() { k.neg() } else { (*k).clone() };
            Congruence::new(k_abs * (*m).clone(), (*k).clone() * (*r).clone())
        }
        _ => Congruence::bottom(),
    }
}

fn add_congruence<N: CongruenceNumber>(a: &Congruence<N>, b: &Congruence<N>) -> Congruence<N> {
    match (a.modulus(), a.representative(), b.modulus(), b.representative()) {
        (Some(m1), Some(r1), Some(m2), Some(r2)) => Congruence::new(m1.gcd(m2), r1.add(r2)),
        _ => Congruence::bottom(),
    }
}

fn sub_congruence<N>(a: &Congruence<N>, b: &Congruence<N>) -> Congruence<N>
where
    N: CongruenceNumber + core::ops::Mul<Output = N> + IntervalNumber,
{
    add_congruence(a, &scale(b, &N::one().neg()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_num::{Bound, Z};

    fn z(v: i64) -> Z {
        Z::from_i64(v)
    }

    fn iv(lb: i64, ub: i64) -> Interval<Z> {
        Interval::new(Bound::finite(z(lb)), Bound::finite(z(ub)))
    }

    #[test]
    fn equality_propagates_between_two_variables() {
        // x - y = 0, x in [0, 10] -- should pin y to [0, 10] too.
        let env = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(0), iv(0, 10));
        let system = vec![LinearConstraint::new(
            vec![(z(1), ikos_ar::VariableId(0)), (z(-1), ikos_ar::VariableId(1))],
            ConstraintKind::Equal,
            z(0),
        )];
        let solved = solve_intervals(env, &system, 10);
        assert_eq!(solved.get(&ikos_ar::VariableId(1)), iv(0, 10));
    }

    #[test]
    fn less_equal_refines_a_half_line() {
        // x + y <= 5, y in [0, 10] -- x refines to (-inf, 5].
        let env = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(1), iv(0, 10));
        let system = vec![LinearConstraint::new(
            vec![(z(1), ikos_ar::VariableId(0)), (z(1), ikos_ar::VariableId(1))],
            ConstraintKind::LessEqual,
            z(5),
        )];
        let solved = solve_intervals(env, &system, 10);
        assert_eq!(solved.get(&ikos_ar::VariableId(0)).ub(), Some(&Bound::finite(z(5))));
    }

    #[test]
    fn contradictory_constant_constraint_is_bottom() {
        let env = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top();
        let system = vec![LinearConstraint::new(vec![], ConstraintKind::LessEqual, z(-1))];
        let solved = solve_intervals(env, &system, 10);
        assert!(solved.is_bottom());
    }

    #[test]
    fn incompatible_equality_drives_variable_to_bottom() {
        // x = 5 and x = 6 in two rows, over x in [0, 10].
        let env = SeparateDomain::<ikos_ar::VariableId, Interval<Z>>::top()
            .set(ikos_ar::VariableId(0), iv(0, 10));
        let system = vec![
            LinearConstraint::new(vec![(z(1), ikos_ar::VariableId(0))], ConstraintKind::Equal, z(5)),
            LinearConstraint::new(vec![(z(1), ikos_ar::VariableId(0))], ConstraintKind::Equal, z(6)),
        ];
        let solved = solve_intervals(env, &system, 10);
        assert!(solved.is_bottom());
    }

    #[test]
    fn congruence_equality_propagates_parity() {
        // x - y = 0, x even -- y must be even too.
        let env = SeparateDomain::<ikos_ar::VariableId, Congruence<Z>>::top()
            .set(ikos_ar::VariableId(0), Congruence::new(z(2), z(0)));
        let system = vec![LinearConstraint::new(
            vec![(z(1), ikos_ar::VariableId(0)), (z(-1), ikos_ar::VariableId(1))],
            ConstraintKind::Equal,
            z(0),
        )];
        let solved = solve_congruences(env, &system, 10);
        assert_eq!(solved.get(&ikos_ar::VariableId(1)).modulus(), Some(&z(2)));
    }

    #[test]
    fn congruence_solver_ignores_inequalities() {
        let env = SeparateDomain::<ikos_ar::VariableId, Congruence<Z>>::top();
        let system = vec![LinearConstraint::new(
            vec![(z(1), ikos_ar::VariableId(0))],
            ConstraintKind::LessEqual,
            z(5),
        )];
        let solved = solve_congruences(env, &system, 10);
        assert!(solved.get(&ikos_ar::VariableId(0)).is_top());
    }

    #[test]
    fn congruence_solver_skips_non_unit_coefficients() {
        // 2x = 4 -- not inverted; x stays top rather than guessing.
        let env = SeparateDomain::<ikos_ar::VariableId, Congruence<Z>>::top();
        let system = vec![LinearConstraint::new(
            vec![(z(2), ikos_ar::VariableId(0))],
            ConstraintKind::Equal,
            z(4),
        )];
        let solved = solve_congruences(env, &system, 10);
        assert!(solved.get(&ikos_ar::VariableId(0)).is_top());
    }
}
