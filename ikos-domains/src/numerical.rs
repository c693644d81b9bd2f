//! Numerical domains (spec §4.4): concrete `SeparateDomain` instantiations
//! wired to the linear-constraint solvers, plus the [`NumericalDomain`]
//! trait seam the pointer/memory domains and the engine's transfer
//! functions are written against so they don't care which one is in use.

use core::fmt;

use ikos_ar::VariableId;
use ikos_num::Z;

use crate::congruence::Congruence;
use crate::dummy::DummyDomain;
use crate::interval::Interval;
use crate::interval_congruence::IntervalCongruence;
use crate::lattice::AbstractDomain;
use crate::linear::LinearConstraint;
use crate::separate_domain::SeparateDomain;
use crate::solver::{solve_congruences, solve_intervals};

/// Number of sweeps a `NumericalDomain::add` default implementation runs
/// the solver for, when the caller doesn't have its own fixpoint-parameter
/// budget to pass (the engine's `FixpointParameters::solver_max_cycles`
/// overrides this via `add_with_cycles`).
pub const DEFAULT_SOLVER_CYCLES: usize = 10;

/// A variable-indexed abstract domain that can absorb a system of linear
/// constraints (spec §4.4's solvers) and project/forget single variables —
/// the interface `pointer_domain.rs`/`transfer.rs` program against.
pub trait NumericalDomain: AbstractDomain {
    fn add_with_cycles(&self, system: &[LinearConstraint<Z, VariableId>], max_cycles: usize) -> Self;

    fn add(&self, system: &[LinearConstraint<Z, VariableId>]) -> Self {
        self.add_with_cycles(system, DEFAULT_SOLVER_CYCLES)
    }

    fn forget(&self, var: &VariableId) -> Self;

    /// Best available interval approximation for `var`: exact for
    /// [`IntervalDomain`]/[`IntervalCongruenceDomain`], `top` for domains
    /// that don't track bounds at all (spec §4.4 `DummyDomain`/
    /// `CongruenceDomain`).
    fn to_interval(&self, var: &VariableId) -> Interval<Z>;
}

macro_rules! separate_domain_wrapper {
    ($name:ident, $value:ty) => {
        #[derive(Clone, PartialEq)]
        pub struct $name {
            env: SeparateDomain<VariableId, $value>,
        }

        impl $name {
            pub fn get(&self, var: &VariableId) -> $value {
                self.env.get(var)
            }

            pub fn set(&self, var: VariableId, value: $value) -> Self {
                $name {
                    env: self.env.set(var, value),
                }
            }

            pub fn iter(&self) -> impl Iterator<Item = (&VariableId, &$value)> {
                self.env.iter()
            }
        }

        impl AbstractDomain for $name {
            fn top() -> Self {
                $name {
                    env: SeparateDomain::top(),
                }
            }

            fn bottom() -> Self {
                $name {
                    env: SeparateDomain::bottom(),
                }
            }

            fn is_top(&self) -> bool {
                self.env.is_top()
            }

            fn is_bottom(&self) -> bool {
                self.env.is_bottom()
            }

            fn leq(&self, other: &Self) -> bool {
                self.env.leq(&other.env)
            }

            fn join(&self, other: &Self) -> Self {
                $name {
                    env: self.env.join(&other.env),
                }
            }

            fn meet(&self, other: &Self) -> Self {
                $name {
                    env: self.env.meet(&other.env),
                }
            }

            fn widen(&self, other: &Self) -> Self {
                $name {
                    env: self.env.widen(&other.env),
                }
            }

            fn narrow(&self, other: &Self) -> Self {
                $name {
                    env: self.env.narrow(&other.env),
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(&self.env, f)
            }
        }
    };
}

separate_domain_wrapper!(IntervalDomain, Interval<Z>);
separate_domain_wrapper!(CongruenceDomain, Congruence<Z>);
separate_domain_wrapper!(IntervalCongruenceDomain, IntervalCongruence);

impl NumericalDomain for IntervalDomain {
    fn add_with_cycles(&self, system: &[LinearConstraint<Z, VariableId>], max_cycles: usize) -> Self {
        IntervalDomain {
            env: solve_intervals(self.env.clone(), system, max_cycles),
        }
    }

    fn forget(&self, var: &VariableId) -> Self {
        self.set((*var).clone(), Interval::top())
    }

    fn to_interval(&self, var: &VariableId) -> Interval<Z> {
        self.get(var)
    }
}

impl NumericalDomain for CongruenceDomain {
    fn add_with_cycles(&self, system: &[LinearConstraint<Z, VariableId>], max_cycles: usize) -> Self {
        CongruenceDomain {
            env: solve_congruences(self.env.clone(), system, max_cycles),
        }
    }

    fn forget(&self, var: &VariableId) -> Self {
        self.set((*var).clone(), Congruence::top())
    }

    /// A bare congruence class constrains divisibility, not bounds.
    fn to_interval(&self, _var: &VariableId) -> Interval<Z> {
        Interval::top()
    }
}

impl NumericalDomain for IntervalCongruenceDomain {
    /// Runs both solvers against the projected interval/congruence
    /// components and re-reduces pointwise (spec §4.1's `IntervalCongruence`
    /// reduction, applied per variable rather than once at construction).
    fn add_with_cycles(&self, system: &[LinearConstraint<Z, VariableId>], max_cycles: usize) -> Self {
        let intervals: SeparateDomain<VariableId, Interval<Z>> = self.iter().fold(
            SeparateDomain::top(),
            |acc, (v, ic)| acc.set((*v).clone(), (*ic.interval()).clone()),
        );
        let congruences: SeparateDomain<VariableId, Congruence<Z>> = self.iter().fold(
            SeparateDomain::top(),
            |acc, (v, ic)| acc.set((*v).clone(), (*ic.congruence()).clone()),
        );
        let solved_intervals = solve_intervals(intervals, system, max_cycles);
        let solved_congruences = solve_congruences(congruences, system, max_cycles);
        if solved_intervals.is_bottom() || solved_congruences.is_bottom() {
            return IntervalCongruenceDomain::bottom();
        }
        let keys: std::collections::BTreeSet<u32> = self
            .iter()
            .map(|(v, _)| v.0)
            .chain(solved_intervals.iter().map(|(v, _)| v.0))
            .chain(solved_congruences.iter().map(|(v, _)| v.0))
            .collect();
        let mut result = IntervalCongruenceDomain::top();
        for k in keys {
            let var = VariableId(k);
            let ic = IntervalCongruence::new(solved_intervals.get(&var), solved_congruences.get(&var));
            result = result.set(var, ic);
        }
        result
    }

    fn forget(&self, var: &VariableId) -> Self {
        self.set((*var).clone(), IntervalCongruence::top())
    }

    fn to_interval(&self, var: &VariableId) -> Interval<Z> {
        (*self.get(var).interval()).clone()
    }
}

impl NumericalDomain for DummyDomain {
    fn add_with_cycles(&self, _system: &[LinearConstraint<Z, VariableId>], _max_cycles: usize) -> Self {
        *self
    }

    fn forget(&self, _var: &VariableId) -> Self {
        *self
    }

    fn to_interval(&self, _var: &VariableId) -> Interval<Z> {
        Interval::top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::ConstraintKind;
    use ikos_num::Bound;

    fn z(v: i64) -> Z {
        Z::from_i64(v)
    }

    fn iv(lb: i64, ub: i64) -> Interval<Z> {
        Interval::new(Bound::finite(z(lb)), Bound::finite(z(ub)))
    }

    #[test]
    fn interval_domain_add_runs_the_solver() {
        let d = IntervalDomain::top().set(VariableId(0), iv(0, 10));
        let system = vec![LinearConstraint::new(
            vec![(z(1), VariableId(0)), (z(-1), VariableId(1))],
            ConstraintKind::Equal,
            z(0),
        )];
        let d = d.add(&system);
        assert_eq!(d.get(&VariableId(1)), iv(0, 10));
    }

    #[test]
    fn interval_congruence_domain_reduces_after_solving() {
        let d = IntervalCongruenceDomain::top().set(
            VariableId(0),
            IntervalCongruence::new(iv(0, 20), Congruence::new(z(3), z(0))),
        );
        let system = vec![LinearConstraint::new(
            vec![(z(1), VariableId(0))],
            ConstraintKind::LessEqual,
            z(10),
        )];
        let d = d.add(&system);
        let ic = d.get(&VariableId(0));
        assert!(ic.interval().ub().is_some());
    }

    #[test]
    fn dummy_domain_ignores_constraints() {
        let d = DummyDomain::top();
        let system = vec![LinearConstraint::new(
            vec![(z(1), VariableId(0))],
            ConstraintKind::Equal,
            z(5),
        )];
        assert!(d.add(&system).is_top());
    }
}
