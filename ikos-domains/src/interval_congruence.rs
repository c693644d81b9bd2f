//! `IntervalCongruence`: the reduced product of `Interval<Z>` and
//! `Congruence<Z>` (spec §4.1).
//!
//! Specialised to `Z`: the reduction shrinks an interval bound to the
//! nearest element of the paired congruence class, which only has a
//! well-defined "nearest" notion over the integers (the interval domain's
//! `MachineInt`/`Q` instantiations never pair with a congruence in this
//! core). Grounded on the same `ikos::core::domain::numeric::
//! interval_congruence.hpp` pattern this specification's §4.1 reduction
//! recipe was distilled from.

use core::fmt;
use core::ops::{Add, Sub};

use ikos_num::{Bound, Z};

use crate::congruence::Congruence;
use crate::interval::Interval;
use crate::lattice::AbstractDomain;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IntervalCongruence {
    interval: Interval<Z>,
    congruence: Congruence<Z>,
}

impl IntervalCongruence {
    pub fn new(interval: Interval<Z>, congruence: Congruence<Z>) -> Self {
        reduce(interval, congruence)
    }

    pub fn interval(&self) -> &Interval<Z> {
        &self.interval
    }

    pub fn congruence(&self) -> &Congruence<Z> {
        &self.congruence
    }
}

/// Tightens `interval`'s bounds to the nearest element of `congruence`'s
/// class, and tightens `congruence` to a singleton if the result is a
/// single point. Bottoms out either component if the pair is inconsistent.
fn reduce(interval: Interval<Z>, congruence: Congruence<Z>) -> IntervalCongruence {
    if interval.is_bottom() || congruence.is_bottom() {
        return IntervalCongruence {
            interval: Interval::bottom(),
            congruence: Congruence::bottom(),
        };
    }
    if congruence.is_top() {
        return IntervalCongruence {
            interval,
            congruence,
        };
    }
    if let Some(value) = congruence.as_singleton() {
        return if interval.leq(&Interval::top())
            && interval_contains(&interval, value)
        {
            IntervalCongruence {
                interval: Interval::singleton((*value).clone()),
                congruence,
            }
        } else {
            IntervalCongruence {
                interval: Interval::bottom(),
                congruence: Congruence::bottom(),
            }
        };
    }

    let modulus = congruence.modulus().expect("not top, not singleton");
    let representative = congruence.representative().expect("not top, not singleton");

    let new_lb = match interval.lb() {
        Some(Bound::Finite(lb)) => {
            let delta = representative
                .sub(lb)
                .rem_euclid(modulus)
                .expect("modulus checked non-zero by is_top/is_singleton guards above");
            Bound::finite(lb.add(&delta))
        }
        other => other.cloned().unwrap_or(Bound::NegInf),
    };
    let new_ub = match interval.ub() {
        Some(Bound::Finite(ub)) => {
            let delta = ub
                .sub(representative)
                .rem_euclid(modulus)
                .expect("modulus checked non-zero by is_top/is_singleton guards above");
            Bound::finite(ub.sub(&delta))
        }
        other => other.cloned().unwrap_or(Bound::PosInf),
    };

    let new_interval = Interval::new(new_lb, new_ub);
    if new_interval.is_bottom() {
        return IntervalCongruence {
            interval: Interval::bottom(),
            congruence: Congruence::bottom(),
        };
    }
    let new_congruence = match new_interval.as_singleton() {
        Some(v) => Congruence::singleton((*v).clone()),
        None => congruence,
    };
    IntervalCongruence {
        interval: new_interval,
        congruence: new_congruence,
    }
}

fn interval_contains(interval: &Interval<Z>, value: &Z) -> bool {
    let point = Interval::singleton((*value).clone());
    point.leq(interval)
}

impl AbstractDomain for IntervalCongruence {
    fn top() -> Self {
        IntervalCongruence {
            interval: Interval::top(),
            congruence: Congruence::top(),
        }
    }

    fn bottom() -> Self {
        IntervalCongruence {
            interval: Interval::bottom(),
            congruence: Congruence::bottom(),
        }
    }

    fn is_top(&self) -> bool {
        self.interval.is_top() && self.congruence.is_top()
    }

    fn is_bottom(&self) -> bool {
        self.interval.is_bottom()
    }

    fn leq(&self, other: &Self) -> bool {
        self.interval.leq(&other.interval) && self.congruence.leq(&other.congruence)
    }

    fn join(&self, other: &Self) -> Self {
        reduce(
            self.interval.join(&other.interval),
            self.congruence.join(&other.congruence),
        )
    }

    fn meet(&self, other: &Self) -> Self {
        reduce(
            self.interval.meet(&other.interval),
            self.congruence.meet(&other.congruence),
        )
    }

    fn widen(&self, other: &Self) -> Self {
        reduce(
            self.interval.widen(&other.interval),
            self.congruence.widen(&other.congruence),
        )
    }

    fn narrow(&self, other: &Self) -> Self {
        reduce(self.interval.narrow(&other.interval), self.congruence.clone())
    }
}

impl fmt::Debug for IntervalCongruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.interval, self.congruence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z(v: i64) -> Z {
        Z::from_i64(v)
    }

    fn interval(lb: i64, ub: i64) -> Interval<Z> {
        Interval::new(Bound::finite(z(lb)), Bound::finite(z(ub)))
    }

    #[test]
    fn reduction_shrinks_bounds_to_the_congruence_class() {
        // x = 3k (mod 3, i.e. {0 (mod 3)}) and x in [0,20]; assert x >= 7.
        let ic = IntervalCongruence::new(interval(0, 20), Congruence::new(z(3), z(0)));
        let asserted = ic.meet(&IntervalCongruence::new(
            Interval::new(Bound::finite(z(7)), Bound::PosInf),
            Congruence::top(),
        ));
        assert_eq!(asserted.interval().lb(), Some(&Bound::finite(z(9))));
        assert_eq!(asserted.interval().ub(), Some(&Bound::finite(z(18))));
    }

    #[test]
    fn singleton_congruence_outside_interval_is_bottom() {
        let ic = IntervalCongruence::new(interval(0, 5), Congruence::singleton(z(10)));
        assert!(ic.is_bottom());
    }

    #[test]
    fn singleton_result_tightens_congruence() {
        let ic = IntervalCongruence::new(interval(4, 4), Congruence::new(z(3), z(1)));
        assert_eq!(ic.congruence().as_singleton(), Some(&z(4)));
    }

    #[test]
    fn reduction_is_idempotent() {
        let once = IntervalCongruence::new(interval(0, 20), Congruence::new(z(3), z(0)));
        let twice = IntervalCongruence::new(once.interval.clone(), once.congruence.clone());
        assert_eq!(once.interval().lb(), twice.interval().lb());
        assert_eq!(once.interval().ub(), twice.interval().ub());
    }
}
