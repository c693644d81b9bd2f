//! The congruence abstract domain `Congruence<N>` (spec §4.1): tracks
//! `{b + k*a | k in Z}` for a modulus `a >= 0` and representative `b`.
//!
//! Grounded on the same filtered-out `ikos::core::domain::numeric::
//! congruence.hpp` the `IntervalCongruence` reduction in spec §4.1
//! references, and on `Z::extended_gcd` (added alongside this domain) for
//! the meet's Chinese-Remainder combination.

use core::fmt;

use ikos_num::{Number, Z};

use crate::lattice::AbstractDomain;

/// Numbers usable as a `Congruence` modulus/representative. Only `Z` is
/// implemented: congruence reasoning over `Q` is not meaningful (no modular
/// structure) and over `MachineInt` the interval domain already captures
/// the bit-width; the spec's other two numerical domains (`IntervalDomain`,
/// `IntervalCongruenceDomain`) are the consumers this needs to serve.
pub trait CongruenceNumber: Number + Clone + PartialOrd {
    fn one() -> Self;
    fn gcd(&self, other: &Self) -> Self;
    fn rem_euclid(&self, modulus: &Self) -> Option<Self>;
    fn is_negative(&self) -> bool;
    /// Solve `x = r1 (mod m1)`, `x = r2 (mod m2)` for `m1, m2 != 0`.
    /// Returns `(lcm, representative)`, or `None` if unsatisfiable.
    fn crt(m1: &Self, r1: &Self, m2: &Self, r2: &Self) -> Option<(Self, Self)>;
}

impl CongruenceNumber for Z {
    fn one() -> Self {
        Z::one()
    }
    fn gcd(&self, other: &Self) -> Self {
        Z::gcd(self, other)
    }
    fn rem_euclid(&self, modulus: &Self) -> Option<Self> {
        Z::rem_euclid(self, modulus).ok()
    }
    fn is_negative(&self) -> bool {
        self.signum() < 0
    }
    fn crt(m1: &Self, r1: &Self, m2: &Self, r2: &Self) -> Option<(Self, Self)> {
        let (g, x, _y) = m1.extended_gcd(m2);
        let diff = (*r2).clone() - (*r1).clone();
        let diff_rem = diff.rem_euclid(&g).ok()?;
        if !diff_rem.is_zero() {
            return None;
        }
        let lcm = ((*m1).clone() / g.clone()) * (*m2).clone();
        let k = diff.div_euclid(&g).ok()?;
        let rep = ((*r1).clone() + ((*m1).clone() * x * k))
            .rem_euclid(&lcm)
            .ok()?;
        Some((lcm, rep))
    }
}

/// `{representative + k*modulus | k in Z}`, or bottom. `modulus == 0` means
/// the singleton `{representative}`; `modulus == 1` is top (every integer).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Congruence<N: CongruenceNumber> {
    value: Option<(N, N)>,
}

impl<N: CongruenceNumber> Congruence<N> {
    /// Normalises `representative` into `[0, modulus)` (no-op when
    /// `modulus == 0`, the singleton case).
    pub fn new(modulus: N, representative: N) -> Self {
        let modulus = if modulus.is_negative() {
            modulus.neg()
        } else {
            modulus
        };
        if modulus.is_zero() {
            Congruence {
                value: Some((modulus, representative)),
            }
        } else {
            let rep = representative
                .rem_euclid(&modulus)
                .expect("modulus checked non-zero above");
            Congruence {
                value: Some((modulus, rep)),
            }
        }
    }

    pub fn singleton(value: N) -> Self {
        let zero = value.zero_like();
        Congruence::new(zero, value)
    }

    pub fn modulus(&self) -> Option<&N> {
        self.value.as_ref().map(|(m, _)| m)
    }

    pub fn representative(&self) -> Option<&N> {
        self.value.as_ref().map(|(_, r)| r)
    }

    pub fn as_singleton(&self) -> Option<&N> {
        match &self.value {
            Some((m, r)) if m.is_zero() => Some(r),
            _ => None,
        }
    }

    /// `true` if `x` satisfies this congruence class.
    pub fn contains(&self, x: &N) -> bool {
        match &self.value {
            None => false,
            Some((m, r)) if m.is_zero() => x == r,
            Some((m, r)) => x.rem_euclid(m).is_some_and(|rem| rem == *r),
        }
    }
}

impl<N: CongruenceNumber> AbstractDomain for Congruence<N> {
    fn top() -> Self {
        let one = N::one();
        let zero = one.zero_like();
        Congruence::new(one, zero)
    }

    fn bottom() -> Self {
        Congruence { value: None }
    }

    fn is_top(&self) -> bool {
        self.value.as_ref().is_some_and(|(m, _)| *m == N::one())
    }

    fn is_bottom(&self) -> bool {
        self.value.is_none()
    }

    fn leq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (None, _) => true,
            (_, None) => false,
            (Some((m1, r1)), Some((m2, r2))) => {
                if m2.is_zero() {
                    m1.is_zero() && r1 == r2
                } else if m1.is_zero() {
                    r1.rem_euclid(m2).is_some_and(|rem| rem == *r2)
                } else {
                    let divides = m1.rem_euclid(m2).is_some_and(|rem| rem.is_zero());
                    divides && r1.rem_euclid(m2).is_some_and(|rem| rem == *r2)
                }
            }
        }
    }

    /// Join is the gcd of the moduli and the representatives' difference
    /// (spec §4.1): the smallest congruence class containing both operands.
    fn join(&self, other: &Self) -> Self {
        match (&self.value, &other.value) {
            (None, _) => (*other).clone(),
            (_, None) => (*self).clone(),
            (Some((m1, r1)), Some((m2, r2))) => {
                let diff = if *r1 < *r2 {
                    r2.sub(r1)
                } else {
                    r1.sub(r2)
                };
                let modulus = m1.gcd(m2).gcd(&diff);
                Congruence::new(modulus, (*r1).clone())
            }
        }
    }

    /// Meet solves the pair of congruences via CRT; unsatisfiable means
    /// bottom (spec §4.1).
    fn meet(&self, other: &Self) -> Self {
        match (&self.value, &other.value) {
            (None, _) | (_, None) => Congruence::bottom(),
            (Some((m1, r1)), Some((m2, r2))) => {
                if m1.is_zero() && m2.is_zero() {
                    if r1 == r2 {
                        Congruence::singleton((*r1).clone())
                    } else {
                        Congruence::bottom()
                    }
                } else if m1.is_zero() {
                    if other.contains(r1) {
                        Congruence::singleton((*r1).clone())
                    } else {
                        Congruence::bottom()
                    }
                } else if m2.is_zero() {
                    if self.contains(r2) {
                        Congruence::singleton((*r2).clone())
                    } else {
                        Congruence::bottom()
                    }
                } else {
                    match N::crt(m1, r1, m2, r2) {
                        Some((modulus, rep)) => Congruence::new(modulus, rep),
                        None => Congruence::bottom(),
                    }
                }
            }
        }
    }

    /// Finite ascending chains are not guaranteed (spec §4.1): widening
    /// falls back to join, stability is only promised on equalities.
    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }
}

impl<N: CongruenceNumber + fmt::Debug> fmt::Debug for Congruence<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            None => write!(f, "_|_"),
            Some((m, r)) if m.is_zero() => write!(f, "{{{r:?}}}"),
            Some((m, r)) => write!(f, "{r:?} + {m:?}Z"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z(v: i64) -> Z {
        Z::from_i64(v)
    }

    #[test]
    fn singleton_contains_only_itself() {
        let c = Congruence::singleton(z(5));
        assert!(c.contains(&z(5)));
        assert!(!c.contains(&z(6)));
    }

    #[test]
    fn top_contains_everything() {
        let top = Congruence::<Z>::top();
        assert!(top.contains(&z(42)));
        assert!(top.contains(&z(-7)));
    }

    #[test]
    fn join_finds_the_common_modulus() {
        // {0, 2} joins to the even numbers.
        let a = Congruence::singleton(z(0));
        let b = Congruence::singleton(z(2));
        let j = a.join(&b);
        assert_eq!(j.modulus(), Some(&z(2)));
        assert!(j.contains(&z(4)));
        assert!(!j.contains(&z(3)));
    }

    #[test]
    fn meet_combines_via_crt() {
        // x = 1 (mod 2), x = 2 (mod 3)  =>  x = 5 (mod 6).
        let a = Congruence::new(z(2), z(1));
        let b = Congruence::new(z(3), z(2));
        let m = a.meet(&b);
        assert_eq!(m.modulus(), Some(&z(6)));
        assert!(m.contains(&z(5)));
        assert!(m.contains(&z(-1)));
    }

    #[test]
    fn meet_is_bottom_when_unsatisfiable() {
        // x = 0 (mod 2), x = 1 (mod 2): no integer satisfies both.
        let a = Congruence::new(z(2), z(0));
        let b = Congruence::new(z(2), z(1));
        assert!(a.meet(&b).is_bottom());
    }

    #[test]
    fn leq_detects_refinement() {
        let even = Congruence::new(z(2), z(0));
        let mult_of_4 = Congruence::new(z(4), z(0));
        assert!(mult_of_4.leq(&even));
        assert!(!even.leq(&mult_of_4));
    }

    #[test]
    fn reduction_is_idempotent() {
        let c = Congruence::new(z(5), z(12));
        let rep = c.representative().cloned();
        let reduced_again = Congruence::new(z(5), rep.clone().unwrap());
        assert_eq!(reduced_again.representative().cloned(), rep);
    }
}
