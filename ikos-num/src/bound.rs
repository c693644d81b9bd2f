//! A number extended with ±∞, with saturating arithmetic (spec §4.1).

use core::cmp::Ordering;
use core::fmt;

use crate::number::Number;

/// `N` extended with a negative and a positive infinity. Used as the
/// endpoint type of [`Interval`](https://docs.rs/ikos-domains) so that
/// unbounded ranges (`[-∞, +∞]`, `top`) are representable without a
/// separate flag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bound<N> {
    NegInf,
    Finite(N),
    PosInf,
}

impl<N: Number> Bound<N> {
    pub fn finite(n: N) -> Self {
        Bound::Finite(n)
    }

    pub fn is_infinite(&self) -> bool {
        !matches!(self, Bound::Finite(_))
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Bound::Finite(_))
    }

    pub fn as_finite(&self) -> Option<&N> {
        match self {
            Bound::Finite(n) => Some(n),
            _ => None,
        }
    }

    /// Saturating negation: `-(-∞) = +∞`, `-(+∞) = -∞`.
    pub fn neg(&self) -> Self {
        match self {
            Bound::NegInf => Bound::PosInf,
            Bound::PosInf => Bound::NegInf,
            Bound::Finite(n) => Bound::Finite(n.neg()),
        }
    }

    /// Saturating addition. `(+∞) + (-∞)` is a logic error: the spec
    /// requires callers to pre-check bottomness so this combination is
    /// never reachable from sound interval arithmetic (spec §4.1).
    pub fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.add(b)),
            (Bound::NegInf, Bound::PosInf) | (Bound::PosInf, Bound::NegInf) => {
                panic!("Bound::add: (+inf) + (-inf) is undefined; caller must pre-check bottomness")
            }
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
        }
    }

    /// Saturating subtraction, expressed as `self + (-other)`.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Multiplication by zero always yields a finite zero, regardless of
    /// whether either operand is infinite — justified by its use inside
    /// interval products, where a degenerate `[0,0]` factor collapses the
    /// product to `[0,0]` (spec §4.1).
    pub fn mul(&self, other: &Self) -> Self
    where
        N: Clone + core::ops::Mul<Output = N>,
    {
        let self_zero = matches!(self, Bound::Finite(n) if n.is_zero());
        let other_zero = matches!(other, Bound::Finite(n) if n.is_zero());
        if self_zero || other_zero {
            let zero = match (self, other) {
                (Bound::Finite(n), _) if self_zero => n.zero_like(),
                (_, Bound::Finite(n)) if other_zero => n.zero_like(),
                _ => unreachable!("zero case implies a finite zero operand exists"),
            };
            return Bound::Finite(zero);
        }
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.clone() * b.clone()),
            _ => {
                let neg = self.sign() * other.sign();
                if neg < 0 {
                    Bound::NegInf
                } else {
                    Bound::PosInf
                }
            }
        }
    }

    fn sign(&self) -> i32 {
        match self {
            Bound::NegInf => -1,
            Bound::PosInf => 1,
            Bound::Finite(n) => {
                if n.is_zero() {
                    0
                } else if *n < n.zero_like() {
                    -1
                } else {
                    1
                }
            }
        }
    }

    pub fn min(&self, other: &Self) -> Self
    where
        N: Clone,
    {
        if self <= other {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn max(&self, other: &Self) -> Self
    where
        N: Clone,
    {
        if self >= other {
            self.clone()
        } else {
            other.clone()
        }
    }
}

impl<N: Number> PartialOrd for Bound<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Bound::NegInf, Bound::NegInf) => Some(Ordering::Equal),
            (Bound::PosInf, Bound::PosInf) => Some(Ordering::Equal),
            (Bound::NegInf, _) => Some(Ordering::Less),
            (_, Bound::NegInf) => Some(Ordering::Greater),
            (Bound::PosInf, _) => Some(Ordering::Greater),
            (_, Bound::PosInf) => Some(Ordering::Less),
            (Bound::Finite(a), Bound::Finite(b)) => a.partial_cmp(b),
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for Bound<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-inf"),
            Bound::PosInf => write!(f, "+inf"),
            Bound::Finite(n) => write!(f, "{n:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::z::Z;

    #[test]
    fn infinities_dominate_addition() {
        let pos: Bound<Z> = Bound::PosInf;
        let fin = Bound::Finite(Z::from_i64(5));
        assert_eq!(pos.add(&fin), Bound::PosInf);
    }

    #[test]
    fn zero_multiplication_is_finite_zero() {
        let zero: Bound<Z> = Bound::Finite(Z::zero());
        let inf: Bound<Z> = Bound::PosInf;
        assert_eq!(zero.mul(&inf), Bound::Finite(Z::zero()));
    }

    #[test]
    #[should_panic]
    fn opposite_infinities_addition_panics() {
        let pos: Bound<Z> = Bound::PosInf;
        let neg: Bound<Z> = Bound::NegInf;
        let _ = pos.add(&neg);
    }

    #[test]
    fn ordering_places_neg_inf_below_everything() {
        let neg: Bound<Z> = Bound::NegInf;
        let fin = Bound::Finite(Z::from_i64(-1_000_000));
        assert!(neg < fin);
    }
}
