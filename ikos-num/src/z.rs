//! Arbitrary-precision signed integer.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, Div, Mul, Neg, Rem, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::error::{NumError, NumResult};

/// An arbitrary-precision integer, used as the representative of a
/// [`Congruence`](crate::Congruence) and as the scalar type of
/// `Interval<Z>`/`LinearExpression<Z, _>` when the analysis is not tied to a
/// fixed machine width.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Z(BigInt);

impl Z {
    /// The integer zero.
    pub fn zero() -> Self {
        Z(BigInt::zero())
    }

    /// The integer one.
    pub fn one() -> Self {
        Z(BigInt::from(1))
    }

    /// Build from a primitive `i64`.
    pub fn from_i64(v: i64) -> Self {
        Z(BigInt::from(v))
    }

    /// Build from a primitive `u64`.
    pub fn from_u64(v: u64) -> Self {
        Z(BigInt::from(v))
    }

    /// Build from a primitive `i128`, the widest signed/unsigned
    /// intermediate [`crate::MachineInt`] exposes via `to_signed`/
    /// `to_unsigned`.
    pub fn from_i128(v: i128) -> Self {
        Z(BigInt::from(v))
    }

    /// Build from a primitive `u128`.
    pub fn from_u128(v: u128) -> Self {
        Z(BigInt::from(v))
    }

    /// Projects down to `i128`, when the value fits. Used when lifting a
    /// solved numerical-domain bound back into a fixed-width `MachineInt`
    /// range (values outside `i128` are clamped by the caller instead).
    pub fn to_i128(&self) -> Option<i128> {
        use num_traits::ToPrimitive;
        self.0.to_i128()
    }

    /// `true` if this value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Z(self.0.abs())
    }

    /// Sign: -1, 0 or 1.
    pub fn signum(&self) -> i32 {
        if self.0.is_zero() {
            0
        } else if self.0.is_negative() {
            -1
        } else {
            1
        }
    }

    /// Greatest common divisor (always non-negative).
    pub fn gcd(&self, other: &Self) -> Self {
        Z(self.0.gcd(&other.0))
    }

    /// Extended Euclidean algorithm: `(g, x, y)` with `self*x + other*y = g`
    /// and `g = gcd(self, other)`. Used to solve the pair of congruences a
    /// `Congruence` meet combines (spec §4.1 "Meet uses extended-Euclid").
    pub fn extended_gcd(&self, other: &Self) -> (Self, Self, Self) {
        let num_integer::ExtendedGcd { gcd, x, y, .. } = self.0.extended_gcd(&other.0);
        (Z(gcd), Z(x), Z(y))
    }

    /// Euclidean remainder, always in `[0, |other|)`. Computed as
    /// `mod_floor` against the absolute value of the divisor, which by
    /// definition of floor-division keeps the same non-negative sign
    /// regardless of the divisor's own sign.
    pub fn rem_euclid(&self, other: &Self) -> NumResult<Self> {
        if other.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        Ok(Z(self.0.mod_floor(&other.0.abs())))
    }

    /// Euclidean division, the quotient matching [`Z::rem_euclid`]:
    /// `self == quotient * other + rem_euclid(self, other)`.
    pub fn div_euclid(&self, other: &Self) -> NumResult<Self> {
        if other.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        let r = self.0.mod_floor(&other.0.abs());
        Ok(Z((&self.0 - &r) / &other.0))
    }

    /// Checked division; `None` on division by zero.
    pub fn checked_div(&self, other: &Self) -> NumResult<Self> {
        if other.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        Ok(Z(&self.0 / &other.0))
    }

    /// Checked remainder; `None` on division by zero.
    pub fn checked_rem(&self, other: &Self) -> NumResult<Self> {
        if other.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        Ok(Z(&self.0 % &other.0))
    }

    /// Minimum of two values.
    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Maximum of two values.
    pub fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// Access the underlying big integer.
    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }
}

impl From<i64> for Z {
    fn from(v: i64) -> Self {
        Z::from_i64(v)
    }
}

impl From<BigInt> for Z {
    fn from(v: BigInt) -> Self {
        Z(v)
    }
}

impl fmt::Debug for Z {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for Z {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for Z {
    type Output = Z;
    fn add(self, rhs: Self) -> Z {
        Z(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Z> for &'a Z {
    type Output = Z;
    fn add(self, rhs: &'a Z) -> Z {
        Z(&self.0 + &rhs.0)
    }
}

impl Sub for Z {
    type Output = Z;
    fn sub(self, rhs: Self) -> Z {
        Z(self.0 - rhs.0)
    }
}

impl<'a> Sub<&'a Z> for &'a Z {
    type Output = Z;
    fn sub(self, rhs: &'a Z) -> Z {
        Z(&self.0 - &rhs.0)
    }
}

impl Mul for Z {
    type Output = Z;
    fn mul(self, rhs: Self) -> Z {
        Z(self.0 * rhs.0)
    }
}

impl<'a> Mul<&'a Z> for &'a Z {
    type Output = Z;
    fn mul(self, rhs: &'a Z) -> Z {
        Z(&self.0 * &rhs.0)
    }
}

impl Div for Z {
    type Output = Z;
    /// Truncating division. Panics on division by zero; callers that accept
    /// untrusted denominators must use [`Z::checked_div`] instead.
    fn div(self, rhs: Self) -> Z {
        Z(self.0 / rhs.0)
    }
}

impl Rem for Z {
    type Output = Z;
    fn rem(self, rhs: Self) -> Z {
        Z(self.0 % rhs.0)
    }
}

impl Neg for Z {
    type Output = Z;
    fn neg(self) -> Z {
        Z(-self.0)
    }
}

impl PartialOrd<i64> for Z {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        self.0.partial_cmp(&BigInt::from(*other))
    }
}

impl PartialEq<i64> for Z {
    fn eq(&self, other: &i64) -> bool {
        self.0 == BigInt::from(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_is_nonnegative() {
        let a = Z::from_i64(-12);
        let b = Z::from_i64(8);
        assert_eq!(a.gcd(&b), Z::from_i64(4));
    }

    #[test]
    fn euclidean_remainder_is_nonnegative() {
        let a = Z::from_i64(-7);
        let m = Z::from_i64(3);
        assert_eq!(a.rem_euclid(&m).unwrap(), Z::from_i64(2));
    }

    #[test]
    fn division_by_zero_is_structural_error() {
        let a = Z::from_i64(5);
        let z = Z::zero();
        assert_eq!(a.checked_div(&z), Err(NumError::DivisionByZero));
    }
}
