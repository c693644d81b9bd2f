//! Arbitrary-precision rational number.

use core::fmt;
use core::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use crate::error::{NumError, NumResult};
use crate::z::Z;

/// An arbitrary-precision rational, always kept in lowest terms with a
/// positive denominator (`num_rational` normalises on every construction
/// and arithmetic operation).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Q(BigRational);

impl Q {
    /// The rational zero.
    pub fn zero() -> Self {
        Q(BigRational::new(BigInt::zero(), BigInt::from(1)))
    }

    /// The rational one.
    pub fn one() -> Self {
        Q(BigRational::new(BigInt::from(1), BigInt::from(1)))
    }

    /// Build from an integer.
    pub fn from_z(v: Z) -> Self {
        Q(BigRational::new(v.as_bigint().clone(), BigInt::from(1)))
    }

    /// Build from a numerator/denominator pair; reduces to lowest terms.
    pub fn new(num: Z, den: Z) -> NumResult<Self> {
        if den.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        Ok(Q(BigRational::new(
            num.as_bigint().clone(),
            den.as_bigint().clone(),
        )))
    }

    /// `true` if this value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
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

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Q(self.0.abs())
    }

    /// Integer part, rounded toward zero.
    pub fn trunc(&self) -> Z {
        Z::from(self.0.trunc().to_integer())
    }

    /// Integer part, rounded toward negative infinity (used to compute the
    /// nearest congruence class member below an interval bound).
    pub fn floor(&self) -> Z {
        Z::from(self.0.floor().to_integer())
    }

    /// Integer part, rounded toward positive infinity (used to compute the
    /// nearest congruence class member above an interval bound).
    pub fn ceil(&self) -> Z {
        Z::from(self.0.ceil().to_integer())
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
}

impl From<Z> for Q {
    fn from(v: Z) -> Self {
        Q::from_z(v)
    }
}

impl From<i64> for Q {
    fn from(v: i64) -> Self {
        Q::from_z(Z::from_i64(v))
    }
}

impl fmt::Debug for Q {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for Q {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for Q {
    type Output = Q;
    fn add(self, rhs: Self) -> Q {
        Q(self.0 + rhs.0)
    }
}

impl Sub for Q {
    type Output = Q;
    fn sub(self, rhs: Self) -> Q {
        Q(self.0 - rhs.0)
    }
}

impl Mul for Q {
    type Output = Q;
    fn mul(self, rhs: Self) -> Q {
        Q(self.0 * rhs.0)
    }
}

impl Div for Q {
    type Output = Q;
    /// Panics on division by zero; untrusted denominators should be checked
    /// with `is_zero` first.
    fn div(self, rhs: Self) -> Q {
        Q(self.0 / rhs.0)
    }
}

impl Neg for Q {
    type Output = Q;
    fn neg(self) -> Q {
        Q(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_to_lowest_terms() {
        let q = Q::new(Z::from_i64(4), Z::from_i64(8)).unwrap();
        assert_eq!(q, Q::new(Z::from_i64(1), Z::from_i64(2)).unwrap());
    }

    #[test]
    fn floor_and_ceil_bracket_value() {
        let q = Q::new(Z::from_i64(-3), Z::from_i64(2)).unwrap(); // -1.5
        assert_eq!(q.floor(), Z::from_i64(-2));
        assert_eq!(q.ceil(), Z::from_i64(-1));
    }
}
