//! The minimal numeric interface [`Bound`](crate::Bound) needs from its
//! finite representative type.

use crate::machine_int::MachineInt;
use crate::q::Q;
use crate::z::Z;

/// A ring-like numeric type usable as the finite representative of a
/// [`Bound`](crate::Bound). Deliberately narrow: only what interval
/// arithmetic needs, so that `MachineInt` (which carries extra
/// width/signedness context that a static `zero()` cannot express) can
/// implement it alongside `Z` and `Q`.
pub trait Number: Clone + PartialEq + PartialOrd {
    /// A zero value "of the same shape" as `self` (same bit-width/sign for
    /// `MachineInt`; the unique zero for `Z`/`Q`).
    fn zero_like(&self) -> Self;
    fn add(&self, other: &Self) -> Self;
    fn sub(&self, other: &Self) -> Self;
    fn neg(&self) -> Self;
    fn is_zero(&self) -> bool;
}

impl Number for Z {
    fn zero_like(&self) -> Self {
        Z::zero()
    }
    fn add(&self, other: &Self) -> Self {
        self.clone() + other.clone()
    }
    fn sub(&self, other: &Self) -> Self {
        self.clone() - other.clone()
    }
    fn neg(&self) -> Self {
        -self.clone()
    }
    fn is_zero(&self) -> bool {
        Z::is_zero(self)
    }
}

impl Number for Q {
    fn zero_like(&self) -> Self {
        Q::zero()
    }
    fn add(&self, other: &Self) -> Self {
        self.clone() + other.clone()
    }
    fn sub(&self, other: &Self) -> Self {
        self.clone() - other.clone()
    }
    fn neg(&self) -> Self {
        -self.clone()
    }
    fn is_zero(&self) -> bool {
        Q::is_zero(self)
    }
}

impl Number for MachineInt {
    fn zero_like(&self) -> Self {
        MachineInt::zero(self.width(), self.sign())
    }
    fn add(&self, other: &Self) -> Self {
        MachineInt::add(self, other)
    }
    fn sub(&self, other: &Self) -> Self {
        MachineInt::sub(self, other)
    }
    fn neg(&self) -> Self {
        MachineInt::neg(self)
    }
    fn is_zero(&self) -> bool {
        MachineInt::is_zero(self)
    }
}
