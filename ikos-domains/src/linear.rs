//! `LinearConstraint<N, V>` (spec §4.4): one row `Σ cᵢ·xᵢ ⋈ k` of a linear
//! system the interval/congruence solvers propagate over.

use core::fmt;

use crate::interval::IntervalNumber;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConstraintKind {
    LessEqual,
    Equal,
    NotEqual,
}

/// `Σ cᵢ·xᵢ ⋈ k`. Zero-coefficient terms are dropped at construction so a
/// solver never has to special-case them during residual propagation.
#[derive(Clone)]
pub struct LinearConstraint<N: IntervalNumber, V> {
    terms: Vec<(N, V)>,
    kind: ConstraintKind,
    constant: N,
}

impl<N: IntervalNumber, V: Clone + PartialEq> LinearConstraint<N, V> {
    pub fn new(terms: Vec<(N, V)>, kind: ConstraintKind, constant: N) -> Self {
        LinearConstraint {
            terms: terms.into_iter().filter(|(c, _)| !c.is_zero()).collect(),
            kind,
            constant,
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn constant(&self) -> &N {
        &self.constant
    }

    pub fn terms(&self) -> &[(N, V)] {
        &self.terms
    }

    pub fn variables(&self) -> impl Iterator<Item = &V> {
        self.terms.iter().map(|(_, v)| v)
    }

    pub fn touches(&self, variable: &V) -> bool {
        self.terms.iter().any(|(_, v)| v == variable)
    }

    /// A constraint with no variables left (every coefficient was zero):
    /// `0 ⋈ k`, decidable without an environment. `None` means it still has
    /// variables and can't be pre-filtered (spec §4.4 "pre-filtered when
    /// added").
    pub fn evaluate_constant(&self) -> Option<bool> {
        if !self.terms.is_empty() {
            return None;
        }
        let zero = self.constant.zero_like();
        Some(match self.kind {
            ConstraintKind::LessEqual => self.constant <= zero,
            ConstraintKind::Equal => self.constant == zero,
            ConstraintKind::NotEqual => self.constant != zero,
        })
    }

    pub fn is_tautology(&self) -> bool {
        self.evaluate_constant() == Some(true)
    }

    pub fn is_contradiction(&self) -> bool {
        self.evaluate_constant() == Some(false)
    }
}

impl<N: IntervalNumber + fmt::Debug, V: fmt::Debug> fmt::Debug for LinearConstraint<N, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (c, v)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{c:?}*{v:?}")?;
        }
        let op = match self.kind {
            ConstraintKind::LessEqual => "<=",
            ConstraintKind::Equal => "=",
            ConstraintKind::NotEqual => "!=",
        };
        write!(f, " {op} {:?}", self.constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_num::Z;

    fn z(v: i64) -> Z {
        Z::from_i64(v)
    }

    #[test]
    fn zero_coefficient_terms_are_dropped() {
        let c = LinearConstraint::new(
            vec![(z(0), "x"), (z(1), "y")],
            ConstraintKind::LessEqual,
            z(5),
        );
        assert_eq!(c.terms().len(), 1);
    }

    #[test]
    fn constant_only_constraint_is_decidable() {
        let tautology = LinearConstraint::<Z, &str>::new(vec![], ConstraintKind::LessEqual, z(5));
        assert!(tautology.is_tautology());
        let contradiction =
            LinearConstraint::<Z, &str>::new(vec![], ConstraintKind::LessEqual, z(-1));
        assert!(contradiction.is_contradiction());
    }
}
