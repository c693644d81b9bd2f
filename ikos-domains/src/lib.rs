//! Numerical and memory abstract domains: the value lattices, the
//! variable-to-value separate domain they compose into, a linear-constraint
//! solver, and the pointer/memory domains built on top (spec §4).

pub mod congruence;
pub mod dummy;
pub mod interval;
pub mod interval_congruence;
pub mod lattice;
pub mod lifetime;
pub mod linear;
pub mod memory_domain;
pub mod numerical;
pub mod nullity;
pub mod octagon;
pub mod persistent_map;
pub mod pointer_domain;
pub mod pointer_value;
pub mod points_to;
pub mod separate_domain;
pub mod solver;
pub mod uninitialized;

pub use congruence::{Congruence, CongruenceNumber};
pub use dummy::DummyDomain;
pub use interval::{Interval, IntervalNumber};
pub use interval_congruence::IntervalCongruence;
pub use lattice::AbstractDomain;
pub use lifetime::Lifetime;
pub use linear::{ConstraintKind, LinearConstraint};
pub use memory_domain::MemoryDomain;
pub use numerical::{
    CongruenceDomain, IntervalCongruenceDomain, IntervalDomain, NumericalDomain,
    DEFAULT_SOLVER_CYCLES,
};
pub use nullity::Nullity;
pub use octagon::OctagonDomain;
pub use persistent_map::{PersistentMap, StableIndex};
pub use pointer_domain::PointerDomain;
pub use pointer_value::PointerAbsValue;
pub use points_to::PointsToSet;
pub use separate_domain::SeparateDomain;
pub use solver::{solve_congruences, solve_intervals};
pub use uninitialized::Uninitialized;
