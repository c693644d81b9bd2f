//! The transfer function (spec §4.7): the effect of a single [`Statement`]
//! on the [`AbstractState`] the fixpoint iterator carries at each program
//! point, plus the edge-level refinement a trailing `Comparison` statement
//! applies to the two successors of the block it ends (spec §4.7's note
//! that `Comparison` "does not itself mutate the invariant at the statement
//! point").
//!
//! Grounded on `fuel-vm`'s `Interpreter::instruction` dispatch for shape —
//! one method per statement family, each a short, self-contained state
//! update — generalized from concrete opcode execution to abstract-domain
//! transfer.

use ikos_ar::{
    BinaryOp, CallArguments, CompareOp, DataLayout, Function, MemoryLocation, MemoryLocationFactory,
    Statement, UnaryOp, ValueOperand, VariableId, VariableKind,
};
use ikos_domains::{
    AbstractDomain, ConstraintKind, Interval, LinearConstraint, MemoryDomain, NumericalDomain,
    PointerDomain, SeparateDomain, Uninitialized, DEFAULT_SOLVER_CYCLES,
};
use ikos_num::{Bound, MachineInt, Sign, Width, Z};

use crate::error::{AnalysisError, AnalysisResult};
use crate::literal::{variable_kind, LiteralFactory, ScalarLit};

/// Representation convention for every machine integer that crosses into
/// the pointer domain's offset currency (`Interval<MachineInt>`): always
/// unsigned at the operand's own bit width. Signed interpretation is read
/// out of the bit pattern locally by whichever op needs it (`SDiv`,
/// `AShr`, the `Signed*` comparisons), rather than threading a sign tag
/// through every stored interval.
const REPR_SIGN: Sign = Sign::Unsigned;

/// The per-program-point abstract value (spec §4.8's two-channel design):
/// `normal` is the reduced product of pointer, heap and lifetime
/// information that drives ordinary control flow; `pending_exceptions`
/// carries the same shape for a program point reached only by an in-flight
/// exception. A function whose `normal` component is bottom has no live
/// non-exceptional path, but may still have a pending exception to
/// propagate — so `AbstractState::is_bottom` looks only at `normal`.
pub struct AbstractState<N: NumericalDomain> {
    pub normal: MemoryDomain<N>,
    pub uninitialized: SeparateDomain<VariableId, Uninitialized>,
    pub pending_exceptions: MemoryDomain<N>,
}

impl<N: NumericalDomain> Clone for AbstractState<N> {
    fn clone(&self) -> Self {
        AbstractState {
            normal: self.normal.clone(),
            uninitialized: self.uninitialized.clone(),
            pending_exceptions: self.pending_exceptions.clone(),
        }
    }
}

impl<N: NumericalDomain> AbstractDomain for AbstractState<N> {
    fn top() -> Self {
        AbstractState {
            normal: MemoryDomain::top(),
            uninitialized: SeparateDomain::top(),
            pending_exceptions: MemoryDomain::bottom(),
        }
    }

    fn bottom() -> Self {
        AbstractState {
            normal: MemoryDomain::bottom(),
            uninitialized: SeparateDomain::bottom(),
            pending_exceptions: MemoryDomain::bottom(),
        }
    }

    fn is_top(&self) -> bool {
        self.normal.is_top() && self.uninitialized.is_top() && self.pending_exceptions.is_bottom()
    }

    fn is_bottom(&self) -> bool {
        self.normal.is_bottom()
    }

    fn leq(&self, other: &Self) -> bool {
        self.normal.leq(&other.normal)
            && self.uninitialized.leq(&other.uninitialized)
            && self.pending_exceptions.leq(&other.pending_exceptions)
    }

    fn join(&self, other: &Self) -> Self {
        AbstractState {
            normal: self.normal.join(&other.normal),
            uninitialized: self.uninitialized.join(&other.uninitialized),
            pending_exceptions: self.pending_exceptions.join(&other.pending_exceptions),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        AbstractState {
            normal: self.normal.meet(&other.normal),
            uninitialized: self.uninitialized.meet(&other.uninitialized),
            pending_exceptions: self.pending_exceptions.meet(&other.pending_exceptions),
        }
    }

    fn widen(&self, other: &Self) -> Self {
        AbstractState {
            normal: self.normal.widen(&other.normal),
            uninitialized: self.uninitialized.widen(&other.uninitialized),
            pending_exceptions: self.pending_exceptions.widen(&other.pending_exceptions),
        }
    }

    fn narrow(&self, other: &Self) -> Self {
        AbstractState {
            normal: self.normal.narrow(&other.normal),
            uninitialized: self.uninitialized.narrow(&other.uninitialized),
            pending_exceptions: self.pending_exceptions.narrow(&other.pending_exceptions),
        }
    }
}

impl<N: NumericalDomain> PartialEq for AbstractState<N> {
    fn eq(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }
}

impl<N: NumericalDomain + core::fmt::Debug> core::fmt::Debug for AbstractState<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "(normal={:?}, uninit={:?}, pending={:?})",
            self.normal, self.uninitialized, self.pending_exceptions
        )
    }
}

/// Lifts a machine integer's exact value into `Z`, trusting the value's own
/// recorded sign tag. The numerical domain itself reasons in unbounded `Z`
/// currency past this point; `wrap_z_interval_to_width` below is what puts
/// the bit-width back once an `Integer`-kind result is posted (see
/// DESIGN.md for why `Signed*`/`Unsigned*` op variants aren't separately
/// modelled in between).
pub fn z_of_machine_int(m: &MachineInt) -> Z {
    match m.sign() {
        Sign::Signed => Z::from_i128(m.to_signed()),
        Sign::Unsigned => Z::from_u128(m.to_unsigned()),
    }
}

fn clamp_z_to_machine_int(z: &Z, width: Width) -> MachineInt {
    let min = MachineInt::min_value(width, REPR_SIGN);
    let max = MachineInt::max_value(width, REPR_SIGN);
    match z.to_i128() {
        Some(v) => {
            let min_v = min.to_unsigned() as i128;
            let max_v = max.to_unsigned() as i128;
            if v < min_v {
                min
            } else if v > max_v {
                max
            } else {
                MachineInt::from_i128(v, width, REPR_SIGN)
            }
        }
        None => {
            if *z < Z::zero() {
                min
            } else {
                max
            }
        }
    }
}

/// Narrows an unbounded `Interval<Z>` down into a fixed-width
/// `Interval<MachineInt>`, clamping rather than wrapping (spec's numerical
/// domain never reasons about wraparound past this boundary).
fn z_interval_to_machine_int(iv: &Interval<Z>, width: Width) -> Interval<MachineInt> {
    if iv.is_bottom() {
        return Interval::bottom();
    }
    let min = MachineInt::min_value(width, REPR_SIGN);
    let max = MachineInt::max_value(width, REPR_SIGN);
    let lb = match iv.lb() {
        Some(Bound::Finite(z)) => Bound::finite(clamp_z_to_machine_int(z, width)),
        _ => Bound::finite(min),
    };
    let ub = match iv.ub() {
        Some(Bound::Finite(z)) => Bound::finite(clamp_z_to_machine_int(z, width)),
        _ => Bound::finite(max),
    };
    Interval::new(lb, ub)
}

fn machine_int_interval_to_z(iv: &Interval<MachineInt>) -> Interval<Z> {
    if iv.is_bottom() {
        return Interval::bottom();
    }
    let lb = match iv.lb() {
        Some(Bound::Finite(m)) => Bound::finite(z_of_machine_int(m)),
        Some(Bound::NegInf) | None => Bound::NegInf,
        Some(Bound::PosInf) => Bound::PosInf,
    };
    let ub = match iv.ub() {
        Some(Bound::Finite(m)) => Bound::finite(z_of_machine_int(m)),
        Some(Bound::PosInf) | None => Bound::PosInf,
        Some(Bound::NegInf) => Bound::NegInf,
    };
    Interval::new(lb, ub)
}

/// Posts `var in interval` as up to two `<=` constraints (spec §4.1's
/// numerical domains only expose linear-constraint ingestion, not direct
/// interval assignment); infinite bounds are simply omitted.
fn bound_constraints(var: VariableId, interval: &Interval<Z>) -> Vec<LinearConstraint<Z, VariableId>> {
    let mut system = Vec::new();
    if let Some(Bound::Finite(ub)) = interval.ub() {
        system.push(LinearConstraint::new(
            vec![(Z::one(), var)],
            ConstraintKind::LessEqual,
            ub.clone(),
        ));
    }
    if let Some(Bound::Finite(lb)) = interval.lb() {
        system.push(LinearConstraint::new(
            vec![(Z::from_i64(-1), var)],
            ConstraintKind::LessEqual,
            -lb.clone(),
        ));
    }
    system
}

/// The declared bit-width of `result`, if it is an `Integer`-kind local of
/// `function`. `None` for anything else (a pointer/float/aggregate result,
/// or a result outside the function's own local table), in which case the
/// caller leaves the interval unwrapped.
fn result_width(function: &Function, result: VariableId) -> Option<Width> {
    match variable_kind(function, result) {
        Some(VariableKind::Integer(width)) => Some(width),
        _ => None,
    }
}

/// Reduces an exact `Interval<Z>` result modulo `2^width` (spec §4.2: "all
/// operations are computed in Z then wrapped to the type"), matching
/// `MachineInt`'s own wrapping arithmetic at the interval level. A single
/// interval can only represent a contiguous range, so when the unwrapped
/// span is wide enough that wrapping would split it into two disjoint
/// pieces (or exactly spans the modulus), this over-approximates to the
/// full `[0, 2^width)` range rather than losing soundness.
fn wrap_z_interval_to_width(iv: &Interval<Z>, width: Width) -> Interval<Z> {
    let (Some(Bound::Finite(lb)), Some(Bound::Finite(ub))) = (iv.lb(), iv.ub()) else {
        return full_width_range(width);
    };
    let modulus = Z::from_u128(1u128 << width.bits());
    let span = ub - lb;
    if span >= modulus {
        return full_width_range(width);
    }
    let lb_mod = match lb.rem_euclid(&modulus) {
        Ok(v) => v,
        Err(_) => unreachable!("modulus is 2^width, never zero"),
    };
    let ub_mod = lb_mod.clone() + span;
    if ub_mod >= modulus {
        return full_width_range(width);
    }
    Interval::new(Bound::finite(lb_mod), Bound::finite(ub_mod))
}

fn full_width_range(width: Width) -> Interval<Z> {
    let modulus = Z::from_u128(1u128 << width.bits());
    Interval::new(Bound::finite(Z::zero()), Bound::finite(modulus - Z::one()))
}

fn with_numerical<N: NumericalDomain>(mem: &MemoryDomain<N>, f: impl FnOnce(&N) -> N) -> MemoryDomain<N> {
    match mem.pointers().and_then(|p| p.numerical().map(|n| (p, n))) {
        Some((ptrs, n)) => mem.with_pointers(ptrs.with_numerical(f(n))),
        None => MemoryDomain::bottom(),
    }
}

fn update_pointers<N: NumericalDomain>(
    mem: &MemoryDomain<N>,
    f: impl FnOnce(&PointerDomain<N>) -> PointerDomain<N>,
) -> MemoryDomain<N> {
    match mem.pointers() {
        Some(p) => mem.with_pointers(f(p)),
        None => MemoryDomain::bottom(),
    }
}

fn negate_compare(op: CompareOp) -> CompareOp {
    match op {
        CompareOp::Eq => CompareOp::Ne,
        CompareOp::Ne => CompareOp::Eq,
        CompareOp::SignedLt => CompareOp::SignedGe,
        CompareOp::SignedLe => CompareOp::SignedGt,
        CompareOp::SignedGt => CompareOp::SignedLe,
        CompareOp::SignedGe => CompareOp::SignedLt,
        CompareOp::UnsignedLt => CompareOp::UnsignedGe,
        CompareOp::UnsignedLe => CompareOp::UnsignedGt,
        CompareOp::UnsignedGt => CompareOp::UnsignedLe,
        CompareOp::UnsignedGe => CompareOp::UnsignedLt,
        CompareOp::PointerEq => CompareOp::PointerNe,
        CompareOp::PointerNe => CompareOp::PointerEq,
    }
}

fn flip_compare(op: CompareOp) -> CompareOp {
    match op {
        CompareOp::SignedLt => CompareOp::SignedGt,
        CompareOp::SignedLe => CompareOp::SignedGe,
        CompareOp::SignedGt => CompareOp::SignedLt,
        CompareOp::SignedGe => CompareOp::SignedLe,
        CompareOp::UnsignedLt => CompareOp::UnsignedGt,
        CompareOp::UnsignedLe => CompareOp::UnsignedGe,
        CompareOp::UnsignedGt => CompareOp::UnsignedLt,
        CompareOp::UnsignedGe => CompareOp::UnsignedLe,
        other => other,
    }
}

fn linear_constraint_var_const(op: CompareOp, left: VariableId, rhs: Z) -> Option<LinearConstraint<Z, VariableId>> {
    Some(match op {
        CompareOp::Eq => LinearConstraint::new(vec![(Z::one(), left)], ConstraintKind::Equal, rhs),
        CompareOp::Ne => LinearConstraint::new(vec![(Z::one(), left)], ConstraintKind::NotEqual, rhs),
        CompareOp::SignedLe | CompareOp::UnsignedLe => {
            LinearConstraint::new(vec![(Z::one(), left)], ConstraintKind::LessEqual, rhs)
        }
        CompareOp::SignedLt | CompareOp::UnsignedLt => {
            LinearConstraint::new(vec![(Z::one(), left)], ConstraintKind::LessEqual, rhs - Z::one())
        }
        CompareOp::SignedGe | CompareOp::UnsignedGe => {
            LinearConstraint::new(vec![(Z::from_i64(-1), left)], ConstraintKind::LessEqual, -rhs)
        }
        CompareOp::SignedGt | CompareOp::UnsignedGt => LinearConstraint::new(
            vec![(Z::from_i64(-1), left)],
            ConstraintKind::LessEqual,
            -(rhs + Z::one()),
        ),
        CompareOp::PointerEq | CompareOp::PointerNe => return None,
    })
}

fn linear_constraint_var_var(op: CompareOp, left: VariableId, right: VariableId) -> Option<LinearConstraint<Z, VariableId>> {
    let zero = Z::zero();
    Some(match op {
        CompareOp::Eq => LinearConstraint::new(
            vec![(Z::one(), left), (Z::from_i64(-1), right)],
            ConstraintKind::Equal,
            zero,
        ),
        CompareOp::Ne => LinearConstraint::new(
            vec![(Z::one(), left), (Z::from_i64(-1), right)],
            ConstraintKind::NotEqual,
            zero,
        ),
        CompareOp::SignedLe | CompareOp::UnsignedLe => LinearConstraint::new(
            vec![(Z::one(), left), (Z::from_i64(-1), right)],
            ConstraintKind::LessEqual,
            zero,
        ),
        CompareOp::SignedLt | CompareOp::UnsignedLt => LinearConstraint::new(
            vec![(Z::one(), left), (Z::from_i64(-1), right)],
            ConstraintKind::LessEqual,
            -Z::one(),
        ),
        CompareOp::SignedGe | CompareOp::UnsignedGe => LinearConstraint::new(
            vec![(Z::from_i64(-1), left), (Z::one(), right)],
            ConstraintKind::LessEqual,
            zero,
        ),
        CompareOp::SignedGt | CompareOp::UnsignedGt => LinearConstraint::new(
            vec![(Z::from_i64(-1), left), (Z::one(), right)],
            ConstraintKind::LessEqual,
            -Z::one(),
        ),
        CompareOp::PointerEq | CompareOp::PointerNe => return None,
    })
}

/// Folds a constant `(op, MachineInt, MachineInt)` triple. `Err` means the
/// operation is locally infeasible (division/remainder by the constant
/// zero), which the caller folds into the domain going bottom rather than
/// a structural [`AnalysisError`] (spec §4.8, channel 2).
fn apply_machine_int_binary(op: BinaryOp, l: &MachineInt, r: &MachineInt) -> Result<MachineInt, ()> {
    Ok(match op {
        BinaryOp::URem => l.urem(r).map_err(|_| ())?,
        BinaryOp::SRem => l.srem(r).map_err(|_| ())?,
        BinaryOp::And => l.and(r),
        BinaryOp::Or => l.or(r),
        BinaryOp::Xor => l.xor(r),
        BinaryOp::Shl => l.shl(shift_amount(r)),
        BinaryOp::LShr => l.lshr(shift_amount(r)),
        BinaryOp::AShr => l.ashr(shift_amount(r)),
        _ => unreachable!("only the constant-fold-only ops reach here"),
    })
}

fn shift_amount(r: &MachineInt) -> u32 {
    r.to_unsigned().min(u32::MAX as u128) as u32
}

/// Intraprocedural transfer function (spec §4.7): evaluates the effect of
/// every statement except `Call`/`Invoke`'s interprocedural part, which
/// `crate::call_engine::CallExecutionEngine` handles instead (this engine's
/// `opaque_call` is the context-insensitive fallback it falls back to).
pub struct NumericalExecutionEngine<'a> {
    data_layout: &'a DataLayout,
    locations: &'a MemoryLocationFactory,
    literals: LiteralFactory,
    /// Budget handed to every `NumericalDomain::add_with_cycles` call this
    /// engine makes (spec §4.4's solver `max_cycles` config field).
    max_cycles: usize,
}

impl<'a> NumericalExecutionEngine<'a> {
    pub fn new(data_layout: &'a DataLayout, locations: &'a MemoryLocationFactory) -> Self {
        Self::with_max_cycles(data_layout, locations, DEFAULT_SOLVER_CYCLES)
    }

    pub fn with_max_cycles(data_layout: &'a DataLayout, locations: &'a MemoryLocationFactory, max_cycles: usize) -> Self {
        NumericalExecutionEngine {
            data_layout,
            locations,
            literals: LiteralFactory::new(),
            max_cycles,
        }
    }

    pub fn execute<N: NumericalDomain>(
        &self,
        stmt: &Statement,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        if state.normal.is_bottom() {
            return Ok(state);
        }
        match stmt {
            Statement::Assignment { result, operand } => self.assignment(*result, operand, state, function),
            Statement::UnaryOperation { result, op, operand } => self.unary(*result, *op, operand, state, function),
            Statement::BinaryOperation { result, op, left, right } => {
                self.binary(*result, *op, left, right, state, function)
            }
            // Refined on the outgoing edges instead, see `analyze_edge`.
            Statement::Comparison { .. } => Ok(state),
            Statement::Allocate { result, size } => self.allocate(*result, size.as_ref(), state, function),
            Statement::PointerShift { result, pointer, offset } => {
                self.pointer_shift(*result, pointer, offset, state, function)
            }
            Statement::Load { result, pointer, access_size } => {
                self.load(*result, pointer, *access_size, state, function)
            }
            Statement::Store { pointer, value, access_size } => {
                self.store(pointer, value, *access_size, state, function)
            }
            Statement::InsertElement { result, .. }
            | Statement::ExtractElement { result, .. }
            | Statement::ShuffleVector { result, .. } => Ok(self.forget_scalar_or_pointer(*result, state)),
            Statement::Call { call, .. } | Statement::Invoke { call, .. } => {
                Ok(self.opaque_call(call.result, state))
            }
            Statement::ReturnValue { .. } => Ok(state),
            Statement::LandingPad { result } => {
                let normal = state.normal.join(&state.pending_exceptions);
                let state = AbstractState {
                    normal,
                    pending_exceptions: MemoryDomain::bottom(),
                    ..state
                };
                Ok(self.forget_scalar_or_pointer(*result, state))
            }
            Statement::Resume { .. } => Ok(AbstractState {
                pending_exceptions: state.pending_exceptions.join(&state.normal),
                normal: MemoryDomain::bottom(),
                ..state
            }),
            Statement::Unreachable => Ok(AbstractState { normal: MemoryDomain::bottom(), ..state }),
        }
    }

    /// Refines the state flowing across one successor edge of a block whose
    /// last statement is `Comparison`. `branch_taken` is `true` for the
    /// first successor and `false` for the second — `BasicBlock::successors`
    /// carries no explicit guard, so the fixpoint iterator adopts
    /// `[true-branch, false-branch]` as the successor order convention for a
    /// two-successor comparison block (see DESIGN.md).
    pub fn analyze_edge<N: NumericalDomain>(
        &self,
        op: CompareOp,
        left: &ValueOperand,
        right: &ValueOperand,
        branch_taken: bool,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        if state.normal.is_bottom() {
            return Ok(state);
        }
        let left_lit = self.literals.scalar(left, function)?;
        let right_lit = self.literals.scalar(right, function)?;
        let effective_op = if branch_taken { op } else { negate_compare(op) };
        let normal = match effective_op {
            CompareOp::PointerEq | CompareOp::PointerNe => {
                self.refine_pointer_comparison(effective_op, &left_lit, &right_lit, state.normal.clone())
            }
            _ => self.refine_numeric_comparison(effective_op, &left_lit, &right_lit, &state.normal),
        };
        Ok(AbstractState { normal, ..state })
    }

    fn assignment<N: NumericalDomain>(
        &self,
        result: VariableId,
        operand: &ValueOperand,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let lit = self.literals.scalar(operand, function)?;
        Ok(self.assign_scalar(result, &lit, state))
    }

    fn assign_scalar<N: NumericalDomain>(&self, result: VariableId, lit: &ScalarLit, state: AbstractState<N>) -> AbstractState<N> {
        let normal = match lit {
            ScalarLit::PointerVar(q) => update_pointers(&state.normal, |ptrs| ptrs.assign(result, q)),
            ScalarLit::Null => {
                let absolute_zero = self.locations.get_or_create(MemoryLocation::AbsoluteZero);
                update_pointers(&state.normal, |ptrs| {
                    ptrs.assign_null(result, absolute_zero, self.data_layout.pointer_width)
                })
            }
            ScalarLit::Integer(m) => self.post_machine_int(result, *m, &state.normal),
            ScalarLit::IntegerVar(v) => with_numerical(&state.normal, |n| {
                let interval = n.to_interval(v);
                let cleared = n.forget(&result);
                cleared.add_with_cycles(&bound_constraints(result, &interval), self.max_cycles)
            }),
            ScalarLit::FloatingPoint(_) | ScalarLit::FloatingPointVar(_) => self.forget_numerical(result, &state.normal),
            ScalarLit::Undefined => {
                return AbstractState {
                    uninitialized: state.uninitialized.set(result, Uninitialized::uninitialized()),
                    ..state
                };
            }
        };
        AbstractState { normal, ..state }
    }

    fn post_machine_int<N: NumericalDomain>(&self, var: VariableId, m: MachineInt, mem: &MemoryDomain<N>) -> MemoryDomain<N> {
        let z = z_of_machine_int(&m);
        with_numerical(mem, |n| {
            let cleared = n.forget(&var);
            cleared.add_with_cycles(
                &[LinearConstraint::new(vec![(Z::one(), var)], ConstraintKind::Equal, z.clone())],
                self.max_cycles,
            )
        })
    }

    fn forget_numerical<N: NumericalDomain>(&self, var: VariableId, mem: &MemoryDomain<N>) -> MemoryDomain<N> {
        with_numerical(mem, |n| n.forget(&var))
    }

    fn scalar_z_interval<N: NumericalDomain>(&self, lit: &ScalarLit, n: &N) -> Interval<Z> {
        match lit {
            ScalarLit::Integer(m) => Interval::singleton(z_of_machine_int(m)),
            ScalarLit::IntegerVar(v) => n.to_interval(v),
            _ => Interval::top(),
        }
    }

    fn fold_or_forget<N: NumericalDomain>(
        &self,
        result: VariableId,
        lit: &ScalarLit,
        mem: &MemoryDomain<N>,
        f: impl FnOnce(&MachineInt) -> AnalysisResult<MachineInt>,
    ) -> AnalysisResult<MemoryDomain<N>> {
        match lit {
            ScalarLit::Integer(m) => Ok(self.post_machine_int(result, f(m)?, mem)),
            _ => Ok(self.forget_numerical(result, mem)),
        }
    }

    fn unary<N: NumericalDomain>(
        &self,
        result: VariableId,
        op: UnaryOp,
        operand: &ValueOperand,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let lit = self.literals.scalar(operand, function)?;
        let normal = match op {
            UnaryOp::Neg => with_numerical(&state.normal, |n| {
                let interval = self.scalar_z_interval(&lit, n);
                let negated = interval.neg();
                let cleared = n.forget(&result);
                cleared.add_with_cycles(&bound_constraints(result, &negated), self.max_cycles)
            }),
            UnaryOp::Not => self.fold_or_forget(result, &lit, &state.normal, |m| Ok(m.not()))?,
            UnaryOp::Trunc(w) => self.fold_or_forget(result, &lit, &state.normal, |m| {
                m.trunc(w).map_err(|_| AnalysisError::LogicError("Trunc to a wider width".into()))
            })?,
            UnaryOp::ZExt(w) => self.fold_or_forget(result, &lit, &state.normal, |m| {
                m.zext(w).map_err(|_| AnalysisError::LogicError("ZExt to a narrower width".into()))
            })?,
            UnaryOp::SExt(w) => self.fold_or_forget(result, &lit, &state.normal, |m| {
                m.sext(w).map_err(|_| AnalysisError::LogicError("SExt to a narrower width".into()))
            })?,
            // Crosses the pointer/integer boundary; no value-preserving
            // abstraction on either side of it (see DESIGN.md).
            UnaryOp::Bitcast | UnaryOp::PtrToInt(_) | UnaryOp::IntToPtr => {
                return Ok(self.forget_scalar_or_pointer(result, state));
            }
        };
        Ok(AbstractState { normal, ..state })
    }

    fn binary<N: NumericalDomain>(
        &self,
        result: VariableId,
        op: BinaryOp,
        left: &ValueOperand,
        right: &ValueOperand,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let left_lit = self.literals.scalar(left, function)?;
        let right_lit = self.literals.scalar(right, function)?;
        let normal = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::UDiv | BinaryOp::SDiv => {
                self.interval_binary(result, op, &left_lit, &right_lit, &state.normal, function)
            }
            // Exact when both operands are constants, forgotten otherwise:
            // `Interval<N>` has no native bitwise/shift abstraction (see
            // DESIGN.md).
            BinaryOp::URem
            | BinaryOp::SRem
            | BinaryOp::Shl
            | BinaryOp::LShr
            | BinaryOp::AShr
            | BinaryOp::And
            | BinaryOp::Or
            | BinaryOp::Xor => self.constant_fold_binary(result, op, &left_lit, &right_lit, &state.normal),
        };
        Ok(AbstractState { normal, ..state })
    }

    /// `Add`/`Sub`/`Mul`/`UDiv`/`SDiv` on an `Integer`-kind result (spec
    /// §4.2: "all operations are computed in Z then wrapped to the type").
    /// The exact result is computed in unbounded `Z` and then reduced
    /// modulo `result`'s own declared bit-width before being posted,
    /// matching what `MachineInt`'s arithmetic already does for constants.
    fn interval_binary<N: NumericalDomain>(
        &self,
        result: VariableId,
        op: BinaryOp,
        left: &ScalarLit,
        right: &ScalarLit,
        mem: &MemoryDomain<N>,
        function: &Function,
    ) -> MemoryDomain<N> {
        let width = result_width(function, result);
        with_numerical(mem, |n| {
            let lv = self.scalar_z_interval(left, n);
            let rv = self.scalar_z_interval(right, n);
            let result_interval = match op {
                BinaryOp::Add => lv.add(&rv),
                BinaryOp::Sub => lv.sub(&rv),
                BinaryOp::Mul => lv.mul(&rv),
                BinaryOp::UDiv | BinaryOp::SDiv => lv.div(&rv),
                _ => unreachable!("dispatched only for arithmetic ops"),
            };
            let result_interval = match width {
                Some(w) => wrap_z_interval_to_width(&result_interval, w),
                None => result_interval,
            };
            let cleared = n.forget(&result);
            cleared.add_with_cycles(&bound_constraints(result, &result_interval), self.max_cycles)
        })
    }

    fn constant_fold_binary<N: NumericalDomain>(
        &self,
        result: VariableId,
        op: BinaryOp,
        left: &ScalarLit,
        right: &ScalarLit,
        mem: &MemoryDomain<N>,
    ) -> MemoryDomain<N> {
        match (left, right) {
            (ScalarLit::Integer(l), ScalarLit::Integer(r)) => match apply_machine_int_binary(op, l, r) {
                Ok(folded) => self.post_machine_int(result, folded, mem),
                Err(()) => MemoryDomain::bottom(),
            },
            _ => self.forget_numerical(result, mem),
        }
    }

    fn allocate<N: NumericalDomain>(
        &self,
        result: VariableId,
        size: Option<&ValueOperand>,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let _ = size; // the store doesn't track a per-location byte extent beyond what's written
        let addr = self.locations.get_or_create(MemoryLocation::Local(result, function.id));
        let normal = state
            .normal
            .assign_address(result, addr, ikos_domains::Nullity::non_null(), self.data_layout.pointer_width)
            .lifetime_assign_allocated(addr);
        Ok(AbstractState { normal, ..state })
    }

    fn pointer_shift<N: NumericalDomain>(
        &self,
        result: VariableId,
        pointer: &ValueOperand,
        offset: &ValueOperand,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let base = self.literals.scalar(pointer, function)?;
        let Some(base_var) = base.as_variable() else {
            return Ok(self.forget_scalar_or_pointer(result, state));
        };
        let offset_lit = self.literals.scalar(offset, function)?;
        let delta = self.offset_interval(&offset_lit, &state.normal);
        let normal = update_pointers(&state.normal, |ptrs| ptrs.assign_shifted(result, &base_var, &delta));
        Ok(AbstractState { normal, ..state })
    }

    fn offset_interval<N: NumericalDomain>(&self, lit: &ScalarLit, mem: &MemoryDomain<N>) -> Interval<MachineInt> {
        let width = self.data_layout.pointer_width;
        match lit {
            ScalarLit::Integer(m) => Interval::singleton(*m),
            ScalarLit::IntegerVar(v) => match mem.pointers().and_then(|p| p.numerical()) {
                Some(n) => z_interval_to_machine_int(&n.to_interval(v), width),
                None => Interval::top(),
            },
            _ => Interval::top(),
        }
    }

    fn load<N: NumericalDomain>(
        &self,
        result: VariableId,
        pointer: &ValueOperand,
        access_size: u64,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let lit = self.literals.scalar(pointer, function)?;
        let Some(p) = lit.as_variable() else {
            return Ok(self.forget_scalar_or_pointer(result, state));
        };
        let value = state.normal.mem_read(&p, access_size);
        let z_interval = machine_int_interval_to_z(&value);
        let normal = with_numerical(&state.normal, |n| {
            let cleared = n.forget(&result);
            cleared.add_with_cycles(&bound_constraints(result, &z_interval), self.max_cycles)
        });
        Ok(AbstractState { normal, ..state })
    }

    fn store<N: NumericalDomain>(
        &self,
        pointer: &ValueOperand,
        value: &ValueOperand,
        access_size: u64,
        state: AbstractState<N>,
        function: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let ptr_lit = self.literals.scalar(pointer, function)?;
        let Some(p) = ptr_lit.as_variable() else {
            // An unresolvable pointer operand: conservative no-op rather
            // than a structural error, since the operand may legitimately
            // be aggregate-typed (no store target we can model).
            return Ok(state);
        };
        let value_lit = self.literals.scalar(value, function)?;
        let width = Width::from_bits((access_size * 8) as u32).ok();
        let value_interval = match (&value_lit, width) {
            (ScalarLit::Integer(m), _) => Interval::singleton(*m),
            (ScalarLit::IntegerVar(v), Some(w)) => match state.normal.pointers().and_then(|ptrs| ptrs.numerical()) {
                Some(n) => z_interval_to_machine_int(&n.to_interval(v), w),
                None => Interval::top(),
            },
            _ => Interval::top(),
        };
        let normal = state.normal.mem_write(&p, &value_interval, access_size, self.locations);
        Ok(AbstractState { normal, ..state })
    }

    fn forget_scalar_or_pointer<N: NumericalDomain>(&self, var: VariableId, state: AbstractState<N>) -> AbstractState<N> {
        let normal = update_pointers(&state.normal, |ptrs| {
            let ptrs = ptrs.forget(&var);
            match ptrs.numerical() {
                Some(n) => ptrs.with_numerical(n.forget(&var)),
                None => ptrs,
            }
        });
        AbstractState {
            normal,
            uninitialized: state.uninitialized.set(var, Uninitialized::top()),
            ..state
        }
    }

    /// Binds each actual argument into its formal parameter slot at call
    /// entry (`CallArguments`'s own doc comment names this `match_down`).
    /// Assumes a bundle-wide unique `VariableId` numbering (the "arena +
    /// index" redesign), so a formal parameter and its matching actual never
    /// collide with an unrelated local of either function.
    pub fn match_down<N: NumericalDomain>(
        &self,
        callee: &Function,
        call: &CallArguments,
        state: AbstractState<N>,
        caller: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let mut state = state;
        for (formal, actual) in callee.parameters.iter().zip(call.arguments.iter()) {
            state = self.assignment(*formal, actual, state, caller)?;
        }
        Ok(state)
    }

    /// Binds the callee's returned value into the caller's result slot at
    /// call return (`match_up`, the counterpart `CallArguments`'s doc
    /// comment pairs with `match_down`). `return_operand` is the operand of
    /// the callee's `ReturnValue` statement at whichever exit the callee's
    /// fixpoint actually reached; `None` covers a void return or an exit
    /// that never produced one (e.g. the callee always diverges).
    pub fn match_up<N: NumericalDomain>(
        &self,
        result: Option<VariableId>,
        return_operand: Option<&ValueOperand>,
        state: AbstractState<N>,
        callee: &Function,
    ) -> AnalysisResult<AbstractState<N>> {
        let result = match result {
            Some(r) => r,
            None => return Ok(state),
        };
        match return_operand {
            Some(operand) => self.assignment(result, operand, state, callee),
            None => Ok(self.forget_scalar_or_pointer(result, state)),
        }
    }

    /// Context-insensitive call transfer (spec §4.7): scrubs the heap (an
    /// unknown callee may write through any pointer it can reach) but keeps
    /// existing pointer-variable bindings, since a call doesn't reassign
    /// variables other than its own result.
    pub fn opaque_call<N: NumericalDomain>(&self, result: Option<VariableId>, state: AbstractState<N>) -> AbstractState<N> {
        let scrubbed = match state.normal.pointers() {
            Some(ptrs) => MemoryDomain::top().with_pointers(ptrs.clone()),
            None => MemoryDomain::bottom(),
        };
        let state = AbstractState { normal: scrubbed, ..state };
        match result {
            Some(r) => self.forget_scalar_or_pointer(r, state),
            None => state,
        }
    }

    fn refine_pointer_comparison<N: NumericalDomain>(
        &self,
        op: CompareOp,
        left: &ScalarLit,
        right: &ScalarLit,
        mem: MemoryDomain<N>,
    ) -> MemoryDomain<N> {
        let pointer_and_null = |a: &ScalarLit, b: &ScalarLit| match (a, b) {
            (ScalarLit::PointerVar(p), ScalarLit::Null) => Some(*p),
            _ => None,
        };
        if let Some(p) = pointer_and_null(left, right).or_else(|| pointer_and_null(right, left)) {
            return match op {
                CompareOp::PointerEq => update_pointers(&mem, |ptrs| ptrs.assert_null(&p)),
                CompareOp::PointerNe => update_pointers(&mem, |ptrs| ptrs.assert_non_null(&p)),
                _ => mem,
            };
        }
        if let (ScalarLit::PointerVar(p), ScalarLit::PointerVar(q), CompareOp::PointerEq) = (left, right, op) {
            let p_pts = mem.points_to(p);
            let q_pts = mem.points_to(q);
            let refined = p_pts.meet(&q_pts);
            return update_pointers(&mem, |ptrs| ptrs.refine(p, refined.clone()).refine(q, refined));
        }
        mem
    }

    fn refine_numeric_comparison<N: NumericalDomain>(
        &self,
        op: CompareOp,
        left: &ScalarLit,
        right: &ScalarLit,
        mem: &MemoryDomain<N>,
    ) -> MemoryDomain<N> {
        let constraint = match (left.as_variable(), right.as_variable()) {
            (Some(l), Some(r)) => linear_constraint_var_var(op, l, r),
            (Some(l), None) => scalar_constant(right).and_then(|rhs| linear_constraint_var_const(op, l, rhs)),
            (None, Some(r)) => scalar_constant(left).and_then(|lhs| linear_constraint_var_const(flip_compare(op), r, lhs)),
            (None, None) => None,
        };
        match constraint {
            Some(c) => with_numerical(mem, |n| n.add_with_cycles(&[c], self.max_cycles)),
            None => mem.clone(),
        }
    }
}

fn scalar_constant(lit: &ScalarLit) -> Option<Z> {
    match lit {
        ScalarLit::Integer(m) => Some(z_of_machine_int(m)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_ar::{DataLayout, Endianness, FunctionId, GlobalVariableId, IntrinsicId, MemoryLocationFactory, TypeId, Variable, VariableKind};
    use ikos_domains::IntervalDomain;
    use quickcheck_macros::quickcheck;

    type State = AbstractState<IntervalDomain>;

    fn layout() -> DataLayout {
        DataLayout::new(Endianness::Little, Width::W64)
    }

    fn function_with(locals: Vec<Variable>) -> Function {
        Function {
            id: FunctionId(0),
            name: "f".into(),
            parameters: Vec::new(),
            locals,
            return_type: None,
            code: None,
            intrinsic_id: IntrinsicId::NotIntrinsic,
        }
    }

    fn int_var(id: u32, width: Width) -> Variable {
        Variable { id: VariableId(id), name: format!("v{id}"), kind: VariableKind::Integer(width), ty: TypeId(0) }
    }

    #[test]
    fn assignment_of_a_constant_pins_an_exact_interval() {
        let layout = layout();
        let locations = MemoryLocationFactory::new();
        let engine = NumericalExecutionEngine::new(&layout, &locations);
        let function = function_with(vec![int_var(0, Width::W32)]);
        let stmt = Statement::Assignment {
            result: VariableId(0),
            operand: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(7, Width::W32, Sign::Unsigned))),
        };
        let state = engine.execute(&stmt, State::top(), &function).unwrap();
        let n = state.normal.pointers().unwrap().numerical().unwrap();
        assert_eq!(n.to_interval(&VariableId(0)), Interval::singleton(Z::from_i64(7)));
    }

    #[test]
    fn binary_add_widens_to_the_sum_of_both_intervals() {
        let layout = layout();
        let locations = MemoryLocationFactory::new();
        let engine = NumericalExecutionEngine::new(&layout, &locations);
        let function = function_with(vec![int_var(0, Width::W32), int_var(1, Width::W32), int_var(2, Width::W32)]);
        let assign_a = Statement::Assignment {
            result: VariableId(0),
            operand: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(3, Width::W32, Sign::Unsigned))),
        };
        let assign_b = Statement::Assignment {
            result: VariableId(1),
            operand: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(4, Width::W32, Sign::Unsigned))),
        };
        let add = Statement::BinaryOperation {
            result: VariableId(2),
            op: BinaryOp::Add,
            left: ValueOperand::Variable(VariableId(0)),
            right: ValueOperand::Variable(VariableId(1)),
        };
        let state = engine.execute(&assign_a, State::top(), &function).unwrap();
        let state = engine.execute(&assign_b, state, &function).unwrap();
        let state = engine.execute(&add, state, &function).unwrap();
        let n = state.normal.pointers().unwrap().numerical().unwrap();
        assert_eq!(n.to_interval(&VariableId(2)), Interval::singleton(Z::from_i64(7)));
    }

    #[test]
    fn allocate_then_store_then_load_round_trips_through_the_store() {
        let layout = layout();
        let locations = MemoryLocationFactory::new();
        let engine = NumericalExecutionEngine::new(&layout, &locations);
        let function = function_with(vec![
            Variable { id: VariableId(0), name: "p".into(), kind: VariableKind::Pointer, ty: TypeId(0) },
            int_var(1, Width::W32),
        ]);
        let alloc = Statement::Allocate { result: VariableId(0), size: None };
        let assign = Statement::Assignment {
            result: VariableId(1),
            operand: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(9, Width::W32, Sign::Unsigned))),
        };
        let store = Statement::Store {
            pointer: ValueOperand::Variable(VariableId(0)),
            value: ValueOperand::Variable(VariableId(1)),
            access_size: 4,
        };
        let load = Statement::Load { result: VariableId(1), pointer: ValueOperand::Variable(VariableId(0)), access_size: 4 };
        let state = engine.execute(&alloc, State::top(), &function).unwrap();
        let state = engine.execute(&assign, state, &function).unwrap();
        let state = engine.execute(&store, state, &function).unwrap();
        let state = engine.execute(&load, state, &function).unwrap();
        let n = state.normal.pointers().unwrap().numerical().unwrap();
        assert_eq!(n.to_interval(&VariableId(1)), Interval::singleton(Z::from_i64(9)));
    }

    #[test]
    fn division_by_constant_zero_is_locally_infeasible_not_a_structural_error() {
        let layout = layout();
        let locations = MemoryLocationFactory::new();
        let engine = NumericalExecutionEngine::new(&layout, &locations);
        let function = function_with(vec![int_var(0, Width::W32)]);
        let rem = Statement::BinaryOperation {
            result: VariableId(0),
            op: BinaryOp::URem,
            left: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(10, Width::W32, Sign::Unsigned))),
            right: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::zero(Width::W32, Sign::Unsigned))),
        };
        let state = engine.execute(&rem, State::top(), &function).unwrap();
        assert!(state.is_bottom());
    }

    #[test]
    fn analyze_edge_on_the_false_branch_negates_the_comparison() {
        let layout = layout();
        let locations = MemoryLocationFactory::new();
        let engine = NumericalExecutionEngine::new(&layout, &locations);
        let function = function_with(vec![int_var(0, Width::W32)]);
        let assign = Statement::Assignment {
            result: VariableId(0),
            operand: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(5, Width::W32, Sign::Unsigned))),
        };
        let state = engine.execute(&assign, State::top(), &function).unwrap();
        let left = ValueOperand::Variable(VariableId(0));
        let right = ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(5, Width::W32, Sign::Unsigned)));
        let false_branch = engine
            .analyze_edge(CompareOp::Eq, &left, &right, false, state, &function)
            .unwrap();
        assert!(false_branch.is_bottom());
    }

    // Constant-folded `Add` must agree with wrapping `u32` arithmetic for
    // every pair of operands, not just the handful the unit tests above
    // pick by hand.
    #[quickcheck]
    fn add_of_two_constants_matches_wrapping_u32_arithmetic(a: u32, b: u32) -> bool {
        let layout = layout();
        let locations = MemoryLocationFactory::new();
        let engine = NumericalExecutionEngine::new(&layout, &locations);
        let function = function_with(vec![int_var(0, Width::W32)]);
        let add = Statement::BinaryOperation {
            result: VariableId(0),
            op: BinaryOp::Add,
            left: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(a as u128, Width::W32, Sign::Unsigned))),
            right: ValueOperand::Constant(ikos_ar::Constant::Integer(MachineInt::from_u128(b as u128, Width::W32, Sign::Unsigned))),
        };
        let Ok(state) = engine.execute(&add, State::top(), &function) else {
            return false;
        };
        let n = state.normal.pointers().unwrap().numerical().unwrap();
        let expected = Z::from_u64(a.wrapping_add(b) as u64);
        n.to_interval(&VariableId(0)).as_singleton() == Some(&expected)
    }
}
