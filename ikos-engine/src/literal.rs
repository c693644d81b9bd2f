//! The literal factory (spec §6): translates an AR [`ValueOperand`] into
//! either a [`ScalarLit`] or an [`AggregateLit`], the shapes the transfer
//! function and checkers actually read values through instead of matching
//! on [`Constant`] variants directly everywhere.

use ikos_ar::{Constant, Function, ValueOperand, VariableId, VariableKind};
use ikos_num::MachineInt;

use crate::error::{AnalysisError, AnalysisResult};

/// A scalar value as seen by the numerical/pointer domains.
#[derive(Debug, Clone)]
pub enum ScalarLit {
    Undefined,
    Integer(MachineInt),
    /// Only the bit pattern is kept (spec §1 Non-goals: no float semantics).
    FloatingPoint(u64),
    Null,
    PointerVar(VariableId),
    IntegerVar(VariableId),
    FloatingPointVar(VariableId),
}

impl ScalarLit {
    pub fn as_variable(&self) -> Option<VariableId> {
        match self {
            ScalarLit::PointerVar(v) | ScalarLit::IntegerVar(v) | ScalarLit::FloatingPointVar(v) => Some(*v),
            _ => None,
        }
    }
}

/// An aggregate (struct/array/vector) value.
#[derive(Debug, Clone)]
pub enum AggregateLit {
    Cst(Vec<ScalarLit>),
    Zero,
    Undefined,
    Var(VariableId),
}

pub(crate) fn variable_kind(function: &Function, id: VariableId) -> Option<VariableKind> {
    function.locals.iter().find(|v| v.id == id).map(|v| v.kind)
}

/// Stateless translator from `ValueOperand` to `ScalarLit`/`AggregateLit`;
/// takes the owning `Function` per call since a variable's kind is only
/// resolvable against its declaring function's local table (spec §6).
pub struct LiteralFactory;

impl LiteralFactory {
    pub fn new() -> Self {
        LiteralFactory
    }

    pub fn scalar(&self, operand: &ValueOperand, function: &Function) -> AnalysisResult<ScalarLit> {
        match operand {
            ValueOperand::Variable(id) => match variable_kind(function, *id) {
                Some(VariableKind::Pointer) => Ok(ScalarLit::PointerVar(*id)),
                Some(VariableKind::Integer(_)) => Ok(ScalarLit::IntegerVar(*id)),
                Some(VariableKind::Float) => Ok(ScalarLit::FloatingPointVar(*id)),
                Some(VariableKind::Aggregate) | None => Err(AnalysisError::UnexpectedOperand(format!(
                    "{id:?} is not a scalar variable of function {:?}",
                    function.id
                ))),
            },
            ValueOperand::Constant(c) => match c {
                Constant::Integer(m) => Ok(ScalarLit::Integer(*m)),
                Constant::Float(bits) => Ok(ScalarLit::FloatingPoint(*bits)),
                Constant::Null => Ok(ScalarLit::Null),
                Constant::Undefined => Ok(ScalarLit::Undefined),
                other => Err(AnalysisError::UnexpectedOperand(format!(
                    "{other:?} used where a scalar literal was expected"
                ))),
            },
        }
    }

    /// Aggregate-typed operand (spec §6); constant fields never reference
    /// variables, so no owning `Function` is needed here unlike `scalar`.
    pub fn aggregate(&self, operand: &ValueOperand) -> AnalysisResult<AggregateLit> {
        match operand {
            ValueOperand::Variable(id) => Ok(AggregateLit::Var(*id)),
            ValueOperand::Constant(Constant::Undefined) => Ok(AggregateLit::Undefined),
            ValueOperand::Constant(Constant::AggregateZero(_)) => Ok(AggregateLit::Zero),
            ValueOperand::Constant(Constant::Struct(fields) | Constant::Array(fields) | Constant::Vector(fields)) => {
                Ok(AggregateLit::Cst(fields.iter().map(constant_to_scalar).collect()))
            }
            other => Err(AnalysisError::UnexpectedOperand(format!(
                "{other:?} used where an aggregate literal was expected"
            ))),
        }
    }
}

impl Default for LiteralFactory {
    fn default() -> Self {
        LiteralFactory::new()
    }
}

/// Best-effort scalar view of a constant nested inside an aggregate; a
/// further-nested aggregate field collapses to `Undefined` rather than
/// recursing (spec's `AggregateLit::cst` takes a flat field list).
fn constant_to_scalar(c: &Constant) -> ScalarLit {
    match c {
        Constant::Integer(m) => ScalarLit::Integer(*m),
        Constant::Float(bits) => ScalarLit::FloatingPoint(*bits),
        Constant::Null => ScalarLit::Null,
        _ => ScalarLit::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikos_ar::Variable;
    use ikos_num::Width;

    fn function_with(kind: VariableKind) -> Function {
        Function {
            id: ikos_ar::FunctionId(0),
            name: "f".into(),
            parameters: Vec::new(),
            locals: vec![Variable {
                id: VariableId(0),
                name: "x".into(),
                kind,
                ty: ikos_ar::TypeId(0),
            }],
            return_type: None,
            code: None,
            intrinsic_id: ikos_ar::IntrinsicId::NotIntrinsic,
        }
    }

    #[test]
    fn pointer_variable_resolves_to_pointer_var() {
        let f = function_with(VariableKind::Pointer);
        let lit = LiteralFactory::new()
            .scalar(&ValueOperand::Variable(VariableId(0)), &f)
            .unwrap();
        assert!(matches!(lit, ScalarLit::PointerVar(v) if v == VariableId(0)));
    }

    #[test]
    fn integer_constant_resolves_directly() {
        let f = function_with(VariableKind::Integer(Width::W32));
        let operand = ValueOperand::Constant(Constant::Integer(MachineInt::zero(
            Width::W32,
            ikos_num::Sign::Unsigned,
        )));
        let lit = LiteralFactory::new().scalar(&operand, &f).unwrap();
        assert!(matches!(lit, ScalarLit::Integer(_)));
    }

    #[test]
    fn aggregate_variable_resolves_to_var() {
        let lit = LiteralFactory::new()
            .aggregate(&ValueOperand::Variable(VariableId(3)))
            .unwrap();
        assert!(matches!(lit, AggregateLit::Var(v) if v == VariableId(3)));
    }
}
