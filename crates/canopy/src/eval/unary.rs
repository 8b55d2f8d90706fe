//! Unary operation evaluation

use crate::ast::{ExprRef, UnaryOp};
use crate::{Environment, EvalContext, EvalError, Value};

use super::{lift, Evaluate};

/// Evaluate `op operand`.
pub fn eval_unary(
    op: UnaryOp,
    operand: &ExprRef,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let value = operand.eval(env, ctx)?;
    apply_unary(op, value)
}

/// Apply `op` to a value, lifting over a promise.
pub fn apply_unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    if value.is_promise() {
        return Ok(lift(vec![value], move |operands| {
            match operands.into_iter().next() {
                Some(value) => compute(op, value),
                None => Err(EvalError::type_error(op.symbol(), Vec::new())),
            }
        }));
    }
    compute(op, value)
}

fn compute(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, &value) {
        (UnaryOp::Neg, Value::Integer(n)) => {
            n.checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| EvalError::IntegerOverflow {
                    operation: op.symbol().to_string(),
                })
        }
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::BitNot, Value::Integer(n)) => Ok(Value::Integer(!n)),
        (UnaryOp::BitNot, Value::Byte(b)) => Ok(Value::Byte(!b)),
        _ => Err(EvalError::type_error(op.symbol(), vec![value])),
    }
}
