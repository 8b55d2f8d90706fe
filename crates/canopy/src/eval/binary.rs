//! Binary operation evaluation
//!
//! Every operator is a dispatch over concrete operand variants. When an
//! operand is a promise, the whole operation is lifted: it waits for all
//! operands and then runs the same concrete dispatch, so a lifted result
//! always equals the synchronous result on the resolved values.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, ExprRef};
use crate::value::collections::{
    dict_intersection, dict_symmetric_difference, dict_union, set_intersection,
    set_symmetric_difference, set_union,
};
use crate::{Environment, EvalContext, EvalError, Value};

use super::{lift, when_ready, Evaluate};

/// Evaluate `left op right`.
///
/// `&&` and `||` short-circuit: the right operand is evaluated only when
/// the left one does not decide the result.
pub fn eval_binary(
    op: BinaryOp,
    left: &ExprRef,
    right: &ExprRef,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        return eval_logical(op, left, right, env, ctx);
    }

    // Evaluate both operands
    let left = left.eval(env, ctx)?;
    let right = right.eval(env, ctx)?;
    apply_binary(op, left, right)
}

/// Apply `op` to two values, lifting over promises.
pub fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    if left.is_promise() || right.is_promise() {
        return Ok(lift(vec![left, right], move |operands| {
            let mut operands = operands.into_iter();
            match (operands.next(), operands.next()) {
                (Some(left), Some(right)) => compute(op, left, right),
                _ => Err(EvalError::type_error(op.symbol(), Vec::new())),
            }
        }));
    }
    compute(op, left, right)
}

/// Concrete dispatch.
fn compute(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        // Arithmetic
        BinaryOp::Add => eval_add(left, right),
        BinaryOp::Sub => eval_sub(left, right),
        BinaryOp::Mul => eval_mul(left, right),
        BinaryOp::Div => eval_div(left, right),
        BinaryOp::Rem => eval_rem(left, right),

        // Comparison
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => eval_compare(op, left, right),

        // Logical, when both sides are already values
        BinaryOp::And | BinaryOp::Or => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(mismatch(op, left, right)),
        },

        // Bitwise and collection algebra
        BinaryOp::BitAnd => eval_bitand(left, right),
        BinaryOp::BitOr => eval_bitor(left, right),
        BinaryOp::BitXor => eval_bitxor(left, right),
        BinaryOp::Shl | BinaryOp::Shr => eval_shift(op, left, right),

        // Sequences
        BinaryOp::Join => eval_join(left, right),
        BinaryOp::ConsLeft => eval_cons_left(left, right),
        BinaryOp::ConsRight => eval_cons_right(left, right),
        BinaryOp::In => eval_in(left, right),
    }
}

fn mismatch(op: BinaryOp, left: Value, right: Value) -> EvalError {
    EvalError::type_error(op.symbol(), vec![left, right])
}

fn overflow(op: BinaryOp) -> EvalError {
    EvalError::IntegerOverflow {
        operation: op.symbol().to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Logical Operations (Short-Circuit)
// ═══════════════════════════════════════════════════════════════════════

fn eval_logical(
    op: BinaryOp,
    left: &ExprRef,
    right: &ExprRef,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let left = left.eval(env, ctx)?;
    let right = ExprRef::clone(right);
    when_ready(left, env, ctx, move |left, env, ctx| {
        let decided = match (&left, op) {
            (Value::Bool(false), BinaryOp::And) => Some(false),
            (Value::Bool(true), BinaryOp::Or) => Some(true),
            (Value::Bool(_), _) => None,
            _ => return Err(EvalError::type_error(op.symbol(), vec![left])),
        };
        match decided {
            Some(result) => Ok(Value::Bool(result)),
            None => {
                let right = right.eval(env, ctx)?;
                when_ready(right, env, ctx, move |right, _, _| match right {
                    Value::Bool(b) => Ok(Value::Bool(b)),
                    other => Err(EvalError::type_error(op.symbol(), vec![other])),
                })
            }
        }
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic Operations
// ═══════════════════════════════════════════════════════════════════════

/// Integer, byte, and float implementations of one arithmetic operator.
struct Arithmetic {
    op: BinaryOp,
    integer: fn(i64, i64) -> Option<i64>,
    byte: fn(u8, u8) -> Option<u8>,
    float: fn(f64, f64) -> f64,
}

impl Arithmetic {
    fn apply(&self, left: Value, right: Value) -> Result<Value, EvalError> {
        match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => (self.integer)(*a, *b)
                .map(Value::Integer)
                .ok_or_else(|| overflow(self.op)),
            (Value::Byte(a), Value::Byte(b)) => (self.byte)(*a, *b)
                .map(Value::Byte)
                .ok_or_else(|| overflow(self.op)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float((self.float)(*a, *b))),
            _ => Err(mismatch(self.op, left, right)),
        }
    }
}

fn eval_add(left: Value, right: Value) -> Result<Value, EvalError> {
    Arithmetic {
        op: BinaryOp::Add,
        integer: i64::checked_add,
        byte: u8::checked_add,
        float: |a, b| a + b,
    }
    .apply(left, right)
}

fn eval_sub(left: Value, right: Value) -> Result<Value, EvalError> {
    Arithmetic {
        op: BinaryOp::Sub,
        integer: i64::checked_sub,
        byte: u8::checked_sub,
        float: |a, b| a - b,
    }
    .apply(left, right)
}

fn eval_mul(left: Value, right: Value) -> Result<Value, EvalError> {
    Arithmetic {
        op: BinaryOp::Mul,
        integer: i64::checked_mul,
        byte: u8::checked_mul,
        float: |a, b| a * b,
    }
    .apply(left, right)
}

fn eval_div(left: Value, right: Value) -> Result<Value, EvalError> {
    if is_exact_zero(&right) {
        return match left {
            Value::Integer(_) | Value::Byte(_) if same_variant(&left, &right) => {
                Err(EvalError::DivisionByZero)
            }
            _ => Err(mismatch(BinaryOp::Div, left, right)),
        };
    }
    Arithmetic {
        op: BinaryOp::Div,
        integer: i64::checked_div,
        byte: u8::checked_div,
        float: |a, b| a / b,
    }
    .apply(left, right)
}

fn eval_rem(left: Value, right: Value) -> Result<Value, EvalError> {
    if is_exact_zero(&right) {
        return match left {
            Value::Integer(_) | Value::Byte(_) if same_variant(&left, &right) => {
                Err(EvalError::DivisionByZero)
            }
            _ => Err(mismatch(BinaryOp::Rem, left, right)),
        };
    }
    Arithmetic {
        op: BinaryOp::Rem,
        integer: i64::checked_rem,
        byte: u8::checked_rem,
        float: |a, b| a % b,
    }
    .apply(left, right)
}

fn is_exact_zero(value: &Value) -> bool {
    matches!(value, Value::Integer(0) | Value::Byte(0))
}

fn same_variant(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

// ═══════════════════════════════════════════════════════════════════════
// Comparison Operations
// ═══════════════════════════════════════════════════════════════════════

fn eval_compare(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let ordering = match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Byte(a), Value::Byte(b)) => a.partial_cmp(b),
        (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
        _ => return Err(mismatch(op, left, right)),
    };
    // NaN compares false with everything
    let result = ordering.is_some_and(|ordering| match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    });
    Ok(Value::Bool(result))
}

// ═══════════════════════════════════════════════════════════════════════
// Bitwise and Collection Algebra
// ═══════════════════════════════════════════════════════════════════════

fn eval_bitand(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a & b)),
        (Value::Byte(a), Value::Byte(b)) => Ok(Value::Byte(a & b)),
        (Value::Set(a), Value::Set(b)) => Ok(Value::Set(set_intersection(a, b))),
        (Value::Dict(a), Value::Dict(b)) => Ok(Value::Dict(dict_intersection(a, b))),
        _ => Err(mismatch(BinaryOp::BitAnd, left, right)),
    }
}

fn eval_bitor(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a | b)),
        (Value::Byte(a), Value::Byte(b)) => Ok(Value::Byte(a | b)),
        (Value::Set(a), Value::Set(b)) => Ok(Value::Set(set_union(a, b))),
        (Value::Dict(a), Value::Dict(b)) => Ok(Value::Dict(dict_union(a, b))),
        _ => Err(mismatch(BinaryOp::BitOr, left, right)),
    }
}

fn eval_bitxor(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a ^ b)),
        (Value::Byte(a), Value::Byte(b)) => Ok(Value::Byte(a ^ b)),
        (Value::Set(a), Value::Set(b)) => Ok(Value::Set(set_symmetric_difference(a, b))),
        (Value::Dict(a), Value::Dict(b)) => Ok(Value::Dict(dict_symmetric_difference(a, b))),
        _ => Err(mismatch(BinaryOp::BitXor, left, right)),
    }
}

fn eval_shift(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let shl = op == BinaryOp::Shl;
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let amount = u32::try_from(*b).map_err(|_| overflow(op))?;
            let shifted = if shl {
                a.checked_shl(amount)
            } else {
                a.checked_shr(amount)
            };
            shifted.map(Value::Integer).ok_or_else(|| overflow(op))
        }
        (Value::Byte(a), Value::Byte(b)) => {
            let amount = u32::from(*b);
            let shifted = if shl {
                a.checked_shl(amount)
            } else {
                a.checked_shr(amount)
            };
            shifted.map(Value::Byte).ok_or_else(|| overflow(op))
        }
        _ => Err(mismatch(op, left, right)),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Sequence Operations
// ═══════════════════════════════════════════════════════════════════════

fn eval_join(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Sequence(a), Value::Sequence(b)) => Ok(Value::Sequence(a.concat(b))),
        _ => Err(mismatch(BinaryOp::Join, left, right)),
    }
}

fn eval_cons_left(left: Value, right: Value) -> Result<Value, EvalError> {
    match right {
        Value::Sequence(seq) => Ok(Value::Sequence(seq.push_front(left))),
        right => Err(mismatch(BinaryOp::ConsLeft, left, right)),
    }
}

fn eval_cons_right(left: Value, right: Value) -> Result<Value, EvalError> {
    match left {
        Value::Sequence(seq) => Ok(Value::Sequence(seq.push_back(right))),
        left => Err(mismatch(BinaryOp::ConsRight, left, right)),
    }
}

fn eval_in(left: Value, right: Value) -> Result<Value, EvalError> {
    match &right {
        Value::Set(set) => Ok(Value::Bool(set.contains(&left))),
        Value::Dict(dict) => Ok(Value::Bool(dict.contains_key(&left))),
        Value::Sequence(seq) => Ok(Value::Bool(seq.contains(&left))),
        _ => Err(mismatch(BinaryOp::In, left, right)),
    }
}
