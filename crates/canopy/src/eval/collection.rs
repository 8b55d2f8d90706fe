//! Tuple, sequence, set, and dictionary constructors
//!
//! Tuples and sequences hold their elements as they are, pending or not:
//! building one does not need the element values. Sets and dictionaries
//! hash their elements, so they wait for pending elements to resolve.

use crate::ast::ExprRef;
use crate::{Environment, EvalContext, EvalError, Value};

use super::{any_pending, lift, Evaluate};

fn eval_all(
    items: &[ExprRef],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Vec<Value>, EvalError> {
    items.iter().map(|item| item.eval(env, ctx)).collect()
}

/// `(a, b, ...)`
pub fn eval_tuple(
    items: &[ExprRef],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    Ok(Value::tuple(eval_all(items, env, ctx)?))
}

/// `[a, b, ...]`
pub fn eval_sequence(
    items: &[ExprRef],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    Ok(Value::sequence(eval_all(items, env, ctx)?))
}

/// `{a, b, ...}`
pub fn eval_set(
    items: &[ExprRef],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let values = eval_all(items, env, ctx)?;
    if any_pending(&values) {
        return Ok(lift(values, |resolved| Ok(Value::set(resolved))));
    }
    Ok(Value::set(values))
}

/// `{k1 = v1, k2 = v2, ...}`
pub fn eval_dict(
    pairs: &[(ExprRef, ExprRef)],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut flat = Vec::with_capacity(pairs.len() * 2);
    for (key, value) in pairs {
        flat.push(key.eval(env, ctx)?);
        flat.push(value.eval(env, ctx)?);
    }
    if any_pending(&flat) {
        return Ok(lift(flat, |resolved| Ok(dict_of_flat(resolved))));
    }
    Ok(dict_of_flat(flat))
}

fn dict_of_flat(flat: Vec<Value>) -> Value {
    let mut values = flat.into_iter();
    let mut pairs = Vec::new();
    while let (Some(key), Some(value)) = (values.next(), values.next()) {
        pairs.push((key, value));
    }
    Value::dict(pairs)
}
