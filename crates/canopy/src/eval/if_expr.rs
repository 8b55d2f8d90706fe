//! Conditional evaluation

use crate::ast::ExprRef;
use crate::{Environment, EvalContext, EvalError, Value};

use super::{when_ready, Evaluate};

/// Evaluate `if condition then a else b`.
///
/// The condition must be a boolean. A pending condition defers the choice
/// of branch; the branch itself is evaluated only after it resolves.
pub fn eval_if(
    condition: &ExprRef,
    then_branch: &ExprRef,
    else_branch: &ExprRef,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let condition = condition.eval(env, ctx)?;
    let then_branch = ExprRef::clone(then_branch);
    let else_branch = ExprRef::clone(else_branch);
    when_ready(condition, env, ctx, move |condition, env, ctx| match condition {
        Value::Bool(true) => then_branch.eval(env, ctx),
        Value::Bool(false) => else_branch.eval(env, ctx),
        other => Err(EvalError::type_error("if", vec![other])),
    })
}
