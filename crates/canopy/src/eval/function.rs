//! Lambda evaluation

use std::sync::Arc;

use crate::ast::{ExprRef, Lambda};
use crate::{Environment, EvalError, FunctionValue, Value};

/// Name given to lambdas that are not bound by `let`.
pub(crate) const ANONYMOUS: &str = "$lambda";

/// Turn a lambda into a function value closing over `env`.
///
/// `name` is the `let` name the lambda is bound to, if any. A named
/// function sees itself under that name when called, which is how
/// recursion works.
pub fn eval_lambda(
    lambda: &Arc<Lambda>,
    name: Option<&str>,
    env: &Environment,
) -> Result<Value, EvalError> {
    let name = name.or(lambda.name.as_deref()).unwrap_or(ANONYMOUS);
    Ok(Value::function(FunctionValue::new(
        name,
        lambda.params.clone(),
        ExprRef::clone(&lambda.body),
        env.capture(),
    )))
}
