//! Identifier evaluation

use crate::{Environment, EvalError, Value};

/// Look up `name` in scope.
pub fn eval_identifier(name: &str, env: &Environment) -> Result<Value, EvalError> {
    env.get(name)
        .cloned()
        .ok_or_else(|| EvalError::undefined_identifier(name))
}
