//! Local binding (`let ... in`) evaluation

use std::sync::Arc;

use crate::ast::{Expr, ExprRef, LetBinding, Pattern};
use crate::{Environment, EvalContext, EvalError, Value};

use super::function::eval_lambda;
use super::pattern::bind_then;
use super::Evaluate;

/// Evaluate `let p1 = e1; p2 = e2 in body`.
///
/// Bindings are evaluated in order, each seeing the ones before it, and
/// live only for the body.
///
/// # Errors
///
/// Returns `NoMatch` if a binding's pattern does not match its value.
pub fn eval_let(
    bindings: &Arc<[LetBinding]>,
    body: &ExprRef,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut scope = env.scope_guard();
    bind_from(Arc::clone(bindings), 0, ExprRef::clone(body), &mut scope, ctx)
}

fn bind_from(
    bindings: Arc<[LetBinding]>,
    index: usize,
    body: ExprRef,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let Some(binding) = bindings.get(index) else {
        return body.eval(env, ctx);
    };

    // A lambda bound to a plain name takes that name, so it can recurse
    let value = match (&binding.pattern, &*binding.value) {
        (Pattern::Binding(name), Expr::Lambda(lambda)) => {
            eval_lambda(lambda, Some(name.as_str()), env)?
        }
        _ => binding.value.eval(env, ctx)?,
    };
    let pattern = binding.pattern.clone();

    bind_then(value, &pattern, env, ctx, move |env, ctx| {
        bind_from(bindings, index + 1, body, env, ctx)
    })
}
