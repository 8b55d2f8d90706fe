//! `async` evaluation
//!
//! `async f` submits the zero-argument function `f` to the context's task
//! executor and returns a pending promise at once. The task settles the
//! promise with whatever the call produces; a panic inside the task
//! becomes a task failure instead of a promise left pending forever.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::ast::ExprRef;
use crate::promise::Promise;
use crate::{Environment, EvalContext, EvalError, FunctionValue, Value};

use super::call::invoke;
use super::{when_ready, Evaluate};

/// Evaluate `async function`.
///
/// # Errors
///
/// Returns `ArityMismatch` if the function takes arguments, `TypeError`
/// if the operand is not a function.
pub fn eval_async(
    function: &ExprRef,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let function = function.eval(env, ctx)?;
    when_ready(function, env, ctx, |function, env, ctx| match function {
        Value::Function(func) if func.arity() == 0 => Ok(Value::Promise(submit(func, env, ctx))),
        Value::Function(func) => Err(EvalError::ArityMismatch {
            function: func.qualified_name(),
            expected: 0,
            got: func.arity(),
        }),
        other => Err(EvalError::type_error("async", vec![other])),
    })
}

fn submit(func: Arc<FunctionValue>, env: &Environment, ctx: &EvalContext) -> Promise {
    let promise = Promise::new();
    let target = promise.clone();
    let caller = env.clone();
    let task_ctx = ctx.clone();
    let name = func.qualified_name();

    tracing::debug!(function = %name, task = promise.id(), "submitting async task");
    let submitted = ctx.executor.submit(Box::new(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            invoke(&func, Vec::new(), None, &caller, &task_ctx)
        }))
        .unwrap_or_else(|payload| {
            Err(EvalError::TaskFailed {
                message: panic_message(payload.as_ref()),
            })
        });
        tracing::debug!(task = target.id(), ok = outcome.is_ok(), "async task finished");
        target.fulfil(outcome);
    }));

    if let Err(err) = submitted {
        tracing::warn!(function = %name, error = %err, "async task was not submitted");
        promise.fulfil(Err(err));
    }
    promise
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "task panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::task::InlineExecutor;
    use pretty_assertions::assert_eq;

    fn inline() -> EvalContext {
        EvalContext::new().with_executor(Arc::new(InlineExecutor))
    }

    #[test]
    fn test_async_returns_promise() {
        let mut env = Environment::new();
        let ctx = inline();
        let spawned = Expr::spawn(Expr::lambda(&[], Expr::int(5)));
        let Value::Promise(promise) = spawned.eval(&mut env, &ctx).unwrap() else {
            panic!("expected a promise");
        };
        assert_eq!(promise.wait().unwrap(), Value::Integer(5));
    }

    #[test]
    fn test_async_requires_zero_arguments() {
        let mut env = Environment::new();
        let ctx = inline();
        let spawned = Expr::spawn(Expr::lambda(&["x"], Expr::ident("x")));
        assert!(matches!(
            spawned.eval(&mut env, &ctx),
            Err(EvalError::ArityMismatch { expected: 0, got: 1, .. })
        ));
    }

    #[test]
    fn test_async_requires_function() {
        let mut env = Environment::new();
        let ctx = inline();
        assert!(matches!(
            Expr::spawn(Expr::int(1)).eval(&mut env, &ctx),
            Err(EvalError::TypeError { .. })
        ));
    }

    #[test]
    fn test_panicking_native_fails_task() {
        let mut env = Environment::new();
        env.define(
            "explode",
            Value::function(FunctionValue::native("explode", 0, |_| panic!("kaboom"))),
        );
        let ctx = inline();
        let Value::Promise(promise) = Expr::spawn(Expr::ident("explode")).eval(&mut env, &ctx).unwrap()
        else {
            panic!("expected a promise");
        };
        match promise.wait() {
            Err(EvalError::TaskFailed { message }) => assert_eq!(message, "kaboom"),
            other => panic!("expected task failure, got {:?}", other),
        }
    }
}
