//! `raise` and `try`/`catch` evaluation

use std::sync::Arc;

use crate::ast::{CaseArm, ExprRef};
use crate::{Environment, EvalContext, EvalError, Symbol, Value};

use super::match_expr::{select, Case, Unmatched};
use super::{when_ready, Evaluate};

/// Evaluate `raise :tag message`.
///
/// The error records the call stack at the raise point.
pub fn eval_raise(
    tag: &Symbol,
    message: &ExprRef,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let message = message.eval(env, ctx)?;
    let tag = tag.clone();
    when_ready(message, env, ctx, move |message, env, _| {
        match message.as_string() {
            Some(text) => Err(EvalError::UserRaised {
                tag,
                message: text,
                stack: env.stack_trace(),
            }),
            None => Err(EvalError::type_error("raise", vec![message])),
        }
    })
}

/// Evaluate `try body catch arms`.
///
/// A failure of `body`, immediate or delivered later through a promise, is
/// rendered as a `(tag, message, stack)` tuple and matched against the
/// arms. When no arm matches, the original error propagates. Interruption
/// is never caught.
pub fn eval_try(
    body: &ExprRef,
    arms: &Arc<[CaseArm]>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let outcome = {
        let mut scope = env.scope_guard();
        body.eval(&mut scope, ctx)
    };

    match outcome {
        Ok(Value::Promise(promise)) => {
            let arms = Arc::clone(arms);
            let mut env = env.clone();
            let ctx = ctx.clone();
            Ok(Value::Promise(promise.then(move |outcome| match outcome {
                Err(err) if err.is_catchable() => catch(err, arms, &mut env, &ctx),
                other => other,
            })))
        }
        Err(err) if err.is_catchable() => catch(err, Arc::clone(arms), env, ctx),
        other => other,
    }
}

fn catch(
    err: EvalError,
    arms: Arc<[CaseArm]>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    tracing::debug!(tag = %err.tag(), "handling error");
    let triple = err.to_triple(&env.stack_trace());
    select(Case::new(triple, arms, Unmatched::Rethrow(err)), 0, env, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, Pattern};
    use crate::promise::Promise;
    use pretty_assertions::assert_eq;

    fn tag_handler() -> CaseArm {
        CaseArm::new(
            Pattern::tuple(vec![Pattern::bind("tag"), Pattern::bind("msg"), Pattern::Wildcard]),
            Expr::tuple(vec![Expr::ident("tag"), Expr::ident("msg")]),
        )
    }

    #[test]
    fn test_raise_carries_tag_and_message() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        let err = Expr::raise("random_error", Expr::text("bad luck"))
            .eval(&mut env, &ctx)
            .unwrap_err();
        assert_eq!(err.tag().name(), "random_error");
        assert_eq!(err.message(), "bad luck");
    }

    #[test]
    fn test_raise_requires_text() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        assert!(matches!(
            Expr::raise("oops", Expr::int(1)).eval(&mut env, &ctx),
            Err(EvalError::TypeError { .. })
        ));
    }

    #[test]
    fn test_catch_user_error() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        let expr = Expr::try_catch(
            Expr::raise("random_error", Expr::text("bad luck")),
            vec![tag_handler()],
        );
        assert_eq!(
            expr.eval(&mut env, &ctx).unwrap(),
            Value::tuple(vec![Value::symbol("random_error"), Value::string("bad luck")])
        );
    }

    #[test]
    fn test_catch_system_error() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        let expr = Expr::try_catch(
            Expr::binary(BinaryOp::Div, Expr::int(1), Expr::int(0)),
            vec![CaseArm::new(
                Pattern::tuple(vec![Pattern::lit(Value::symbol("arithmetic")), Pattern::Wildcard, Pattern::Wildcard]),
                Expr::text("caught"),
            )],
        );
        assert_eq!(expr.eval(&mut env, &ctx).unwrap(), Value::string("caught"));
    }

    #[test]
    fn test_unmatched_error_is_rethrown() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        let expr = Expr::try_catch(
            Expr::raise("mine", Expr::text("kept")),
            vec![CaseArm::new(
                Pattern::tuple(vec![Pattern::lit(Value::symbol("other")), Pattern::Wildcard, Pattern::Wildcard]),
                Expr::int(0),
            )],
        );
        let err = expr.eval(&mut env, &ctx).unwrap_err();
        assert_eq!(err.tag().name(), "mine");
    }

    #[test]
    fn test_catch_failed_promise() {
        let pending = Promise::new();
        let mut env = Environment::new();
        env.define("later", Value::Promise(pending.clone()));
        let ctx = EvalContext::new();
        let expr = Expr::try_catch(Expr::ident("later"), vec![tag_handler()]);

        let Value::Promise(result) = expr.eval(&mut env, &ctx).unwrap() else {
            panic!("expected a promise");
        };
        pending.fulfil(Err(EvalError::DivisionByZero));
        assert_eq!(
            result.wait().unwrap(),
            Value::tuple(vec![Value::symbol("arithmetic"), Value::string("Division by zero")])
        );
    }

    #[test]
    fn test_interrupt_is_not_caught() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        ctx.interrupt();
        let expr = Expr::try_catch(Expr::int(1), vec![tag_handler()]);
        assert!(matches!(expr.eval(&mut env, &ctx), Err(EvalError::Interrupted)));
    }
}
