//! `do` block evaluation

use std::sync::Arc;

use crate::ast::DoStep;
use crate::{Environment, EvalContext, EvalError, Value};

use super::pattern::bind_then;
use super::{when_ready, Evaluate};

/// Evaluate `do step; step; ... end`.
///
/// Steps run in order and the block yields the value of its last step
/// (unit when empty). A step that produces a pending promise holds back
/// the steps after it until the promise resolves, so effects keep their
/// order; a failure skips the remaining steps.
pub fn eval_do(
    steps: &Arc<[DoStep]>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut scope = env.scope_guard();
    run_from(Arc::clone(steps), 0, &mut scope, ctx)
}

fn run_from(
    steps: Arc<[DoStep]>,
    index: usize,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let Some(step) = steps.get(index) else {
        return Ok(Value::Unit);
    };
    let last = index + 1 == steps.len();

    match step {
        DoStep::Bind(binding) => {
            let value = binding.value.eval(env, ctx)?;
            let pattern = binding.pattern.clone();
            if last {
                let result = value.clone();
                return bind_then(value, &pattern, env, ctx, move |_, _| Ok(result));
            }
            bind_then(value, &pattern, env, ctx, move |env, ctx| {
                run_from(steps, index + 1, env, ctx)
            })
        }
        DoStep::Eval(expr) => {
            let value = expr.eval(env, ctx)?;
            if last {
                return Ok(value);
            }
            when_ready(value, env, ctx, move |_, env, ctx| {
                run_from(steps, index + 1, env, ctx)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, LetBinding, Pattern};
    use crate::promise::Promise;
    use pretty_assertions::assert_eq;

    fn steps(steps: Vec<DoStep>) -> Arc<[DoStep]> {
        steps.into()
    }

    #[test]
    fn test_empty_block_is_unit() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        assert_eq!(eval_do(&steps(vec![]), &mut env, &ctx).unwrap(), Value::Unit);
    }

    #[test]
    fn test_binds_flow_into_later_steps() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        let block = steps(vec![
            DoStep::Bind(LetBinding::new(Pattern::bind("a"), Expr::int(20))),
            DoStep::Eval(Expr::int(0)),
            DoStep::Eval(Expr::binary(BinaryOp::Add, Expr::ident("a"), Expr::int(1))),
        ]);
        assert_eq!(eval_do(&block, &mut env, &ctx).unwrap(), Value::Integer(21));
        assert!(!env.contains("a"));
    }

    #[test]
    fn test_pending_step_holds_back_rest() {
        let pending = Promise::new();
        let mut env = Environment::new();
        env.define("later", Value::Promise(pending.clone()));
        let ctx = EvalContext::new();
        let block = steps(vec![DoStep::Eval(Expr::ident("later")), DoStep::Eval(Expr::int(2))]);

        let Value::Promise(result) = eval_do(&block, &mut env, &ctx).unwrap() else {
            panic!("expected a promise");
        };
        assert!(result.is_pending());
        pending.fulfil(Ok(Value::Unit));
        assert_eq!(result.peek().unwrap().unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_failed_step_skips_rest() {
        let mut env = Environment::new();
        env.define("failed", Value::Promise(Promise::failed(EvalError::DivisionByZero)));
        let ctx = EvalContext::new();
        let block = steps(vec![DoStep::Eval(Expr::ident("failed")), DoStep::Eval(Expr::int(2))]);

        let Value::Promise(result) = eval_do(&block, &mut env, &ctx).unwrap() else {
            panic!("expected a promise");
        };
        assert!(matches!(result.peek(), Some(Err(EvalError::DivisionByZero))));
    }
}
