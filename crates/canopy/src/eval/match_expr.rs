//! Case expression evaluation
//!
//! Arms are tried in source order. Each step that meets a pending promise
//! (a dictionary key, part of the scrutinee, a guard) registers the rest of
//! the selection as a continuation, so a case over an asynchronous value
//! behaves exactly like a case over the resolved value.

use std::sync::Arc;
use std::vec;

use crate::ast::{ArmBody, CaseArm, ExprRef};
use crate::promise::Promise;
use crate::{Environment, EvalContext, EvalError, Value};

use super::pattern::{apply_bindings, collect_keys, match_pattern, MatchBindings, Matching};
use super::{any_pending, when_ready, Evaluate};

/// What happens when no arm matches.
#[derive(Debug, Clone)]
pub(crate) enum Unmatched {
    /// Fail with a no-match error for the scrutinee
    NoMatch,
    /// Re-raise the error a `catch` was handling
    Rethrow(EvalError),
}

/// A case selection in progress.
#[derive(Debug)]
pub(crate) struct Case {
    value: Value,
    arms: Arc<[CaseArm]>,
    unmatched: Unmatched,
}

impl Case {
    pub(crate) fn new(value: Value, arms: Arc<[CaseArm]>, unmatched: Unmatched) -> Arc<Self> {
        Arc::new(Self {
            value,
            arms,
            unmatched,
        })
    }

    fn fall_through(&self) -> EvalError {
        match &self.unmatched {
            Unmatched::NoMatch => EvalError::no_match(&self.value),
            Unmatched::Rethrow(err) => err.clone(),
        }
    }
}

/// Evaluate `case scrutinee of arms`.
pub fn eval_case(
    scrutinee: &ExprRef,
    arms: &Arc<[CaseArm]>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let value = scrutinee.eval(env, ctx)?;
    let case = Case::new(value, Arc::clone(arms), Unmatched::NoMatch);
    select(case, 0, env, ctx)
}

/// Try arms from `index` onwards.
pub(crate) fn select(
    case: Arc<Case>,
    index: usize,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let Some(arm) = case.arms.get(index) else {
        return Err(case.fall_through());
    };
    let keys = collect_keys(&arm.pattern, env, ctx)?;
    if any_pending(&keys) {
        let keys = Value::Promise(Promise::all(keys));
        return when_ready(keys, env, ctx, move |keys, env, ctx| {
            let keys = keys.into_elements().unwrap_or_default();
            try_arm(case, index, keys, env, ctx)
        });
    }
    try_arm(case, index, keys, env, ctx)
}

fn try_arm(
    case: Arc<Case>,
    index: usize,
    keys: Vec<Value>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let Some(arm) = case.arms.get(index) else {
        return Err(case.fall_through());
    };
    match match_pattern(&case.value, &arm.pattern, env, &keys)? {
        Matching::NoMatch => select(case, index + 1, env, ctx),
        Matching::Pending(promise) => {
            when_ready(Value::Promise(promise), env, ctx, move |_, env, ctx| {
                try_arm(case, index, keys, env, ctx)
            })
        }
        Matching::Matched(result) => {
            if ctx.trace {
                tracing::trace!(arm = index, bindings = result.bindings.len(), "arm matched");
            }
            check_pattern_guards(case, index, result.bindings, result.guards.into_iter(), env, ctx)
        }
    }
}

/// Evaluate `expr` with the arm's bindings in a fresh scope.
fn eval_in_arm(
    expr: &ExprRef,
    bindings: &MatchBindings,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut scope = env.scope_guard();
    apply_bindings(&mut scope, bindings);
    expr.eval(&mut scope, ctx)
}

/// Guards attached inside the pattern; a false one rejects the arm.
fn check_pattern_guards(
    case: Arc<Case>,
    index: usize,
    bindings: MatchBindings,
    mut guards: vec::IntoIter<ExprRef>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let Some(guard) = guards.next() else {
        return choose(case, index, bindings, 0, env, ctx);
    };
    let holds = eval_in_arm(&guard, &bindings, env, ctx)?;
    when_ready(holds, env, ctx, move |holds, env, ctx| match holds {
        Value::Bool(true) => check_pattern_guards(case, index, bindings, guards, env, ctx),
        Value::Bool(false) => select(case, index + 1, env, ctx),
        other => Err(EvalError::type_error("guard", vec![other])),
    })
}

/// The `alternative`-th guarded body of an arm. A plain body is a single
/// unguarded alternative.
fn alternative(arm: &CaseArm, alternative: usize) -> Option<(Option<ExprRef>, ExprRef)> {
    match &arm.body {
        ArmBody::Expr(body) if alternative == 0 => Some((None, ExprRef::clone(body))),
        ArmBody::Expr(_) => None,
        ArmBody::Guarded(bodies) => bodies
            .get(alternative)
            .map(|b| (Some(ExprRef::clone(&b.guard)), ExprRef::clone(&b.body))),
    }
}

/// Pick the first alternative whose guard holds; none holding falls
/// through to the next arm.
fn choose(
    case: Arc<Case>,
    index: usize,
    bindings: MatchBindings,
    next: usize,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let picked = case.arms.get(index).and_then(|arm| alternative(arm, next));
    match picked {
        None => select(case, index + 1, env, ctx),
        Some((None, body)) => eval_in_arm(&body, &bindings, env, ctx),
        Some((Some(guard), body)) => {
            let holds = eval_in_arm(&guard, &bindings, env, ctx)?;
            when_ready(holds, env, ctx, move |holds, env, ctx| match holds {
                Value::Bool(true) => eval_in_arm(&body, &bindings, env, ctx),
                Value::Bool(false) => choose(case, index, bindings, next + 1, env, ctx),
                other => Err(EvalError::type_error("guard", vec![other])),
            })
        }
    }
}
