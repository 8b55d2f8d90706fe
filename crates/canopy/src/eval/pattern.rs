//! Pattern matching logic
//!
//! Matching is pure: dictionary key expressions are evaluated beforehand
//! by [`collect_keys`], and the matcher only inspects the value. When it
//! reaches a pending promise that it must look inside, it reports
//! [`Matching::Pending`] and the caller retries once that promise settles.

use std::borrow::Cow;
use std::vec;

use crate::ast::{ExprRef, Pattern};
use crate::promise::Promise;
use crate::{Environment, EvalContext, EvalError, Value};

use super::{any_pending, when_ready, Evaluate};

/// Bindings produced by a successful match, in pattern order.
pub type MatchBindings = Vec<(String, Value)>;

/// A successful structural match.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Names to install into scope
    pub bindings: MatchBindings,

    /// Guards from `pattern | guard` sub-patterns, in pattern order; all
    /// must hold for the match to count
    pub guards: Vec<ExprRef>,
}

/// Outcome of [`match_pattern`].
#[derive(Debug)]
pub enum Matching {
    /// The value has the pattern's shape
    Matched(MatchResult),

    /// The value does not match
    NoMatch,

    /// The matcher needs to look inside this promise; retry once it settles
    Pending(Promise),
}

/// Why matching stopped early.
enum Stop {
    Fail,
    Wait(Promise),
    Error(EvalError),
}

impl From<EvalError> for Stop {
    fn from(err: EvalError) -> Self {
        Stop::Error(err)
    }
}

fn check(matched: bool) -> Result<(), Stop> {
    if matched {
        Ok(())
    } else {
        Err(Stop::Fail)
    }
}

/// Look through a settled promise; a pending one stops the matcher.
fn settle(value: &Value) -> Result<Cow<'_, Value>, Stop> {
    match value {
        Value::Promise(promise) => match promise.peek() {
            Some(Ok(resolved)) => Ok(Cow::Owned(resolved)),
            Some(Err(err)) => Err(Stop::Error(err)),
            None => Err(Stop::Wait(promise.clone())),
        },
        ready => Ok(Cow::Borrowed(ready)),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Dictionary Keys
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate every dictionary key expression in `pattern`, in the order
/// the matcher consumes them.
pub fn collect_keys(
    pattern: &Pattern,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Vec<Value>, EvalError> {
    let mut keys = Vec::new();
    collect_into(pattern, env, ctx, &mut keys)?;
    Ok(keys)
}

fn collect_into(
    pattern: &Pattern,
    env: &mut Environment,
    ctx: &EvalContext,
    keys: &mut Vec<Value>,
) -> Result<(), EvalError> {
    match pattern {
        Pattern::Literal(_) | Pattern::Wildcard | Pattern::Binding(_) => Ok(()),
        Pattern::Alias(_, inner) | Pattern::Guarded(inner, _) => {
            collect_into(inner, env, ctx, keys)
        }
        Pattern::Tuple(items) | Pattern::Sequence(items) => items
            .iter()
            .try_for_each(|item| collect_into(item, env, ctx, keys)),
        Pattern::Cons { front, rest, back } => front
            .iter()
            .chain(std::iter::once(&**rest))
            .chain(back)
            .try_for_each(|item| collect_into(item, env, ctx, keys)),
        Pattern::Dict(entries) => {
            for (key, item) in entries {
                keys.push(key.eval(env, ctx)?);
                collect_into(item, env, ctx, keys)?;
            }
            Ok(())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Structural Matching
// ═══════════════════════════════════════════════════════════════════════

/// Match `value` against `pattern`.
///
/// `scope` decides whether a name binds or compares: a name already bound
/// by the program (or earlier in the same pattern) must see an equal
/// value. `keys` holds the pre-evaluated dictionary keys from
/// [`collect_keys`].
pub fn match_pattern(
    value: &Value,
    pattern: &Pattern,
    scope: &Environment,
    keys: &[Value],
) -> Result<Matching, EvalError> {
    let mut matcher = Matcher {
        scope,
        keys: keys.iter(),
        result: MatchResult::default(),
    };
    match matcher.visit(value, pattern) {
        Ok(()) => Ok(Matching::Matched(matcher.result)),
        Err(Stop::Fail) => Ok(Matching::NoMatch),
        Err(Stop::Wait(promise)) => Ok(Matching::Pending(promise)),
        Err(Stop::Error(err)) => Err(err),
    }
}

struct Matcher<'a> {
    scope: &'a Environment,
    keys: std::slice::Iter<'a, Value>,
    result: MatchResult,
}

impl Matcher<'_> {
    fn visit(&mut self, value: &Value, pattern: &Pattern) -> Result<(), Stop> {
        match pattern {
            Pattern::Wildcard => Ok(()),
            Pattern::Binding(name) => self.bind(name, value),
            Pattern::Alias(name, inner) => {
                self.visit(value, inner)?;
                self.bind(name, value)
            }
            Pattern::Literal(expected) => check(*settle(value)? == *expected),
            Pattern::Tuple(items) => match &*settle(value)? {
                Value::Tuple(elements) if elements.len() == items.len() => {
                    self.visit_all(elements.iter(), items)
                }
                _ => Err(Stop::Fail),
            },
            Pattern::Sequence(items) => match &*settle(value)? {
                Value::Sequence(seq) if seq.len() == items.len() => {
                    self.visit_all(seq.iter(), items)
                }
                _ => Err(Stop::Fail),
            },
            Pattern::Cons { front, rest, back } => self.visit_cons(value, front, rest, back),
            Pattern::Dict(entries) => self.visit_dict(value, entries),
            Pattern::Guarded(inner, guard) => {
                self.visit(value, inner)?;
                self.result.guards.push(ExprRef::clone(guard));
                Ok(())
            }
        }
    }

    fn visit_all<'v>(
        &mut self,
        values: impl Iterator<Item = &'v Value>,
        patterns: &[Pattern],
    ) -> Result<(), Stop> {
        values
            .zip(patterns)
            .try_for_each(|(value, pattern)| self.visit(value, pattern))
    }

    /// Bind `name`, or compare when it is already bound.
    fn bind(&mut self, name: &str, value: &Value) -> Result<(), Stop> {
        let bound = self
            .result
            .bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value.clone())
            .or_else(|| self.scope.get_user(name).cloned());

        match bound {
            Some(bound) => check(*settle(&bound)? == *settle(value)?),
            None => {
                self.result.bindings.push((name.to_string(), value.clone()));
                Ok(())
            }
        }
    }

    fn visit_cons(
        &mut self,
        value: &Value,
        front: &[Pattern],
        rest: &Pattern,
        back: &[Pattern],
    ) -> Result<(), Stop> {
        check_rest(rest)?;
        let seq = match &*settle(value)? {
            Value::Sequence(seq) if seq.len() >= front.len() + back.len() => seq.clone(),
            _ => return Err(Stop::Fail),
        };

        let mut middle = seq;
        let mut heads = Vec::with_capacity(front.len());
        for _ in front {
            match (middle.first().cloned(), middle.drop_first()) {
                (Some(head), Some(remaining)) => {
                    heads.push(head);
                    middle = remaining;
                }
                _ => return Err(Stop::Fail),
            }
        }
        let mut tails = Vec::with_capacity(back.len());
        for _ in back {
            match (middle.last().cloned(), middle.drop_last()) {
                (Some(tail), Some(remaining)) => {
                    tails.push(tail);
                    middle = remaining;
                }
                _ => return Err(Stop::Fail),
            }
        }
        tails.reverse();

        // Bindings follow source order: front, rest, back
        self.visit_all(heads.iter(), front)?;
        self.visit(&Value::Sequence(middle), rest)?;
        self.visit_all(tails.iter(), back)
    }

    fn visit_dict(&mut self, value: &Value, entries: &[(ExprRef, Pattern)]) -> Result<(), Stop> {
        let value = settle(value)?;
        let Value::Dict(dict) = &*value else {
            return Err(Stop::Fail);
        };
        if entries.is_empty() {
            return check(dict.is_empty());
        }
        for (_, item) in entries {
            let key = self.keys.next().ok_or_else(|| EvalError::Resolution {
                message: "dictionary pattern key was not evaluated".to_string(),
            })?;
            let Some(found) = dict.get(key) else {
                return Err(Stop::Fail);
            };
            self.visit(found, item)?;
        }
        Ok(())
    }
}

/// The remainder of a cons pattern is always a sequence.
fn check_rest(rest: &Pattern) -> Result<(), Stop> {
    let invalid = |kind: &str| {
        Err(Stop::Error(EvalError::Resolution {
            message: format!("{} pattern cannot match the rest of a sequence", kind),
        }))
    };
    match rest {
        Pattern::Tuple(_) => invalid("tuple"),
        Pattern::Dict(_) => invalid("dictionary"),
        Pattern::Literal(value) if !matches!(value, Value::Sequence(_)) => {
            invalid("non-sequence literal")
        }
        Pattern::Alias(_, inner) | Pattern::Guarded(inner, _) => check_rest(inner),
        _ => Ok(()),
    }
}

/// Install match bindings into the current scope.
pub fn apply_bindings(env: &mut Environment, bindings: &MatchBindings) {
    for (name, value) in bindings {
        env.define(name.clone(), value.clone());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Binding Forms (`let`, `do`)
// ═══════════════════════════════════════════════════════════════════════

/// Destructure `value` into the current scope, then run `rest`.
///
/// A failed match or a false guard is a no-match error. Pending keys,
/// pending parts of the value and pending guards defer the remaining work.
pub(crate) fn bind_then<K>(
    value: Value,
    pattern: &Pattern,
    env: &mut Environment,
    ctx: &EvalContext,
    rest: K,
) -> Result<Value, EvalError>
where
    K: FnOnce(&mut Environment, &EvalContext) -> Result<Value, EvalError> + Send + 'static,
{
    let keys = collect_keys(pattern, env, ctx)?;
    if any_pending(&keys) {
        let pattern = pattern.clone();
        let keys = Value::Promise(Promise::all(keys));
        return when_ready(keys, env, ctx, move |keys, env, ctx| {
            let keys = keys.into_elements().unwrap_or_default();
            bind_with_keys(value, &pattern, keys, env, ctx, rest)
        });
    }
    bind_with_keys(value, pattern, keys, env, ctx, rest)
}

fn bind_with_keys<K>(
    value: Value,
    pattern: &Pattern,
    keys: Vec<Value>,
    env: &mut Environment,
    ctx: &EvalContext,
    rest: K,
) -> Result<Value, EvalError>
where
    K: FnOnce(&mut Environment, &EvalContext) -> Result<Value, EvalError> + Send + 'static,
{
    match match_pattern(&value, pattern, env, &keys)? {
        Matching::NoMatch => Err(EvalError::no_match(&value)),
        Matching::Pending(promise) => {
            let pattern = pattern.clone();
            when_ready(Value::Promise(promise), env, ctx, move |_, env, ctx| {
                bind_with_keys(value, &pattern, keys, env, ctx, rest)
            })
        }
        Matching::Matched(result) => {
            apply_bindings(env, &result.bindings);
            check_guards(value, result.guards.into_iter(), env, ctx, rest)
        }
    }
}

fn check_guards<K>(
    value: Value,
    mut guards: vec::IntoIter<ExprRef>,
    env: &mut Environment,
    ctx: &EvalContext,
    rest: K,
) -> Result<Value, EvalError>
where
    K: FnOnce(&mut Environment, &EvalContext) -> Result<Value, EvalError> + Send + 'static,
{
    let Some(guard) = guards.next() else {
        return rest(env, ctx);
    };
    let holds = guard.eval(env, ctx)?;
    when_ready(holds, env, ctx, move |holds, env, ctx| match holds {
        Value::Bool(true) => check_guards(value, guards, env, ctx, rest),
        Value::Bool(false) => Err(EvalError::no_match(&value)),
        other => Err(EvalError::type_error("guard", vec![other])),
    })
}
