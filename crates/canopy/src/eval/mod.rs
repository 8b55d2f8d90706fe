//! Expression evaluation
//!
//! Evaluation never blocks. Wherever a construct needs a concrete value
//! (a branch condition, an operand, a destructured scrutinee) and finds a
//! pending [`Promise`], it registers the rest of its work as a continuation
//! and returns a new promise for the final result.

pub mod async_expr;
pub mod binary;
pub mod block;
pub mod call;
pub mod collection;
pub mod error_expr;
pub mod function;
pub mod if_expr;
pub mod literal;
pub mod local;
pub mod match_expr;
pub mod module;
pub mod pattern;
pub mod unary;

use crate::ast::Expr;
use crate::promise::Promise;
use crate::{Environment, EvalContext, EvalError, Value};

/// Trait for evaluating AST nodes to values.
///
/// This is the core abstraction for the tree-walking interpreter. The
/// returned value may be a pending promise standing in for the result.
pub trait Evaluate {
    /// Evaluate this AST node in the given environment.
    fn eval(&self, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Main Expression Dispatcher
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for Expr {
    fn eval(&self, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
        // Check for interruption before each expression
        if ctx.is_interrupted() {
            return Err(EvalError::Interrupted);
        }
        if ctx.trace {
            tracing::trace!(kind = self.kind_name(), depth = env.call_depth(), "eval");
        }

        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Identifier(name) => literal::eval_identifier(name, env),

            // Constructors
            Expr::Tuple(items) => collection::eval_tuple(items, env, ctx),
            Expr::Sequence(items) => collection::eval_sequence(items, env, ctx),
            Expr::Set(items) => collection::eval_set(items, env, ctx),
            Expr::Dict(pairs) => collection::eval_dict(pairs, env, ctx),

            // Operators
            Expr::Binary { op, left, right } => binary::eval_binary(*op, left, right, env, ctx),
            Expr::Unary { op, operand } => unary::eval_unary(*op, operand, env, ctx),

            // Control flow
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => if_expr::eval_if(condition, then_branch, else_branch, env, ctx),
            Expr::Let { bindings, body } => local::eval_let(bindings, body, env, ctx),
            Expr::Do(steps) => block::eval_do(steps, env, ctx),
            Expr::Case { scrutinee, arms } => match_expr::eval_case(scrutinee, arms, env, ctx),

            // Functions
            Expr::Lambda(lambda) => function::eval_lambda(lambda, None, env),
            Expr::Call {
                callee,
                args,
                location,
            } => call::eval_call(callee, args, location.as_ref(), env, ctx),

            // Modules
            Expr::Module(decl) => module::eval_module(decl, env, ctx),
            Expr::ModuleRef(fqn) => module::eval_module_ref(fqn, ctx),
            Expr::FunctionRef { module, name } => {
                module::eval_function_ref(module, name, env, ctx)
            }

            // Concurrency and errors
            Expr::Async(function) => async_expr::eval_async(function, env, ctx),
            Expr::Raise { tag, message } => error_expr::eval_raise(tag, message, env, ctx),
            Expr::Try { body, arms } => error_expr::eval_try(body, arms, env, ctx),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Deferral Helpers
// ═══════════════════════════════════════════════════════════════════════

/// Run `k` on `value` now, or once it resolves if it is a promise.
///
/// The deferred path runs `k` against clones of the environment and
/// context, so it may execute on whichever thread settles the promise.
pub(crate) fn when_ready<K>(
    value: Value,
    env: &mut Environment,
    ctx: &EvalContext,
    k: K,
) -> Result<Value, EvalError>
where
    K: FnOnce(Value, &mut Environment, &EvalContext) -> Result<Value, EvalError> + Send + 'static,
{
    match value {
        Value::Promise(promise) => {
            let mut env = env.clone();
            let ctx = ctx.clone();
            Ok(Value::Promise(
                promise.map(move |resolved| k(resolved, &mut env, &ctx)),
            ))
        }
        ready => k(ready, env, ctx),
    }
}

/// Defer `compute` until every operand has resolved.
///
/// `compute` receives the operands in their original positions.
pub(crate) fn lift<F>(operands: Vec<Value>, compute: F) -> Value
where
    F: FnOnce(Vec<Value>) -> Result<Value, EvalError> + Send + 'static,
{
    Value::Promise(
        Promise::all(operands)
            .map(move |resolved| compute(resolved.into_elements().unwrap_or_default())),
    )
}

/// Whether any value is a promise.
pub(crate) fn any_pending(values: &[Value]) -> bool {
    values.iter().any(Value::is_promise)
}

// ═══════════════════════════════════════════════════════════════════════
// Convenience Functions
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate an expression (convenience wrapper).
pub fn eval_expr(expr: &Expr, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
    expr.eval(env, ctx)
}

/// Block until `value` is concrete.
///
/// For hosts at the edge of a program; the evaluator itself never waits.
pub fn force(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Promise(promise) => promise.wait(),
        ready => Ok(ready),
    }
}

// Re-export for use by other modules
pub use call::call_function;
pub use pattern::{apply_bindings, collect_keys, match_pattern, MatchBindings, MatchResult, Matching};
