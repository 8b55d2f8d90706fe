//! Function call evaluation

use std::sync::Arc;

use crate::ast::{ExprRef, SourceLocation};
use crate::error::StackFrame;
use crate::{Environment, EvalContext, EvalError, FunctionBody, FunctionValue, Value};

use super::function::ANONYMOUS;
use super::{any_pending, lift, when_ready, Evaluate};

/// Evaluate `callee arg1 arg2 ...`.
///
/// Arguments are evaluated left to right and passed as they are: a user
/// function receives pending arguments unforced. A pending callee defers
/// the call until it resolves.
pub fn eval_call(
    callee: &ExprRef,
    args: &[ExprRef],
    location: Option<&SourceLocation>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    // Evaluate the function expression
    let callee = callee.eval(env, ctx)?;

    // Evaluate arguments
    let args: Vec<Value> = args
        .iter()
        .map(|arg| arg.eval(env, ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let location = location.cloned();
    when_ready(callee, env, ctx, move |callee, env, ctx| {
        call_value(&callee, args, location.as_ref(), env, ctx)
    })
}

/// Invoke a function value from host code.
///
/// The result is either concrete or a promise, exactly as if the call
/// appeared in a program.
///
/// # Errors
///
/// Returns `NotCallable` if `func` is not a function.
/// Returns `ArityMismatch` if the argument count doesn't match.
pub fn call_function(
    func: &Value,
    args: Vec<Value>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    when_ready(func.clone(), env, ctx, move |func, env, ctx| {
        call_value(&func, args, None, env, ctx)
    })
}

fn call_value(
    callee: &Value,
    args: Vec<Value>,
    location: Option<&SourceLocation>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    match callee {
        Value::Function(func) => invoke(func, args, location, env, ctx),
        other => Err(EvalError::NotCallable {
            value: format!("{:?}", other),
        }),
    }
}

/// Call a concrete function.
pub(crate) fn invoke(
    func: &Arc<FunctionValue>,
    args: Vec<Value>,
    location: Option<&SourceLocation>,
    caller: &Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    // Check arity
    if args.len() != func.arity() {
        return Err(EvalError::ArityMismatch {
            function: func.qualified_name(),
            expected: func.arity(),
            got: args.len(),
        });
    }

    match &func.body {
        FunctionBody::Native(native) => {
            // Natives are strict in every argument
            if any_pending(&args) {
                let native = Arc::clone(&native.func);
                return Ok(lift(args, move |args| native(&args)));
            }
            (native.func)(&args)
        }
        FunctionBody::Expr(body) => {
            let mut env = Environment::for_call(&func.captures, caller);

            // Track call depth (stack overflow protection)
            env.enter_call(stack_frame(func, location), ctx.max_call_depth)?;

            match func.module() {
                // Module functions see their siblings, private ones included
                Some(module) => {
                    for sibling in module.functions() {
                        env.define(sibling.name.clone(), Value::Function(Arc::clone(sibling)));
                    }
                    env.set_current_module(Some(module.fqn().clone()));
                }
                None if func.name != ANONYMOUS => {
                    env.define(func.name.clone(), Value::Function(Arc::clone(func)));
                }
                None => {}
            }

            // Bind parameters to arguments
            for (param, arg) in func.params.iter().zip(args) {
                env.define(param.clone(), arg);
            }

            if ctx.trace {
                tracing::trace!(function = %func.qualified_name(), depth = env.call_depth(), "call");
            }
            body.eval(&mut env, ctx).map_err(|err| err.with_stack(|| env.stack_trace()))
        }
    }
}

fn stack_frame(func: &FunctionValue, location: Option<&SourceLocation>) -> StackFrame {
    StackFrame {
        source: location.map_or_else(|| Arc::from("<unknown>"), |l| Arc::clone(&l.source)),
        function: func.qualified_name(),
        line: location.map(|l| l.line),
        column: location.map(|l| l.column),
    }
}
