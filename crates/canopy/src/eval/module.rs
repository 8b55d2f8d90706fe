//! Module declaration and qualified reference evaluation

use std::sync::Arc;

use crate::ast::{ExprRef, ModuleDecl};
use crate::error::UndefinedKind;
use crate::value::{Fqn, ModuleValue};
use crate::{Environment, EvalContext, EvalError, Value};

use super::{when_ready, Evaluate};

/// Evaluate a module declaration and register the module.
///
/// Module functions close over the scope the declaration appears in.
///
/// # Errors
///
/// Returns `Resolution` if an export names a function the module does not
/// declare, or a function is declared twice.
pub fn eval_module(
    decl: &Arc<ModuleDecl>,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let module = ModuleValue::declare(
        decl.fqn.clone(),
        &decl.exports,
        &decl.functions,
        env.capture(),
    )?;
    ctx.modules.register(Arc::clone(&module));
    Ok(Value::Module(module))
}

/// Look up a registered module by name.
pub fn eval_module_ref(fqn: &Fqn, ctx: &EvalContext) -> Result<Value, EvalError> {
    ctx.modules
        .get(fqn)
        .map(Value::Module)
        .ok_or_else(|| EvalError::UndefinedName {
            name: fqn.to_string(),
            kind: UndefinedKind::UnknownModule,
        })
}

/// Evaluate `module.name`.
///
/// From outside the module only exported functions resolve; code running
/// inside the module reaches private functions too.
pub fn eval_function_ref(
    module: &ExprRef,
    name: &str,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let module = module.eval(env, ctx)?;
    let name = name.to_string();
    when_ready(module, env, ctx, move |module, env, _| match module {
        Value::Module(module) => {
            let func = if env.current_module() == Some(module.fqn()) {
                module.resolve_internal(&name)?
            } else {
                module.resolve(&name)?
            };
            Ok(Value::Function(func))
        }
        other => Err(EvalError::type_error(".", vec![other])),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, FunctionDecl};

    fn declare(env: &mut Environment, ctx: &EvalContext) -> Value {
        let decl = Expr::module(
            "Demo.Math",
            &["double"],
            vec![
                FunctionDecl::new(
                    "double",
                    &["x"],
                    Expr::call(Expr::ident("twice"), vec![Expr::ident("x")]),
                ),
                FunctionDecl::new(
                    "twice",
                    &["x"],
                    Expr::binary(BinaryOp::Mul, Expr::ident("x"), Expr::int(2)),
                ),
            ],
        );
        decl.eval(env, ctx).unwrap()
    }

    #[test]
    fn test_module_is_registered() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        declare(&mut env, &ctx);
        assert!(eval_module_ref(&Fqn::parse("Demo.Math"), &ctx).is_ok());
    }

    #[test]
    fn test_unknown_module() {
        let ctx = EvalContext::new();
        assert!(matches!(
            eval_module_ref(&Fqn::parse("Nope"), &ctx),
            Err(EvalError::UndefinedName {
                kind: UndefinedKind::UnknownModule,
                ..
            })
        ));
    }

    #[test]
    fn test_exported_function_calls_private_sibling() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        declare(&mut env, &ctx);
        let call = Expr::call(
            Expr::function_ref(Expr::module_ref("Demo.Math"), "double"),
            vec![Expr::int(21)],
        );
        assert_eq!(call.eval(&mut env, &ctx).unwrap(), Value::Integer(42));
    }

    #[test]
    fn test_private_and_unknown_are_distinct() {
        let mut env = Environment::new();
        let ctx = EvalContext::new();
        declare(&mut env, &ctx);

        let private = Expr::function_ref(Expr::module_ref("Demo.Math"), "twice");
        let missing = Expr::function_ref(Expr::module_ref("Demo.Math"), "thrice");
        let private = private.eval(&mut env, &ctx).unwrap_err();
        let missing = missing.eval(&mut env, &ctx).unwrap_err();

        assert_eq!(private.tag().name(), "private_function");
        assert_eq!(missing.tag().name(), "undefined_function");
    }
}
