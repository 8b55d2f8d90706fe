//! Standard prelude with built-in functions

use super::Environment;
use crate::error::{type_name, EvalError};
use crate::value::{FunctionValue, Value};

impl Environment {
    /// Create an environment with standard built-in functions.
    pub fn with_prelude() -> Self {
        let mut env = Self::new();
        env.load_prelude();
        env
    }

    /// Load the standard prelude into this environment.
    ///
    /// Builtins are strict: a pending argument defers the call until it
    /// resolves.
    pub fn load_prelude(&mut self) {
        // Type inspection
        self.define_builtin(FunctionValue::native("type_of", 1, builtin_type_of));

        // Collections
        self.define_builtin(FunctionValue::native("len", 1, builtin_len));

        // Identity, handy as a default continuation
        self.define_builtin(FunctionValue::native("identity", 1, |args| {
            Ok(args[0].clone())
        }));

        // Display representation
        self.define_builtin(FunctionValue::native("show", 1, |args| {
            Ok(Value::string(args[0].to_string()))
        }));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Function Implementations
// ═══════════════════════════════════════════════════════════════════════

fn builtin_type_of(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::symbol(&type_name(&args[0]).to_lowercase()))
}

fn builtin_len(args: &[Value]) -> Result<Value, EvalError> {
    match args[0].len() {
        Some(n) => i64::try_from(n)
            .map(Value::Integer)
            .map_err(|_| EvalError::IntegerOverflow {
                operation: "len".to_string(),
            }),
        None => Err(EvalError::type_error("len", args.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(env: &Environment, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        match env.get(name) {
            Some(Value::Function(func)) => match &func.body {
                crate::value::FunctionBody::Native(native) => (native.func)(args),
                _ => panic!("{} is not native", name),
            },
            other => panic!("{} not bound: {:?}", name, other),
        }
    }

    #[test]
    fn test_prelude_names() {
        let env = Environment::with_prelude();
        for name in ["type_of", "len", "identity", "show"] {
            assert!(env.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_type_of() {
        let env = Environment::with_prelude();
        assert_eq!(
            call(&env, "type_of", &[Value::Integer(1)]).unwrap(),
            Value::symbol("integer")
        );
    }

    #[test]
    fn test_len() {
        let env = Environment::with_prelude();
        assert_eq!(
            call(&env, "len", &[Value::string("abc")]).unwrap(),
            Value::Integer(3)
        );
        assert!(matches!(
            call(&env, "len", &[Value::Bool(true)]),
            Err(EvalError::TypeError { .. })
        ));
    }

    #[test]
    fn test_show() {
        let env = Environment::with_prelude();
        assert_eq!(
            call(&env, "show", &[Value::tuple(vec![Value::Integer(1)])]).unwrap(),
            Value::string("(1,)")
        );
    }
}
