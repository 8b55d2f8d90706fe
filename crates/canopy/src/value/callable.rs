//! Callable values: lambdas, module functions, and native builtins

use std::fmt;
use std::sync::{Arc, Weak};

use super::{ModuleValue, Value};
use crate::ast::ExprRef;
use crate::environment::Binding;
use crate::error::EvalError;

/// Type alias for native function pointers.
pub type NativeFnPtr = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Bindings captured by a function when it was created.
pub type Captures = Arc<[Binding]>;

/// A native function implemented in Rust.
///
/// Natives are strict: when any argument is a pending promise the call is
/// deferred until every argument has resolved.
#[derive(Clone)]
pub struct NativeFn {
    /// Fixed number of arguments
    pub arity: usize,

    /// The implementation
    pub func: NativeFnPtr,
}

/// What runs when a function is invoked.
#[derive(Clone)]
pub enum FunctionBody {
    /// An expression evaluated in the captured environment
    Expr(ExprRef),

    /// A native implementation
    Native(NativeFn),
}

/// A function value.
///
/// User functions keep the bindings visible where they were created.
/// Functions declared inside a module hold a weak link back to it so they
/// can reach their private siblings.
#[derive(Clone)]
pub struct FunctionValue {
    /// Function name (`$lambda` for anonymous lambdas)
    pub name: String,

    /// Parameter names; empty for natives
    pub params: Vec<String>,

    /// The function body
    pub body: FunctionBody,

    /// Captured lexical bindings
    pub captures: Captures,

    /// Declaring module, if any
    pub module: Option<Weak<ModuleValue>>,
}

impl FunctionValue {
    /// Create a user function.
    pub fn new(
        name: impl Into<String>,
        params: Vec<String>,
        body: ExprRef,
        captures: Captures,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body: FunctionBody::Expr(body),
            captures,
            module: None,
        }
    }

    /// Create a native function.
    pub fn native<F>(name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: FunctionBody::Native(NativeFn {
                arity,
                func: Arc::new(func),
            }),
            captures: Arc::from(Vec::new()),
            module: None,
        }
    }

    /// Number of arguments the function expects.
    pub fn arity(&self) -> usize {
        match &self.body {
            FunctionBody::Native(native) => native.arity,
            FunctionBody::Expr(_) => self.params.len(),
        }
    }

    /// The declaring module, if it is still alive.
    pub fn module(&self) -> Option<Arc<ModuleValue>> {
        self.module.as_ref().and_then(Weak::upgrade)
    }

    /// Name qualified by the declaring module, e.g. `Demo.Math.add`.
    pub fn qualified_name(&self) -> String {
        match self.module() {
            Some(module) => format!("{}.{}", module.fqn(), self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            FunctionBody::Native(_) => "native",
            FunctionBody::Expr(_) => "fn",
        };
        write!(f, "{}({}/{})", kind, self.qualified_name(), self.arity())
    }
}
