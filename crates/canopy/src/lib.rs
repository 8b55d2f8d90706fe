//! # Canopy
//!
//! Execution core for a dynamically typed, expression-oriented functional
//! language whose every operation is *future transparent*.
//!
//! Any operation that acts on a concrete value also accepts a pending
//! [`Promise`] standing in for that value, and returns a promise of its own
//! instead of blocking. Operators, calls, branch conditions and structural
//! pattern matching all follow this rule, so asynchronous results flow
//! through a program exactly like ordinary values.
//!
//! ## Architecture
//!
//! - **Value model** ([`value`]): closed set of runtime variants built on
//!   persistent collections
//! - **Deferred results** ([`promise`]): single-assignment promises with
//!   `map`/`then`/`all` combinators
//! - **Operator engine** ([`eval::binary`], [`eval::unary`]): type-tag
//!   dispatch plus automatic lifting over promises
//! - **Pattern matching** ([`eval::pattern`], [`eval::match_expr`]):
//!   structural destructuring, cons splitting from both ends, guards
//! - **Modules** ([`value::module`]): export-checked function resolution
//! - **Async tasks** ([`task`]): zero-argument functions submitted to a
//!   worker pool
//!
//! Parsing is not part of this crate. Front ends hand the evaluator an
//! immutable [`ast::Expr`] tree.
//!
//! ## Example
//!
//! ```
//! use canopy::ast::{BinaryOp, Expr};
//! use canopy::{eval_expr, force, Environment, EvalContext, Value};
//!
//! let ctx = EvalContext::new();
//! let mut env = Environment::with_prelude();
//! let sum = Expr::binary(BinaryOp::Add, Expr::int(40), Expr::int(2));
//! let value = eval_expr(&sum, &mut env, &ctx).unwrap();
//! assert_eq!(force(value).unwrap(), Value::Integer(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod context;
pub mod environment;
pub mod error;
pub mod eval;
pub mod promise;
pub mod task;
pub mod value;

// Re-export main types
pub use context::{EvalContext, ModuleRegistry};
pub use environment::{Binding, Environment, ScopeGuard};
pub use error::{EvalError, Result, StackFrame, StackTrace, UndefinedKind};
pub use eval::{call_function, eval_expr, force, Evaluate};
pub use promise::{Outcome, Promise};
pub use task::{InlineExecutor, PoolConfig, SharedPool, Task, TaskExecutor, WorkerPool};
pub use value::{
    Dict, FunctionBody, FunctionValue, ModuleValue, NativeFn, NativeFnPtr, Seq, Set, Symbol,
    Value,
};

/// Canopy version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
