//! Runtime value representation

mod callable;
pub(crate) mod collections;
mod display;
mod hashable;
mod impls;
pub mod module;
mod seq;
mod symbol;

pub use callable::{Captures, FunctionBody, FunctionValue, NativeFn, NativeFnPtr};
pub use collections::{Dict, Set};
pub use module::{Fqn, ModuleValue};
pub use seq::Seq;
pub use symbol::Symbol;

use std::sync::Arc;

use crate::promise::Promise;

/// A runtime value.
///
/// The variant set is closed. Values of different variants are never equal
/// and nothing converts implicitly between them. Compound variants are
/// persistent and cheap to clone, so values move freely between threads.
///
/// # Size
///
/// Collections sit behind shared pointers, keeping `Value` small enough to
/// pass by value everywhere.
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// The unit value `()`
    Unit,

    /// Boolean
    Bool(bool),

    /// Unsigned byte, written `5b`
    Byte(u8),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit float
    Float(f64),

    /// Unicode scalar
    Char(char),

    /// Interned tag such as `:ok`
    Symbol(Symbol),

    // ═══════════════════════════════════════════════════════════════════
    // Collections
    // ═══════════════════════════════════════════════════════════════════
    /// Ordered persistent sequence; strings are sequences of chars
    Sequence(Seq),

    /// Fixed-arity tuple
    Tuple(Arc<Vec<Value>>),

    /// Persistent set
    Set(Set),

    /// Persistent dictionary
    Dict(Dict),

    // ═══════════════════════════════════════════════════════════════════
    // Callables and modules
    // ═══════════════════════════════════════════════════════════════════
    /// A function: user lambda, module function or native builtin
    Function(Arc<FunctionValue>),

    /// A module with its export list
    Module(Arc<ModuleValue>),

    // ═══════════════════════════════════════════════════════════════════
    // Deferred
    // ═══════════════════════════════════════════════════════════════════
    /// A value that is not available yet
    Promise(Promise),
}
