//! Error types for evaluation

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::value::{Symbol, Value};

/// What kind of name failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndefinedKind {
    /// A bare identifier with no binding in scope
    Identifier,

    /// A qualified function that the module does not define
    UnknownFunction {
        /// Module that was searched
        module: String,
    },

    /// A qualified function that exists but is not exported
    PrivateFunction {
        /// Module that owns the function
        module: String,
    },

    /// A module name absent from the registry
    UnknownModule,
}

/// One entry of a captured call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Source name, e.g. a file path
    pub source: Arc<str>,

    /// Function name qualified by its module
    pub function: String,

    /// 1-based line, when known
    pub line: Option<u32>,

    /// 1-based column, when known
    pub column: Option<u32>,
}

impl StackFrame {
    /// Render as `(source, function, line, column)`; unknown positions are `()`.
    pub fn to_value(&self) -> Value {
        let position = |n: Option<u32>| n.map_or(Value::Unit, |n| Value::Integer(i64::from(n)));
        Value::tuple(vec![
            Value::string(&*self.source),
            Value::string(&self.function),
            position(self.line),
            position(self.column),
        ])
    }
}

/// Call stack snapshot, innermost frame first.
pub type StackTrace = Arc<[StackFrame]>;

/// Errors that can occur during evaluation.
///
/// Errors are `Clone` because one failure may be delivered to every
/// continuation waiting on a promise.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Operator, guard, or construct applied to values it is not defined for
    #[error("Type error: operation \"{operation}\" not defined for {}", describe_values(.values))]
    TypeError {
        /// Operator or construct name
        operation: String,
        /// The concrete operands
        values: Vec<Value>,
    },

    /// Name lookup failed
    #[error("{}", undefined_message(.name, .kind))]
    UndefinedName {
        /// The name that failed to resolve
        name: String,
        /// Which lookup failed
        kind: UndefinedKind,
    },

    /// No case arm or let pattern matched
    #[error("NoMatchException: no pattern matched {value}")]
    NoMatch {
        /// Rendering of the unmatched value
        value: String,
    },

    /// Function called with the wrong number of arguments
    #[error("Unexpected number of arguments when calling '{function}': {got} given, {expected} expected")]
    ArityMismatch {
        /// Function name
        function: String,
        /// Declared arity
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Raised by the program with `raise`
    #[error("{tag}: {message}")]
    UserRaised {
        /// The raised tag
        tag: Symbol,
        /// The raised message
        message: String,
        /// Call stack at the raise point
        stack: StackTrace,
    },

    /// Structurally invalid pattern or declaration
    #[error("Resolution error: {message}")]
    Resolution {
        /// What was invalid
        message: String,
    },

    /// Integer or byte division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Checked arithmetic overflowed
    #[error("Integer overflow in \"{operation}\"")]
    IntegerOverflow {
        /// The overflowing operator
        operation: String,
    },

    /// Call of something that is not a function
    #[error("Cannot invoke non-function value {value}")]
    NotCallable {
        /// Rendering of the callee
        value: String,
    },

    /// Call depth limit exceeded
    #[error("Stack overflow: call depth {depth} exceeds maximum {max}")]
    StackOverflow {
        /// Depth reached
        depth: usize,
        /// Configured limit
        max: usize,
    },

    /// An asynchronous task panicked or could not be submitted
    #[error("Async task failed: {message}")]
    TaskFailed {
        /// Panic payload or submission failure
        message: String,
    },

    /// Evaluation was interrupted through the context flag
    #[error("Evaluation interrupted")]
    Interrupted,

    /// A system error that escaped a function body, with the call stack
    /// as it stood there
    #[error("{error}")]
    Traced {
        /// The error as first raised
        error: Box<EvalError>,
        /// Call stack of the innermost function the error left
        stack: StackTrace,
    },
}

/// Result type alias for evaluation
pub type Result<T> = std::result::Result<T, EvalError>;

impl EvalError {
    /// Build a type error for `operation` over `values`.
    pub fn type_error(operation: impl Into<String>, values: Vec<Value>) -> Self {
        EvalError::TypeError {
            operation: operation.into(),
            values,
        }
    }

    /// Build an undefined-identifier error.
    pub fn undefined_identifier(name: impl Into<String>) -> Self {
        EvalError::UndefinedName {
            name: name.into(),
            kind: UndefinedKind::Identifier,
        }
    }

    /// Build a no-match error for `value`.
    pub fn no_match(value: &Value) -> Self {
        EvalError::NoMatch {
            value: format!("{:?}", value),
        }
    }

    /// Attach the stack of the function this error is leaving.
    ///
    /// Only the first stack sticks: user-raised errors already carry one,
    /// traced errors keep theirs, and interruption is never traced.
    pub fn with_stack(self, stack: impl FnOnce() -> StackTrace) -> Self {
        match self {
            EvalError::UserRaised { .. } | EvalError::Traced { .. } | EvalError::Interrupted => {
                self
            }
            error => EvalError::Traced {
                error: Box::new(error),
                stack: stack(),
            },
        }
    }

    /// The error as first raised, without any attached stack.
    pub fn root(&self) -> &EvalError {
        match self {
            EvalError::Traced { error, .. } => error.root(),
            other => other,
        }
    }

    /// Owned form of [`EvalError::root`].
    pub fn into_root(self) -> EvalError {
        match self {
            EvalError::Traced { error, .. } => error.into_root(),
            other => other,
        }
    }

    /// The symbol a `try` handler sees as the first element of the triple.
    pub fn tag(&self) -> Symbol {
        let name = match self {
            EvalError::Traced { error, .. } => return error.tag(),
            EvalError::UserRaised { tag, .. } => return tag.clone(),
            EvalError::TypeError { .. } | EvalError::NotCallable { .. } => "type_error",
            EvalError::UndefinedName { kind, .. } => match kind {
                UndefinedKind::Identifier => "undefined_identifier",
                UndefinedKind::UnknownFunction { .. } => "undefined_function",
                UndefinedKind::PrivateFunction { .. } => "private_function",
                UndefinedKind::UnknownModule => "undefined_module",
            },
            EvalError::NoMatch { .. } => "nomatch",
            EvalError::ArityMismatch { .. } => "arity",
            EvalError::Resolution { .. } => "resolution",
            EvalError::DivisionByZero | EvalError::IntegerOverflow { .. } => "arithmetic",
            EvalError::StackOverflow { .. } => "stack_overflow",
            EvalError::TaskFailed { .. } => "task_failed",
            EvalError::Interrupted => "interrupted",
        };
        Symbol::intern(name)
    }

    /// The message a `try` handler sees as the second element of the triple.
    pub fn message(&self) -> String {
        match self.root() {
            EvalError::UserRaised { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Render as the catchable `(tag, message, stack)` triple.
    ///
    /// User-raised errors carry the stack captured at the raise point and
    /// traced errors the stack of the function they escaped. An error that
    /// never left a function body uses `fallback`, the stack where it was
    /// caught, which is the same function.
    pub fn to_triple(&self, fallback: &[StackFrame]) -> Value {
        let frames = match self {
            EvalError::UserRaised { stack, .. } | EvalError::Traced { stack, .. } => &stack[..],
            _ => fallback,
        };
        Value::tuple(vec![
            Value::Symbol(self.tag()),
            Value::string(self.message()),
            Value::sequence(frames.iter().map(StackFrame::to_value).collect()),
        ])
    }

    /// Whether a `try` handler may intercept this error.
    pub fn is_catchable(&self) -> bool {
        !matches!(self.root(), EvalError::Interrupted)
    }
}

fn undefined_message(name: &str, kind: &UndefinedKind) -> String {
    match kind {
        UndefinedKind::Identifier => {
            format!("Identifier '{}' not found in the current scope", name)
        }
        UndefinedKind::UnknownFunction { module } => {
            format!("Function {} is not present in module {}", name, module)
        }
        UndefinedKind::PrivateFunction { module } => {
            format!("Function {} is not exported from module {}", name, module)
        }
        UndefinedKind::UnknownModule => format!("Module {} not found", name),
    }
}

fn describe_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| format!("{} {:?}", type_name(v), v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Get the runtime type name of a value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Unit => "Unit",
        Value::Bool(_) => "Bool",
        Value::Byte(_) => "Byte",
        Value::Integer(_) => "Integer",
        Value::Float(_) => "Float",
        Value::Char(_) => "Char",
        Value::Symbol(_) => "Symbol",
        Value::Sequence(_) => "Sequence",
        Value::Tuple(_) => "Tuple",
        Value::Set(_) => "Set",
        Value::Dict(_) => "Dict",
        Value::Function(_) => "Function",
        Value::Module(_) => "Module",
        Value::Promise(_) => "Promise",
    }
}

impl fmt::Display for UndefinedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedKind::Identifier => write!(f, "identifier"),
            UndefinedKind::UnknownFunction { .. } => write!(f, "unknown function"),
            UndefinedKind::PrivateFunction { .. } => write!(f, "private function"),
            UndefinedKind::UnknownModule => write!(f, "unknown module"),
        }
    }
}
