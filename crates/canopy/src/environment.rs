//! Runtime environment managing lexical bindings and the call stack

mod frame;
mod prelude;

pub use frame::ScopeGuard;

use rpds::ListSync;
use std::sync::Arc;

use crate::error::{EvalError, StackFrame, StackTrace};
use crate::value::{Captures, Fqn, FunctionValue, Value};

/// A single name binding.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The binding's name
    pub name: String,

    /// The bound value
    pub value: Value,

    /// Whether the binding comes from the prelude
    pub builtin: bool,
}

/// Names visible to the running code, plus the calls that led there.
///
/// Bindings live in one vector, newest last. A frame is just an index
/// into it, so closing a scope is a truncate and lookup is a reverse scan
/// that naturally finds the innermost shadowing binding. Nothing is ever
/// reassigned.
///
/// The call stack is a persistent list. Continuations clone the whole
/// environment, and they share the stack rather than copy it.
///
/// ```
/// use canopy::{Environment, Value};
///
/// let mut env = Environment::with_prelude();
/// env.define("n", Value::Integer(1));
///
/// env.push_frame();
/// env.define("n", Value::Integer(2));
/// assert_eq!(env.get("n"), Some(&Value::Integer(2)));
/// env.pop_frame();
///
/// assert_eq!(env.get("n"), Some(&Value::Integer(1)));
/// assert!(env.get("len").is_some());
/// assert!(env.get_user("len").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Environment {
    bindings: Vec<Binding>,

    /// Start index of each open frame; the first is the global frame
    frames: Vec<usize>,

    /// Active calls, innermost first
    call_stack: ListSync<StackFrame>,

    /// Module whose function body is running, if any
    module: Option<Fqn>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// An environment with no bindings and an empty call stack.
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            frames: vec![0],
            call_stack: ListSync::new_sync(),
            module: None,
        }
    }

    /// Environment for a function body: the function's captured bindings
    /// plus the caller's call stack.
    pub fn for_call(captures: &Captures, caller: &Environment) -> Self {
        Self {
            bindings: captures.to_vec(),
            frames: vec![0],
            call_stack: caller.call_stack.clone(),
            module: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Frames
    // ═══════════════════════════════════════════════════════════════════

    /// Open a frame. Prefer [`Environment::scope_guard`].
    pub fn push_frame(&mut self) {
        self.frames.push(self.bindings.len());
    }

    /// Close the innermost frame, dropping what it bound. The global frame
    /// stays open.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            if let Some(start) = self.frames.pop() {
                self.bindings.truncate(start);
            }
        }
    }

    /// Number of open frames, the global one included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Call Stack
    // ═══════════════════════════════════════════════════════════════════

    /// Record entry into a call. Fails when `max_depth` would be exceeded.
    pub fn enter_call(&mut self, frame: StackFrame, max_depth: usize) -> Result<(), EvalError> {
        let depth = self.call_stack.len();
        if depth >= max_depth {
            return Err(EvalError::StackOverflow {
                depth,
                max: max_depth,
            });
        }
        self.call_stack.push_front_mut(frame);
        Ok(())
    }

    /// Number of active calls.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Snapshot of the call stack, innermost frame first.
    pub fn stack_trace(&self) -> StackTrace {
        self.call_stack.iter().cloned().collect::<Vec<_>>().into()
    }

    /// The module whose code is running.
    pub fn current_module(&self) -> Option<&Fqn> {
        self.module.as_ref()
    }

    /// Mark this environment as running code of `module`.
    pub fn set_current_module(&mut self, module: Option<Fqn>) {
        self.module = module;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════════

    /// Bind `name` in the innermost frame, shadowing any earlier binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.push(Binding {
            name: name.into(),
            value,
            builtin: false,
        });
    }

    /// Register a native function under its own name.
    pub fn define_builtin(&mut self, func: FunctionValue) {
        self.bindings.push(Binding {
            name: func.name.clone(),
            value: Value::Function(Arc::new(func)),
            builtin: true,
        });
    }

    /// The innermost value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_binding(name).map(|b| &b.value)
    }

    /// The innermost binding of `name`.
    pub fn get_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| b.name == name)
    }

    /// Look up a name bound by the program, ignoring prelude builtins.
    ///
    /// Pattern variables consult this: a name already bound here makes the
    /// pattern compare instead of bind.
    pub fn get_user(&self, name: &str) -> Option<&Value> {
        self.get_binding(name)
            .filter(|b| !b.builtin)
            .map(|b| &b.value)
    }

    /// Whether `name` is bound at all.
    pub fn contains(&self, name: &str) -> bool {
        self.get_binding(name).is_some()
    }

    /// Snapshot of every visible binding, for a function to capture.
    pub fn capture(&self) -> Captures {
        self.bindings.as_slice().into()
    }

    /// All bindings, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Names bound in the innermost frame.
    pub fn names_in_current_scope(&self) -> Vec<&str> {
        let start = self.frames.last().copied().unwrap_or(0);
        self.bindings[start..].iter().map(|b| b.name.as_str()).collect()
    }

    /// Total number of bindings across all frames.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(name: &str) -> StackFrame {
        StackFrame {
            source: Arc::from("test"),
            function: name.to_string(),
            line: None,
            column: None,
        }
    }

    #[test]
    fn test_enter_call_limits_depth() {
        let mut env = Environment::new();
        env.enter_call(frame("a"), 2).unwrap();
        env.enter_call(frame("b"), 2).unwrap();
        assert!(matches!(
            env.enter_call(frame("c"), 2),
            Err(EvalError::StackOverflow { depth: 2, max: 2 })
        ));
        assert_eq!(env.call_depth(), 2);
    }

    #[test]
    fn test_stack_trace_innermost_first() {
        let mut env = Environment::new();
        env.enter_call(frame("outer"), 10).unwrap();
        env.enter_call(frame("inner"), 10).unwrap();
        let names: Vec<_> = env
            .stack_trace()
            .iter()
            .map(|f| f.function.clone())
            .collect();
        assert_eq!(names, vec!["inner", "outer"]);
    }

    #[test]
    fn test_for_call_shares_stack_not_bindings() {
        let mut caller = Environment::new();
        caller.define("local", Value::Integer(1));
        caller.enter_call(frame("caller"), 10).unwrap();

        let mut captured = Environment::new();
        captured.define("captured", Value::Integer(2));

        let callee = Environment::for_call(&captured.capture(), &caller);
        assert!(callee.contains("captured"));
        assert!(!callee.contains("local"));
        assert_eq!(callee.call_depth(), 1);
    }

    #[test]
    fn test_get_user_skips_builtins() {
        let env = Environment::with_prelude();
        assert!(env.get("len").is_some());
        assert!(env.get_user("len").is_none());
    }

    #[test]
    fn test_pop_frame_keeps_global() {
        let mut env = Environment::new();
        env.define("x", Value::Unit);
        env.pop_frame();
        assert!(env.contains("x"));
        assert_eq!(env.depth(), 1);
    }
}
