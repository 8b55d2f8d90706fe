//! Scoped frames for `let`, `do`, case arms and `try` bodies

use std::ops::{Deref, DerefMut};

use super::Environment;

/// Holds a frame open on an [`Environment`] and pops it when dropped.
///
/// Everything bound through the guard (pattern variables, `let` names)
/// disappears with it, including on early return through `?`.
///
/// ```
/// use canopy::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.define("limit", Value::Integer(3));
/// {
///     let mut arm = env.scope_guard();
///     arm.define("head", Value::Char('a'));
///     assert!(arm.contains("limit"));
/// }
/// assert!(!env.contains("head"));
/// ```
pub struct ScopeGuard<'env> {
    env: &'env mut Environment,
}

impl Environment {
    /// Open a frame that closes when the returned guard is dropped.
    pub fn scope_guard(&mut self) -> ScopeGuard<'_> {
        self.push_frame();
        ScopeGuard { env: self }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.env.pop_frame();
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        self.env
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        self.env
    }
}
