//! RAII scope guard for automatic frame cleanup

use super::Environment;

/// RAII guard that pops a frame when dropped.
///
/// # Example
///
/// ```
/// use tenon::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.define("x", Value::Int(1));
///
/// {
///     let mut guard = env.scope_guard();
///     guard.define("y", Value::Int(2));
///     assert!(guard.capture().get("y").is_some());
/// }
/// assert!(!env.contains("y"));
/// assert!(env.contains("x"));
/// ```
pub struct ScopeGuard<'a> {
    env: &'a mut Environment,
}

impl Environment {
    /// Push a frame now and pop it when the guard drops.
    pub fn scope_guard(&mut self) -> ScopeGuard<'_> {
        self.push_frame();
        ScopeGuard { env: self }
    }
}

impl<'a> Drop for ScopeGuard<'a> {
    fn drop(&mut self) {
        self.env.pop_frame();
    }
}

impl<'a> std::ops::Deref for ScopeGuard<'a> {
    type Target = Environment;

    fn deref(&self) -> &Self::Target {
        self.env
    }
}

impl<'a> std::ops::DerefMut for ScopeGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.env
    }
}
