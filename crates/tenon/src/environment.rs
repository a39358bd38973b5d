//! Lexical environment used while building objects
//!
//! A front end binds names in an [`Environment`] as it walks nested object
//! bodies, lets and function parameters. When an object is instantiated, the
//! visible bindings are snapshotted into a [`CapturedScope`] owned by the
//! object, so every member thunk can later be evaluated in exactly the scope
//! it was written in.

mod frame;

pub use frame::ScopeGuard;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::SourceLocation;
use crate::value::Value;

/// A single name binding.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The binding's name
    pub name: Arc<str>,

    /// The bound value
    pub value: Value,

    /// Where this binding was defined (for error messages)
    pub location: Option<SourceLocation>,
}

/// The front end's lexical environment.
///
/// Uses a flat binding stack with frame boundaries for cheap scope
/// entry/exit.
///
/// # Example
///
/// ```
/// use tenon::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.define("x", Value::Int(1));
///
/// env.push_frame();
/// env.define("x", Value::Int(10)); // Shadows outer x
/// assert_eq!(env.get("x"), Some(&Value::Int(10)));
///
/// let scope = env.capture();
/// env.pop_frame();
///
/// assert_eq!(env.get("x"), Some(&Value::Int(1)));
/// assert_eq!(scope.get("x"), Some(&Value::Int(10)));
/// ```
#[derive(Debug, Clone)]
pub struct Environment {
    /// All bindings (most recent at end)
    bindings: Vec<Binding>,

    /// Indices into `bindings` where each scope begins
    frames: Vec<usize>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create a new empty environment.
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            frames: vec![0], // global scope
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Frame Management
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a new scope.
    pub fn push_frame(&mut self) {
        self.frames.push(self.bindings.len());
    }

    /// Exit the current scope, dropping its bindings.
    ///
    /// Does nothing at global scope.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            if let Some(boundary) = self.frames.pop() {
                self.bindings.truncate(boundary);
            }
        }
    }

    /// Number of frames, including the global one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether we're at global scope.
    pub fn is_global_scope(&self) -> bool {
        self.frames.len() == 1
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════════

    /// Bind `name` in the current scope, shadowing any outer binding.
    pub fn define(&mut self, name: impl Into<Arc<str>>, value: Value) {
        self.bindings.push(Binding {
            name: name.into(),
            value,
            location: None,
        });
    }

    /// Bind `name` with a definition location for error reporting.
    pub fn define_at(&mut self, name: impl Into<Arc<str>>, value: Value, location: SourceLocation) {
        self.bindings.push(Binding {
            name: name.into(),
            value,
            location: Some(location),
        });
    }

    /// Look up the innermost binding for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_binding(name).map(|b| &b.value)
    }

    /// Look up the innermost binding for `name`, with its metadata.
    pub fn get_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| &*b.name == name)
    }

    /// Check if a binding exists.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.iter().any(|b| &*b.name == name)
    }

    /// Check if a binding exists in the innermost scope only.
    pub fn contains_in_current_scope(&self, name: &str) -> bool {
        let frame_start = *self.frames.last().unwrap_or(&0);
        self.bindings[frame_start..].iter().any(|b| &*b.name == name)
    }

    /// Number of bindings across all frames.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Snapshot the visible bindings, innermost winning.
    pub fn capture(&self) -> CapturedScope {
        let mut slots = IndexMap::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            // shadowed bindings move to the position of the innermost one
            slots.shift_remove(&binding.name);
            slots.insert(binding.name.clone(), binding.value.clone());
        }
        CapturedScope {
            slots: Arc::new(slots),
        }
    }
}

/// Immutable snapshot of the lexical scope active when an object was
/// instantiated.
///
/// Cheap to clone: the slots are shared.
#[derive(Debug, Clone, Default)]
pub struct CapturedScope {
    slots: Arc<IndexMap<Arc<str>, Value>>,
}

impl CapturedScope {
    /// The empty scope.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a captured binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Iterate captured bindings, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(k, v)| (&**k, v))
    }

    /// Number of captured bindings.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_is_a_snapshot() {
        let mut env = Environment::new();
        env.define("a", Value::Int(1));
        let scope = env.capture();
        env.define("b", Value::Int(2));

        assert_eq!(scope.get("a"), Some(&Value::Int(1)));
        assert_eq!(scope.get("b"), None);
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_capture_innermost_wins() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));
        env.define("y", Value::Int(2));
        env.push_frame();
        env.define("x", Value::Int(3));

        let scope = env.capture();
        assert_eq!(scope.get("x"), Some(&Value::Int(3)));
        let names: Vec<&str> = scope.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn test_pop_frame_never_pops_global() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));
        env.pop_frame();
        assert!(env.is_global_scope());
        assert!(env.contains("x"));
    }

    #[test]
    fn test_contains_in_current_scope() {
        let mut env = Environment::new();
        env.define("outer", Value::Null);
        env.push_frame();
        env.define("inner", Value::Null);
        assert!(env.contains_in_current_scope("inner"));
        assert!(!env.contains_in_current_scope("outer"));
    }

    #[test]
    fn test_define_at_records_location() {
        let mut env = Environment::new();
        env.define_at("x", Value::Int(1), SourceLocation::new("file:///m.pkl", 3, 5));
        let binding = env.get_binding("x").unwrap();
        assert_eq!(binding.location.as_ref().map(|l| l.line), Some(3));
    }
}
