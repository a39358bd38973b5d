//! Evaluation context configuration
//!
//! One [`EvalContext`] exists per evaluation session and is passed as
//! `&mut EvalContext` through every evaluation call. Sessions evaluating
//! sibling modules in parallel each own their context, so none of this state
//! is global.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::object::{MemberKey, ObjectId};

/// Options controlling an evaluation session.
///
/// Deserializable so hosts can load them from their own configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Maximum member evaluation depth (stack overflow protection)
    pub max_depth: usize,

    /// Run element/entry type checks when a surrogate is created instead of
    /// on first read
    pub eager_type_checks: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            eager_type_checks: false,
        }
    }
}

/// Per-session evaluation state.
#[derive(Debug, Default)]
pub struct EvalContext {
    options: EvalOptions,

    /// Set while evaluating the body of a type test (`x is T`)
    in_type_test: bool,

    /// Nesting depth of diagnostic trackers
    tracker_depth: usize,

    /// Current member evaluation depth
    depth: usize,

    /// Members this session is currently evaluating
    evaluating: FxHashSet<(ObjectId, MemberKey)>,

    /// Objects this session is currently forcing
    forcing: FxHashSet<ObjectId>,
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with the given options.
    pub fn with_options(options: EvalOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Create a context with a custom depth limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self::with_options(EvalOptions {
            max_depth,
            ..Default::default()
        })
    }

    /// The session options.
    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Whether type checks run eagerly.
    pub fn eager_type_checks(&self) -> bool {
        self.options.eager_type_checks
    }

    /// Whether evaluation is currently inside a type test.
    pub fn in_type_test(&self) -> bool {
        self.in_type_test
    }

    /// Current diagnostic tracker nesting depth.
    pub fn tracker_depth(&self) -> usize {
        self.tracker_depth
    }

    /// Current member evaluation depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run `f` with the in-type-test flag set, restoring it afterwards.
    pub fn type_test<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.in_type_test, true);
        let result = f(self);
        self.in_type_test = previous;
        result
    }

    /// Run `f` one diagnostic tracker level deeper.
    pub fn track<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.tracker_depth >= self.options.max_depth {
            return Err(EvalError::stack_overflow(self.tracker_depth));
        }
        self.tracker_depth += 1;
        let result = f(self);
        self.tracker_depth -= 1;
        result
    }

    /// Run `f` while `key` of object `id` is marked as being evaluated.
    ///
    /// Re-entering the same member of the same object within this session is
    /// a cyclic definition.
    pub(crate) fn evaluating_member<T>(
        &mut self,
        id: ObjectId,
        key: &MemberKey,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.depth >= self.options.max_depth {
            return Err(EvalError::stack_overflow(self.depth));
        }
        let entry = (id, key.clone());
        if !self.evaluating.insert(entry.clone()) {
            return Err(EvalError::cyclic_definition(key.clone()));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        self.evaluating.remove(&entry);
        result
    }

    /// Run `f` while object `id` is marked as being forced.
    ///
    /// Returns `Ok(false)` without running `f` when this session is already
    /// forcing `id` further up the stack.
    pub(crate) fn forcing_object(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<bool> {
        if !self.forcing.insert(id) {
            return Ok(false);
        }
        let result = f(self);
        self.forcing.remove(&id);
        result.map(|()| true)
    }
}
