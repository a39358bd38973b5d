//! Type-checking overlays over listings and mappings
//!
//! A surrogate is an object with no members of its own whose reads fall
//! through to a base object. Every element or entry value coming back from
//! the base is run through the surrogate's [`TypeCheck`] before it is cached
//! on the surrogate. Surrogates stack: checks apply from the level nearest
//! the base outward.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::context::EvalContext;
use crate::environment::CapturedScope;
use crate::error::{EvalError, Result};
use crate::value::{Class, Value};

use super::{MemberKey, ObjectRef};

/// A declared element or entry type.
pub trait TypeCheck: Send + Sync {
    /// Rendering of the expected type, e.g. `Int` or `String(!isEmpty)`.
    fn expected_type(&self) -> String;

    /// Check `value`, returning the value to store on success.
    fn check(&self, value: Value, scope: &CapturedScope, ctx: &mut EvalContext) -> Result<Value>;

    /// Type test (`value is T`): a failing check is `false`, not an error.
    fn matches(&self, value: &Value, scope: &CapturedScope, ctx: &mut EvalContext) -> Result<bool> {
        ctx.type_test(|ctx| match self.check(value.clone(), scope, ctx) {
            Ok(_) => Ok(true),
            Err(EvalError::TypeMismatch { .. }) => Ok(false),
            Err(other) => Err(other),
        })
    }
}

/// Membership in a class, optionally nullable.
#[derive(Debug, Clone)]
pub struct ClassCheck {
    class: Arc<Class>,
    nullable: bool,
}

impl ClassCheck {
    /// Require an instance of `class`.
    pub fn new(class: Arc<Class>) -> Self {
        Self {
            class,
            nullable: false,
        }
    }

    /// Also accept `null` (builder pattern).
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl TypeCheck for ClassCheck {
    fn expected_type(&self) -> String {
        if self.nullable {
            format!("{}?", self.class.name())
        } else {
            self.class.name().to_string()
        }
    }

    fn check(&self, value: Value, _: &CapturedScope, _: &mut EvalContext) -> Result<Value> {
        if (self.nullable && value.is_null()) || value.class_of().is_subclass_of(&self.class) {
            Ok(value)
        } else {
            Err(EvalError::type_mismatch(self.expected_type(), value))
        }
    }
}

type Predicate = dyn Fn(&Value, &CapturedScope, &mut EvalContext) -> Result<bool> + Send + Sync;

/// A class check refined by a constraint, e.g. `Int(isPositive)`.
pub struct PredicateCheck {
    base: ClassCheck,
    constraint: String,
    predicate: Arc<Predicate>,
}

impl PredicateCheck {
    /// Refine `base` with `predicate`, rendered as `constraint`.
    pub fn new<F>(base: ClassCheck, constraint: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value, &CapturedScope, &mut EvalContext) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            base,
            constraint: constraint.into(),
            predicate: Arc::new(predicate),
        }
    }
}

impl TypeCheck for PredicateCheck {
    fn expected_type(&self) -> String {
        format!("{}({})", self.base.expected_type(), self.constraint)
    }

    fn check(&self, value: Value, scope: &CapturedScope, ctx: &mut EvalContext) -> Result<Value> {
        let value = self.base.check(value, scope, ctx)?;
        if (self.predicate)(&value, scope, ctx)? {
            Ok(value)
        } else {
            Err(EvalError::type_mismatch(self.expected_type(), value))
        }
    }
}

/// Overlay state of a surrogate object.
#[derive(Clone)]
pub struct Surrogate {
    base: ObjectRef,
    type_check: Arc<dyn TypeCheck>,
    scope: CapturedScope,
}

impl Surrogate {
    pub(crate) fn new(base: ObjectRef, type_check: Arc<dyn TypeCheck>, scope: CapturedScope) -> Self {
        Self {
            base,
            type_check,
            scope,
        }
    }

    /// The overlaid object.
    pub fn base(&self) -> &ObjectRef {
        &self.base
    }

    /// The declared type.
    pub fn type_check(&self) -> &Arc<dyn TypeCheck> {
        &self.type_check
    }

    /// Read `key` from the base and check the result against this level.
    ///
    /// Properties (such as `default`) pass through unchecked.
    pub(crate) fn read_through(&self, key: &MemberKey, ctx: &mut EvalContext) -> Result<Value> {
        let value = self.base.read_member(key, ctx)?;
        if key.is_property() {
            return Ok(value);
        }
        let member = self
            .base
            .member_of_record(key)
            .ok_or_else(|| EvalError::bug(format!("no definition of record for `{}`", key)))?;

        trace!(
            object = ?self.base.id(),
            %key,
            expected = %self.type_check.expected_type(),
            "checking surrogate value"
        );
        self.type_check
            .check(value, &self.scope, ctx)
            .map_err(|e| e.with_location(member.check_location()))
    }
}

impl fmt::Debug for Surrogate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surrogate")
            .field("base", &self.base.id())
            .field("type_check", &self.type_check.expected_type())
            .finish()
    }
}
