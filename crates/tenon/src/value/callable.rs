//! Callable values

use std::fmt;
use std::sync::Arc;

use crate::context::EvalContext;
use crate::error::{EvalError, Result};

use super::Value;

/// Native function body.
pub type NativeFn = Arc<dyn Fn(&[Value], &mut EvalContext) -> Result<Value> + Send + Sync>;

/// A function value with a fixed arity.
///
/// The body is an already-closed native function: whatever scope it needs
/// was captured when the front end built it.
#[derive(Clone)]
pub struct FunctionValue {
    /// Name for diagnostics, if the function was declared with one
    pub name: Option<String>,

    /// Number of parameters
    pub arity: usize,

    body: NativeFn,
}

impl FunctionValue {
    /// Create an anonymous function.
    pub fn new(
        arity: usize,
        body: impl Fn(&[Value], &mut EvalContext) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: None,
            arity,
            body: Arc::new(body),
        }
    }

    /// Set the function name (builder pattern).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Apply the function.
    pub fn call(&self, args: &[Value], ctx: &mut EvalContext) -> Result<Value> {
        if args.len() != self.arity {
            return Err(EvalError::eval(
                "Function expects {0} argument(s), but was called with {1}.",
                vec![self.arity.to_string(), args.len().to_string()],
            ));
        }
        (self.body)(args, ctx)
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Function({}/{})", name, self.arity),
            None => write!(f, "Function(<anonymous>/{})", self.arity),
        }
    }
}
