//! Error types for evaluation
//!
//! Every failure unwinds as an [`EvalError`]. User-facing variants carry a
//! [`Diagnostic`] with enough context for a renderer at the boundary to
//! produce a full message without walking the value graph again. Internal
//! invariant violations are reported as [`Bug`] and are never recovered from.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::object::MemberKey;
use crate::value::Value;
use crate::visit::{PathElement, ValuePath, ValueRenderer};

/// A position in a source module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// URI of the module the location belongs to
    pub uri: Arc<str>,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(uri: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            uri: uri.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.uri, self.line, self.column)
    }
}

/// A named value attached to a diagnostic, e.g. `("Value", 42)`.
#[derive(Debug, Clone)]
pub struct ProgramValue {
    /// Label shown next to the value
    pub name: String,
    /// The offending value
    pub value: Value,
}

impl ProgramValue {
    /// Create a new program value.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for ProgramValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.name,
            ValueRenderer::single_line(80).render(&self.value)
        )
    }
}

/// Diagnostic context shared by all user-facing errors.
#[derive(Debug, Clone, Default)]
pub struct Diagnostic {
    /// Message template with `{0}`, `{1}`, ... placeholders
    pub template: Cow<'static, str>,
    /// Rendered template arguments
    pub args: Vec<String>,
    /// Optional human-readable hint
    pub hint: Option<String>,
    /// Error that caused this one
    pub cause: Option<Arc<EvalError>>,
    /// Ordered `(name, value)` pairs for the renderer
    pub program_values: Vec<ProgramValue>,
    /// Where the error occurred
    pub location: Option<SourceLocation>,
    /// Name of the member being evaluated, if known
    pub member_name: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic from a template and its arguments.
    pub fn new(template: impl Into<Cow<'static, str>>, args: Vec<String>) -> Self {
        Self {
            template: template.into(),
            args,
            ..Default::default()
        }
    }

    /// Substitute the arguments into the template.
    pub fn message(&self) -> String {
        let mut message = self.template.to_string();
        for (i, arg) in self.args.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), arg);
        }
        message
    }
}

/// Failures raised by the checked arithmetic layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    /// Integer result does not fit in 64 bits
    IntOverflow,
    /// Integer division or remainder by zero
    DivisionByZero,
    /// Integer does not fit in 32 bits
    IntValueTooLarge,
    /// Float is finite but outside the integer range
    CannotConvertLargeFloat,
    /// Float is NaN or infinite
    CannotConvertNonFiniteFloat,
}

impl ArithmeticError {
    fn template(self) -> &'static str {
        match self {
            ArithmeticError::IntOverflow => "Integer overflow.",
            ArithmeticError::DivisionByZero => "Division by zero.",
            ArithmeticError::IntValueTooLarge => {
                "Integer value `{0}` is too large to fit into 32 bits."
            }
            ArithmeticError::CannotConvertLargeFloat => {
                "Cannot convert `{0}` to `Int` because it is too large."
            }
            ArithmeticError::CannotConvertNonFiniteFloat => {
                "Cannot convert non-finite `{0}` to `Int`."
            }
        }
    }
}

/// An internal invariant violation.
///
/// Signals cache or definition corruption, never a mistake in user code.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct Bug {
    /// What went wrong
    pub message: String,
}

/// Main error type for evaluation.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Generic evaluation failure raised by a member body or builtin
    #[error("{}", .0.message())]
    Eval(Box<Diagnostic>),

    /// A required member has no value
    #[error("{}", .diagnostic.message())]
    UndefinedValue {
        /// Key of the member without a value
        key: MemberKey,
        /// Object the member was read from
        receiver: Option<Value>,
        /// Diagnostic context
        diagnostic: Box<Diagnostic>,
    },

    /// A value failed a declared element or entry type
    #[error("{}", .diagnostic.message())]
    TypeMismatch {
        /// Rendered expected type
        expected: String,
        /// The value that failed the check
        actual: Value,
        /// Diagnostic context
        diagnostic: Box<Diagnostic>,
    },

    /// Checked arithmetic failed
    #[error("{}", .diagnostic.message())]
    Arithmetic {
        /// Which arithmetic failure occurred
        kind: ArithmeticError,
        /// Diagnostic context
        diagnostic: Box<Diagnostic>,
    },

    /// A member's value depends on itself
    #[error("{}", .diagnostic.message())]
    CyclicDefinition {
        /// Key of the member re-entered while evaluating
        key: MemberKey,
        /// Diagnostic context
        diagnostic: Box<Diagnostic>,
    },

    /// No definition for a member exists anywhere in the prototype chain
    #[error("{}", .diagnostic.message())]
    MemberNotFound {
        /// Key that was looked up
        key: MemberKey,
        /// Diagnostic context
        diagnostic: Box<Diagnostic>,
    },

    /// Evaluation nested deeper than the configured limit
    #[error("{}", .diagnostic.message())]
    StackOverflow {
        /// Depth at which evaluation was aborted
        depth: usize,
        /// Diagnostic context
        diagnostic: Box<Diagnostic>,
    },

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Bug(Bug),
}

/// Result type alias for evaluation
pub type Result<T> = std::result::Result<T, EvalError>;

impl EvalError {
    // ═══════════════════════════════════════════════════════════════════
    // Constructors
    // ═══════════════════════════════════════════════════════════════════

    /// Create a generic evaluation error.
    pub fn eval(template: impl Into<Cow<'static, str>>, args: Vec<String>) -> Self {
        EvalError::Eval(Box::new(Diagnostic::new(template, args)))
    }

    /// Create an undefined-value error for `key` read from `receiver`.
    pub fn undefined_value(key: MemberKey, receiver: Option<Value>) -> Self {
        let template = match key {
            MemberKey::Property(_) => "Tried to read property `{0}` but its value is undefined.",
            MemberKey::Element(_) => "Tried to read element `{0}` but its value is undefined.",
            MemberKey::Entry(_) => "Tried to read entry `{0}` but its value is undefined.",
        };
        let mut diagnostic = Diagnostic::new(template, vec![key.to_string()]);
        diagnostic.member_name = Some(key.to_string());
        EvalError::UndefinedValue {
            key,
            receiver,
            diagnostic: Box::new(diagnostic),
        }
    }

    /// Create a type-check failure.
    pub fn type_mismatch(expected: impl Into<String>, actual: Value) -> Self {
        let expected = expected.into();
        let rendered = ValueRenderer::single_line(80).render(&actual);
        let mut diagnostic = Diagnostic::new(
            "Expected value of type `{0}`, but got {1}.",
            vec![expected.clone(), rendered],
        );
        diagnostic
            .program_values
            .push(ProgramValue::new("Value", actual.clone()));
        EvalError::TypeMismatch {
            expected,
            actual,
            diagnostic: Box::new(diagnostic),
        }
    }

    /// Create an arithmetic error. `operand` fills the template's `{0}`.
    pub fn arithmetic(kind: ArithmeticError, operand: Option<&Value>) -> Self {
        let args = operand
            .map(|v| vec![ValueRenderer::single_line(80).render(v)])
            .unwrap_or_default();
        EvalError::Arithmetic {
            kind,
            diagnostic: Box::new(Diagnostic::new(kind.template(), args)),
        }
    }

    /// Create a cyclic-definition error.
    pub fn cyclic_definition(key: MemberKey) -> Self {
        let mut diagnostic = Diagnostic::new(
            "A stack overflow occurred: member `{0}` refers to itself.",
            vec![key.to_string()],
        );
        diagnostic.member_name = Some(key.to_string());
        EvalError::CyclicDefinition {
            key,
            diagnostic: Box::new(diagnostic),
        }
    }

    /// Create a member-not-found error.
    pub fn member_not_found(key: MemberKey, class_name: &str) -> Self {
        let template = match key {
            MemberKey::Property(_) => "Cannot find property `{0}` in object of type `{1}`.",
            MemberKey::Element(_) => "Element index `{0}` is out of range for `{1}`.",
            MemberKey::Entry(_) => "Cannot find key `{0}` in `{1}`.",
        };
        let diagnostic = Diagnostic::new(template, vec![key.to_string(), class_name.to_string()]);
        EvalError::MemberNotFound {
            key,
            diagnostic: Box::new(diagnostic),
        }
    }

    /// Create a stack-overflow error.
    pub fn stack_overflow(depth: usize) -> Self {
        EvalError::StackOverflow {
            depth,
            diagnostic: Box::new(Diagnostic::new(
                "A stack overflow occurred at evaluation depth {0}.",
                vec![depth.to_string()],
            )),
        }
    }

    /// Create an internal-invariant error.
    pub fn bug(message: impl Into<String>) -> Self {
        EvalError::Bug(Bug {
            message: message.into(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Diagnostic Access
    // ═══════════════════════════════════════════════════════════════════

    /// The diagnostic context, absent for [`EvalError::Bug`].
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            EvalError::Eval(diagnostic) => Some(diagnostic),
            EvalError::UndefinedValue { diagnostic, .. }
            | EvalError::TypeMismatch { diagnostic, .. }
            | EvalError::Arithmetic { diagnostic, .. }
            | EvalError::CyclicDefinition { diagnostic, .. }
            | EvalError::MemberNotFound { diagnostic, .. }
            | EvalError::StackOverflow { diagnostic, .. } => Some(diagnostic),
            EvalError::Bug(_) => None,
        }
    }

    fn diagnostic_mut(&mut self) -> Option<&mut Diagnostic> {
        match self {
            EvalError::Eval(diagnostic) => Some(diagnostic),
            EvalError::UndefinedValue { diagnostic, .. }
            | EvalError::TypeMismatch { diagnostic, .. }
            | EvalError::Arithmetic { diagnostic, .. }
            | EvalError::CyclicDefinition { diagnostic, .. }
            | EvalError::MemberNotFound { diagnostic, .. }
            | EvalError::StackOverflow { diagnostic, .. } => Some(diagnostic),
            EvalError::Bug(_) => None,
        }
    }

    /// The hint, if any.
    pub fn hint(&self) -> Option<&str> {
        self.diagnostic().and_then(|d| d.hint.as_deref())
    }

    /// The source location, if any.
    pub fn location(&self) -> Option<&SourceLocation> {
        self.diagnostic().and_then(|d| d.location.as_ref())
    }

    /// The causing error, if any.
    pub fn cause(&self) -> Option<&EvalError> {
        self.diagnostic().and_then(|d| d.cause.as_deref())
    }

    /// Diagnostic `(name, value)` pairs.
    pub fn program_values(&self) -> &[ProgramValue] {
        self.diagnostic()
            .map(|d| d.program_values.as_slice())
            .unwrap_or(&[])
    }

    /// Whether this is an undefined-value error.
    pub fn is_undefined_value(&self) -> bool {
        matches!(self, EvalError::UndefinedValue { .. })
    }

    /// Whether any recovery site may handle this error. Bugs are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EvalError::Bug(_))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Builders
    // ═══════════════════════════════════════════════════════════════════

    /// Attach a hint, replacing any existing one.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        if let Some(d) = self.diagnostic_mut() {
            d.hint = Some(hint.into());
        }
        self
    }

    /// Attach a causing error.
    pub fn with_cause(mut self, cause: EvalError) -> Self {
        if let Some(d) = self.diagnostic_mut() {
            d.cause = Some(Arc::new(cause));
        }
        self
    }

    /// Append a diagnostic `(name, value)` pair.
    pub fn with_program_value(mut self, name: impl Into<String>, value: Value) -> Self {
        if let Some(d) = self.diagnostic_mut() {
            d.program_values.push(ProgramValue::new(name, value));
        }
        self
    }

    /// Attribute the error to `location` unless it already has one.
    pub fn with_location(mut self, location: Option<&SourceLocation>) -> Self {
        if let (Some(d), Some(location)) = (self.diagnostic_mut(), location) {
            if d.location.is_none() {
                d.location = Some(location.clone());
            }
        }
        self
    }

    /// Record the member being evaluated unless one is already recorded.
    pub fn with_member_name(mut self, name: impl Into<String>) -> Self {
        if let Some(d) = self.diagnostic_mut() {
            if d.member_name.is_none() {
                d.member_name = Some(name.into());
            }
        }
        self
    }

    /// Describe where an undefined value was encountered.
    ///
    /// Only applies to [`EvalError::UndefinedValue`] without a hint. `path`
    /// leads to the object the member was read from; the member key is
    /// appended when rendering.
    pub fn fill_in_hint(mut self, path: &ValuePath, top_level: &Value) -> Self {
        if let EvalError::UndefinedValue {
            key, diagnostic, ..
        } = &mut self
        {
            if diagnostic.hint.is_none() {
                let mut full = path.clone();
                full.push(PathElement::from(&*key));

                let mut hint = format!(
                    "The above error occurred when rendering path `{}`",
                    full.render()
                );
                if let Value::Typed(typed) = top_level {
                    if let Some(uri) = typed.module_uri() {
                        hint.push_str(&format!(" of module `{}`", uri));
                    }
                }
                hint.push('.');
                diagnostic.hint = Some(hint);
            }
        }
        self
    }
}
