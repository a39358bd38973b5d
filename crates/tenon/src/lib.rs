//! # Tenon
//!
//! Runtime values and lazy objects for a declarative configuration
//! language.
//!
//! Tenon is the value layer an evaluator builds on. A front end turns
//! member definitions into [`ObjectMember`]s and assembles objects with an
//! [`ObjectBuilder`]; Tenon resolves members through the prototype chain,
//! evaluates each one at most once per instance, overlays declared element
//! types on listings and mappings without copying them, and exports fully
//! evaluated values.
//!
//! ## Architecture
//!
//! - **Values** ([`value`]): the closed set of runtime value kinds, units,
//!   classes, hashing and export
//! - **Objects** ([`object`]): member definitions, the per-instance value
//!   cache, listings, mappings and type-checking surrogates
//! - **Operators** ([`ops`]): checked integer math and the binary operators
//! - **Traversal** ([`visit`]): visitor dispatch, path-tracking conversion,
//!   rendering and JSON output
//!
//! Every evaluation call takes the session's [`EvalContext`], which holds
//! options, recursion depth and cycle detection state.
//!
//! ## Example
//!
//! ```
//! use tenon::{EvalContext, MemberKey, ObjectBuilder, ObjectMember, ObjectRef, Value};
//!
//! let parent = ObjectBuilder::new()
//!     .property("port", ObjectMember::constant(80i64))
//!     .build_dynamic();
//! let child: ObjectRef = ObjectBuilder::new()
//!     .parent(parent)
//!     .property("host", ObjectMember::constant("localhost"))
//!     .build_dynamic()
//!     .into();
//!
//! let mut ctx = EvalContext::new();
//! let port = child.read_member(&MemberKey::property("port"), &mut ctx).unwrap();
//! assert_eq!(port, Value::Int(80));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod environment;
pub mod error;
pub mod object;
pub mod ops;
pub mod value;
pub mod visit;

// Re-export main types
pub use context::{EvalContext, EvalOptions};
pub use environment::{Binding, CapturedScope, Environment, ScopeGuard};
pub use error::{ArithmeticError, Diagnostic, EvalError, ProgramValue, Result, SourceLocation};
pub use object::{
    ClassCheck, DynamicObject, Listing, Mapping, MemberFrame, MemberKey, Modifiers, ObjectBuilder,
    ObjectMember, ObjectRef, PredicateCheck, TypeCheck, TypedObject,
};
pub use value::{
    base, Class, DataSize, DataSizeUnit, Duration, DurationUnit, Exported, FunctionValue,
    HashableValue, IntSeq, Pair, RegexValue, TypeAlias, Value,
};
pub use visit::{JsonConverter, PathElement, ValueConverter, ValuePath, ValueRenderer, ValueVisitor};

/// Tenon version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
