//! Member keys and member definitions

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::context::EvalContext;
use crate::environment::CapturedScope;
use crate::error::{Result, SourceLocation};
use crate::value::{std_hash, HashableValue, Value};
use crate::visit::ValueRenderer;

use super::ObjectRef;

/// Name of the pseudo-member supplying fallback elements and entries.
pub const DEFAULT_MEMBER: &str = "default";

/// Identifies a member within an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKey {
    /// Named property, e.g. `name`
    Property(Arc<str>),
    /// Listing or dynamic element by index
    Element(i64),
    /// Mapping or dynamic entry by key
    Entry(HashableValue),
}

impl MemberKey {
    /// Key for a named property.
    pub fn property(name: impl Into<Arc<str>>) -> Self {
        MemberKey::Property(name.into())
    }

    /// Key for an element index.
    pub fn element(index: i64) -> Self {
        MemberKey::Element(index)
    }

    /// Key for an entry.
    pub fn entry(key: impl Into<HashableValue>) -> Self {
        MemberKey::Entry(key.into())
    }

    /// Key of the `default` pseudo-member.
    pub fn default_member() -> Self {
        MemberKey::property(DEFAULT_MEMBER)
    }

    /// Whether this is a property key.
    pub fn is_property(&self) -> bool {
        matches!(self, MemberKey::Property(_))
    }

    /// Whether this is an element key.
    pub fn is_element(&self) -> bool {
        matches!(self, MemberKey::Element(_))
    }

    /// Whether this is an entry key.
    pub fn is_entry(&self) -> bool {
        matches!(self, MemberKey::Entry(_))
    }

    /// Property name, if this is a property key.
    pub fn as_property(&self) -> Option<&str> {
        match self {
            MemberKey::Property(name) => Some(name),
            _ => None,
        }
    }

    /// Hash code used by object hashing; agrees with `Value::hash_code` of
    /// the key's value form.
    pub(crate) fn hash_code(&self) -> i64 {
        match self {
            MemberKey::Property(name) => std_hash(name),
            MemberKey::Element(index) => std_hash(index),
            MemberKey::Entry(key) => key.hash_code(),
        }
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKey::Property(name) => f.write_str(name),
            MemberKey::Element(index) => write!(f, "{}", index),
            MemberKey::Entry(key) => {
                f.write_str(&ValueRenderer::single_line(80).render(key.value()))
            }
        }
    }
}

bitflags! {
    /// Declaration modifiers of a member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        /// Visible only inside the declaring object
        const LOCAL = 1 << 0;
        /// Excluded from output
        const HIDDEN = 1 << 1;
        /// Implemented by the host
        const EXTERNAL = 1 << 2;
        /// Must be overridden
        const ABSTRACT = 1 << 3;
        /// May only reference other const members
        const CONST = 1 << 4;
        /// Cannot be amended
        const FIXED = 1 << 5;
        /// Member is a class declaration
        const CLASS = 1 << 6;
        /// Member is a type alias declaration
        const TYPE_ALIAS = 1 << 7;
    }
}

impl Modifiers {
    /// Members that never take part in iteration or output.
    pub const INTERNAL: Modifiers = Modifiers::LOCAL
        .union(Modifiers::HIDDEN)
        .union(Modifiers::EXTERNAL);
}

/// Everything a member body can see while it is evaluated.
pub struct MemberFrame<'a> {
    /// Object the member is read from (`this`)
    pub receiver: &'a ObjectRef,
    /// Object that declares the member definition
    pub owner: &'a ObjectRef,
    /// Lexical scope captured by the owner
    pub scope: &'a CapturedScope,
    /// Key being evaluated
    pub key: &'a MemberKey,
}

impl MemberFrame<'_> {
    /// Read another member of the receiver.
    pub fn read(&self, key: &MemberKey, ctx: &mut EvalContext) -> Result<Value> {
        self.receiver.read_member(key, ctx)
    }

    /// Read a property of the receiver.
    pub fn property(&self, name: &str, ctx: &mut EvalContext) -> Result<Value> {
        self.read(&MemberKey::property(name), ctx)
    }

    /// Look up a captured binding.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scope.get(name)
    }
}

/// An unevaluated member body.
///
/// Produced by the front end. Evaluation must be a deterministic function of
/// the frame: a member may be computed more than once under concurrent reads
/// and the last result is the one kept.
pub trait MemberThunk: Send + Sync {
    /// Compute the member's value.
    fn evaluate(&self, frame: &MemberFrame<'_>, ctx: &mut EvalContext) -> Result<Value>;
}

impl<F> MemberThunk for F
where
    F: Fn(&MemberFrame<'_>, &mut EvalContext) -> Result<Value> + Send + Sync,
{
    fn evaluate(&self, frame: &MemberFrame<'_>, ctx: &mut EvalContext) -> Result<Value> {
        self(frame, ctx)
    }
}

/// Body of a member definition.
#[derive(Clone)]
pub enum MemberBody {
    /// Already-known value
    Constant(Value),
    /// Lazily evaluated body
    Thunk(Arc<dyn MemberThunk>),
    /// Declared without a value
    Undefined,
}

impl fmt::Debug for MemberBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberBody::Constant(value) => write!(f, "Constant({:?})", value),
            MemberBody::Thunk(_) => f.write_str("Thunk"),
            MemberBody::Undefined => f.write_str("Undefined"),
        }
    }
}

/// A member definition. Immutable once its object is built.
#[derive(Debug, Clone)]
pub struct ObjectMember {
    modifiers: Modifiers,
    location: Option<SourceLocation>,
    body_location: Option<SourceLocation>,
    body: MemberBody,
}

impl ObjectMember {
    fn new(body: MemberBody) -> Self {
        Self {
            modifiers: Modifiers::empty(),
            location: None,
            body_location: None,
            body,
        }
    }

    /// A member with a known value.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::new(MemberBody::Constant(value.into()))
    }

    /// A member computed on first read.
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn(&MemberFrame<'_>, &mut EvalContext) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(MemberBody::Thunk(Arc::new(f)))
    }

    /// A member backed by a shared thunk.
    pub fn from_thunk(thunk: Arc<dyn MemberThunk>) -> Self {
        Self::new(MemberBody::Thunk(thunk))
    }

    /// A member declared without a value.
    pub fn undefined() -> Self {
        Self::new(MemberBody::Undefined)
    }

    /// Add modifiers (builder pattern).
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Mark `local` (builder pattern).
    pub fn local(self) -> Self {
        self.with_modifiers(Modifiers::LOCAL)
    }

    /// Mark `hidden` (builder pattern).
    pub fn hidden(self) -> Self {
        self.with_modifiers(Modifiers::HIDDEN)
    }

    /// Set the declaration location (builder pattern).
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the body location (builder pattern).
    pub fn with_body_location(mut self, location: SourceLocation) -> Self {
        self.body_location = Some(location);
        self
    }

    /// Declaration modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// The body.
    pub fn body(&self) -> &MemberBody {
        &self.body
    }

    /// Where the member is declared.
    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Where the member's body starts.
    pub fn body_location(&self) -> Option<&SourceLocation> {
        self.body_location.as_ref()
    }

    /// Location type-check failures are attributed to.
    pub fn check_location(&self) -> Option<&SourceLocation> {
        self.body_location.as_ref().or(self.location.as_ref())
    }

    /// Whether the member is `local`.
    pub fn is_local(&self) -> bool {
        self.modifiers.contains(Modifiers::LOCAL)
    }

    /// Whether the member is `hidden`.
    pub fn is_hidden(&self) -> bool {
        self.modifiers.contains(Modifiers::HIDDEN)
    }

    /// Whether the member is `external`.
    pub fn is_external(&self) -> bool {
        self.modifiers.contains(Modifiers::EXTERNAL)
    }

    /// Whether the member is `abstract`.
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    /// Whether the member is `const`.
    pub fn is_const(&self) -> bool {
        self.modifiers.contains(Modifiers::CONST)
    }

    /// Whether the member is `fixed`.
    pub fn is_fixed(&self) -> bool {
        self.modifiers.contains(Modifiers::FIXED)
    }

    /// Whether the member declares a class or type alias.
    pub fn is_type_declaration(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::CLASS | Modifiers::TYPE_ALIAS)
    }

    /// Whether the member is excluded from iteration and output.
    pub fn is_internal(&self) -> bool {
        self.modifiers.intersects(Modifiers::INTERNAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(MemberKey::property("port").to_string(), "port");
        assert_eq!(MemberKey::element(3).to_string(), "3");
        assert_eq!(MemberKey::entry("k").to_string(), "\"k\"");
    }

    #[test]
    fn test_internal_modifiers() {
        assert!(ObjectMember::constant(1i64).local().is_internal());
        assert!(ObjectMember::undefined().hidden().is_internal());
        let class_member = ObjectMember::constant(1i64).with_modifiers(Modifiers::CLASS);
        assert!(!class_member.is_internal());
        assert!(class_member.is_type_declaration());
    }

    #[test]
    fn test_check_location_prefers_body() {
        let decl = SourceLocation::new("file:///m.pkl", 1, 1);
        let body = SourceLocation::new("file:///m.pkl", 1, 9);
        let member = ObjectMember::constant(1i64).at(decl.clone());
        assert_eq!(member.check_location(), Some(&decl));
        let member = member.with_body_location(body.clone());
        assert_eq!(member.check_location(), Some(&body));
    }
}
