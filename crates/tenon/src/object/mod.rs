//! Lazy objects: member definitions, the value cache and prototype lookup
//!
//! Every object kind ([`DynamicObject`], [`TypedObject`], [`Listing`],
//! [`Mapping`]) wraps an [`ObjectCore`]. Member definitions are fixed at
//! construction; values are computed on first read, cached per instance and
//! tagged with the definition that produced them.
//!
//! The cache is not locked around evaluation. Two sessions reading the same
//! member concurrently may both compute it, and the last write wins. Member
//! bodies must therefore be pure functions of their frame.

mod dynamic;
mod listing;
mod mapping;
mod member;
mod surrogate;

pub use dynamic::{DynamicObject, TypedObject};
pub use listing::Listing;
pub use mapping::Mapping;
pub use member::{
    MemberBody, MemberFrame, MemberKey, MemberThunk, Modifiers, ObjectMember, DEFAULT_MEMBER,
};
pub use surrogate::{ClassCheck, PredicateCheck, Surrogate, TypeCheck};

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use dashmap::DashMap;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::context::EvalContext;
use crate::environment::CapturedScope;
use crate::error::{EvalError, Result};
use crate::value::{Class, Exported, HashableValue, Value};

/// Unique identity of an object instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ObjectId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Ordered member definitions, keyed by member key.
pub type Members = IndexMap<MemberKey, Arc<ObjectMember>>;

type ExtraStorage = Arc<dyn Any + Send + Sync>;

/// A cached member value with its definition of record.
#[derive(Debug, Clone)]
struct CachedValue {
    value: Value,
    member: Arc<ObjectMember>,
}

/// State shared by every object kind.
pub struct ObjectCore {
    id: ObjectId,
    parent: Option<ObjectRef>,
    members: Arc<Members>,
    cache: DashMap<MemberKey, CachedValue>,
    scope: CapturedScope,
    extra_storage: RwLock<Option<ExtraStorage>>,
    surrogate: Option<Surrogate>,
    forced: AtomicBool,
    cached_hash: OnceLock<i64>,
}

impl ObjectCore {
    pub(crate) fn new(
        parent: Option<ObjectRef>,
        members: Members,
        scope: CapturedScope,
        surrogate: Option<Surrogate>,
    ) -> Self {
        Self {
            id: ObjectId::next(),
            parent,
            members: Arc::new(members),
            cache: DashMap::new(),
            scope,
            extra_storage: RwLock::new(None),
            surrogate,
            forced: AtomicBool::new(false),
            cached_hash: OnceLock::new(),
        }
    }

    /// The instance id.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The prototype parent.
    pub fn parent(&self) -> Option<&ObjectRef> {
        self.parent.as_ref()
    }

    /// Member definitions declared on this object.
    pub fn members(&self) -> &Members {
        &self.members
    }

    /// The lexical scope captured at instantiation.
    pub fn scope(&self) -> &CapturedScope {
        &self.scope
    }

    /// The overlay, if this object is a surrogate.
    pub fn surrogate(&self) -> Option<&Surrogate> {
        self.surrogate.as_ref()
    }

    pub(crate) fn cached_hash(&self) -> &OnceLock<i64> {
        &self.cached_hash
    }

    /// The next object consulted for definitions: the parent, or for a
    /// surrogate, its base.
    fn next_in_chain(&self) -> Option<ObjectRef> {
        self.parent
            .clone()
            .or_else(|| self.surrogate.as_ref().map(|s| s.base().clone()))
    }

    /// Every object this one delegates lookups to, nearest first.
    pub(crate) fn inherited_chain(&self) -> Vec<ObjectRef> {
        let mut chain: Vec<ObjectRef> = Vec::new();
        let mut current = self.next_in_chain();
        while let Some(object) = current {
            current = object.core().next_in_chain();
            chain.push(object);
        }
        chain
    }
}

impl fmt::Debug for ObjectCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCore")
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(ObjectRef::id))
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("cached", &self.cache.len())
            .field("surrogate", &self.surrogate)
            .finish()
    }
}

/// A shared reference to any object kind.
#[derive(Debug, Clone)]
pub enum ObjectRef {
    /// Dynamic object
    Dynamic(Arc<DynamicObject>),
    /// Typed object or module
    Typed(Arc<TypedObject>),
    /// Listing
    Listing(Arc<Listing>),
    /// Mapping
    Mapping(Arc<Mapping>),
}

impl From<Arc<DynamicObject>> for ObjectRef {
    fn from(object: Arc<DynamicObject>) -> Self {
        ObjectRef::Dynamic(object)
    }
}

impl From<Arc<TypedObject>> for ObjectRef {
    fn from(object: Arc<TypedObject>) -> Self {
        ObjectRef::Typed(object)
    }
}

impl From<Arc<Listing>> for ObjectRef {
    fn from(object: Arc<Listing>) -> Self {
        ObjectRef::Listing(object)
    }
}

impl From<Arc<Mapping>> for ObjectRef {
    fn from(object: Arc<Mapping>) -> Self {
        ObjectRef::Mapping(object)
    }
}

impl ObjectRef {
    /// The shared core.
    pub fn core(&self) -> &ObjectCore {
        match self {
            ObjectRef::Dynamic(o) => o.core(),
            ObjectRef::Typed(o) => o.core(),
            ObjectRef::Listing(o) => o.core(),
            ObjectRef::Mapping(o) => o.core(),
        }
    }

    /// The instance id.
    pub fn id(&self) -> ObjectId {
        self.core().id
    }

    /// The object as a value.
    pub fn to_value(&self) -> Value {
        match self {
            ObjectRef::Dynamic(o) => Value::Dynamic(o.clone()),
            ObjectRef::Typed(o) => Value::Typed(o.clone()),
            ObjectRef::Listing(o) => Value::Listing(o.clone()),
            ObjectRef::Mapping(o) => Value::Mapping(o.clone()),
        }
    }

    /// The runtime class.
    pub fn class(&self) -> Arc<Class> {
        self.to_value().class_of()
    }

    /// Whether both refer to the same instance.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        match (self, other) {
            (ObjectRef::Dynamic(a), ObjectRef::Dynamic(b)) => Arc::ptr_eq(a, b),
            (ObjectRef::Typed(a), ObjectRef::Typed(b)) => Arc::ptr_eq(a, b),
            (ObjectRef::Listing(a), ObjectRef::Listing(b)) => Arc::ptr_eq(a, b),
            (ObjectRef::Mapping(a), ObjectRef::Mapping(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// This object followed by every object it delegates lookups to.
    fn definition_chain(&self) -> Vec<ObjectRef> {
        let mut chain = vec![self.clone()];
        chain.extend(self.core().inherited_chain());
        chain
    }

    // ═══════════════════════════════════════════════════════════════════
    // Definitions
    // ═══════════════════════════════════════════════════════════════════

    /// Whether `key` is defined anywhere in the chain.
    pub fn has_member(&self, key: &MemberKey) -> bool {
        self.find_member(key).is_some()
    }

    /// The nearest definition of `key`.
    pub fn get_member(&self, key: &MemberKey) -> Option<Arc<ObjectMember>> {
        self.find_member(key).map(|(_, member)| member)
    }

    /// The nearest definition of `key` together with the object declaring it.
    pub fn find_member(&self, key: &MemberKey) -> Option<(ObjectRef, Arc<ObjectMember>)> {
        let mut current = Some(self.clone());
        while let Some(object) = current {
            if let Some(member) = object.core().members.get(key) {
                return Some((object.clone(), member.clone()));
            }
            current = object.core().next_in_chain();
        }
        None
    }

    /// The definition a cached value was produced by, or else the nearest
    /// definition.
    pub(crate) fn member_of_record(&self, key: &MemberKey) -> Option<Arc<ObjectMember>> {
        self.core()
            .cache
            .get(key)
            .map(|cached| cached.member.clone())
            .or_else(|| self.get_member(key))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Value Cache
    // ═══════════════════════════════════════════════════════════════════

    /// A previously computed value of `key` on this instance.
    ///
    /// Absence only means "not computed here yet".
    pub fn get_cached_value(&self, key: &MemberKey) -> Option<Value> {
        self.core().cache.get(key).map(|cached| cached.value.clone())
    }

    /// Whether a value of `key` is cached on this instance.
    pub fn has_cached_value(&self, key: &MemberKey) -> bool {
        self.core().cache.contains_key(key)
    }

    /// Record a computed value and the definition that produced it.
    pub fn set_cached_value(&self, key: MemberKey, value: Value, member: Arc<ObjectMember>) {
        self.core().cache.insert(key, CachedValue { value, member });
    }

    /// The opaque per-instance payload, if one of type `T` is stored.
    pub fn extra_storage<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let storage = self
            .core()
            .extra_storage
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        storage.clone().and_then(|s| s.downcast::<T>().ok())
    }

    /// Replace the opaque per-instance payload.
    pub fn set_extra_storage<T: Any + Send + Sync>(&self, payload: Arc<T>) {
        let mut storage = self
            .core()
            .extra_storage
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *storage = Some(payload as ExtraStorage);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Reading
    // ═══════════════════════════════════════════════════════════════════

    /// Read a member, evaluating and caching it on first access.
    pub fn read_member(&self, key: &MemberKey, ctx: &mut EvalContext) -> Result<Value> {
        let core = self.core();
        if let Some(value) = self.get_cached_value(key) {
            trace!(object = ?core.id, %key, "member cache hit");
            return Ok(value);
        }

        let (value, member) =
            ctx.evaluating_member(core.id, key, |ctx| self.compute_member(key, ctx))?;
        self.set_cached_value(key.clone(), value.clone(), member);
        Ok(value)
    }

    fn compute_member(
        &self,
        key: &MemberKey,
        ctx: &mut EvalContext,
    ) -> Result<(Value, Arc<ObjectMember>)> {
        let core = self.core();

        if let Some(surrogate) = &core.surrogate {
            if !core.members.contains_key(key) {
                let value = surrogate.read_through(key, ctx)?;
                let member = surrogate
                    .base()
                    .member_of_record(key)
                    .ok_or_else(|| EvalError::bug(format!("no definition of record for `{}`", key)))?;
                return Ok((value, member));
            }
        }

        match self.find_member(key) {
            Some((owner, member)) => {
                trace!(object = ?core.id, %key, owner = ?owner.id(), "evaluating member");
                let value = self.evaluate_body(key, &owner, &member, ctx)?;
                Ok((value, member))
            }
            None => self.resolve_missing(key, ctx),
        }
    }

    fn evaluate_body(
        &self,
        key: &MemberKey,
        owner: &ObjectRef,
        member: &ObjectMember,
        ctx: &mut EvalContext,
    ) -> Result<Value> {
        match member.body() {
            MemberBody::Constant(value) => Ok(value.clone()),
            MemberBody::Thunk(thunk) => {
                let frame = MemberFrame {
                    receiver: self,
                    owner,
                    scope: owner.core().scope(),
                    key,
                };
                thunk
                    .evaluate(&frame, ctx)
                    .map_err(|e| e.with_location(member.body_location().or(member.location())))
            }
            MemberBody::Undefined => Err(EvalError::undefined_value(
                key.clone(),
                Some(self.to_value()),
            )
            .with_location(member.location())),
        }
    }

    /// A key with no definition anywhere in the chain.
    fn resolve_missing(
        &self,
        key: &MemberKey,
        ctx: &mut EvalContext,
    ) -> Result<(Value, Arc<ObjectMember>)> {
        if let (ObjectRef::Listing(listing), MemberKey::Element(index)) = (self, key) {
            if listing.contains_index(*index) {
                return listing::fill_default(self, *index, ctx);
            }
        }
        Err(EvalError::member_not_found(key.clone(), self.class().name()))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Iteration
    // ═══════════════════════════════════════════════════════════════════

    /// Visit every definition occurrence, from the top of the chain down,
    /// skipping `local` members. Return `false` from `consumer` to stop.
    pub fn iterate_members(
        &self,
        mut consumer: impl FnMut(&MemberKey, &Arc<ObjectMember>) -> bool,
    ) -> bool {
        for object in self.definition_chain().iter().rev() {
            for (key, member) in object.core().members.iter() {
                if member.is_local() {
                    continue;
                }
                if !consumer(key, member) {
                    return false;
                }
            }
        }
        true
    }

    /// Whether the first definition of `key` excludes it from output.
    fn is_internal(&self, key: &MemberKey, member: &ObjectMember) -> bool {
        if member.is_internal() {
            return true;
        }
        match (self, key) {
            (ObjectRef::Typed(typed), MemberKey::Property(name)) => {
                typed.class().is_hidden_property(name)
            }
            _ => false,
        }
    }

    /// Visit each visible member once, in order of first definition from the
    /// top of the chain down, with its cached value if one exists.
    ///
    /// The definition passed is the first one in the chain. Return `false`
    /// from `consumer` to stop; the result tells whether iteration ran to
    /// completion.
    pub fn iterate_member_values(
        &self,
        mut consumer: impl FnMut(&MemberKey, &Arc<ObjectMember>, Option<Value>) -> bool,
    ) -> bool {
        let mut visited = FxHashSet::default();
        for object in self.definition_chain().iter().rev() {
            for (key, member) in object.core().members.iter() {
                if !visited.insert(key.clone()) || self.is_internal(key, member) {
                    continue;
                }
                if !consumer(key, member, self.get_cached_value(key)) {
                    return false;
                }
            }
        }
        true
    }

    /// Shallow-force, then visit each visible member with its value.
    pub fn force_and_iterate_member_values(
        &self,
        ctx: &mut EvalContext,
        mut consumer: impl FnMut(&MemberKey, &Arc<ObjectMember>, Value) -> bool,
    ) -> Result<bool> {
        self.force(false, false, ctx)?;
        let mut missing = None;
        let completed = self.iterate_member_values(|key, member, value| match value {
            Some(value) => consumer(key, member, value),
            None => {
                missing = Some(key.clone());
                false
            }
        });
        match missing {
            Some(key) => Err(EvalError::bug(format!(
                "member `{}` has no value after forcing",
                key
            ))),
            None => Ok(completed),
        }
    }

    /// Keys whose values make up this object's output, in order.
    pub(crate) fn visible_keys(&self) -> Vec<MemberKey> {
        match self {
            ObjectRef::Listing(listing) => (0..listing.length() as i64)
                .map(MemberKey::Element)
                .collect(),
            ObjectRef::Mapping(mapping) => mapping.all_keys().to_vec(),
            ObjectRef::Typed(_) => {
                let mut keys = Vec::new();
                self.iterate_member_values(|key, member, _| {
                    if key.is_property() && !member.is_type_declaration() {
                        keys.push(key.clone());
                    }
                    true
                });
                keys
            }
            ObjectRef::Dynamic(_) => {
                let mut keys = Vec::new();
                self.iterate_member_values(|key, _, _| {
                    keys.push(key.clone());
                    true
                });
                keys
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Forcing
    // ═══════════════════════════════════════════════════════════════════

    /// Whether a recursive force has completed on this instance.
    pub fn is_forced(&self) -> bool {
        self.core().forced.load(Ordering::Acquire)
    }

    /// Evaluate every visible member and, if `recurse`, their nested values.
    ///
    /// With `allow_undefined`, members without a value are skipped instead
    /// of failing. The object is marked forced only once a recursive force
    /// has completed, so a force still running in another session is never
    /// mistaken for a finished one. A failed force leaves the object unforced.
    pub fn force(&self, allow_undefined: bool, recurse: bool, ctx: &mut EvalContext) -> Result<()> {
        let core = self.core();
        if !recurse {
            debug!(object = ?core.id, recurse, "forcing object");
            return self.force_members(allow_undefined, false, ctx);
        }
        if core.forced.load(Ordering::Acquire) {
            return Ok(());
        }
        debug!(object = ?core.id, recurse, "forcing object");

        // a reference cycle back to an object this session is forcing stops here
        let completed =
            ctx.forcing_object(core.id, |ctx| self.force_members(allow_undefined, true, ctx))?;
        if completed {
            core.forced.store(true, Ordering::Release);
        }
        Ok(())
    }

    fn force_members(&self, allow_undefined: bool, recurse: bool, ctx: &mut EvalContext) -> Result<()> {
        let mut keys = Vec::new();
        self.iterate_member_values(|key, _, _| {
            keys.push(key.clone());
            true
        });
        if let ObjectRef::Listing(listing) = self {
            keys.extend(
                (0..listing.length() as i64)
                    .map(MemberKey::Element)
                    .filter(|key| !self.has_member(key)),
            );
        }

        for key in keys {
            let value = match self.read_member(&key, ctx) {
                Ok(value) => value,
                Err(e) if allow_undefined && e.is_undefined_value() => continue,
                Err(e) => return Err(e),
            };
            if recurse {
                value.force(allow_undefined, ctx)?;
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Equality, Hashing, Export
    // ═══════════════════════════════════════════════════════════════════

    fn same_shape(&self, other: &ObjectRef) -> bool {
        match (self, other) {
            (ObjectRef::Dynamic(_), ObjectRef::Dynamic(_)) => true,
            (ObjectRef::Typed(a), ObjectRef::Typed(b)) => a.class() == b.class(),
            (ObjectRef::Listing(a), ObjectRef::Listing(b)) => a.length() == b.length(),
            (ObjectRef::Mapping(a), ObjectRef::Mapping(b)) => a.entry_count() == b.entry_count(),
            _ => false,
        }
    }

    /// Language-level equality: same kind, then forced member values.
    pub fn equals(&self, other: &ObjectRef, ctx: &mut EvalContext) -> Result<bool> {
        if self.ptr_eq(other) {
            return Ok(true);
        }
        if !self.same_shape(other) {
            return Ok(false);
        }
        self.force(false, true, ctx)?;
        other.force(false, true, ctx)?;

        let keys = self.visible_keys();
        let other_keys = other.visible_keys();
        if keys.len() != other_keys.len() {
            return Ok(false);
        }
        for key in keys {
            if !other_keys.contains(&key) {
                return Ok(false);
            }
            let a = self.read_member(&key, ctx)?;
            let b = other.read_member(&key, ctx)?;
            if !a.equals(&b, ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Structural equality over already-cached values, without evaluating.
    pub(crate) fn forced_eq(&self, other: &ObjectRef) -> bool {
        if !(self.is_forced() && other.is_forced() && self.same_shape(other)) {
            return false;
        }
        let keys = self.visible_keys();
        let other_keys = other.visible_keys();
        keys.len() == other_keys.len()
            && keys.iter().all(|key| {
                match (self.get_cached_value(key), other.get_cached_value(key)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            })
    }

    /// Hash code consistent with [`ObjectRef::equals`]; computed once.
    pub fn hash_code(&self, ctx: &mut EvalContext) -> Result<i64> {
        if let Some(hash) = self.core().cached_hash().get() {
            return Ok(*hash);
        }
        self.force(false, true, ctx)?;
        let hash = match self {
            ObjectRef::Listing(listing) => listing.compute_hash(self, ctx)?,
            _ => {
                let mut acc: i64 = 0;
                for key in self.visible_keys() {
                    let value = self.read_member(&key, ctx)?;
                    acc = acc.wrapping_add(key.hash_code() ^ value.hash_code(ctx)?);
                }
                acc
            }
        };
        Ok(*self.core().cached_hash().get_or_init(|| hash))
    }

    /// Export a forced object.
    pub fn export(&self, ctx: &mut EvalContext) -> Result<Exported> {
        if !self.is_forced() {
            return Err(EvalError::bug("value must be forced before it is exported"));
        }
        let mut values = Vec::new();
        for key in self.visible_keys() {
            let value = self.get_cached_value(&key).ok_or_else(|| {
                EvalError::undefined_value(key.clone(), Some(self.to_value()))
            })?;
            values.push((key, value.export(ctx)?));
        }

        let exported = match self {
            ObjectRef::Listing(_) => Exported::List(values.into_iter().map(|(_, v)| v).collect()),
            ObjectRef::Mapping(_) => Exported::Map(
                values
                    .into_iter()
                    .map(|(key, v)| match key {
                        MemberKey::Entry(k) => Ok((k.value().export(ctx)?, v)),
                        other => Err(EvalError::bug(format!("mapping key `{}` is not an entry", other))),
                    })
                    .collect::<Result<_>>()?,
            ),
            ObjectRef::Dynamic(_) | ObjectRef::Typed(_) => {
                let (class_name, module_uri) = match self {
                    ObjectRef::Typed(typed) => (
                        typed.class().name().to_string(),
                        typed.module_uri().map(str::to_string),
                    ),
                    _ => ("Dynamic".to_string(), None),
                };
                Exported::Object {
                    class_name,
                    module_uri,
                    properties: values
                        .into_iter()
                        .filter_map(|(key, v)| key.as_property().map(|name| (name.to_string(), v)))
                        .collect(),
                }
            }
        };
        Ok(exported)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════

/// Collects member definitions for a new object.
///
/// New elements are appended after the parent's elements; an explicit
/// element key overrides an inherited index.
#[derive(Default)]
pub struct ObjectBuilder {
    parent: Option<ObjectRef>,
    members: Members,
    scope: CapturedScope,
    next_element: i64,
}

impl ObjectBuilder {
    /// Start an object with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Amend `parent` (builder pattern).
    pub fn parent(mut self, parent: impl Into<ObjectRef>) -> Self {
        let parent = parent.into();
        if let ObjectRef::Listing(listing) = &parent {
            self.next_element = self.next_element.max(listing.length() as i64);
        }
        self.parent = Some(parent);
        self
    }

    /// Set the captured scope (builder pattern).
    pub fn scope(mut self, scope: CapturedScope) -> Self {
        self.scope = scope;
        self
    }

    /// Define a member under an explicit key (builder pattern).
    pub fn member(mut self, key: MemberKey, member: ObjectMember) -> Self {
        if let MemberKey::Element(index) = key {
            self.next_element = self.next_element.max(index + 1);
        }
        self.members.insert(key, Arc::new(member));
        self
    }

    /// Define a property (builder pattern).
    pub fn property(self, name: &str, member: ObjectMember) -> Self {
        self.member(MemberKey::property(name), member)
    }

    /// Append an element (builder pattern).
    pub fn element(self, member: ObjectMember) -> Self {
        let index = self.next_element;
        self.member(MemberKey::Element(index), member)
    }

    /// Define an entry (builder pattern).
    pub fn entry(self, key: impl Into<HashableValue>, member: ObjectMember) -> Self {
        self.member(MemberKey::entry(key), member)
    }

    /// Define the hidden `default` pseudo-member (builder pattern).
    pub fn default_member(self, member: ObjectMember) -> Self {
        self.member(MemberKey::default_member(), member.hidden())
    }

    pub(crate) fn element_count(&self) -> usize {
        self.next_element.max(0) as usize
    }

    pub(crate) fn into_core(self) -> ObjectCore {
        ObjectCore::new(self.parent, self.members, self.scope, None)
    }

    /// Build a dynamic object.
    pub fn build_dynamic(self) -> Arc<DynamicObject> {
        Arc::new(DynamicObject::from_core(self.into_core()))
    }

    /// Build an instance of `class`.
    pub fn build_typed(self, class: Arc<Class>) -> Arc<TypedObject> {
        Arc::new(TypedObject::from_core(self.into_core(), class, None))
    }

    /// Build the object of the module at `uri`.
    pub fn build_module(self, class: Arc<Class>, uri: &str) -> Arc<TypedObject> {
        Arc::new(TypedObject::from_core(self.into_core(), class, Some(uri.into())))
    }

    /// Build a listing whose length counts inherited and new elements.
    pub fn build_listing(self) -> Arc<Listing> {
        let length = self.element_count();
        Arc::new(Listing::from_core(self.into_core(), length))
    }

    /// Build a mapping.
    pub fn build_mapping(self) -> Arc<Mapping> {
        Arc::new(Mapping::from_core(self.into_core()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_member(counter: &Arc<AtomicUsize>, value: i64) -> ObjectMember {
        let counter = counter.clone();
        ObjectMember::thunk(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Int(value))
        })
    }

    #[test]
    fn test_read_member_memoizes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let object: ObjectRef = ObjectBuilder::new()
            .property("x", counting_member(&counter, 1))
            .build_dynamic()
            .into();
        let mut ctx = EvalContext::new();
        let key = MemberKey::property("x");

        assert!(!object.has_cached_value(&key));
        assert_eq!(object.read_member(&key, &mut ctx).unwrap(), Value::Int(1));
        assert_eq!(object.read_member(&key, &mut ctx).unwrap(), Value::Int(1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(object.has_cached_value(&key));
    }

    #[test]
    fn test_child_evaluates_inherited_member_with_self_as_receiver() {
        let parent = ObjectBuilder::new()
            .property("base", ObjectMember::constant(1i64))
            .property(
                "doubled",
                ObjectMember::thunk(|frame, ctx| {
                    let base = frame.property("base", ctx)?;
                    Ok(Value::Int(base.as_int().unwrap_or(0) * 2))
                }),
            )
            .build_dynamic();
        let child: ObjectRef = ObjectBuilder::new()
            .parent(parent.clone())
            .property("base", ObjectMember::constant(21i64))
            .build_dynamic()
            .into();
        let mut ctx = EvalContext::new();
        assert_eq!(
            child.read_member(&MemberKey::property("doubled"), &mut ctx).unwrap(),
            Value::Int(42)
        );
        let parent: ObjectRef = parent.into();
        assert_eq!(
            parent.read_member(&MemberKey::property("doubled"), &mut ctx).unwrap(),
            Value::Int(2)
        );
    }

    #[test]
    fn test_failed_evaluation_is_not_cached() {
        let object: ObjectRef = ObjectBuilder::new()
            .property("x", ObjectMember::undefined())
            .build_dynamic()
            .into();
        let mut ctx = EvalContext::new();
        let key = MemberKey::property("x");
        let err = object.read_member(&key, &mut ctx).unwrap_err();
        assert!(err.is_undefined_value());
        assert!(!object.has_cached_value(&key));
    }

    #[test]
    fn test_iterate_member_values_order_and_visibility() {
        let parent = ObjectBuilder::new()
            .property("a", ObjectMember::constant(1i64))
            .property("secret", ObjectMember::constant(0i64).hidden())
            .build_dynamic();
        let child: ObjectRef = ObjectBuilder::new()
            .parent(parent)
            .property("b", ObjectMember::constant(2i64))
            .property("a", ObjectMember::constant(10i64))
            .property("tmp", ObjectMember::constant(3i64).local())
            .build_dynamic()
            .into();

        let mut seen = Vec::new();
        child.iterate_member_values(|key, _, value| {
            seen.push((key.to_string(), value.is_some()));
            true
        });
        assert_eq!(
            seen,
            vec![("a".to_string(), false), ("b".to_string(), false)]
        );

        let mut ctx = EvalContext::new();
        let mut values = Vec::new();
        child
            .force_and_iterate_member_values(&mut ctx, |key, _, value| {
                values.push((key.to_string(), value));
                true
            })
            .unwrap();
        assert_eq!(
            values,
            vec![
                ("a".to_string(), Value::Int(10)),
                ("b".to_string(), Value::Int(2))
            ]
        );
    }

    #[test]
    fn test_iterate_members_visits_every_definition() {
        let parent = ObjectBuilder::new()
            .property("a", ObjectMember::constant(1i64))
            .build_dynamic();
        let child: ObjectRef = ObjectBuilder::new()
            .parent(parent)
            .property("a", ObjectMember::constant(2i64))
            .build_dynamic()
            .into();
        let mut count = 0;
        let completed = child.iterate_members(|_, _| {
            count += 1;
            true
        });
        assert!(completed);
        assert_eq!(count, 2);
        // early termination
        assert!(!child.iterate_members(|_, _| false));
    }

    #[test]
    fn test_extra_storage() {
        let object: ObjectRef = ObjectBuilder::new().build_dynamic().into();
        assert!(object.extra_storage::<Vec<i64>>().is_none());
        object.set_extra_storage(Arc::new(vec![1i64, 2]));
        assert_eq!(object.extra_storage::<Vec<i64>>().as_deref(), Some(&vec![1, 2]));
        assert!(object.extra_storage::<String>().is_none());
    }

    #[test]
    fn test_export_requires_force() {
        let object: ObjectRef = ObjectBuilder::new()
            .property("x", ObjectMember::constant(1i64))
            .build_dynamic()
            .into();
        let mut ctx = EvalContext::new();
        let err = object.export(&mut ctx).unwrap_err();
        assert!(!err.is_recoverable());

        object.force(false, true, &mut ctx).unwrap();
        let exported = object.export(&mut ctx).unwrap();
        assert_eq!(exported.property("x"), Some(&Exported::Int(1)));
    }
}
