//! Value representation for runtime values
//!
//! [`Value`] is the closed set of runtime value kinds. Every kind supports
//! class identity ([`Value::class_of`]), recursive forcing
//! ([`Value::force`]), export to an external form ([`Value::export`]) and
//! visitor dispatch ([`Value::accept`](crate::visit)).

mod callable;
mod class;
mod compound;
mod display;
mod export;
mod hashable;
mod impls;
mod units;

pub use callable::{FunctionValue, NativeFn};
pub use class::{base, BaseClasses, Class, TypeAlias};
pub use compound::{IntSeq, Pair, RegexValue};
pub use export::Exported;
pub use hashable::HashableValue;
pub use units::{DataSize, DataSizeUnit, Duration, DurationUnit, Quantity, Unit};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::context::EvalContext;
use crate::error::Result;
use crate::object::{DynamicObject, Listing, Mapping, ObjectRef, TypedObject};

/// Runtime value.
///
/// Scalars are stored inline; everything else is shared behind an `Arc`,
/// so cloning a value never copies a collection or an object.
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// `null`
    Null,

    /// `true` or `false`
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit float
    Float(f64),

    /// Immutable string
    String(Arc<str>),

    /// Duration with unit
    Duration(Duration),

    /// Data size with unit
    DataSize(DataSize),

    // ═══════════════════════════════════════════════════════════════════
    // Collections
    // ═══════════════════════════════════════════════════════════════════
    /// Byte buffer
    Bytes(Arc<[u8]>),

    /// Integer sequence `IntSeq(start, end).step(step)`
    IntSeq(IntSeq),

    /// Eager list
    List(Arc<Vec<Value>>),

    /// Insertion-ordered set
    Set(Arc<IndexSet<HashableValue>>),

    /// Insertion-ordered map
    Map(Arc<IndexMap<HashableValue, Value>>),

    /// Ordered 2-tuple
    Pair(Arc<Pair>),

    /// Compiled regular expression
    Regex(Arc<RegexValue>),

    // ═══════════════════════════════════════════════════════════════════
    // Callables and types
    // ═══════════════════════════════════════════════════════════════════
    /// Function
    Function(Arc<FunctionValue>),

    /// Class descriptor
    Class(Arc<Class>),

    /// Type alias descriptor
    TypeAlias(Arc<TypeAlias>),

    // ═══════════════════════════════════════════════════════════════════
    // Lazy objects
    // ═══════════════════════════════════════════════════════════════════
    /// Dynamic object
    Dynamic(Arc<DynamicObject>),

    /// Instance of a class (including module objects)
    Typed(Arc<TypedObject>),

    /// Sequence-shaped object with a fixed length
    Listing(Arc<Listing>),

    /// Map-shaped object
    Mapping(Arc<Mapping>),
}

impl Value {
    /// The runtime class of this value.
    pub fn class_of(&self) -> Arc<Class> {
        let base = base();
        match self {
            Value::Null => base.null.clone(),
            Value::Bool(_) => base.boolean.clone(),
            Value::Int(_) => base.int.clone(),
            Value::Float(_) => base.float.clone(),
            Value::String(_) => base.string.clone(),
            Value::Duration(_) => base.duration.clone(),
            Value::DataSize(_) => base.data_size.clone(),
            Value::Bytes(_) => base.bytes.clone(),
            Value::IntSeq(_) => base.int_seq.clone(),
            Value::List(_) => base.list.clone(),
            Value::Set(_) => base.set.clone(),
            Value::Map(_) => base.map.clone(),
            Value::Pair(_) => base.pair.clone(),
            Value::Regex(_) => base.regex.clone(),
            Value::Function(_) => base.function.clone(),
            Value::Class(_) => base.class.clone(),
            Value::TypeAlias(_) => base.type_alias.clone(),
            Value::Dynamic(_) => base.dynamic.clone(),
            Value::Typed(t) => t.class().clone(),
            Value::Listing(_) => base.listing.clone(),
            Value::Mapping(_) => base.mapping.clone(),
        }
    }

    /// View this value as an object, if it is one.
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Value::Dynamic(o) => Some(ObjectRef::Dynamic(o.clone())),
            Value::Typed(o) => Some(ObjectRef::Typed(o.clone())),
            Value::Listing(o) => Some(ObjectRef::Listing(o.clone())),
            Value::Mapping(o) => Some(ObjectRef::Mapping(o.clone())),
            _ => None,
        }
    }

    /// Recursively evaluate every lazy value reachable from this one.
    ///
    /// Idempotent: forcing an already forced value does nothing.
    pub fn force(&self, allow_undefined: bool, ctx: &mut EvalContext) -> Result<()> {
        match self {
            Value::List(items) => {
                for item in items.iter() {
                    item.force(allow_undefined, ctx)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                for value in entries.values() {
                    value.force(allow_undefined, ctx)?;
                }
                Ok(())
            }
            Value::Pair(pair) => pair.force(allow_undefined, ctx),
            other => match other.as_object() {
                Some(object) => object.force(allow_undefined, true, ctx),
                // set elements are forced when they are hashed
                None => Ok(()),
            },
        }
    }

    /// Language-level equality.
    ///
    /// Objects are forced before they are compared, which may fail.
    pub fn equals(&self, other: &Value, ctx: &mut EvalContext) -> Result<bool> {
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.equals(y, ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Map(a), Value::Map(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (key, x) in a.iter() {
                    match b.get(key) {
                        Some(y) if x.equals(y, ctx)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            (Value::Pair(a), Value::Pair(b)) => {
                Ok(a.first().equals(b.first(), ctx)? && a.second().equals(b.second(), ctx)?)
            }
            _ => match (self.as_object(), other.as_object()) {
                (Some(a), Some(b)) => a.equals(&b, ctx),
                _ => Ok(self == other),
            },
        }
    }

    /// Hash code consistent with [`Value::equals`].
    ///
    /// Objects are forced first.
    pub fn hash_code(&self, ctx: &mut EvalContext) -> Result<i64> {
        let hash = match self {
            Value::Null => 0,
            Value::Bool(b) => std_hash(b),
            Value::Int(n) => std_hash(n),
            Value::Float(f) => std_hash(&normalize_float(*f).to_bits()),
            Value::String(s) => std_hash(s),
            Value::Duration(d) => std_hash(d),
            Value::DataSize(d) => std_hash(d),
            Value::Bytes(b) => std_hash(b),
            Value::IntSeq(seq) => std_hash(seq),
            Value::List(items) => {
                let mut acc: i64 = 1;
                for item in items.iter() {
                    acc = acc.wrapping_mul(31).wrapping_add(item.hash_code(ctx)?);
                }
                acc
            }
            Value::Set(items) => items
                .iter()
                .fold(0i64, |acc, item| acc.wrapping_add(item.hash_code())),
            Value::Map(entries) => {
                let mut acc: i64 = 0;
                for (key, value) in entries.iter() {
                    acc = acc.wrapping_add(key.hash_code() ^ value.hash_code(ctx)?);
                }
                acc
            }
            Value::Pair(pair) => pair
                .first()
                .hash_code(ctx)?
                .wrapping_mul(31)
                .wrapping_add(pair.second().hash_code(ctx)?),
            Value::Regex(regex) => std_hash(regex.pattern()),
            Value::Function(f) => Arc::as_ptr(f) as usize as i64,
            Value::Class(c) => std_hash(&c.qualified_name()),
            Value::TypeAlias(t) => std_hash(&t.qualified_name()),
            other => match other.as_object() {
                Some(object) => object.hash_code(ctx)?,
                None => 0,
            },
        };
        Ok(hash)
    }
}

/// Hash with the standard library's fixed-key hasher.
pub(crate) fn std_hash<T: Hash + ?Sized>(value: &T) -> i64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish() as i64
}

/// Collapse `-0.0` into `0.0` so hashing agrees with `==`.
pub(crate) fn normalize_float(f: f64) -> f64 {
    if f == 0.0 {
        0.0
    } else {
        f
    }
}
