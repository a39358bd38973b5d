//! Value trait implementations: constructors, predicates, extractors, From traits, PartialEq

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use super::*;

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Create a byte buffer value
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(b.into().into())
    }

    /// Create a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    /// Create a pair value
    pub fn pair(first: Value, second: Value) -> Self {
        Value::Pair(Arc::new(Pair::new(first, second)))
    }

    /// Create a duration value
    pub fn duration(value: f64, unit: DurationUnit) -> Self {
        Value::Duration(Duration::new(value, unit))
    }

    /// Create a data size value
    pub fn data_size(value: f64, unit: DataSizeUnit) -> Self {
        Value::DataSize(DataSize::new(value, unit))
    }

    /// Create a set value, forcing and hashing each element
    pub fn set(items: Vec<Value>, ctx: &mut EvalContext) -> Result<Self> {
        let mut set = IndexSet::with_capacity(items.len());
        for item in items {
            set.insert(HashableValue::new(item, ctx)?);
        }
        Ok(Value::Set(Arc::new(set)))
    }

    /// Create a map value, forcing and hashing each key
    pub fn map(entries: Vec<(Value, Value)>, ctx: &mut EvalContext) -> Result<Self> {
        let mut map = IndexMap::with_capacity(entries.len());
        for (key, value) in entries {
            map.insert(HashableValue::new(key, ctx)?, value);
        }
        Ok(Value::Map(Arc::new(map)))
    }

    /// Create a regex value
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Value::Regex(Arc::new(RegexValue::new(pattern)?)))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════

    /// Check if this is `null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is a number
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Check if this is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this is a lazy object
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Value::Dynamic(_) | Value::Typed(_) | Value::Listing(_) | Value::Mapping(_)
        )
    }

    /// Check if this is callable
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Value Extractors
    // ═══════════════════════════════════════════════════════════════════

    /// Extract as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract as f64, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Extract as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as list slice
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Extract as function
    pub fn as_function(&self) -> Option<&Arc<FunctionValue>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════

/// Structural equality that never evaluates anything.
///
/// Objects are equal if they are the same instance, or if both are already
/// forced and their cached members compare equal. Use [`Value::equals`] for
/// language-level equality.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::DataSize(a), Value::DataSize(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::IntSeq(a), Value::IntSeq(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => {
                a.first() == b.first() && a.second() == b.second()
            }
            (Value::Regex(a), Value::Regex(b)) => a == b,

            // Functions are equal if they're the same Arc
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),

            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::TypeAlias(a), Value::TypeAlias(b)) => a == b,

            _ => match (self.as_object(), other.as_object()) {
                (Some(a), Some(b)) => a.ptr_eq(&b) || a.forced_eq(&b),
                _ => false,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Trait Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<DataSize> for Value {
    fn from(d: DataSize) -> Self {
        Value::DataSize(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}
