//! Hashable wrapper for Value to enable use as set elements and map keys

use std::hash::{Hash, Hasher};

use crate::context::EvalContext;
use crate::error::Result;

use super::Value;

/// A forced value together with its precomputed hash code.
///
/// Computing a language-level hash may force objects, which can fail, so the
/// hash is computed once up front by [`HashableValue::new`]. After that the
/// wrapper is an ordinary `Hash + Eq` key.
#[derive(Debug, Clone)]
pub struct HashableValue {
    value: Value,
    hash: i64,
}

impl HashableValue {
    /// Force `value` and compute its hash code.
    pub fn new(value: Value, ctx: &mut EvalContext) -> Result<Self> {
        value.force(false, ctx)?;
        let hash = value.hash_code(ctx)?;
        Ok(Self { value, hash })
    }

    /// Wrap a value that never needs forcing.
    ///
    /// Returns `None` for objects and collections that may contain them.
    pub fn scalar(value: Value) -> Option<Self> {
        match value {
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::String(_)
            | Value::Duration(_)
            | Value::DataSize(_)
            | Value::Bytes(_)
            | Value::IntSeq(_)
            | Value::Regex(_)
            | Value::Class(_)
            | Value::TypeAlias(_) => {
                let hash = value.hash_code(&mut EvalContext::new()).ok()?;
                Some(Self { value, hash })
            }
            _ => None,
        }
    }

    /// Key for an `Int`.
    pub fn int(n: i64) -> Self {
        Self {
            hash: super::std_hash(&n),
            value: Value::Int(n),
        }
    }

    /// Key for a `String`.
    pub fn string(s: &str) -> Self {
        let s: std::sync::Arc<str> = s.into();
        Self {
            hash: super::std_hash(&s),
            value: Value::String(s),
        }
    }

    /// The wrapped value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Unwrap.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The precomputed language-level hash code.
    pub fn hash_code(&self) -> i64 {
        self.hash
    }
}

impl Hash for HashableValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialEq for HashableValue {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.value == other.value
    }
}

impl Eq for HashableValue {}

impl From<i64> for HashableValue {
    fn from(n: i64) -> Self {
        HashableValue::int(n)
    }
}

impl From<&str> for HashableValue {
    fn from(s: &str) -> Self {
        HashableValue::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexSet;

    #[test]
    fn test_helpers_agree_with_new() {
        let mut ctx = EvalContext::new();
        assert_eq!(
            HashableValue::int(42),
            HashableValue::new(Value::Int(42), &mut ctx).unwrap()
        );
        assert_eq!(
            HashableValue::string("a"),
            HashableValue::new(Value::string("a"), &mut ctx).unwrap()
        );
    }

    #[test]
    fn test_set_deduplicates() {
        let mut set = IndexSet::new();
        set.insert(HashableValue::int(1));
        set.insert(HashableValue::string("1"));
        set.insert(HashableValue::int(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_scalar_rejects_objects() {
        assert!(HashableValue::scalar(Value::Int(1)).is_some());
        assert!(HashableValue::scalar(Value::list(vec![])).is_none());
    }
}
