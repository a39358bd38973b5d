//! Traversal of runtime values
//!
//! [`ValueVisitor`] has one method per value kind; [`Value::accept`] is the
//! closed dispatch over the variant. [`ValueConverter`] adds a
//! [`ValuePath`] that is pushed on descent and popped on return, so a
//! failure deep inside a structure can say where it happened.

mod json;
mod path;
mod render;

pub use json::JsonConverter;
pub use path::{PathElement, ValuePath};
pub use render::ValueRenderer;

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::context::EvalContext;
use crate::error::Result;
use crate::object::{DynamicObject, Listing, Mapping, TypedObject};
use crate::value::{
    Class, DataSize, Duration, FunctionValue, HashableValue, IntSeq, Pair, RegexValue, TypeAlias,
    Value,
};

/// Visitor over every value kind.
///
/// Each method defaults to [`ValueVisitor::visit_other`], so a visitor only
/// overrides the kinds it treats specially.
#[allow(unused_variables)]
pub trait ValueVisitor {
    /// Result of visiting one value.
    type Output;

    /// Fallback for kinds the visitor does not override.
    fn visit_other(&mut self, value: &Value) -> Self::Output;

    /// `null`
    fn visit_null(&mut self) -> Self::Output {
        self.visit_other(&Value::Null)
    }

    /// Boolean
    fn visit_bool(&mut self, value: bool) -> Self::Output {
        self.visit_other(&Value::Bool(value))
    }

    /// Integer
    fn visit_int(&mut self, value: i64) -> Self::Output {
        self.visit_other(&Value::Int(value))
    }

    /// Float
    fn visit_float(&mut self, value: f64) -> Self::Output {
        self.visit_other(&Value::Float(value))
    }

    /// String
    fn visit_string(&mut self, value: &str) -> Self::Output {
        self.visit_other(&Value::string(value))
    }

    /// Duration
    fn visit_duration(&mut self, value: &Duration) -> Self::Output {
        self.visit_other(&Value::Duration(*value))
    }

    /// Data size
    fn visit_data_size(&mut self, value: &DataSize) -> Self::Output {
        self.visit_other(&Value::DataSize(*value))
    }

    /// Byte buffer
    fn visit_bytes(&mut self, value: &[u8]) -> Self::Output {
        self.visit_other(&Value::bytes(value))
    }

    /// Integer sequence
    fn visit_int_seq(&mut self, value: &IntSeq) -> Self::Output {
        self.visit_other(&Value::IntSeq(*value))
    }

    /// List
    fn visit_list(&mut self, items: &Arc<Vec<Value>>) -> Self::Output {
        self.visit_other(&Value::List(items.clone()))
    }

    /// Set
    fn visit_set(&mut self, items: &Arc<IndexSet<HashableValue>>) -> Self::Output {
        self.visit_other(&Value::Set(items.clone()))
    }

    /// Map
    fn visit_map(&mut self, entries: &Arc<IndexMap<HashableValue, Value>>) -> Self::Output {
        self.visit_other(&Value::Map(entries.clone()))
    }

    /// Pair
    fn visit_pair(&mut self, pair: &Arc<Pair>) -> Self::Output {
        self.visit_other(&Value::Pair(pair.clone()))
    }

    /// Regex
    fn visit_regex(&mut self, regex: &Arc<RegexValue>) -> Self::Output {
        self.visit_other(&Value::Regex(regex.clone()))
    }

    /// Function
    fn visit_function(&mut self, function: &Arc<FunctionValue>) -> Self::Output {
        self.visit_other(&Value::Function(function.clone()))
    }

    /// Class
    fn visit_class(&mut self, class: &Arc<Class>) -> Self::Output {
        self.visit_other(&Value::Class(class.clone()))
    }

    /// Type alias
    fn visit_type_alias(&mut self, alias: &Arc<TypeAlias>) -> Self::Output {
        self.visit_other(&Value::TypeAlias(alias.clone()))
    }

    /// Dynamic object
    fn visit_dynamic(&mut self, object: &Arc<DynamicObject>) -> Self::Output {
        self.visit_other(&Value::Dynamic(object.clone()))
    }

    /// Typed object or module
    fn visit_typed(&mut self, object: &Arc<TypedObject>) -> Self::Output {
        self.visit_other(&Value::Typed(object.clone()))
    }

    /// Listing
    fn visit_listing(&mut self, listing: &Arc<Listing>) -> Self::Output {
        self.visit_other(&Value::Listing(listing.clone()))
    }

    /// Mapping
    fn visit_mapping(&mut self, mapping: &Arc<Mapping>) -> Self::Output {
        self.visit_other(&Value::Mapping(mapping.clone()))
    }
}

impl Value {
    /// Dispatch to the visitor method matching this value's kind.
    pub fn accept<V: ValueVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Value::Null => visitor.visit_null(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Int(n) => visitor.visit_int(*n),
            Value::Float(f) => visitor.visit_float(*f),
            Value::String(s) => visitor.visit_string(s),
            Value::Duration(d) => visitor.visit_duration(d),
            Value::DataSize(d) => visitor.visit_data_size(d),
            Value::Bytes(b) => visitor.visit_bytes(b),
            Value::IntSeq(seq) => visitor.visit_int_seq(seq),
            Value::List(items) => visitor.visit_list(items),
            Value::Set(items) => visitor.visit_set(items),
            Value::Map(entries) => visitor.visit_map(entries),
            Value::Pair(pair) => visitor.visit_pair(pair),
            Value::Regex(regex) => visitor.visit_regex(regex),
            Value::Function(function) => visitor.visit_function(function),
            Value::Class(class) => visitor.visit_class(class),
            Value::TypeAlias(alias) => visitor.visit_type_alias(alias),
            Value::Dynamic(object) => visitor.visit_dynamic(object),
            Value::Typed(object) => visitor.visit_typed(object),
            Value::Listing(listing) => visitor.visit_listing(listing),
            Value::Mapping(mapping) => visitor.visit_mapping(mapping),
        }
    }
}

/// Host scalars a caller may hand to [`visit`] without wrapping them first.
#[derive(Debug, Clone, Copy)]
pub enum Visitable<'a> {
    /// Host string
    Str(&'a str),
    /// Host boolean
    Bool(bool),
    /// Host integer
    Int(i64),
    /// Host float
    Float(f64),
    /// Any runtime value
    Value(&'a Value),
}

impl<'a> From<&'a Value> for Visitable<'a> {
    fn from(value: &'a Value) -> Self {
        Visitable::Value(value)
    }
}

impl<'a> From<&'a str> for Visitable<'a> {
    fn from(s: &'a str) -> Self {
        Visitable::Str(s)
    }
}

impl From<bool> for Visitable<'_> {
    fn from(b: bool) -> Self {
        Visitable::Bool(b)
    }
}

impl From<i64> for Visitable<'_> {
    fn from(n: i64) -> Self {
        Visitable::Int(n)
    }
}

impl From<f64> for Visitable<'_> {
    fn from(f: f64) -> Self {
        Visitable::Float(f)
    }
}

/// Route host scalars straight to their visitor method and everything else
/// through [`Value::accept`].
pub fn visit<'a, V: ValueVisitor + ?Sized>(visitor: &mut V, value: impl Into<Visitable<'a>>) -> V::Output {
    match value.into() {
        Visitable::Str(s) => visitor.visit_string(s),
        Visitable::Bool(b) => visitor.visit_bool(b),
        Visitable::Int(n) => visitor.visit_int(n),
        Visitable::Float(f) => visitor.visit_float(f),
        Visitable::Value(value) => value.accept(visitor),
    }
}

/// A fallible conversion of values into some external form that tracks
/// where in the structure it currently is.
pub trait ValueConverter {
    /// Converted form.
    type Output;

    /// Path from the top-level value to the value being converted.
    fn path_mut(&mut self) -> &mut ValuePath;

    /// Convert one value; nested values go through
    /// [`ValueConverter::convert_nested`].
    fn convert_value(&mut self, value: &Value, ctx: &mut EvalContext) -> Result<Self::Output>;

    /// Convert a nested value with `element` pushed onto the path for the
    /// duration of the call.
    fn convert_nested(
        &mut self,
        element: PathElement,
        value: &Value,
        ctx: &mut EvalContext,
    ) -> Result<Self::Output> {
        self.path_mut().push(element);
        let result = self.convert_value(value, ctx);
        self.path_mut().pop();
        result
    }
}
