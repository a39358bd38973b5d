//! Conversion of forced values into an external, host-owned form

use indexmap::IndexMap;
use serde::Serialize;

use crate::context::EvalContext;
use crate::error::{EvalError, Result};

use super::{DataSizeUnit, DurationUnit, Value};

/// A fully evaluated value detached from the object graph.
///
/// Serializes to plain JSON-like data; objects become maps of their
/// visible properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Exported {
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
    /// Duration as value and unit
    Duration {
        /// Raw value
        value: f64,
        /// Unit
        unit: DurationUnit,
    },
    /// Data size as value and unit
    DataSize {
        /// Raw value
        value: f64,
        /// Unit
        unit: DataSizeUnit,
    },
    /// Byte buffer
    Bytes(Vec<u8>),
    /// Integer sequence
    IntSeq {
        /// First value
        start: i64,
        /// Inclusive bound
        end: i64,
        /// Increment
        step: i64,
    },
    /// List, listing or set elements
    List(Vec<Exported>),
    /// Map or mapping entries in insertion order
    Map(Vec<(Exported, Exported)>),
    /// Pair
    Pair(Box<Exported>, Box<Exported>),
    /// Regex
    Regex {
        /// Source pattern
        pattern: String,
    },
    /// Dynamic or typed object
    Object {
        /// Simple class name
        class_name: String,
        /// URI of the module, for module objects
        #[serde(skip_serializing_if = "Option::is_none")]
        module_uri: Option<String>,
        /// Visible properties in definition order
        properties: IndexMap<String, Exported>,
    },
    /// Class, by qualified name
    Class(String),
    /// Type alias, by qualified name
    TypeAlias(String),
}

impl Exported {
    /// Look up an object property.
    pub fn property(&self, name: &str) -> Option<&Exported> {
        match self {
            Exported::Object { properties, .. } => properties.get(name),
            _ => None,
        }
    }

    /// Elements of an exported list.
    pub fn as_list(&self) -> Option<&[Exported]> {
        match self {
            Exported::List(items) => Some(items),
            _ => None,
        }
    }
}

impl Value {
    /// Export a forced value.
    ///
    /// Objects must have been forced with [`Value::force`] first; exporting
    /// an unforced object is an internal error.
    pub fn export(&self, ctx: &mut EvalContext) -> Result<Exported> {
        let exported = match self {
            Value::Null => Exported::Null,
            Value::Bool(b) => Exported::Bool(*b),
            Value::Int(n) => Exported::Int(*n),
            Value::Float(f) => Exported::Float(*f),
            Value::String(s) => Exported::String(s.to_string()),
            Value::Duration(d) => Exported::Duration {
                value: d.value(),
                unit: d.unit(),
            },
            Value::DataSize(d) => Exported::DataSize {
                value: d.value(),
                unit: d.unit(),
            },
            Value::Bytes(b) => Exported::Bytes(b.to_vec()),
            Value::IntSeq(seq) => Exported::IntSeq {
                start: seq.start,
                end: seq.end,
                step: seq.step,
            },
            Value::List(items) => Exported::List(
                items
                    .iter()
                    .map(|item| item.export(ctx))
                    .collect::<Result<_>>()?,
            ),
            Value::Set(items) => Exported::List(
                items
                    .iter()
                    .map(|item| item.value().export(ctx))
                    .collect::<Result<_>>()?,
            ),
            Value::Map(entries) => Exported::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.value().export(ctx)?, v.export(ctx)?)))
                    .collect::<Result<_>>()?,
            ),
            Value::Pair(pair) => Exported::Pair(
                Box::new(pair.first().export(ctx)?),
                Box::new(pair.second().export(ctx)?),
            ),
            Value::Regex(regex) => Exported::Regex {
                pattern: regex.pattern().to_string(),
            },
            Value::Function(_) => {
                return Err(EvalError::eval(
                    "Cannot export values of type `Function`.",
                    vec![],
                ))
            }
            Value::Class(class) => Exported::Class(class.qualified_name()),
            Value::TypeAlias(alias) => Exported::TypeAlias(alias.qualified_name()),
            Value::Dynamic(_) | Value::Typed(_) | Value::Listing(_) | Value::Mapping(_) => {
                match self.as_object() {
                    Some(object) => object.export(ctx)?,
                    None => return Err(EvalError::bug("object value without object view")),
                }
            }
        };
        Ok(exported)
    }
}
