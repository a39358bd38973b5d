//! JSON conversion
//!
//! Reads object members through the object model, so converting a value
//! evaluates whatever it reaches. An undefined member is reported with the
//! path that led to it.

use serde_json::{json, Map as JsonMap, Number};

use crate::context::EvalContext;
use crate::error::{EvalError, Result};
use crate::object::{MemberKey, ObjectRef};
use crate::value::Value;

use super::{PathElement, ValueConverter, ValuePath};

/// Converts values to [`serde_json::Value`].
///
/// Listings become arrays. Mappings, maps, dynamic and typed objects become
/// JSON objects, and their keys must be strings. A dynamic object with
/// elements but no properties or entries becomes an array.
#[derive(Debug)]
pub struct JsonConverter {
    path: ValuePath,
    top_level: Value,
}

impl Default for JsonConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonConverter {
    /// Create a converter.
    pub fn new() -> Self {
        Self {
            path: ValuePath::top_level(),
            top_level: Value::Null,
        }
    }

    /// Convert `value`, which becomes the top level of every reported path.
    pub fn convert(&mut self, value: &Value, ctx: &mut EvalContext) -> Result<serde_json::Value> {
        self.path = ValuePath::top_level();
        self.top_level = value.clone();
        ctx.track(|ctx| self.convert_value(value, ctx))
    }

    fn read(&self, object: &ObjectRef, key: &MemberKey, ctx: &mut EvalContext) -> Result<Value> {
        object
            .read_member(key, ctx)
            .map_err(|e| e.fill_in_hint(&self.path, &self.top_level))
    }

    fn unsupported(value: &Value) -> EvalError {
        EvalError::eval(
            "Cannot render value of type `{0}` as JSON.",
            vec![value.class_of().name().to_string()],
        )
        .with_program_value("Value", value.clone())
    }

    fn string_key(key: &Value) -> Result<String> {
        key.as_str().map(str::to_string).ok_or_else(|| {
            EvalError::eval(
                "JSON object keys must be strings, but got `{0}`.",
                vec![key.class_of().name().to_string()],
            )
            .with_program_value("Key", key.clone())
        })
    }

    fn convert_members(
        &mut self,
        object: &ObjectRef,
        keys: &[MemberKey],
        ctx: &mut EvalContext,
    ) -> Result<serde_json::Value> {
        let mut out = JsonMap::new();
        for key in keys {
            let name = match key {
                MemberKey::Property(name) => name.to_string(),
                MemberKey::Entry(entry) => Self::string_key(entry.value())?,
                MemberKey::Element(_) => continue,
            };
            let value = self.read(object, key, ctx)?;
            let converted = self.convert_nested(PathElement::from(key), &value, ctx)?;
            out.insert(name, converted);
        }
        Ok(serde_json::Value::Object(out))
    }

    fn convert_elements(
        &mut self,
        object: &ObjectRef,
        keys: &[MemberKey],
        ctx: &mut EvalContext,
    ) -> Result<serde_json::Value> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.read(object, key, ctx)?;
            out.push(self.convert_nested(PathElement::from(key), &value, ctx)?);
        }
        Ok(serde_json::Value::Array(out))
    }
}

impl ValueConverter for JsonConverter {
    type Output = serde_json::Value;

    fn path_mut(&mut self) -> &mut ValuePath {
        &mut self.path
    }

    fn convert_value(&mut self, value: &Value, ctx: &mut EvalContext) -> Result<serde_json::Value> {
        let json = match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Int(n) => json!(n),
            Value::Float(f) => match Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => return Err(Self::unsupported(value)),
            },
            Value::String(s) => json!(&**s),
            Value::Duration(d) => json!({ "value": d.value(), "unit": d.unit() }),
            Value::DataSize(d) => json!({ "value": d.value(), "unit": d.unit() }),
            Value::Bytes(bytes) => json!(&**bytes),
            Value::IntSeq(seq) => json!({ "start": seq.start, "end": seq.end, "step": seq.step }),
            Value::Regex(regex) => json!(regex.pattern()),
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.convert_nested(PathElement::Index(i as i64), item, ctx)?);
                }
                serde_json::Value::Array(out)
            }
            Value::Set(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.convert_nested(PathElement::Index(i as i64), item.value(), ctx)?);
                }
                serde_json::Value::Array(out)
            }
            Value::Map(entries) => {
                let mut out = JsonMap::new();
                for (key, item) in entries.iter() {
                    let name = Self::string_key(key.value())?;
                    let converted =
                        self.convert_nested(PathElement::Key(key.value().clone()), item, ctx)?;
                    out.insert(name, converted);
                }
                serde_json::Value::Object(out)
            }
            Value::Pair(pair) => {
                let first = self.convert_nested(PathElement::property("first"), pair.first(), ctx)?;
                let second =
                    self.convert_nested(PathElement::property("second"), pair.second(), ctx)?;
                json!({ "first": first, "second": second })
            }
            Value::Function(_) | Value::Class(_) | Value::TypeAlias(_) => {
                return Err(Self::unsupported(value))
            }
            Value::Listing(_) | Value::Mapping(_) | Value::Typed(_) | Value::Dynamic(_) => {
                let Some(object) = value.as_object() else {
                    return Err(EvalError::bug("object value without an object view"));
                };
                let keys = object.visible_keys();
                let elements_only = !keys.is_empty() && keys.iter().all(MemberKey::is_element);
                if matches!(object, ObjectRef::Listing(_))
                    || (matches!(object, ObjectRef::Dynamic(_)) && elements_only)
                {
                    self.convert_elements(&object, &keys, ctx)?
                } else {
                    self.convert_members(&object, &keys, ctx)?
                }
            }
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Listing, ObjectBuilder, ObjectMember};
    use crate::value::{base, DurationUnit};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalars_and_collections() {
        let value = Value::list(vec![
            Value::Int(1),
            Value::string("a"),
            Value::duration(5.0, DurationUnit::Minutes),
            Value::pair(Value::Null, Value::Bool(false)),
        ]);
        let json = JsonConverter::new()
            .convert(&value, &mut EvalContext::new())
            .unwrap();
        assert_eq!(
            json,
            json!([1, "a", { "value": 5.0, "unit": "min" }, { "first": null, "second": false }])
        );
    }

    #[test]
    fn test_objects_are_evaluated() {
        let listing = Listing::from_values([Value::Int(1), Value::Int(2)]);
        let object = ObjectBuilder::new()
            .property("name", ObjectMember::constant("web"))
            .property("ports", ObjectMember::constant(Value::Listing(listing)))
            .entry("extra", ObjectMember::constant(true))
            .build_dynamic();
        let json = JsonConverter::new()
            .convert(&Value::Dynamic(object), &mut EvalContext::new())
            .unwrap();
        assert_eq!(json, json!({ "name": "web", "ports": [1, 2], "extra": true }));
    }

    #[test]
    fn test_undefined_member_reports_path() {
        let first = ObjectBuilder::new()
            .property("port", ObjectMember::constant(80i64))
            .build_dynamic();
        let second = ObjectBuilder::new()
            .property("port", ObjectMember::undefined())
            .build_dynamic();
        let servers = Listing::from_values([Value::Dynamic(first), Value::Dynamic(second)]);
        let module = ObjectBuilder::new()
            .property("servers", ObjectMember::constant(Value::Listing(servers)))
            .build_module(base().module.clone(), "file:///app.pkl");

        let err = JsonConverter::new()
            .convert(&Value::Typed(module), &mut EvalContext::new())
            .unwrap_err();
        assert!(err.is_undefined_value());
        assert_eq!(
            err.hint(),
            Some(
                "The above error occurred when rendering path `servers[1].port` \
                 of module `file:///app.pkl`."
            )
        );
    }

    #[test]
    fn test_functions_are_rejected() {
        let value = Value::Class(base().int.clone());
        let err = JsonConverter::new()
            .convert(&value, &mut EvalContext::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot render value of type `Class` as JSON.");
    }
}
