//! Human-readable rendering of values
//!
//! Rendering never evaluates anything. Object members that have not been
//! computed yet show as `?`.

use std::fmt::Write;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::object::{DynamicObject, Listing, Mapping, MemberKey, ObjectRef, TypedObject};
use crate::value::{
    Class, DataSize, Duration, FunctionValue, HashableValue, IntSeq, Pair, RegexValue, TypeAlias,
    Value,
};

use super::ValueVisitor;

const MAX_DEPTH: usize = 32;

/// Renders a value as source-like text.
#[derive(Debug, Clone)]
pub struct ValueRenderer {
    width: usize,
    multi_line: bool,
    indent: usize,
    depth: usize,
    out: String,
}

impl ValueRenderer {
    /// Render on one line, cutting the result off at `width` characters.
    pub fn single_line(width: usize) -> Self {
        Self {
            width,
            multi_line: false,
            indent: 0,
            depth: 0,
            out: String::new(),
        }
    }

    /// Render object bodies one member per line.
    pub fn multi_line() -> Self {
        Self {
            width: usize::MAX,
            multi_line: true,
            ..Self::single_line(usize::MAX)
        }
    }

    /// Render `value`.
    pub fn render(mut self, value: &Value) -> String {
        value.accept(&mut self);
        if self.out.chars().count() > self.width {
            let keep = self.width.saturating_sub(3);
            let mut cut: String = self.out.chars().take(keep).collect();
            cut.push_str("...");
            return cut;
        }
        self.out
    }

    fn nested(&mut self, value: &Value) {
        if self.depth >= MAX_DEPTH {
            self.out.push_str("...");
            return;
        }
        self.depth += 1;
        value.accept(self);
        self.depth -= 1;
    }

    fn sequence<'a>(&mut self, name: &str, items: impl Iterator<Item = &'a Value>) {
        self.out.push_str(name);
        self.out.push('(');
        for (i, item) in items.enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.nested(item);
        }
        self.out.push(')');
    }

    fn member_key(&mut self, key: &MemberKey) {
        match key {
            MemberKey::Property(name) => self.out.push_str(name),
            MemberKey::Element(index) => {
                let _ = write!(self.out, "[{}]", index);
            }
            MemberKey::Entry(key) => {
                self.out.push('[');
                self.nested(key.value());
                self.out.push(']');
            }
        }
    }

    /// `new Name { ... }` with each `(key, value)` rendered by `item`.
    fn object_body<T>(&mut self, class_name: &str, members: Vec<T>, mut item: impl FnMut(&mut Self, T)) {
        let _ = write!(self.out, "new {} {{", class_name);
        if members.is_empty() {
            self.out.push('}');
            return;
        }
        self.indent += 1;
        for (i, member) in members.into_iter().enumerate() {
            if self.multi_line {
                self.out.push('\n');
                self.out.push_str(&"  ".repeat(self.indent));
            } else if i > 0 {
                self.out.push_str("; ");
            } else {
                self.out.push(' ');
            }
            item(self, member);
        }
        self.indent -= 1;
        if self.multi_line {
            self.out.push('\n');
            self.out.push_str(&"  ".repeat(self.indent));
        } else {
            self.out.push(' ');
        }
        self.out.push('}');
    }

    fn cached_or_unknown(&mut self, value: Option<Value>) {
        match value {
            Some(value) => self.nested(&value),
            None => self.out.push('?'),
        }
    }

    fn keyed_object(&mut self, object: &ObjectRef) {
        let mut members = Vec::new();
        object.iterate_member_values(|key, _, value| {
            members.push((key.clone(), value));
            true
        });
        let class = object.class();
        self.object_body(class.name(), members, |this, (key, value)| {
            this.member_key(&key);
            this.out.push_str(" = ");
            this.cached_or_unknown(value);
        });
    }
}

pub(crate) fn render_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{:?}", f)
    }
}

impl ValueVisitor for ValueRenderer {
    type Output = ();

    fn visit_other(&mut self, value: &Value) {
        // every kind is overridden below
        self.out.push_str(value.class_of().name());
    }

    fn visit_null(&mut self) {
        self.out.push_str("null");
    }

    fn visit_bool(&mut self, value: bool) {
        let _ = write!(self.out, "{}", value);
    }

    fn visit_int(&mut self, value: i64) {
        let _ = write!(self.out, "{}", value);
    }

    fn visit_float(&mut self, value: f64) {
        self.out.push_str(&render_float(value));
    }

    fn visit_string(&mut self, value: &str) {
        let _ = write!(self.out, "{:?}", value);
    }

    fn visit_duration(&mut self, value: &Duration) {
        let _ = write!(self.out, "{}", value);
    }

    fn visit_data_size(&mut self, value: &DataSize) {
        let _ = write!(self.out, "{}", value);
    }

    fn visit_bytes(&mut self, value: &[u8]) {
        self.out.push_str("Bytes(");
        for (i, byte) in value.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            let _ = write!(self.out, "{}", byte);
        }
        self.out.push(')');
    }

    fn visit_int_seq(&mut self, value: &IntSeq) {
        let _ = write!(self.out, "IntSeq({}, {})", value.start, value.end);
        if value.step != 1 {
            let _ = write!(self.out, ".step({})", value.step);
        }
    }

    fn visit_list(&mut self, items: &Arc<Vec<Value>>) {
        self.sequence("List", items.iter());
    }

    fn visit_set(&mut self, items: &Arc<IndexSet<HashableValue>>) {
        self.sequence("Set", items.iter().map(|item| item.value()));
    }

    fn visit_map(&mut self, entries: &Arc<IndexMap<HashableValue, Value>>) {
        self.sequence("Map", entries.iter().flat_map(|(k, v)| [k.value(), v]));
    }

    fn visit_pair(&mut self, pair: &Arc<Pair>) {
        self.sequence("Pair", [pair.first(), pair.second()].into_iter());
    }

    fn visit_regex(&mut self, regex: &Arc<RegexValue>) {
        let _ = write!(self.out, "Regex({:?})", regex.pattern());
    }

    fn visit_function(&mut self, function: &Arc<FunctionValue>) {
        match &function.name {
            Some(name) => {
                let _ = write!(self.out, "function {}/{}", name, function.arity);
            }
            None => {
                let _ = write!(self.out, "function/{}", function.arity);
            }
        }
    }

    fn visit_class(&mut self, class: &Arc<Class>) {
        let _ = write!(self.out, "class {}", class.name());
    }

    fn visit_type_alias(&mut self, alias: &Arc<TypeAlias>) {
        let _ = write!(self.out, "typealias {}", alias.name());
    }

    fn visit_dynamic(&mut self, object: &Arc<DynamicObject>) {
        self.keyed_object(&ObjectRef::Dynamic(object.clone()));
    }

    fn visit_typed(&mut self, object: &Arc<TypedObject>) {
        self.keyed_object(&ObjectRef::Typed(object.clone()));
    }

    fn visit_listing(&mut self, listing: &Arc<Listing>) {
        let object = ObjectRef::Listing(listing.clone());
        let elements: Vec<Option<Value>> = (0..listing.length() as i64)
            .map(|i| object.get_cached_value(&MemberKey::Element(i)))
            .collect();
        self.object_body("Listing", elements, |this, value| this.cached_or_unknown(value));
    }

    fn visit_mapping(&mut self, mapping: &Arc<Mapping>) {
        let object = ObjectRef::Mapping(mapping.clone());
        let entries: Vec<(MemberKey, Option<Value>)> = mapping
            .all_keys()
            .iter()
            .map(|key| (key.clone(), object.get_cached_value(key)))
            .collect();
        self.object_body("Mapping", entries, |this, (key, value)| {
            this.member_key(&key);
            this.out.push_str(" = ");
            this.cached_or_unknown(value);
        });
    }
}
