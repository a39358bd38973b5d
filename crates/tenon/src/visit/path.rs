//! Paths into a value graph

use std::fmt::Write;
use std::sync::Arc;

use crate::object::MemberKey;
use crate::value::Value;

use super::ValueRenderer;

/// One step of a [`ValuePath`].
#[derive(Debug, Clone)]
pub enum PathElement {
    /// Marker for the value a traversal started at
    TopLevel,
    /// Property access `.name`
    Property(Arc<str>),
    /// Element access `[index]`
    Index(i64),
    /// Entry access `[key]`
    Key(Value),
    /// Every property of an object
    WildcardProperty,
    /// Every element of a collection
    WildcardElement,
}

impl PathElement {
    /// Property step.
    pub fn property(name: &str) -> Self {
        PathElement::Property(Arc::from(name))
    }

    fn is_marker(&self) -> bool {
        matches!(
            self,
            PathElement::TopLevel | PathElement::WildcardProperty | PathElement::WildcardElement
        )
    }
}

impl From<&MemberKey> for PathElement {
    fn from(key: &MemberKey) -> Self {
        match key {
            MemberKey::Property(name) => PathElement::Property(name.clone()),
            MemberKey::Element(index) => PathElement::Index(*index),
            MemberKey::Entry(key) => PathElement::Key(key.value().clone()),
        }
    }
}

/// A growable path from a top-level value to the value being visited.
#[derive(Debug, Clone, Default)]
pub struct ValuePath {
    elements: Vec<PathElement>,
}

impl ValuePath {
    /// A path holding only the top-level marker.
    pub fn top_level() -> Self {
        Self {
            elements: vec![PathElement::TopLevel],
        }
    }

    /// Append a step.
    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    /// Remove the last step.
    pub fn pop(&mut self) -> Option<PathElement> {
        self.elements.pop()
    }

    /// Number of steps, markers included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the path has no steps at all.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The steps, markers included.
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Render as `a.b[2]["key"]`, skipping markers.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for element in self.elements.iter().filter(|e| !e.is_marker()) {
            match element {
                PathElement::Property(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathElement::Index(index) => {
                    let _ = write!(out, "[{}]", index);
                }
                PathElement::Key(key) => {
                    let _ = write!(out, "[{}]", ValueRenderer::single_line(80).render(key));
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_skips_markers() {
        let mut path = ValuePath::top_level();
        path.push(PathElement::property("a"));
        path.push(PathElement::WildcardElement);
        path.push(PathElement::property("b"));
        path.push(PathElement::Index(2));
        path.push(PathElement::Key(Value::string("k")));
        assert_eq!(path.render(), "a.b[2][\"k\"]");
    }

    #[test]
    fn test_push_pop() {
        let mut path = ValuePath::top_level();
        path.push(PathElement::from(&MemberKey::element(3)));
        assert_eq!(path.len(), 2);
        assert!(matches!(path.pop(), Some(PathElement::Index(3))));
        assert_eq!(path.render(), "");
    }
}
