//! Class and type alias descriptors

use std::fmt;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashSet;

/// URI of the module that defines the built-in classes.
pub const BASE_MODULE_URI: &str = "pkl:base";

/// A runtime class descriptor.
#[derive(Debug)]
pub struct Class {
    name: Arc<str>,
    module_uri: Arc<str>,
    superclass: Option<Arc<Class>>,
    hidden_properties: FxHashSet<Arc<str>>,
    is_abstract: bool,
}

impl Class {
    /// Create a class with no superclass.
    pub fn new(name: impl Into<Arc<str>>, module_uri: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            module_uri: module_uri.into(),
            superclass: None,
            hidden_properties: FxHashSet::default(),
            is_abstract: false,
        }
    }

    /// Set the superclass (builder pattern).
    pub fn with_superclass(mut self, superclass: Arc<Class>) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Declare a hidden property (builder pattern).
    pub fn with_hidden_property(mut self, name: impl Into<Arc<str>>) -> Self {
        self.hidden_properties.insert(name.into());
        self
    }

    /// Mark the class abstract (builder pattern).
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Simple name, e.g. `Listing`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URI of the defining module.
    pub fn module_uri(&self) -> &str {
        &self.module_uri
    }

    /// `pkl.base#Listing` style name, unique across modules.
    pub fn qualified_name(&self) -> String {
        format!("{}#{}", self.module_uri, self.name)
    }

    /// The direct superclass.
    pub fn superclass(&self) -> Option<&Arc<Class>> {
        self.superclass.as_ref()
    }

    /// Whether the class is abstract.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether `name` is hidden in this class or any superclass.
    pub fn is_hidden_property(&self, name: &str) -> bool {
        self.hidden_properties.contains(name)
            || self
                .superclass
                .as_ref()
                .is_some_and(|s| s.is_hidden_property(name))
    }

    /// Whether this class is `other` or inherits from it.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = class.superclass.as_deref();
        }
        false
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.name == other.name && self.module_uri == other.module_uri)
    }
}

impl Eq for Class {}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A type alias descriptor, e.g. `typealias Port = Int(isBetween(0, 65535))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    name: Arc<str>,
    module_uri: Arc<str>,
    aliased_type: Arc<str>,
}

impl TypeAlias {
    /// Create a type alias.
    pub fn new(
        name: impl Into<Arc<str>>,
        module_uri: impl Into<Arc<str>>,
        aliased_type: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            name: name.into(),
            module_uri: module_uri.into(),
            aliased_type: aliased_type.into(),
        }
    }

    /// Simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URI of the defining module.
    pub fn module_uri(&self) -> &str {
        &self.module_uri
    }

    /// Rendering of the aliased type.
    pub fn aliased_type(&self) -> &str {
        &self.aliased_type
    }

    /// `module#Name` style name.
    pub fn qualified_name(&self) -> String {
        format!("{}#{}", self.module_uri, self.name)
    }
}

/// The built-in classes of the base module.
#[derive(Debug)]
#[allow(missing_docs)]
pub struct BaseClasses {
    pub any: Arc<Class>,
    pub object: Arc<Class>,
    pub null: Arc<Class>,
    pub boolean: Arc<Class>,
    pub number: Arc<Class>,
    pub int: Arc<Class>,
    pub float: Arc<Class>,
    pub string: Arc<Class>,
    pub duration: Arc<Class>,
    pub data_size: Arc<Class>,
    pub bytes: Arc<Class>,
    pub int_seq: Arc<Class>,
    pub collection: Arc<Class>,
    pub list: Arc<Class>,
    pub set: Arc<Class>,
    pub map: Arc<Class>,
    pub pair: Arc<Class>,
    pub regex: Arc<Class>,
    pub function: Arc<Class>,
    pub class: Arc<Class>,
    pub type_alias: Arc<Class>,
    pub dynamic: Arc<Class>,
    pub listing: Arc<Class>,
    pub mapping: Arc<Class>,
    pub module: Arc<Class>,
}

impl BaseClasses {
    fn build() -> Self {
        let class = |name: &str, superclass: Option<&Arc<Class>>| {
            let class = Class::new(name, BASE_MODULE_URI);
            Arc::new(match superclass {
                Some(s) => class.with_superclass(s.clone()),
                None => class,
            })
        };
        let any = Arc::new(Class::new("Any", BASE_MODULE_URI).abstract_class());
        let object = Arc::new(
            Class::new("Object", BASE_MODULE_URI)
                .with_superclass(any.clone())
                .abstract_class(),
        );
        let number = Arc::new(
            Class::new("Number", BASE_MODULE_URI)
                .with_superclass(any.clone())
                .abstract_class(),
        );
        let collection = Arc::new(
            Class::new("Collection", BASE_MODULE_URI)
                .with_superclass(any.clone())
                .abstract_class(),
        );
        let listing = Arc::new(
            Class::new("Listing", BASE_MODULE_URI)
                .with_superclass(object.clone())
                .with_hidden_property("default"),
        );
        let mapping = Arc::new(
            Class::new("Mapping", BASE_MODULE_URI)
                .with_superclass(object.clone())
                .with_hidden_property("default"),
        );

        Self {
            null: class("Null", Some(&any)),
            boolean: class("Boolean", Some(&any)),
            int: class("Int", Some(&number)),
            float: class("Float", Some(&number)),
            string: class("String", Some(&any)),
            duration: class("Duration", Some(&any)),
            data_size: class("DataSize", Some(&any)),
            bytes: class("Bytes", Some(&any)),
            int_seq: class("IntSeq", Some(&any)),
            list: class("List", Some(&collection)),
            set: class("Set", Some(&collection)),
            map: class("Map", Some(&any)),
            pair: class("Pair", Some(&any)),
            regex: class("Regex", Some(&any)),
            function: class("Function", Some(&any)),
            class: class("Class", Some(&any)),
            type_alias: class("TypeAlias", Some(&any)),
            dynamic: class("Dynamic", Some(&object)),
            module: class("Module", Some(&object)),
            listing,
            mapping,
            number,
            collection,
            object,
            any,
        }
    }
}

/// The built-in classes, created on first use.
pub fn base() -> &'static BaseClasses {
    static BASE: OnceLock<BaseClasses> = OnceLock::new();
    BASE.get_or_init(BaseClasses::build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subclass_chain() {
        let base = base();
        assert!(base.int.is_subclass_of(&base.number));
        assert!(base.int.is_subclass_of(&base.any));
        assert!(!base.int.is_subclass_of(&base.string));
        assert!(base.listing.is_subclass_of(&base.object));
    }

    #[test]
    fn test_user_class_inherits_hidden_properties() {
        let parent = Arc::new(Class::new("Base", "file:///m.pkl").with_hidden_property("secret"));
        let child = Class::new("Child", "file:///m.pkl").with_superclass(parent.clone());
        assert!(child.is_hidden_property("secret"));
        assert!(!child.is_hidden_property("name"));
        assert!(child.is_subclass_of(&parent));
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(base().mapping.qualified_name(), "pkl:base#Mapping");
        let alias = TypeAlias::new("Port", "file:///m.pkl", "Int");
        assert_eq!(alias.qualified_name(), "file:///m.pkl#Port");
    }
}
