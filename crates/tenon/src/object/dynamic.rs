//! Dynamic objects, typed objects and modules

use std::sync::Arc;

use crate::value::Class;

use super::{ObjectBuilder, ObjectCore};

/// An object with arbitrary properties, elements and entries.
#[derive(Debug)]
pub struct DynamicObject {
    core: ObjectCore,
}

impl DynamicObject {
    pub(crate) fn from_core(core: ObjectCore) -> Self {
        Self { core }
    }

    /// Start building a dynamic object.
    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::new()
    }

    /// The shared object state.
    pub fn core(&self) -> &ObjectCore {
        &self.core
    }
}

/// An instance of a class. Module objects are typed objects that carry the
/// URI of their module.
#[derive(Debug)]
pub struct TypedObject {
    core: ObjectCore,
    class: Arc<Class>,
    module_uri: Option<Arc<str>>,
}

impl TypedObject {
    pub(crate) fn from_core(core: ObjectCore, class: Arc<Class>, module_uri: Option<Arc<str>>) -> Self {
        Self {
            core,
            class,
            module_uri,
        }
    }

    /// Start building a typed object.
    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::new()
    }

    /// The shared object state.
    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    /// The instantiated class.
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Whether this is a module object.
    pub fn is_module(&self) -> bool {
        self.module_uri.is_some()
    }

    /// URI of the module, for module objects.
    pub fn module_uri(&self) -> Option<&str> {
        self.module_uri.as_deref()
    }
}
