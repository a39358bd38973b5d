//! Mapping: a map-shaped object

use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::context::EvalContext;
use crate::environment::CapturedScope;
use crate::error::Result;
use crate::value::{HashableValue, Value};

use super::{MemberKey, ObjectBuilder, ObjectCore, ObjectRef, Surrogate, TypeCheck};

/// A map-shaped object whose entries are evaluated lazily.
#[derive(Debug)]
pub struct Mapping {
    core: ObjectCore,
    keys: OnceLock<Vec<MemberKey>>,
}

impl Mapping {
    pub(crate) fn from_core(core: ObjectCore) -> Self {
        Self {
            core,
            keys: OnceLock::new(),
        }
    }

    /// Start building a mapping.
    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::new()
    }

    /// The shared object state.
    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    /// Entry keys across the prototype chain, in order of first definition.
    pub fn all_keys(&self) -> &[MemberKey] {
        self.keys.get_or_init(|| {
            let chain = self.core.inherited_chain();
            let mut seen = FxHashSet::default();
            let mut keys = Vec::new();
            let own = self.core.members().iter();
            let inherited = chain.iter().rev().flat_map(|o| o.core().members().iter());
            for (key, member) in inherited.chain(own) {
                if key.is_entry() && !member.is_local() && seen.insert(key.clone()) {
                    keys.push(key.clone());
                }
            }
            keys
        })
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.all_keys().len()
    }

    /// Whether an entry exists for `key`.
    pub fn contains_key(&self, key: &HashableValue) -> bool {
        self.all_keys()
            .iter()
            .any(|k| matches!(k, MemberKey::Entry(e) if e == key))
    }

    /// Read the entry for `key`.
    pub fn get(self: &Arc<Self>, key: &Value, ctx: &mut EvalContext) -> Result<Value> {
        let key = HashableValue::new(key.clone(), ctx)?;
        ObjectRef::Mapping(self.clone()).read_member(&MemberKey::Entry(key), ctx)
    }

    /// Overlay an entry value type on this mapping.
    pub fn with_type_check(
        self: &Arc<Self>,
        type_check: Arc<dyn TypeCheck>,
        scope: CapturedScope,
        ctx: &mut EvalContext,
    ) -> Result<Arc<Mapping>> {
        debug!(
            base = ?self.core.id(),
            expected = %type_check.expected_type(),
            "creating mapping surrogate"
        );
        let surrogate = Surrogate::new(ObjectRef::Mapping(self.clone()), type_check, scope);
        let core = ObjectCore::new(None, Default::default(), CapturedScope::empty(), Some(surrogate));
        let mapping = Arc::new(Mapping::from_core(core));

        if ctx.eager_type_checks() {
            let this = ObjectRef::Mapping(mapping.clone());
            for key in mapping.all_keys() {
                this.read_member(key, ctx)?;
            }
        }
        Ok(mapping)
    }
}
