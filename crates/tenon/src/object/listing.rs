//! Listing: a sequence-shaped object with a fixed length

use std::sync::Arc;

use tracing::debug;

use crate::context::EvalContext;
use crate::environment::CapturedScope;
use crate::error::{EvalError, Result};
use crate::value::Value;

use super::{MemberKey, ObjectBuilder, ObjectCore, ObjectMember, ObjectRef, Surrogate, TypeCheck};

/// A sequence-shaped object.
///
/// The length is fixed at construction and known without evaluating any
/// element. Indices in `[0, length)` without an element definition resolve
/// through the hidden `default` member, a one-argument function of the
/// index.
#[derive(Debug)]
pub struct Listing {
    core: ObjectCore,
    length: usize,
}

impl Listing {
    pub(crate) fn from_core(core: ObjectCore, length: usize) -> Self {
        Self { core, length }
    }

    /// Start building a listing.
    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::new()
    }

    /// A listing of constant elements.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Arc<Listing> {
        values
            .into_iter()
            .fold(ObjectBuilder::new(), |builder, value| {
                builder.element(ObjectMember::constant(value))
            })
            .build_listing()
    }

    /// The shared object state.
    pub fn core(&self) -> &ObjectCore {
        &self.core
    }

    /// Number of elements.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether the listing has no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub(crate) fn contains_index(&self, index: i64) -> bool {
        index >= 0 && (index as u64) < self.length as u64
    }

    /// Read the element at `index`.
    pub fn get(self: &Arc<Self>, index: i64, ctx: &mut EvalContext) -> Result<Value> {
        ObjectRef::Listing(self.clone()).read_member(&MemberKey::Element(index), ctx)
    }

    /// Read every element in order.
    pub fn elements(self: &Arc<Self>, ctx: &mut EvalContext) -> Result<Vec<Value>> {
        (0..self.length as i64).map(|i| self.get(i, ctx)).collect()
    }

    /// Overlay an element type on this listing.
    ///
    /// The result shares this listing's definitions and length. Elements are
    /// checked when first read through it, or immediately when the session
    /// runs eager type checks.
    pub fn with_type_check(
        self: &Arc<Self>,
        type_check: Arc<dyn TypeCheck>,
        scope: CapturedScope,
        ctx: &mut EvalContext,
    ) -> Result<Arc<Listing>> {
        debug!(
            base = ?self.core.id(),
            expected = %type_check.expected_type(),
            "creating listing surrogate"
        );
        let surrogate = Surrogate::new(ObjectRef::Listing(self.clone()), type_check, scope);
        let core = ObjectCore::new(None, Default::default(), CapturedScope::empty(), Some(surrogate));
        let listing = Arc::new(Listing::from_core(core, self.length));

        if ctx.eager_type_checks() {
            listing.elements(ctx)?;
        }
        Ok(listing)
    }

    /// `31 * acc + hash` over the elements in order.
    pub(crate) fn compute_hash(&self, this: &ObjectRef, ctx: &mut EvalContext) -> Result<i64> {
        let mut acc: i64 = 0;
        for index in 0..self.length as i64 {
            let value = this.read_member(&MemberKey::Element(index), ctx)?;
            acc = acc.wrapping_mul(31).wrapping_add(value.hash_code(ctx)?);
        }
        Ok(acc)
    }
}

/// Value of an in-range index with no element definition.
pub(super) fn fill_default(
    listing: &ObjectRef,
    index: i64,
    ctx: &mut EvalContext,
) -> Result<(Value, Arc<ObjectMember>)> {
    let key = MemberKey::default_member();
    let Some(member) = listing.get_member(&key) else {
        return Err(EvalError::undefined_value(
            MemberKey::Element(index),
            Some(listing.to_value()),
        ));
    };
    let value = match listing.read_member(&key, ctx)? {
        Value::Function(function) if function.arity == 1 => {
            function.call(&[Value::Int(index)], ctx)?
        }
        other => {
            return Err(EvalError::type_mismatch("(Int) -> Any", other)
                .with_location(member.check_location()))
        }
    };
    Ok((value, member))
}
