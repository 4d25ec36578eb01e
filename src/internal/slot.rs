//! Placeholder-then-backfill instance slots.
//!
//! A slot is published into the partial-instance table before its service is
//! constructed. Dependency edges that loop back onto an in-flight ancestor
//! receive a handle to the same slot; once the ancestor's construction
//! completes, the slot is filled in place and every holder observes the final
//! instance.

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::error::{DiError, DiResult};

/// Type-erased shared instance.
pub(crate) type AnyArc = Arc<dyn std::any::Any + Send + Sync>;

/// Shared, fill-once cell holding a constructed instance.
///
/// Cloning a handle shares the underlying cell; filling it makes the value
/// visible through every clone at once.
#[derive(Clone)]
pub(crate) struct SlotHandle {
    cell: Arc<OnceLock<AnyArc>>,
}

impl SlotHandle {
    /// An empty slot, published as the partial instance for an in-flight
    /// construction.
    pub(crate) fn empty() -> Self {
        Self {
            cell: Arc::new(OnceLock::new()),
        }
    }

    /// A slot that is already wired, for cache hits.
    pub(crate) fn filled(value: AnyArc) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(value);
        Self {
            cell: Arc::new(cell),
        }
    }

    /// Fills the slot. Returns `false` if it was already filled; the first
    /// value wins in that case.
    pub(crate) fn fill(&self, value: AnyArc) -> bool {
        self.cell.set(value).is_ok()
    }

    pub(crate) fn value(&self) -> Option<AnyArc> {
        self.cell.get().cloned()
    }

    pub(crate) fn is_wired(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Typed wrapper over this slot.
    pub(crate) fn typed<T: Send + Sync + 'static>(&self) -> ServiceRef<T> {
        ServiceRef {
            slot: self.clone(),
            _marker: PhantomData,
        }
    }

    /// Forces the slot into a concrete value, failing with [`DiError::NotWired`]
    /// while the owning construction is still in flight.
    pub(crate) fn force<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let any = self
            .value()
            .ok_or_else(|| DiError::NotWired(std::any::type_name::<T>().to_string()))?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }
}

/// A shared reference to a service that may still be under construction.
///
/// This is the handle circular dependents hold: a factory resolving a
/// dependency that loops back onto an ancestor receives a `ServiceRef` whose
/// slot is not yet filled. The reference becomes usable the moment the
/// ancestor's own construction completes, because the slot is shared rather
/// than copied.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, ServiceRef, Resolver};
/// use std::sync::Arc;
///
/// struct A { b: ServiceRef<B> }
/// struct B { a: ServiceRef<A> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_factory::<A, _>(|ctx| {
///     Ok(A { b: ctx.get_deferred::<B>()? })
/// });
/// services.add_singleton_factory::<B, _>(|ctx| {
///     Ok(B { a: ctx.get_deferred::<A>()? })
/// });
///
/// let provider = services.build();
/// let a = provider.get_required::<A>().unwrap();
/// let b = a.b.resolved().unwrap();
/// // The cycle is fully wired: B's reference back to A is A itself.
/// assert!(Arc::ptr_eq(&b.a.resolved().unwrap(), &a));
/// ```
pub struct ServiceRef<T> {
    slot: SlotHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ServiceRef<T> {
    /// The resolved instance.
    ///
    /// Fails with [`DiError::NotWired`] only when called from inside the very
    /// construction cycle that produces the instance; once the top-level
    /// resolution returns, the reference is always wired.
    pub fn resolved(&self) -> DiResult<Arc<T>> {
        self.slot.force::<T>()
    }

    /// The resolved instance, or `None` while construction is in flight.
    pub fn try_resolved(&self) -> Option<Arc<T>> {
        self.slot.force::<T>().ok()
    }

    /// Whether the underlying construction has completed.
    pub fn is_wired(&self) -> bool {
        self.slot.is_wired()
    }
}

impl<T> Clone for ServiceRef<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for ServiceRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRef")
            .field("service", &std::any::type_name::<T>())
            .field("wired", &self.slot.is_wired())
            .finish()
    }
}
