//! Factory-facing resolution context and pre-resolved constructor
//! dependencies.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::{ServiceRef, SlotHandle};
use crate::provider::ResolveDriver;
use crate::token::{ServiceKey, Token};
use crate::traits::ResolverCore;

/// The resolver handed to factory closures.
///
/// It shares the live resolution state of the call that invoked the factory,
/// so a factory resolving a dependency that loops back onto an in-flight
/// ancestor participates in the same placeholder-and-backfill cycle instead
/// of recursing. Eager `get*` on such a back-edge fails with
/// [`DiError::NotWired`](crate::DiError::NotWired); use
/// [`get_deferred`](Self::get_deferred) to hold a [`ServiceRef`] that wires
/// itself when the cycle closes.
pub struct ResolverContext<'a> {
    driver: &'a ResolveDriver<'a>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(driver: &'a ResolveDriver<'a>) -> Self {
        Self { driver }
    }

    /// Resolves `T` as a deferred reference, the cycle-safe counterpart of
    /// `get_required`.
    ///
    /// For an ordinary dependency the reference is wired before this returns.
    /// For a dependency that loops back onto an ancestor, it wires the moment
    /// the top-level resolution completes.
    pub fn get_deferred<T: Send + Sync + 'static>(&self) -> DiResult<ServiceRef<T>> {
        self.get_deferred_token(&Token::of::<T>())
    }

    /// [`get_deferred`](Self::get_deferred) for an explicit token.
    pub fn get_deferred_token<T: Send + Sync + 'static>(
        &self,
        token: &Token,
    ) -> DiResult<ServiceRef<T>> {
        Ok(self.driver.resolve_token_slot(token)?.typed::<T>())
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_token(&self, token: &Token) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let slot = self.driver.resolve_token_slot(token)?;
        slot.value()
            .ok_or_else(|| DiError::NotWired(token.display_name()))
    }

    fn resolve_token_all(&self, token: &Token) -> DiResult<Vec<Arc<dyn Any + Send + Sync>>> {
        self.driver
            .resolve_all_slots(token)?
            .into_iter()
            .map(|slot| {
                slot.value()
                    .ok_or_else(|| DiError::NotWired(token.display_name()))
            })
            .collect()
    }

    fn resolve_token_keyed(
        &self,
        key: &ServiceKey,
        token: &Token,
    ) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let slot = self.driver.resolve_keyed_slot(key, token)?;
        slot.value()
            .ok_or_else(|| DiError::NotWired(token.display_name()))
    }

    fn is_token_registered(&self, token: &Token) -> bool {
        self.driver.registry().contains(token)
    }

    fn is_keyed_registered(&self, key: &ServiceKey, token: &Token) -> bool {
        self.driver.registry().keyed_index(key, token).is_some()
    }
}

/// Declared dependencies handed to an implementation constructor, resolved in
/// declared order.
///
/// Entries are addressed by position, mirroring the descriptor's
/// `dependencies` list. [`get`](Self::get) forces the instance and is the
/// common path; [`get_deferred`](Self::get_deferred) hands out a
/// [`ServiceRef`] for entries that loop back onto the service under
/// construction.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, ServiceDescriptor, Lifetime, Token, Resolver};
/// use std::sync::Arc;
///
/// struct Repo;
/// struct Service { repo: Arc<Repo> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Repo);
/// services.register(ServiceDescriptor::implementation::<Service, _>(
///     Lifetime::Singleton,
///     vec![Token::of::<Repo>()],
///     |deps| Ok(Service { repo: deps.get::<Repo>(0)? }),
/// ));
///
/// let provider = services.build();
/// let service = provider.get_required::<Service>().unwrap();
/// assert!(Arc::ptr_eq(&service.repo, &provider.get_required::<Repo>().unwrap()));
/// ```
pub struct Deps {
    entries: Vec<(Token, SlotHandle)>,
}

impl Deps {
    pub(crate) fn new(entries: Vec<(Token, SlotHandle)>) -> Self {
        Self { entries }
    }

    /// The resolved instance at declared position `index`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        self.slot(index)?.force::<T>()
    }

    /// A deferred reference to the dependency at declared position `index`.
    pub fn get_deferred<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<ServiceRef<T>> {
        Ok(self.slot(index)?.typed::<T>())
    }

    /// The token declared at position `index`.
    pub fn token(&self, index: usize) -> Option<&Token> {
        self.entries.get(index).map(|(token, _)| token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot(&self, index: usize) -> DiResult<&SlotHandle> {
        self.entries
            .get(index)
            .map(|(_, slot)| slot)
            .ok_or_else(|| {
                DiError::NotFound(format!(
                    "declared dependency #{} ({} declared)",
                    index,
                    self.entries.len()
                ))
            })
    }
}
