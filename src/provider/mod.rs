//! Built providers and the resolution engine.

mod context;
mod scope;

pub use context::{Deps, ResolverContext};
pub use scope::Scope;
pub(crate) use scope::ScopeShared;

use std::any::Any;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::descriptor::{ServiceDescriptor, Source};
use crate::error::{DiError, DiResult};
use crate::graph::{self, CircularPath, TreeNode};
use crate::internal::{AnyArc, DisposeBag, SlotHandle};
use crate::lifetime::Lifetime;
use crate::registration::Registry;
use crate::token::{ServiceKey, Token};
use crate::traits::ResolverCore;

/// Identity of one cached instance: the token plus the descriptor's index in
/// that token's registration sequence. Resolve-all and keyed resolution cache
/// per descriptor, not per token.
pub(crate) type CacheKey = (Token, usize);

/// Options applied when a collection is built into a provider. Both checks
/// are opt-in; `BuildOptions::default()` leaves them off.
///
/// `validate_scopes` makes scoped-from-root resolution and singleton capture
/// of scoped services fail with
/// [`DiError::ScopeViolation`](crate::DiError::ScopeViolation). Left off, the
/// root acts as one implicit scope, which is permitted but unsafe: scoped
/// instances then live as long as the root.
///
/// `validate_on_build` walks every descriptor's declared dependencies at
/// build time and aggregates unregistered ones into a single
/// [`DiError::BuildValidation`](crate::DiError::BuildValidation) error.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub validate_scopes: bool,
    pub validate_on_build: bool,
}

/// State shared by the root provider and every scope derived from it.
pub(crate) struct ProviderShared {
    pub(crate) registry: Arc<Registry>,
    pub(crate) options: BuildOptions,
    singletons: Mutex<HashMap<CacheKey, AnyArc>>,
    /// Scoped cache used when the root itself resolves scoped services,
    /// reachable only with `validate_scopes` off.
    root_scoped: Mutex<HashMap<CacheKey, AnyArc>>,
    pub(crate) disposers: Mutex<DisposeBag>,
    pub(crate) disposed: AtomicBool,
}

impl ProviderShared {
    pub(crate) fn resolve_entry(
        &self,
        scope: Option<&ScopeShared>,
        token: &Token,
    ) -> DiResult<AnyArc> {
        let driver = ResolveDriver::new(self, scope);
        let slot = driver.resolve_token_slot(token)?;
        slot.value()
            .ok_or_else(|| DiError::NotWired(token.display_name()))
    }

    pub(crate) fn resolve_entry_all(
        &self,
        scope: Option<&ScopeShared>,
        token: &Token,
    ) -> DiResult<Vec<AnyArc>> {
        let driver = ResolveDriver::new(self, scope);
        driver
            .resolve_all_slots(token)?
            .into_iter()
            .map(|slot| {
                slot.value()
                    .ok_or_else(|| DiError::NotWired(token.display_name()))
            })
            .collect()
    }

    pub(crate) fn resolve_entry_keyed(
        &self,
        scope: Option<&ScopeShared>,
        key: &ServiceKey,
        token: &Token,
    ) -> DiResult<AnyArc> {
        let driver = ResolveDriver::new(self, scope);
        let slot = driver.resolve_keyed_slot(key, token)?;
        slot.value()
            .ok_or_else(|| DiError::NotWired(token.display_name()))
    }
}

impl Drop for ProviderShared {
    fn drop(&mut self) {
        if !self.disposed.load(Ordering::SeqCst) && !self.disposers.lock().is_empty() {
            tracing::warn!("provider dropped without dispose(); running teardown hooks");
            self.disposers.lock().run_all_reverse();
        }
    }
}

/// The root resolver produced by
/// [`ServiceCollection::build`](crate::ServiceCollection::build).
///
/// Cheap to clone; every clone shares the same singleton cache and disposal
/// state. Resolution goes through the [`Resolver`](crate::Resolver) trait.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, Resolver};
///
/// struct Greeter;
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Greeter);
///
/// let provider = services.build();
/// assert!(provider.get::<Greeter>().unwrap().is_some());
/// provider.dispose();
/// assert!(provider.get::<Greeter>().is_err());
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderShared>,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry, options: BuildOptions) -> Self {
        Self {
            inner: Arc::new(ProviderShared {
                registry: Arc::new(registry),
                options,
                singletons: Mutex::new(HashMap::new()),
                root_scoped: Mutex::new(HashMap::new()),
                disposers: Mutex::new(DisposeBag::default()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Opens a new scope with its own scoped-instance cache and disposal
    /// list. Scopes share the root's singleton cache.
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Tears down the provider: every tracked instance's dispose hook runs in
    /// reverse construction order, caches are cleared, and all later `get*`
    /// calls fail with [`DiError::Disposed`](crate::DiError::Disposed).
    /// Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("disposing root provider");
        self.inner.disposers.lock().run_all_reverse();
        self.inner.singletons.lock().clear();
        self.inner.root_scoped.lock().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Registered descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.inner.registry.iter_all()
    }

    /// Dependency tree for a token over the built registry snapshot.
    pub fn dependency_tree(&self, token: &Token) -> TreeNode {
        graph::dependency_tree(&self.inner.registry, token)
    }

    /// Every distinct cycle among the built registry's descriptors.
    pub fn find_circular_paths(&self) -> Vec<CircularPath> {
        graph::find_circular_paths(&self.inner.registry)
    }

    /// Indented text rendering of [`dependency_tree`](Self::dependency_tree).
    pub fn render_dependency_tree(&self, token: &Token) -> String {
        graph::render_dependency_tree(&self.dependency_tree(token))
    }

    /// Text rendering of [`find_circular_paths`](Self::find_circular_paths).
    pub fn render_circular_paths(&self) -> String {
        graph::render_circular_paths(&self.find_circular_paths())
    }

    pub(crate) fn shared(&self) -> &Arc<ProviderShared> {
        &self.inner
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_token(&self, token: &Token) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.inner.resolve_entry(None, token)
    }

    fn resolve_token_all(&self, token: &Token) -> DiResult<Vec<Arc<dyn Any + Send + Sync>>> {
        self.inner.resolve_entry_all(None, token)
    }

    fn resolve_token_keyed(
        &self,
        key: &ServiceKey,
        token: &Token,
    ) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.inner.resolve_entry_keyed(None, key, token)
    }

    fn is_token_registered(&self, token: &Token) -> bool {
        self.inner.registry.contains(token)
    }

    fn is_keyed_registered(&self, key: &ServiceKey, token: &Token) -> bool {
        self.inner.registry.keyed_index(key, token).is_some()
    }
}

/// One in-flight resolution frame.
struct Frame {
    key: CacheKey,
    lifetime: Lifetime,
}

/// Per-top-level-call state.
///
/// `stack` and `partials` move together: a key is on the stack exactly while
/// its empty slot sits in the partial table. `transients` memoizes transient
/// instances for the duration of one call so converging edges share, even
/// after the shared branch has completed.
#[derive(Default)]
struct CallState {
    stack: Vec<Frame>,
    partials: HashMap<CacheKey, SlotHandle>,
    transients: HashMap<CacheKey, AnyArc>,
}

/// The resolution engine for one top-level `get*` call.
///
/// Single-threaded by construction (it lives on the caller's stack); the only
/// cross-thread coordination is the cache commit.
pub(crate) struct ResolveDriver<'a> {
    root: &'a ProviderShared,
    scope: Option<&'a ScopeShared>,
    state: RefCell<CallState>,
}

impl<'a> ResolveDriver<'a> {
    pub(crate) fn new(root: &'a ProviderShared, scope: Option<&'a ScopeShared>) -> Self {
        Self {
            root,
            scope,
            state: RefCell::new(CallState::default()),
        }
    }

    pub(crate) fn registry(&self) -> &'a Registry {
        &self.root.registry
    }

    /// Resolves the token's winning descriptor to a slot. The slot is filled
    /// unless this resolution looped back onto an in-flight ancestor, in
    /// which case it fills when the ancestor's construction completes.
    pub(crate) fn resolve_token_slot(&self, token: &Token) -> DiResult<SlotHandle> {
        let root = self.root;
        let (index, descriptor) = root
            .registry
            .last(token)
            .ok_or_else(|| DiError::NotFound(token.display_name()))?;
        self.resolve_descriptor(token, index, descriptor)
    }

    /// Resolves every descriptor registered under the token, in registration
    /// order. Unregistered tokens yield an empty list, not an error.
    pub(crate) fn resolve_all_slots(&self, token: &Token) -> DiResult<Vec<SlotHandle>> {
        let root = self.root;
        root.registry
            .descriptors(token)
            .iter()
            .enumerate()
            .map(|(index, descriptor)| self.resolve_descriptor(token, index, descriptor))
            .collect()
    }

    pub(crate) fn resolve_keyed_slot(
        &self,
        key: &ServiceKey,
        token: &Token,
    ) -> DiResult<SlotHandle> {
        let root = self.root;
        let index = root.registry.keyed_index(key, token).ok_or_else(|| {
            DiError::NotFound(format!("{} keyed {}", token.display_name(), key))
        })?;
        let descriptor = &root.registry.descriptors(token)[index];
        self.resolve_descriptor(token, index, descriptor)
    }

    fn resolve_descriptor(
        &self,
        token: &Token,
        index: usize,
        descriptor: &ServiceDescriptor,
    ) -> DiResult<SlotHandle> {
        self.ensure_live()?;
        let key = (token.clone(), index);

        if let Some(value) = self.cache_lookup(&key, descriptor.lifetime) {
            return Ok(SlotHandle::filled(value));
        }

        {
            let state = self.state.borrow();
            // A back-edge onto an in-flight ancestor: hand out the ancestor's
            // placeholder slot instead of recursing forever.
            if let Some(slot) = state.partials.get(&key) {
                return Ok(slot.clone());
            }
            if state.stack.iter().any(|frame| frame.key == key) {
                return Err(DiError::MissingPartial(token.display_name()));
            }
            if descriptor.lifetime == Lifetime::Transient {
                if let Some(value) = state.transients.get(&key) {
                    return Ok(SlotHandle::filled(value.clone()));
                }
            }
        }

        if self.root.options.validate_scopes && descriptor.lifetime == Lifetime::Scoped {
            if self.scope.is_none() {
                return Err(DiError::ScopeViolation(format!(
                    "scoped service {} resolved from the root provider",
                    token.display_name()
                )));
            }
            let state = self.state.borrow();
            if let Some(frame) = state
                .stack
                .iter()
                .find(|frame| frame.lifetime == Lifetime::Singleton)
            {
                return Err(DiError::ScopeViolation(format!(
                    "singleton {} captures scoped {}",
                    frame.key.0.display_name(),
                    token.display_name()
                )));
            }
        }

        let slot = SlotHandle::empty();
        {
            let mut state = self.state.borrow_mut();
            state.stack.push(Frame {
                key: key.clone(),
                lifetime: descriptor.lifetime,
            });
            state.partials.insert(key.clone(), slot.clone());
        }

        let constructed = self.construct(token, descriptor);

        let instance = match constructed {
            Ok(instance) => instance,
            Err(err) => {
                let mut state = self.state.borrow_mut();
                state.stack.pop();
                state.partials.remove(&key);
                return Err(err);
            }
        };

        let canonical = self.commit(&key, descriptor, instance);
        slot.fill(canonical);

        let mut state = self.state.borrow_mut();
        state.stack.pop();
        state.partials.remove(&key);
        Ok(slot)
    }

    /// Runs the descriptor's source and then its post-construction hook. No
    /// lock is held here; only the commit synchronizes.
    fn construct(&self, token: &Token, descriptor: &ServiceDescriptor) -> DiResult<AnyArc> {
        let source = descriptor
            .source
            .as_ref()
            .ok_or_else(|| DiError::InvalidDescriptor(token.display_name()))?;

        let instance = match source {
            Source::Value(value) => value.clone(),
            Source::Ctor(ctor) => {
                let mut entries = Vec::with_capacity(descriptor.dependencies.len());
                for dependency in &descriptor.dependencies {
                    let slot = self.resolve_token_slot(dependency)?;
                    entries.push((dependency.clone(), slot));
                }
                ctor(&Deps::new(entries))?
            }
            Source::Factory(factory) => factory(&ResolverContext::new(self))?,
        };

        if let Some(hook) = &descriptor.hooks.on_init {
            hook(&instance)?;
        }
        Ok(instance)
    }

    /// Caches the instance per its lifetime and returns the canonical value.
    /// Two threads racing to construct the same singleton both reach this
    /// point; the entry that lands first wins and the loser's instance is
    /// discarded.
    fn commit(&self, key: &CacheKey, descriptor: &ServiceDescriptor, instance: AnyArc) -> AnyArc {
        match descriptor.lifetime {
            Lifetime::Singleton => Self::commit_cached(
                &self.root.singletons,
                &self.root.disposers,
                key,
                descriptor,
                instance,
            ),
            Lifetime::Scoped => match self.scope {
                Some(scope) => Self::commit_cached(
                    &scope.scoped,
                    &scope.disposers,
                    key,
                    descriptor,
                    instance,
                ),
                None => Self::commit_cached(
                    &self.root.root_scoped,
                    &self.root.disposers,
                    key,
                    descriptor,
                    instance,
                ),
            },
            Lifetime::Transient => {
                self.state
                    .borrow_mut()
                    .transients
                    .insert(key.clone(), instance.clone());
                let disposers = self
                    .scope
                    .map(|scope| &scope.disposers)
                    .unwrap_or(&self.root.disposers);
                Self::register_disposer(disposers, key, descriptor, &instance);
                instance
            }
        }
    }

    fn commit_cached(
        cache: &Mutex<HashMap<CacheKey, AnyArc>>,
        disposers: &Mutex<DisposeBag>,
        key: &CacheKey,
        descriptor: &ServiceDescriptor,
        instance: AnyArc,
    ) -> AnyArc {
        let (canonical, discarded) = {
            let mut cache = cache.lock();
            match cache.entry(key.clone()) {
                Entry::Occupied(existing) => (existing.get().clone(), Some(instance)),
                Entry::Vacant(vacant) => (vacant.insert(instance).clone(), None),
            }
        };
        match discarded {
            // A racing thread landed its instance first. The discarded
            // instance already ran its initializer, so its dispose hook runs
            // now rather than never. Construction stays lock-free: a per-key
            // construction lock would deadlock two threads entering a
            // dependency cycle from opposite ends.
            Some(loser) => {
                if let Some(hook) = &descriptor.hooks.on_dispose {
                    hook(&loser);
                }
            }
            None => Self::register_disposer(disposers, key, descriptor, &canonical),
        }
        canonical
    }

    fn register_disposer(
        disposers: &Mutex<DisposeBag>,
        key: &CacheKey,
        descriptor: &ServiceDescriptor,
        instance: &AnyArc,
    ) {
        if let Some(hook) = descriptor.hooks.on_dispose.clone() {
            let instance = instance.clone();
            disposers
                .lock()
                .push(key.0.display_name(), Box::new(move || hook(&instance)));
        }
    }

    fn cache_lookup(&self, key: &CacheKey, lifetime: Lifetime) -> Option<AnyArc> {
        match lifetime {
            Lifetime::Singleton => self.root.singletons.lock().get(key).cloned(),
            Lifetime::Scoped => match self.scope {
                Some(scope) => scope.scoped.lock().get(key).cloned(),
                None => self.root.root_scoped.lock().get(key).cloned(),
            },
            Lifetime::Transient => None,
        }
    }

    fn ensure_live(&self) -> DiResult<()> {
        if self.root.disposed.load(Ordering::SeqCst) {
            return Err(DiError::Disposed);
        }
        if let Some(scope) = self.scope {
            if scope.disposed.load(Ordering::SeqCst) {
                return Err(DiError::Disposed);
            }
        }
        Ok(())
    }
}
