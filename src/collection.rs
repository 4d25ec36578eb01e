//! Service registration collection.

use crate::descriptor::ServiceDescriptor;
use crate::error::{DiError, DiResult, MissingLink};
use crate::graph::{self, CircularPath, TreeNode};
use crate::lifetime::Lifetime;
use crate::provider::{BuildOptions, Deps, ResolverContext, ServiceProvider};
use crate::registration::Registry;
use crate::token::{ServiceKey, Token};

/// Mutable set of service descriptors, built into a
/// [`ServiceProvider`].
///
/// Registration is append-only per token: the last descriptor wins ordinary
/// resolution, `get_all` sees every descriptor in order, and `try_*` variants
/// never override an existing registration. `remove` and `replace` are the
/// only mutations that drop descriptors.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Database { config: Arc<Config> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Config { url: "localhost".into() });
/// services.add_singleton_factory::<Database, _>(|ctx| {
///     Ok(Database { config: ctx.get_required::<Config>()? })
/// });
///
/// let provider = services.build();
/// let db = provider.get_required::<Database>().unwrap();
/// assert_eq!(db.config.url, "localhost");
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    registry: Registry,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor. Never discards earlier registrations for the
    /// same token.
    pub fn register(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.registry.append(descriptor);
        self
    }

    /// Appends only when the token has no descriptor yet, for library
    /// defaults that must not override caller choices. Returns whether the
    /// descriptor was taken.
    pub fn try_register(&mut self, descriptor: ServiceDescriptor) -> bool {
        self.registry.try_append(descriptor)
    }

    /// Drops every descriptor for the token, including keyed ones. Returns
    /// whether anything was removed.
    pub fn remove(&mut self, token: &Token) -> bool {
        self.registry.remove(token)
    }

    /// Removes then re-registers, keeping the lifetime of the prior last
    /// descriptor (Singleton when the token was unregistered).
    pub fn replace(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.registry.replace(descriptor);
        self
    }

    /// Registers a fixed singleton value under its own type token.
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.register(ServiceDescriptor::value(value))
    }

    /// Registers a singleton factory under `T`'s own type token.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::factory::<T, F>(
            Lifetime::Singleton,
            factory,
        ))
    }

    /// Registers a scoped factory under `T`'s own type token.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::factory::<T, F>(Lifetime::Scoped, factory))
    }

    /// Registers a transient factory under `T`'s own type token.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::factory::<T, F>(
            Lifetime::Transient,
            factory,
        ))
    }

    /// Registers a singleton implementation constructor with explicitly
    /// declared dependencies.
    pub fn add_singleton_ctor<T, F>(&mut self, dependencies: Vec<Token>, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Deps) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::implementation::<T, F>(
            Lifetime::Singleton,
            dependencies,
            ctor,
        ))
    }

    /// Registers a scoped implementation constructor.
    pub fn add_scoped_ctor<T, F>(&mut self, dependencies: Vec<Token>, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Deps) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::implementation::<T, F>(
            Lifetime::Scoped,
            dependencies,
            ctor,
        ))
    }

    /// Registers a transient implementation constructor.
    pub fn add_transient_ctor<T, F>(&mut self, dependencies: Vec<Token>, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Deps) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::implementation::<T, F>(
            Lifetime::Transient,
            dependencies,
            ctor,
        ))
    }

    /// [`add_singleton`](Self::add_singleton) that yields to an existing
    /// registration. Returns whether the value was taken.
    pub fn try_add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> bool {
        self.try_register(ServiceDescriptor::value(value))
    }

    /// [`add_singleton_factory`](Self::add_singleton_factory) that yields to
    /// an existing registration.
    pub fn try_add_singleton_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.try_register(ServiceDescriptor::factory::<T, F>(
            Lifetime::Singleton,
            factory,
        ))
    }

    /// [`add_scoped_factory`](Self::add_scoped_factory) that yields to an
    /// existing registration.
    pub fn try_add_scoped_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.try_register(ServiceDescriptor::factory::<T, F>(Lifetime::Scoped, factory))
    }

    /// [`add_transient_factory`](Self::add_transient_factory) that yields to
    /// an existing registration.
    pub fn try_add_transient_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.try_register(ServiceDescriptor::factory::<T, F>(
            Lifetime::Transient,
            factory,
        ))
    }

    /// Registers a fixed singleton value addressable through `key` as well as
    /// through ordinary resolution of its token.
    pub fn add_keyed_singleton<T: Send + Sync + 'static>(
        &mut self,
        key: ServiceKey,
        value: T,
    ) -> &mut Self {
        self.register(ServiceDescriptor::value(value).with_key(key))
    }

    /// Registers a keyed singleton factory.
    pub fn add_keyed_singleton_factory<T, F>(&mut self, key: ServiceKey, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::factory::<T, F>(Lifetime::Singleton, factory).with_key(key))
    }

    /// Registers a keyed scoped factory.
    pub fn add_keyed_scoped_factory<T, F>(&mut self, key: ServiceKey, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::factory::<T, F>(Lifetime::Scoped, factory).with_key(key))
    }

    /// Registers a keyed transient factory.
    pub fn add_keyed_transient_factory<T, F>(&mut self, key: ServiceKey, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register(ServiceDescriptor::factory::<T, F>(Lifetime::Transient, factory).with_key(key))
    }

    /// Whether any descriptor is registered for `T`'s type token.
    pub fn contains<T: 'static>(&self) -> bool {
        self.contains_token(&Token::of::<T>())
    }

    /// Whether any descriptor is registered for the token.
    pub fn contains_token(&self, token: &Token) -> bool {
        self.registry.contains(token)
    }

    /// Number of registered descriptors, counting duplicates per token.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Registered descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.registry.iter_all()
    }

    /// Builds a provider with default options. Infallible: with
    /// `validate_on_build` off, missing dependencies surface at first
    /// resolution instead.
    pub fn build(self) -> ServiceProvider {
        ServiceProvider::new(self.registry, BuildOptions::default())
    }

    /// Builds a provider with explicit options. With `validate_on_build` set,
    /// every declared dependency edge whose token is unregistered is
    /// collected into one aggregate
    /// [`DiError::BuildValidation`](crate::DiError::BuildValidation) error.
    pub fn build_with(self, options: BuildOptions) -> DiResult<ServiceProvider> {
        if options.validate_on_build {
            let missing = self.missing_links();
            if !missing.is_empty() {
                return Err(DiError::BuildValidation(missing));
            }
        }
        Ok(ServiceProvider::new(self.registry, options))
    }

    /// Dependency tree for a token, expanded from declared dependencies.
    pub fn dependency_tree(&self, token: &Token) -> TreeNode {
        graph::dependency_tree(&self.registry, token)
    }

    /// Every distinct cycle among registered descriptors.
    pub fn find_circular_paths(&self) -> Vec<CircularPath> {
        graph::find_circular_paths(&self.registry)
    }

    /// Indented text rendering of [`dependency_tree`](Self::dependency_tree).
    pub fn render_dependency_tree(&self, token: &Token) -> String {
        graph::render_dependency_tree(&self.dependency_tree(token))
    }

    /// Text rendering of [`find_circular_paths`](Self::find_circular_paths).
    pub fn render_circular_paths(&self) -> String {
        graph::render_circular_paths(&self.find_circular_paths())
    }

    fn missing_links(&self) -> Vec<MissingLink> {
        let mut links = Vec::new();
        for descriptor in self.registry.iter_all() {
            for dependency in descriptor.dependencies() {
                if !self.registry.contains(dependency) {
                    links.push(MissingLink {
                        dependent: descriptor.token().display_name(),
                        dependency: dependency.display_name(),
                    });
                }
            }
        }
        links
    }
}
