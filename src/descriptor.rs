//! Service descriptors: one registration record each.

use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::AnyArc;
use crate::lifetime::Lifetime;
use crate::provider::{Deps, ResolverContext};
use crate::token::{ServiceKey, Token};
use crate::traits::{Dispose, Initialize};

pub(crate) type CtorFn = Arc<dyn Fn(&Deps) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type FactoryFn =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type InitHook = Arc<dyn Fn(&AnyArc) -> DiResult<()> + Send + Sync>;
pub(crate) type DisposeHook = Arc<dyn Fn(&AnyArc) + Send + Sync>;

/// How a descriptor produces its instance.
#[derive(Clone)]
pub(crate) enum Source {
    /// Implementation constructor, receiving declared dependencies resolved
    /// in declared order.
    Ctor(CtorFn),
    /// Factory closure, resolving its dependencies ad hoc through the
    /// resolver context.
    Factory(FactoryFn),
    /// Fixed instance, registered up front.
    Value(AnyArc),
}

impl Source {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Source::Ctor(_) => "constructor",
            Source::Factory(_) => "factory",
            Source::Value(_) => "value",
        }
    }
}

/// Type-erased lifecycle thunks, captured at registration time where the
/// concrete type is still known.
#[derive(Clone, Default)]
pub(crate) struct LifecycleHooks {
    pub(crate) on_init: Option<InitHook>,
    pub(crate) on_dispose: Option<DisposeHook>,
}

/// One service registration: token, lifetime, construction source, declared
/// dependency tokens, optional secondary key, and lifecycle hooks.
///
/// Descriptors are immutable once registered; the registry only appends,
/// removes, or replaces them as a whole. A descriptor built with
/// [`ServiceDescriptor::new`] and never given a source fails at resolution
/// time with [`DiError::InvalidDescriptor`].
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, ServiceDescriptor, Lifetime, Token, Resolver};
///
/// struct Config {
///     url: String,
/// }
///
/// let mut services = ServiceCollection::new();
///
/// // Fixed value under a string token.
/// services.register(
///     ServiceDescriptor::new(Token::name("db-url"), Lifetime::Singleton)
///         .with_value("postgres://localhost".to_string()),
/// );
///
/// // Factory under the type's own token.
/// services.register(ServiceDescriptor::factory::<Config, _>(
///     Lifetime::Singleton,
///     |ctx| {
///         let url = ctx.get_required_token::<String>(&Token::name("db-url"))?;
///         Ok(Config { url: (*url).clone() })
///     },
/// ));
///
/// let provider = services.build();
/// let config = provider.get_required::<Config>().unwrap();
/// assert_eq!(config.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceDescriptor {
    pub(crate) token: Token,
    pub(crate) lifetime: Lifetime,
    pub(crate) source: Option<Source>,
    pub(crate) dependencies: Vec<Token>,
    pub(crate) service_key: Option<ServiceKey>,
    pub(crate) hooks: LifecycleHooks,
}

impl ServiceDescriptor {
    /// A bare descriptor with no construction source. Attach one with
    /// [`with_ctor`](Self::with_ctor), [`with_factory`](Self::with_factory),
    /// or [`with_value`](Self::with_value).
    pub fn new(token: Token, lifetime: Lifetime) -> Self {
        Self {
            token,
            lifetime,
            source: None,
            dependencies: Vec::new(),
            service_key: None,
            hooks: LifecycleHooks::default(),
        }
    }

    /// Implementation descriptor under the type's own token: `ctor` receives
    /// the declared `dependencies`, resolved in declared order.
    ///
    /// Dependencies must be declared manually; nothing is inferred from the
    /// constructor.
    pub fn implementation<T, F>(lifetime: Lifetime, dependencies: Vec<Token>, ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Deps) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::new(Token::of::<T>(), lifetime)
            .with_dependencies(dependencies)
            .with_ctor(ctor)
    }

    /// Factory descriptor under the type's own token.
    pub fn factory<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::new(Token::of::<T>(), lifetime).with_factory(factory)
    }

    /// Fixed-value descriptor under the type's own token. Fixed values are
    /// always singleton-equivalent.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new(Token::of::<T>(), Lifetime::Singleton).with_value(value)
    }

    /// Attaches an implementation constructor.
    pub fn with_ctor<T, F>(mut self, ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Deps) -> DiResult<T> + Send + Sync + 'static,
    {
        self.source = Some(Source::Ctor(Arc::new(move |deps| {
            Ok(Arc::new(ctor(deps)?) as AnyArc)
        })));
        self
    }

    /// Attaches a factory closure.
    pub fn with_factory<T, F>(mut self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.source = Some(Source::Factory(Arc::new(move |ctx| {
            Ok(Arc::new(factory(ctx)?) as AnyArc)
        })));
        self
    }

    /// Attaches a fixed value.
    pub fn with_value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.source = Some(Source::Value(Arc::new(value) as AnyArc));
        self
    }

    /// Declares the dependency tokens, in resolution order.
    pub fn with_dependencies(mut self, dependencies: Vec<Token>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Attaches a secondary key, making this descriptor addressable through
    /// `get_keyed` in addition to ordinary token resolution.
    pub fn with_key(mut self, key: ServiceKey) -> Self {
        self.service_key = Some(key);
        self
    }

    /// Re-homes this descriptor under a different token, typically a string
    /// or symbol token.
    pub fn for_token(mut self, token: Token) -> Self {
        self.token = token;
        self
    }

    /// Captures the [`Initialize`] hook for `T`. The resolved instance must
    /// actually be a `T`; anything else fails resolution with a type
    /// mismatch.
    pub fn with_initializer<T: Initialize + 'static>(mut self) -> Self {
        self.hooks.on_init = Some(Arc::new(|any: &AnyArc| match any.downcast_ref::<T>() {
            Some(instance) => instance.initialize(),
            None => Err(DiError::TypeMismatch(std::any::type_name::<T>())),
        }));
        self
    }

    /// Captures the [`Dispose`] hook for `T`, invoked when the caching
    /// resolver is disposed.
    ///
    /// On a transient descriptor, every top-level resolution adds one
    /// teardown entry to the resolving provider or scope. Resolve disposable
    /// transients from short-lived scopes; doing so from a long-lived root
    /// accumulates teardown entries until the root is disposed.
    pub fn with_disposer<T: Dispose + 'static>(mut self) -> Self {
        self.hooks.on_dispose = Some(Arc::new(|any: &AnyArc| {
            if let Some(instance) = any.downcast_ref::<T>() {
                instance.dispose();
            }
        }));
        self
    }

    /// The token this descriptor is registered under.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// The descriptor's lifetime.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Declared dependency tokens, in resolution order.
    pub fn dependencies(&self) -> &[Token] {
        &self.dependencies
    }

    /// The secondary key, if any.
    pub fn service_key(&self) -> Option<&ServiceKey> {
        self.service_key.as_ref()
    }

    /// `"constructor"`, `"factory"`, or `"value"`; `None` for a descriptor
    /// with no source.
    pub fn source_kind(&self) -> Option<&'static str> {
        self.source.as_ref().map(Source::kind)
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("token", &self.token)
            .field("lifetime", &self.lifetime)
            .field("source", &self.source_kind())
            .field("dependencies", &self.dependencies)
            .field("service_key", &self.service_key)
            .finish()
    }
}
