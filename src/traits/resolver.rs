//! Resolution traits shared by the root provider, scopes, and factory
//! contexts.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::token::{ServiceKey, Token};

/// Object-safe, token-erased resolution surface.
///
/// Implementors return type-erased instances; the typed convenience methods
/// live on [`Resolver`] and are blanket-provided for every `ResolverCore`.
pub trait ResolverCore {
    /// Resolves the token's winning (last-registered) descriptor.
    fn resolve_token(&self, token: &Token) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Resolves every descriptor registered under the token, in registration
    /// order. An unregistered token yields an empty list.
    fn resolve_token_all(&self, token: &Token) -> DiResult<Vec<Arc<dyn Any + Send + Sync>>>;

    /// Resolves the descriptor registered under `(key, token)`.
    fn resolve_token_keyed(
        &self,
        key: &ServiceKey,
        token: &Token,
    ) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Whether any descriptor is registered for the token.
    fn is_token_registered(&self, token: &Token) -> bool;

    /// Whether a descriptor is registered under `(key, token)`.
    fn is_keyed_registered(&self, key: &ServiceKey, token: &Token) -> bool;
}

fn downcast<T: Send + Sync + 'static>(any: Arc<dyn Any + Send + Sync>) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Typed resolution methods, blanket-implemented for every [`ResolverCore`].
///
/// The optional accessors (`get`, `get_token`, `get_keyed`) return `Ok(None)`
/// only when the token itself is unregistered; a registered token whose
/// construction fails still surfaces the error.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, Resolver};
///
/// struct Cache;
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Cache);
/// let provider = services.build();
///
/// assert!(provider.is_registered::<Cache>());
/// assert!(provider.get::<Cache>().unwrap().is_some());
/// assert!(provider.get::<String>().unwrap().is_none());
/// assert!(provider.get_required::<String>().is_err());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `T`, or `Ok(None)` when unregistered.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.get_token(&Token::of::<T>())
    }

    /// Resolves `T`, failing with
    /// [`DiError::NotFound`](crate::DiError::NotFound) when unregistered.
    fn get_required<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_required_token(&Token::of::<T>())
    }

    /// Resolves an explicit token as a `T`, or `Ok(None)` when unregistered.
    fn get_token<T: Send + Sync + 'static>(&self, token: &Token) -> DiResult<Option<Arc<T>>> {
        if !self.is_token_registered(token) {
            return Ok(None);
        }
        self.get_required_token(token).map(Some)
    }

    /// Resolves an explicit token as a `T`.
    fn get_required_token<T: Send + Sync + 'static>(&self, token: &Token) -> DiResult<Arc<T>> {
        downcast(self.resolve_token(token)?)
    }

    /// Resolves every registration of `T`, in registration order.
    fn get_all<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_token_all(&Token::of::<T>())?
            .into_iter()
            .map(downcast)
            .collect()
    }

    /// Resolves the `T` registered under `key`, or `Ok(None)` when no such
    /// keyed registration exists.
    fn get_keyed<T: Send + Sync + 'static>(&self, key: &ServiceKey) -> DiResult<Option<Arc<T>>> {
        if !self.is_keyed_registered(key, &Token::of::<T>()) {
            return Ok(None);
        }
        self.get_required_keyed(key).map(Some)
    }

    /// Resolves the `T` registered under `key`.
    fn get_required_keyed<T: Send + Sync + 'static>(&self, key: &ServiceKey) -> DiResult<Arc<T>> {
        downcast(self.resolve_token_keyed(key, &Token::of::<T>())?)
    }

    /// Whether any descriptor is registered for `T`.
    fn is_registered<T: 'static>(&self) -> bool {
        self.is_token_registered(&Token::of::<T>())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
