//! Scoped resolvers.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::DiResult;
use crate::internal::{AnyArc, DisposeBag};
use crate::provider::{CacheKey, ServiceProvider};
use crate::token::{ServiceKey, Token};
use crate::traits::ResolverCore;

/// Per-scope state: the scoped-instance cache and disposal list.
pub(crate) struct ScopeShared {
    pub(crate) scoped: Mutex<HashMap<CacheKey, AnyArc>>,
    pub(crate) disposers: Mutex<DisposeBag>,
    pub(crate) disposed: AtomicBool,
}

impl Drop for ScopeShared {
    fn drop(&mut self) {
        if !self.disposed.load(Ordering::SeqCst) && !self.disposers.lock().is_empty() {
            tracing::warn!("scope dropped without dispose(); running teardown hooks");
            self.disposers.lock().run_all_reverse();
        }
    }
}

/// A resolution scope opened with
/// [`ServiceProvider::create_scope`].
///
/// Scoped services resolved through a scope are cached on that scope and torn
/// down when it is disposed; singletons still come from the shared root
/// cache. Distinct scopes never share a scoped instance.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Session;
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_factory::<Session, _>(|_| Ok(Session));
/// let provider = services.build();
///
/// let a = provider.create_scope();
/// let b = provider.create_scope();
/// let in_a = a.get_required::<Session>().unwrap();
/// let in_b = b.get_required::<Session>().unwrap();
/// assert!(!Arc::ptr_eq(&in_a, &in_b));
///
/// a.dispose();
/// assert!(a.get_required::<Session>().is_err());
/// // Disposing one scope leaves siblings untouched.
/// assert!(b.get_required::<Session>().is_ok());
/// ```
#[derive(Clone)]
pub struct Scope {
    root: ServiceProvider,
    inner: Arc<ScopeShared>,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        Self {
            root,
            inner: Arc::new(ScopeShared {
                scoped: Mutex::new(HashMap::new()),
                disposers: Mutex::new(DisposeBag::default()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// The root provider this scope was opened from.
    pub fn root(&self) -> &ServiceProvider {
        &self.root
    }

    /// Tears down every scoped and transient instance this scope tracked, in
    /// reverse construction order. Idempotent; does not touch the root or
    /// sibling scopes.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("disposing scope");
        self.inner.disposers.lock().run_all_reverse();
        self.inner.scoped.lock().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl ResolverCore for Scope {
    fn resolve_token(&self, token: &Token) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.root.shared().resolve_entry(Some(&self.inner), token)
    }

    fn resolve_token_all(&self, token: &Token) -> DiResult<Vec<Arc<dyn Any + Send + Sync>>> {
        self.root
            .shared()
            .resolve_entry_all(Some(&self.inner), token)
    }

    fn resolve_token_keyed(
        &self,
        key: &ServiceKey,
        token: &Token,
    ) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.root
            .shared()
            .resolve_entry_keyed(Some(&self.inner), key, token)
    }

    fn is_token_registered(&self, token: &Token) -> bool {
        self.root.registry().contains(token)
    }

    fn is_keyed_registered(&self, key: &ServiceKey, token: &Token) -> bool {
        self.root.registry().keyed_index(key, token).is_some()
    }
}
