//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior.
///
/// The lifetime decides *where* a constructed instance is cached; the
/// resolution algorithm is otherwise identical for all three.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database;
/// struct RequestContext;
/// struct Job;
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database);
/// services.add_scoped_factory::<RequestContext, _>(|_| Ok(RequestContext));
/// services.add_transient_factory::<Job, _>(|_| Ok(Job));
///
/// let provider = services.build();
///
/// // Singleton: one instance for the whole resolver tree.
/// let db1 = provider.get_required::<Database>().unwrap();
/// let scope = provider.create_scope();
/// let db2 = scope.get_required::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// // Scoped: one instance per scope.
/// let ctx1 = scope.get_required::<RequestContext>().unwrap();
/// let ctx2 = scope.get_required::<RequestContext>().unwrap();
/// assert!(Arc::ptr_eq(&ctx1, &ctx2));
///
/// // Transient: fresh per top-level resolution.
/// let job1 = provider.get_required::<Job>().unwrap();
/// let job2 = provider.get_required::<Job>().unwrap();
/// assert!(!Arc::ptr_eq(&job1, &job2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Single instance per resolver tree, cached at the root and shared by
    /// every scope until the root is disposed.
    Singleton,
    /// Single instance per scope, cached on the resolver the request was made
    /// against; distinct scopes never share an instance.
    Scoped,
    /// Fresh instance per top-level resolution request. Within one request's
    /// recursive expansion, converging dependency edges reuse the same
    /// in-flight instance; across requests, never.
    Transient,
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifetime::Singleton => f.write_str("Singleton"),
            Lifetime::Scoped => f.write_str("Scoped"),
            Lifetime::Transient => f.write_str("Transient"),
        }
    }
}
