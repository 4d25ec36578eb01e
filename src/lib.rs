//! # tangle-di
//!
//! A dependency-resolution runtime that wires circular dependency graphs
//! instead of rejecting them.
//!
//! ## Features
//!
//! - **Three lifetimes**: Singleton, Scoped, and Transient services
//! - **Circular dependencies resolved, not rejected**: in-flight services
//!   publish a placeholder that is backfilled when construction completes
//! - **Token-addressed registration**: types, string names, and unique
//!   symbols all work as service identifiers
//! - **Keyed services**: several implementations under one token, selected
//!   by a secondary key
//! - **Lifecycle hooks**: opt-in post-construction and pre-teardown traits,
//!   with LIFO teardown on `dispose()`
//! - **Diagnostics**: build-time validation plus a pure dependency-graph
//!   analyzer with cycle detection and text renderers
//!
//! ## Quick Start
//!
//! ```rust
//! use tangle_di::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_transient_factory::<UserService, _>(|ctx| {
//!     Ok(UserService {
//!         db: ctx.get_required::<Database>()?,
//!     })
//! });
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>().unwrap();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Circular Dependencies
//!
//! Services that reference each other hold a [`ServiceRef`], which wires
//! itself the moment the cycle finishes constructing:
//!
//! ```rust
//! use tangle_di::{ServiceCollection, ServiceRef, Resolver};
//! use std::sync::Arc;
//!
//! struct Chicken { egg: ServiceRef<Egg> }
//! struct Egg { chicken: ServiceRef<Chicken> }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton_factory::<Chicken, _>(|ctx| {
//!     Ok(Chicken { egg: ctx.get_deferred::<Egg>()? })
//! });
//! services.add_singleton_factory::<Egg, _>(|ctx| {
//!     Ok(Egg { chicken: ctx.get_deferred::<Chicken>()? })
//! });
//!
//! let provider = services.build();
//! let chicken = provider.get_required::<Chicken>().unwrap();
//! let egg = chicken.egg.resolved().unwrap();
//! assert!(Arc::ptr_eq(&egg.chicken.resolved().unwrap(), &chicken));
//! ```
//!
//! ## Diagnostics
//!
//! ```rust
//! use tangle_di::{ServiceCollection, ServiceDescriptor, Lifetime, Token};
//!
//! struct A;
//! struct B;
//!
//! let mut services = ServiceCollection::new();
//! services.register(
//!     ServiceDescriptor::new(Token::of::<A>(), Lifetime::Singleton)
//!         .with_dependencies(vec![Token::of::<B>()]),
//! );
//! services.register(
//!     ServiceDescriptor::new(Token::of::<B>(), Lifetime::Singleton)
//!         .with_dependencies(vec![Token::of::<A>()]),
//! );
//!
//! assert_eq!(services.find_circular_paths().len(), 1);
//! println!("{}", services.render_dependency_tree(&Token::of::<A>()));
//! ```

pub mod collection;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod lifetime;
pub mod provider;
pub mod token;
pub mod traits;

mod internal;
mod registration;

pub use collection::ServiceCollection;
pub use descriptor::ServiceDescriptor;
pub use error::{DiError, DiResult, MissingLink};
pub use graph::{CircularPath, TreeNode, TreeStatus};
pub use internal::ServiceRef;
pub use lifetime::Lifetime;
pub use provider::{BuildOptions, Deps, ResolverContext, Scope, ServiceProvider};
pub use token::{token_of, ServiceKey, Symbol, Token};
pub use traits::{Dispose, Initialize, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Database;
    struct Repo {
        db: Arc<Database>,
    }

    #[test]
    fn singleton_round_trip() {
        let mut services = ServiceCollection::new();
        services.add_singleton(Database);
        let provider = services.build();

        let a = provider.get_required::<Database>().unwrap();
        let b = provider.get_required::<Database>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn factory_receives_its_dependencies() {
        let mut services = ServiceCollection::new();
        services.add_singleton(Database);
        services.add_singleton_factory::<Repo, _>(|ctx| {
            Ok(Repo {
                db: ctx.get_required::<Database>()?,
            })
        });
        let provider = services.build();

        let repo = provider.get_required::<Repo>().unwrap();
        assert!(Arc::ptr_eq(
            &repo.db,
            &provider.get_required::<Database>().unwrap()
        ));
    }

    #[test]
    fn missing_service_is_not_found() {
        let provider = ServiceCollection::new().build();
        assert!(matches!(
            provider.get_required::<Database>(),
            Err(DiError::NotFound(_))
        ));
        assert!(provider.get::<Database>().unwrap().is_none());
    }
}
