//! Scope isolation and scope validation.

use std::sync::Arc;

use tangle_di::{BuildOptions, DiError, Resolver, ServiceCollection};

struct Session;

struct Singleton {
    _session: Arc<Session>,
}

fn scoped_session() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services.add_scoped_factory::<Session, _>(|_| Ok(Session));
    services
}

#[test]
fn scoped_instances_are_cached_per_scope() {
    let provider = scoped_session().build();
    let scope = provider.create_scope();

    let a = scope.get_required::<Session>().unwrap();
    let b = scope.get_required::<Session>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn distinct_scopes_never_share_scoped_instances() {
    let provider = scoped_session().build();

    let first = provider.create_scope();
    let second = provider.create_scope();
    assert!(!Arc::ptr_eq(
        &first.get_required::<Session>().unwrap(),
        &second.get_required::<Session>().unwrap()
    ));
}

#[test]
fn singletons_are_shared_across_scopes() {
    struct App;

    let mut services = ServiceCollection::new();
    services.add_singleton(App);
    let provider = services.build();

    let root = provider.get_required::<App>().unwrap();
    let scoped = provider.create_scope().get_required::<App>().unwrap();
    assert!(Arc::ptr_eq(&root, &scoped));
}

#[test]
fn default_build_treats_the_root_as_one_implicit_scope() {
    // Scope validation is opt-in; a plain build() permits root resolution of
    // scoped tokens and caches them on the root.
    let provider = scoped_session().build();

    let a = provider.get_required::<Session>().unwrap();
    let b = provider.get_required::<Session>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    // Real scopes still get their own instances.
    let scoped = provider.create_scope().get_required::<Session>().unwrap();
    assert!(!Arc::ptr_eq(&a, &scoped));
}

#[test]
fn default_build_permits_singleton_capture_of_scoped_services() {
    let mut services = scoped_session();
    services.add_singleton_factory::<Singleton, _>(|ctx| {
        Ok(Singleton {
            _session: ctx.get_required::<Session>()?,
        })
    });
    let provider = services.build();

    let scope = provider.create_scope();
    assert!(scope.get_required::<Singleton>().is_ok());
}

fn validating(services: ServiceCollection) -> tangle_di::ServiceProvider {
    services
        .build_with(BuildOptions {
            validate_scopes: true,
            validate_on_build: false,
        })
        .unwrap()
}

#[test]
fn scope_validation_rejects_scoped_resolution_from_root() {
    let provider = validating(scoped_session());

    match provider.get_required::<Session>() {
        Err(DiError::ScopeViolation(msg)) => assert!(msg.contains("Session")),
        other => panic!("expected ScopeViolation, got {:?}", other.err()),
    }
}

#[test]
fn scope_validation_rejects_singleton_capture_of_scoped_services() {
    let mut services = scoped_session();
    services.add_singleton_factory::<Singleton, _>(|ctx| {
        Ok(Singleton {
            _session: ctx.get_required::<Session>()?,
        })
    });
    let provider = validating(services);
    let scope = provider.create_scope();

    match scope.get_required::<Singleton>() {
        Err(DiError::ScopeViolation(msg)) => {
            // The error names both the captor and the captured service.
            assert!(msg.contains("Singleton"));
            assert!(msg.contains("Session"));
        }
        other => panic!("expected ScopeViolation, got {:?}", other.err()),
    }
}

#[test]
fn disposing_a_scope_leaves_root_and_siblings_working() {
    let provider = scoped_session().build();

    let doomed = provider.create_scope();
    let survivor = provider.create_scope();
    doomed.get_required::<Session>().unwrap();

    doomed.dispose();
    assert!(doomed.is_disposed());
    assert!(matches!(
        doomed.get_required::<Session>(),
        Err(DiError::Disposed)
    ));
    assert!(survivor.get_required::<Session>().is_ok());
    assert!(!provider.is_disposed());
}

#[test]
fn disposing_the_root_fails_scope_resolution_too() {
    let provider = scoped_session().build();
    let scope = provider.create_scope();

    provider.dispose();
    assert!(matches!(
        scope.get_required::<Session>(),
        Err(DiError::Disposed)
    ));
}
