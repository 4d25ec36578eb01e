//! Basic registration and resolution behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tangle_di::{
    DiError, Lifetime, Resolver, ServiceCollection, ServiceDescriptor, Symbol, Token,
};

struct Config {
    url: String,
}

struct Database {
    config: Arc<Config>,
}

struct Job;

#[test]
fn singleton_resolves_to_one_shared_instance() {
    let mut services = ServiceCollection::new();
    services.add_singleton(Config {
        url: "localhost".into(),
    });
    let provider = services.build();

    let a = provider.get_required::<Config>().unwrap();
    let b = provider.get_required::<Config>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.url, "localhost");
}

#[test]
fn transient_resolves_fresh_per_top_level_call() {
    let mut services = ServiceCollection::new();
    services.add_transient_factory::<Job, _>(|_| Ok(Job));
    let provider = services.build();

    let a = provider.get_required::<Job>().unwrap();
    let b = provider.get_required::<Job>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn transient_converging_edges_share_within_one_call() {
    struct Shared;
    struct Left {
        shared: Arc<Shared>,
    }
    struct Right {
        shared: Arc<Shared>,
    }
    struct Top {
        left: Arc<Left>,
        right: Arc<Right>,
    }

    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = constructions.clone();

    let mut services = ServiceCollection::new();
    services.add_transient_factory::<Shared, _>(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Shared)
    });
    services.add_transient_factory::<Left, _>(|ctx| {
        Ok(Left {
            shared: ctx.get_required::<Shared>()?,
        })
    });
    services.add_transient_factory::<Right, _>(|ctx| {
        Ok(Right {
            shared: ctx.get_required::<Shared>()?,
        })
    });
    services.add_transient_factory::<Top, _>(|ctx| {
        Ok(Top {
            left: ctx.get_required::<Left>()?,
            right: ctx.get_required::<Right>()?,
        })
    });
    let provider = services.build();

    let top = provider.get_required::<Top>().unwrap();
    assert!(Arc::ptr_eq(&top.left.shared, &top.right.shared));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);

    // A second top-level call never reuses the first call's transients.
    let again = provider.get_required::<Top>().unwrap();
    assert!(!Arc::ptr_eq(&again.left.shared, &top.left.shared));
    assert_eq!(constructions.load(Ordering::SeqCst), 2);
}

#[test]
fn factories_resolve_their_dependencies() {
    let mut services = ServiceCollection::new();
    services.add_singleton(Config { url: "db".into() });
    services.add_singleton_factory::<Database, _>(|ctx| {
        Ok(Database {
            config: ctx.get_required::<Config>()?,
        })
    });
    let provider = services.build();

    let db = provider.get_required::<Database>().unwrap();
    assert_eq!(db.config.url, "db");
}

#[test]
fn implementation_ctor_receives_declared_dependencies_in_order() {
    struct Wired {
        config: Arc<Config>,
        greeting: Arc<String>,
    }

    let mut services = ServiceCollection::new();
    services.add_singleton(Config { url: "db".into() });
    services.register(
        ServiceDescriptor::new(Token::name("greeting"), Lifetime::Singleton)
            .with_value("hello".to_string()),
    );
    services.add_singleton_ctor::<Wired, _>(
        vec![Token::of::<Config>(), Token::name("greeting")],
        |deps| {
            Ok(Wired {
                config: deps.get::<Config>(0)?,
                greeting: deps.get::<String>(1)?,
            })
        },
    );
    let provider = services.build();

    let wired = provider.get_required::<Wired>().unwrap();
    assert_eq!(wired.config.url, "db");
    assert_eq!(*wired.greeting, "hello");
}

#[test]
fn string_and_symbol_tokens_resolve() {
    let sym = Symbol::new("request-id");
    let mut services = ServiceCollection::new();
    services.register(
        ServiceDescriptor::new(Token::name("db-url"), Lifetime::Singleton)
            .with_value("postgres://localhost".to_string()),
    );
    services.register(
        ServiceDescriptor::new(Token::symbol(sym), Lifetime::Singleton).with_value(7usize),
    );
    let provider = services.build();

    let url = provider
        .get_required_token::<String>(&Token::name("db-url"))
        .unwrap();
    assert_eq!(*url, "postgres://localhost");
    let id = provider
        .get_required_token::<usize>(&Token::symbol(sym))
        .unwrap();
    assert_eq!(*id, 7);

    // A different symbol with the same label is a different token.
    assert!(provider
        .get_token::<usize>(&Token::symbol(Symbol::new("request-id")))
        .unwrap()
        .is_none());
}

#[test]
fn last_registration_wins_ordinary_resolution() {
    let mut services = ServiceCollection::new();
    services.register(
        ServiceDescriptor::new(Token::name("n"), Lifetime::Singleton).with_value(1usize),
    );
    services.register(
        ServiceDescriptor::new(Token::name("n"), Lifetime::Singleton).with_value(2usize),
    );
    let provider = services.build();

    let n = provider
        .get_required_token::<usize>(&Token::name("n"))
        .unwrap();
    assert_eq!(*n, 2);
}

#[test]
fn missing_service_reports_not_found_with_token_name() {
    let provider = ServiceCollection::new().build();
    match provider.get_required::<Config>() {
        Err(DiError::NotFound(name)) => assert!(name.contains("Config")),
        other => panic!("expected NotFound, got {:?}", other.err()),
    }
    assert!(provider.get::<Config>().unwrap().is_none());
}

#[test]
fn missing_transitive_dependency_fails_even_for_optional_get() {
    let mut services = ServiceCollection::new();
    services.add_singleton_factory::<Database, _>(|ctx| {
        Ok(Database {
            config: ctx.get_required::<Config>()?,
        })
    });
    let provider = services.build();

    // Database itself is registered, so the construction failure must not be
    // masked as None.
    assert!(matches!(
        provider.get::<Database>(),
        Err(DiError::NotFound(_))
    ));
}

#[test]
fn sourceless_descriptor_fails_resolution() {
    let mut services = ServiceCollection::new();
    services.register(ServiceDescriptor::new(
        Token::name("empty"),
        Lifetime::Singleton,
    ));
    let provider = services.build();

    assert!(matches!(
        provider.get_required_token::<usize>(&Token::name("empty")),
        Err(DiError::InvalidDescriptor(_))
    ));
}

#[test]
fn factory_errors_propagate_and_nothing_is_cached() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let mut services = ServiceCollection::new();
    services.add_singleton_factory::<Job, _>(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(DiError::NotFound("warming up".into()))
        } else {
            Ok(Job)
        }
    });
    let provider = services.build();

    assert!(provider.get_required::<Job>().is_err());
    // The failed attempt left no cached instance, so the factory runs again.
    assert!(provider.get_required::<Job>().is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
