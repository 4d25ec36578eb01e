//! Dependency graph analyzer: trees, cycle detection, renderers.

use tangle_di::{
    Lifetime, ServiceCollection, ServiceDescriptor, Token, TreeStatus,
};

struct A;
struct B;
struct C;
struct D;

fn node<T: Send + Sync + 'static>(deps: Vec<Token>) -> ServiceDescriptor {
    ServiceDescriptor::new(Token::of::<T>(), Lifetime::Singleton).with_dependencies(deps)
}

#[test]
fn dependency_tree_expands_declared_dependencies() {
    let mut services = ServiceCollection::new();
    services.register(node::<A>(vec![Token::of::<B>(), Token::of::<C>()]));
    services.register(node::<B>(vec![Token::of::<C>()]));
    services.register(node::<C>(vec![]));

    let tree = services.dependency_tree(&Token::of::<A>());
    assert_eq!(tree.status, TreeStatus::Resolved);
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].token, Token::of::<B>());
    assert_eq!(tree.children[0].children.len(), 1);
    assert_eq!(tree.children[1].token, Token::of::<C>());
}

#[test]
fn unregistered_dependencies_appear_as_leaves() {
    let mut services = ServiceCollection::new();
    services.register(node::<A>(vec![Token::of::<B>()]));

    let tree = services.dependency_tree(&Token::of::<A>());
    assert_eq!(tree.children[0].status, TreeStatus::NotRegistered);
    assert!(tree.children[0].children.is_empty());

    let rendered = services.render_dependency_tree(&Token::of::<A>());
    assert!(rendered.contains("(not registered)"));
}

#[test]
fn cycles_terminate_with_an_annotated_leaf() {
    let mut services = ServiceCollection::new();
    services.register(node::<A>(vec![Token::of::<B>()]));
    services.register(node::<B>(vec![Token::of::<A>()]));

    let tree = services.dependency_tree(&Token::of::<A>());
    let leaf = &tree.children[0].children[0];
    match &leaf.status {
        TreeStatus::Circular(path) => {
            assert_eq!(
                path,
                &vec![Token::of::<A>(), Token::of::<B>(), Token::of::<A>()]
            );
        }
        other => panic!("expected circular leaf, got {:?}", other),
    }

    let rendered = services.render_dependency_tree(&Token::of::<A>());
    assert!(rendered.contains("(circular:"));
}

#[test]
fn two_independent_cycles_are_reported_without_cross_contamination() {
    let mut services = ServiceCollection::new();
    services.register(node::<A>(vec![Token::of::<B>()]));
    services.register(node::<B>(vec![Token::of::<A>()]));
    services.register(node::<C>(vec![Token::of::<D>()]));
    services.register(node::<D>(vec![Token::of::<C>()]));

    let cycles = services.find_circular_paths();
    assert_eq!(cycles.len(), 2);
    assert_eq!(
        cycles[0].path,
        vec![Token::of::<A>(), Token::of::<B>(), Token::of::<A>()]
    );
    assert_eq!(
        cycles[1].path,
        vec![Token::of::<C>(), Token::of::<D>(), Token::of::<C>()]
    );
    assert!(!cycles[0].path.contains(&Token::of::<C>()));
    assert!(!cycles[1].path.contains(&Token::of::<A>()));
}

#[test]
fn acyclic_registries_render_an_empty_cycle_report() {
    let mut services = ServiceCollection::new();
    services.register(node::<A>(vec![Token::of::<B>()]));
    services.register(node::<B>(vec![]));

    assert!(services.find_circular_paths().is_empty());
    assert_eq!(services.render_circular_paths(), "no circular dependencies\n");
}

#[test]
fn analyzer_is_available_on_the_built_provider() {
    let mut services = ServiceCollection::new();
    services.register(node::<A>(vec![Token::of::<A>()]));
    let provider = services.build();

    let cycles = provider.find_circular_paths();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].path, vec![Token::of::<A>(), Token::of::<A>()]);

    let rendered = provider.render_circular_paths();
    assert!(rendered.contains("->"));
    assert_eq!(
        provider.dependency_tree(&Token::of::<A>()).status,
        TreeStatus::Resolved
    );
}

#[test]
fn string_tokens_render_quoted() {
    let mut services = ServiceCollection::new();
    services.register(
        ServiceDescriptor::new(Token::name("root"), Lifetime::Singleton)
            .with_dependencies(vec![Token::name("leaf")]),
    );
    services.register(ServiceDescriptor::new(
        Token::name("leaf"),
        Lifetime::Singleton,
    ));

    let rendered = services.render_dependency_tree(&Token::name("root"));
    assert!(rendered.contains("\"root\""));
    assert!(rendered.contains("  \"leaf\""));
}
