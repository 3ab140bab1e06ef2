use sovran_container::{Container, Lifetime, ResolveError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Logger;

#[derive(Debug)]
struct RequestContext;

#[derive(Debug)]
struct IdGenerator;

#[derive(Debug, Clone)]
struct Unregistered;

/// Registers `T` with a factory that counts its invocations
fn counting<T, F>(container: &Container, lifetime: Lifetime, make: F) -> Arc<AtomicUsize>
where
    T: Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    container.register(lifetime, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(make())
    });
    calls
}

#[test]
fn test_shared_logger_across_parent_and_child() {
    let a = Container::new();
    let calls = counting(&a, Lifetime::Shared, || Logger);
    let b = a.spawn_subcontainer();

    let from_a = a.resolve::<Arc<Logger>>().unwrap();
    let from_b = b.resolve::<Arc<Logger>>().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&from_a, &from_b));
}

#[test]
fn test_shared_first_resolved_by_child() {
    let root = Container::new();
    let calls = counting(&root, Lifetime::Shared, || Logger);

    let first = root.spawn_subcontainer();
    let second = root.spawn_subcontainer();
    let nested = first.spawn_subcontainer();

    let from_nested = nested.resolve::<Arc<Logger>>().unwrap();
    for container in [&root, &first, &second, &nested] {
        let logger = container.resolve::<Arc<Logger>>().unwrap();
        assert!(Arc::ptr_eq(&logger, &from_nested));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_scoped_request_context() {
    let a = Container::new();
    let calls = counting(&a, Lifetime::Scoped, || RequestContext);
    let b = a.spawn_subcontainer();

    let from_a = a.resolve::<Arc<RequestContext>>().unwrap();
    let from_b = b.resolve::<Arc<RequestContext>>().unwrap();
    assert!(!Arc::ptr_eq(&from_a, &from_b));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // A keeps its original instance
    for _ in 0..2 {
        let again = a.resolve::<Arc<RequestContext>>().unwrap();
        assert!(Arc::ptr_eq(&from_a, &again));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_scoped_siblings_get_their_own_instance() {
    let root = Container::new();
    let calls = counting(&root, Lifetime::Scoped, || RequestContext);

    let left = root.spawn_subcontainer();
    let right = root.spawn_subcontainer();

    // Parent resolves first; children still don't inherit it
    let from_root = root.resolve::<Arc<RequestContext>>().unwrap();
    let from_left = left.resolve::<Arc<RequestContext>>().unwrap();
    let from_right = right.resolve::<Arc<RequestContext>>().unwrap();

    assert!(!Arc::ptr_eq(&from_root, &from_left));
    assert!(!Arc::ptr_eq(&from_root, &from_right));
    assert!(!Arc::ptr_eq(&from_left, &from_right));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_transient_id_generator() {
    let container = Container::new();
    let calls = counting(&container, Lifetime::Transient, || IdGenerator);

    let instances: Vec<Arc<IdGenerator>> = (0..5)
        .map(|_| container.resolve::<Arc<IdGenerator>>().unwrap())
        .collect();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    for (i, left) in instances.iter().enumerate() {
        for right in &instances[i + 1..] {
            assert!(!Arc::ptr_eq(left, right));
        }
    }

    // Nothing was cached anywhere
    let registry = container.registry();
    assert!(registry.shared_instance::<Arc<IdGenerator>>().is_none());
    assert!(registry
        .scoped_instance::<Arc<IdGenerator>>(container.id())
        .is_none());
}

#[test]
fn test_transient_across_containers() {
    let root = Container::new();
    let calls = counting(&root, Lifetime::Transient, || IdGenerator);
    let child = root.spawn_subcontainer();

    let a = root.resolve::<Arc<IdGenerator>>().unwrap();
    let b = child.resolve::<Arc<IdGenerator>>().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unregistered_is_not_found() {
    let container = Container::new();
    let calls = counting(&container, Lifetime::Shared, || Logger);

    assert!(container.resolve::<Unregistered>().is_none());
    assert!(container.resolve_with_arg::<Unregistered, _>(1u8).is_none());
    assert!(container
        .resolve_with_args::<Unregistered, _, _>(1u8, "two")
        .is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    match container.try_resolve::<Unregistered>() {
        Err(ResolveError::NotRegistered { type_name }) => {
            assert!(type_name.contains("Unregistered"))
        }
        other => panic!("Expected NotRegistered, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_default_lifetime_is_shared() {
    let container = Container::new();
    let calls = counting(&container, Lifetime::default(), || Logger);

    let a = container.resolve::<Arc<Logger>>().unwrap();
    let b = container.spawn_subcontainer().resolve::<Arc<Logger>>().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(container.lifetime_of::<Arc<Logger>>(), Some(Lifetime::Shared));
}

#[test]
fn test_newtypes_are_distinct_keys() {
    #[derive(Clone, Debug, PartialEq)]
    struct Width(u32);

    #[derive(Clone, Debug, PartialEq)]
    struct Height(u32);

    let container = Container::new();
    container.register(Lifetime::Shared, |_| Width(640));
    container.register(Lifetime::Shared, |_| Height(480));

    assert_eq!(container.resolve::<Width>(), Some(Width(640)));
    assert_eq!(container.resolve::<Height>(), Some(Height(480)));
    assert_eq!(container.resolve::<u32>(), None);
}
