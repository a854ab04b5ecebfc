use ferrous_ioc::{Container, Lifetime, Resolver, ServiceType};
use std::sync::Arc;

trait Handler: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Foo;
impl Handler for Foo {
    fn name(&self) -> &'static str {
        "foo"
    }
}

struct OtherFoo;
impl Handler for OtherFoo {
    fn name(&self) -> &'static str {
        "other"
    }
}

fn names(handlers: &[Arc<dyn Handler>]) -> Vec<&'static str> {
    handlers.iter().map(|h| h.name()).collect()
}

#[test]
fn test_resolve_all_in_registration_order() {
    let container = Container::new();
    container
        .register_trait::<dyn Handler, _>(|| Arc::new(Foo), Lifetime::Permanent)
        .register_trait::<dyn Handler, _>(|| Arc::new(OtherFoo), Lifetime::Permanent);

    let all = container.get_all_trait::<dyn Handler>().unwrap();
    assert_eq!(names(&all), ["foo", "other"]);

    let sequence = container.get_trait_sequence::<dyn Handler>().unwrap();
    assert_eq!(names(&sequence), ["foo", "other"]);
}

#[test]
fn test_collection_shares_permanent_memos() {
    let container = Container::new();
    container
        .register_trait::<dyn Handler, _>(|| Arc::new(Foo), Lifetime::Permanent)
        .register_trait::<dyn Handler, _>(|| Arc::new(OtherFoo), Lifetime::Permanent);

    let single = container.get_required_trait::<dyn Handler>();
    let all = container.get_all_trait::<dyn Handler>().unwrap();
    assert!(Arc::ptr_eq(&single, &all[1]));
}

#[test]
fn test_single_registration_is_one_element_collection() {
    let container = Container::new();
    container.register_instance(3u16);

    let all = container.get_all::<u16>().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(*all[0], 3);
}

#[test]
fn test_resolve_all_without_registrations_is_empty() {
    let container = Container::new();
    container.set_throw_if_cant_resolve(true);

    assert!(container.get_all_trait::<dyn Handler>().unwrap().is_empty());
    assert!(container.get_all::<String>().unwrap().is_empty());
    assert!(container.get_trait_sequence::<dyn Handler>().unwrap().is_empty());
}

#[test]
fn test_always_new_entries_rebuild_per_resolve_all() {
    let container = Container::new();
    container.register(|| String::from("a"), Lifetime::AlwaysNew);

    let first = container.get_all::<String>().unwrap();
    let second = container.get_all::<String>().unwrap();
    assert!(!Arc::ptr_eq(&first[0], &second[0]));
}

#[test]
fn test_sequence_is_memoized_until_next_registration() {
    let container = Container::new();
    container.register_trait::<dyn Handler, _>(|| Arc::new(Foo), Lifetime::AlwaysNew);

    let a = container.get_trait_sequence::<dyn Handler>().unwrap();
    let b = container.get_trait_sequence::<dyn Handler>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    container.register_trait::<dyn Handler, _>(|| Arc::new(OtherFoo), Lifetime::AlwaysNew);
    let c = container.get_trait_sequence::<dyn Handler>().unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(names(&c), ["foo", "other"]);
}

#[test]
fn test_sequence_type_is_registered_after_first_append() {
    let container = Container::new();
    let sequence = ServiceType::sequence_of_trait::<dyn Handler>();
    assert!(!container.is_registered(&sequence));

    container.register_trait::<dyn Handler, _>(|| Arc::new(Foo), Lifetime::AlwaysNew);
    assert!(container.is_registered(&sequence));
}

#[test]
fn test_named_registrations_do_not_join_collection() {
    let container = Container::new();
    container
        .register_trait::<dyn Handler, _>(|| Arc::new(Foo), Lifetime::Permanent)
        .register_named_trait::<dyn Handler, _>("other", || Arc::new(OtherFoo), Lifetime::Permanent);

    let all = container.get_all_trait::<dyn Handler>().unwrap();
    assert_eq!(names(&all), ["foo"]);
}

#[test]
fn test_constructor_can_take_a_sequence() {
    use ferrous_ioc::{Constructor, Injectable};

    struct Dispatcher {
        handlers: Arc<Vec<Arc<dyn Handler>>>,
    }

    impl Injectable for Dispatcher {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::new(
                [ServiceType::sequence_of_trait::<dyn Handler>()],
                |args| {
                    Ok(Dispatcher {
                        handlers: args.get_sequence::<dyn Handler>(0)?,
                    })
                },
            )]
        }
    }

    let container = Container::new();
    container
        .register_trait::<dyn Handler, _>(|| Arc::new(Foo), Lifetime::Permanent)
        .register_trait::<dyn Handler, _>(|| Arc::new(OtherFoo), Lifetime::Permanent);

    let dispatcher = container.get_required::<Dispatcher>();
    assert_eq!(names(&dispatcher.handlers), ["foo", "other"]);
}
