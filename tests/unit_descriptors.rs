//! Host adapter: ServiceDescriptor, populate and ServiceProvider

use ferrous_ioc::{
    AnyArc, Constructor, Container, ContainerBuilder, DiError, Injectable, Lifetime, LocalScope, Resolver,
    ServiceDescriptor, ServiceLifetime, ServiceProvider, ServiceSource, ServiceType, ThreadScopeAccessor,
};
use std::sync::Arc;

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock(u64);
impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct Session;
impl Injectable for Session {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::from_default()]
    }
}

#[test]
fn test_descriptor_metadata() {
    let descriptor = ServiceDescriptor::instance(5u32);
    assert_eq!(descriptor.type_name(), "u32");
    assert_eq!(descriptor.lifetime, ServiceLifetime::Singleton);
    assert!(!descriptor.is_named());
    assert_eq!(descriptor.service_name(), None);
    assert!(matches!(descriptor.source, ServiceSource::Instance(_)));

    let named = descriptor.named("port");
    assert!(named.is_named());
    assert_eq!(named.service_name(), Some("port"));

    let constructed = ServiceDescriptor::constructed::<Session>(ServiceLifetime::Scoped);
    assert!(matches!(constructed.source, ServiceSource::Constructed));
    assert!(constructed.service_type.is_constructible());
}

#[test]
fn test_lifetime_mapping() {
    assert_eq!(Lifetime::from(ServiceLifetime::Singleton), Lifetime::Permanent);
    assert_eq!(Lifetime::from(ServiceLifetime::Scoped), Lifetime::Scoped);
    assert_eq!(Lifetime::from(ServiceLifetime::Transient), Lifetime::AlwaysNew);
}

#[test]
fn test_populate_singleton_and_transient_factories() {
    let container = Container::new();
    container.populate(vec![
        ServiceDescriptor::factory(ServiceLifetime::Singleton, |_| Ok(String::from("shared"))),
        ServiceDescriptor::factory(ServiceLifetime::Transient, |_| Ok(7u64)),
    ]);

    let a = container.get_registered_required::<String>();
    let b = container.get_registered_required::<String>();
    assert!(Arc::ptr_eq(&a, &b));

    let x = container.get_registered_required::<u64>();
    let y = container.get_registered_required::<u64>();
    assert!(!Arc::ptr_eq(&x, &y));
}

#[test]
fn test_populate_scoped_descriptor() {
    let accessor = Arc::new(ThreadScopeAccessor::new());
    let container = ContainerBuilder::new().scope_accessor(accessor.clone()).build();
    container.populate([ServiceDescriptor::constructed::<Session>(ServiceLifetime::Scoped)]);

    let _scope = accessor.enter(Arc::new(LocalScope::new()));
    let a = container.get_required::<Session>();
    let b = container.get_required::<Session>();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_populate_traits() {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(10));
    let container = Container::new();
    container.populate([
        ServiceDescriptor::trait_instance(clock.clone()),
        ServiceDescriptor::trait_factory::<dyn Clock, _>(ServiceLifetime::Singleton, |_| {
            Ok(Arc::new(FixedClock(20)) as Arc<dyn Clock>)
        })
        .named("late"),
    ]);

    assert!(Arc::ptr_eq(&container.get_required_trait::<dyn Clock>(), &clock));
    let late = container.get_named_trait::<dyn Clock>("late").unwrap().unwrap();
    assert_eq!(late.now(), 20);
}

#[test]
fn test_populated_services_join_collections() {
    let container = Container::new();
    container.populate([
        ServiceDescriptor::trait_instance::<dyn Clock>(Arc::new(FixedClock(1))),
        ServiceDescriptor::trait_instance::<dyn Clock>(Arc::new(FixedClock(2))),
    ]);

    let all = container.get_all_trait::<dyn Clock>().unwrap();
    let times: Vec<u64> = all.iter().map(|c| c.now()).collect();
    assert_eq!(times, [1, 2]);
}

#[test]
fn test_get_service_never_fails() {
    let container = Container::new();
    container.set_throw_if_cant_resolve(true);
    container.register_type(ServiceType::registered::<u8>(), Lifetime::AlwaysNew, |_| {
        Err(DiError::construction::<u8>("broken"))
    });

    assert!(container.get_service(&ServiceType::registered::<u16>()).is_none());
    assert!(container.get_service(&ServiceType::registered::<u8>()).is_none());
    assert!(matches!(
        container.get_required_service(&ServiceType::registered::<u8>()),
        Err(DiError::Construction { .. })
    ));
}

#[test]
fn test_get_required_service_lenient_missing_is_error() {
    let container = Container::new();
    assert!(matches!(
        container.get_required_service(&ServiceType::registered::<u16>()),
        Err(DiError::UnregisteredType(_))
    ));
}

#[test]
fn test_provider_is_object_safe() {
    let container = Container::new();
    container.populate([ServiceDescriptor::instance(3u8)]);

    let provider: &dyn ServiceProvider = &container;
    let value: AnyArc = provider.get_service(&ServiceType::registered::<u8>()).unwrap();
    assert_eq!(*value.downcast::<u8>().unwrap(), 3);
}

#[test]
fn test_populate_constructed_resolves_dependencies() {
    struct Report {
        clock: Arc<dyn Clock>,
    }
    impl Injectable for Report {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::new([ServiceType::of_trait::<dyn Clock>()], |args| {
                Ok(Report {
                    clock: args.get_trait::<dyn Clock>(0)?,
                })
            })]
        }
    }

    let container = Container::new();
    container.populate([
        ServiceDescriptor::trait_instance::<dyn Clock>(Arc::new(FixedClock(99))),
        ServiceDescriptor::constructed::<Report>(ServiceLifetime::Transient),
    ]);

    assert_eq!(container.get_required::<Report>().clock.now(), 99);
}
