use ferrous_ioc::{
    Constructor, Container, ContainerBuilder, ContainerOptions, DiError, Injectable, Lifetime, Resolver,
    ServiceType,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

struct ServiceA {
    _b: Arc<ServiceB>,
}

struct ServiceB {
    _a: Arc<ServiceA>,
}

impl Injectable for ServiceA {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new([ServiceType::of::<ServiceB>()], |args| {
            Ok(ServiceA { _b: args.get::<ServiceB>(0)? })
        })]
    }
}

impl Injectable for ServiceB {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new([ServiceType::of::<ServiceA>()], |args| {
            Ok(ServiceB { _a: args.get::<ServiceA>(0)? })
        })]
    }
}

fn short(path: &[&'static str]) -> Vec<String> {
    path.iter()
        .map(|p| p.rsplit("::").next().unwrap_or(p).to_string())
        .collect()
}

#[test]
fn test_construction_cycle_reports_path() {
    let container = Container::new();

    match container.get::<ServiceA>() {
        Err(DiError::Circular(path)) => {
            assert_eq!(short(&path), ["ServiceA", "ServiceB", "ServiceA"]);
        }
        other => panic!("expected Circular, got {:?}", other.map(|v| v.is_some())),
    }
}

#[test]
fn test_cycle_is_not_masked_by_leniency() {
    let container = Container::new();
    assert!(!container.throw_if_cant_resolve());
    assert!(matches!(container.get::<ServiceB>(), Err(DiError::Circular(_))));
}

#[test]
fn test_self_referencing_factory() {
    struct SelfReferencing;

    let container = Container::new();
    container.register_with(
        |r| {
            r.get_registered::<SelfReferencing>()?;
            Ok(SelfReferencing)
        },
        Lifetime::Permanent,
    );

    match container.get_registered::<SelfReferencing>() {
        Err(DiError::Circular(path)) => assert_eq!(path.len(), 2),
        other => panic!("expected Circular, got {:?}", other.map(|v| v.is_some())),
    }

    // Still cyclic on retry
    assert!(container.get_registered::<SelfReferencing>().is_err());
}

#[test]
fn test_self_referencing_factory_through_collections() {
    struct Node;

    let container = Container::new();
    container.register_with(
        |r| {
            r.get_registered::<Node>()?;
            Ok(Node)
        },
        Lifetime::Permanent,
    );

    match container.get_all::<Node>() {
        Err(DiError::Circular(path)) => assert_eq!(short(&path), ["Node", "Node"]),
        other => panic!("expected Circular, got {:?}", other.map(|v| v.len())),
    }
    match container.get_sequence::<Node>() {
        Err(DiError::Circular(path)) => assert_eq!(short(&path), ["Node", "Node"]),
        other => panic!("expected Circular, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn test_trait_cycle_through_factories() {
    trait Left: Send + Sync {}
    trait Right: Send + Sync {}
    struct L;
    impl Left for L {}
    struct R;
    impl Right for R {}

    let container = Container::new();
    container
        .register_trait_with::<dyn Left, _>(
            |r| {
                r.get_trait::<dyn Right>()?;
                Ok(Arc::new(L) as Arc<dyn Left>)
            },
            Lifetime::AlwaysNew,
        )
        .register_trait_with::<dyn Right, _>(
            |r| {
                r.get_trait::<dyn Left>()?;
                Ok(Arc::new(R) as Arc<dyn Right>)
            },
            Lifetime::AlwaysNew,
        );

    assert!(matches!(container.get_trait::<dyn Left>(), Err(DiError::Circular(_))));
}

#[test]
fn test_diamond_is_not_a_cycle() {
    #[derive(Default)]
    struct Shared;
    impl Injectable for Shared {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::from_default()]
        }
    }

    struct Diamond;
    impl Injectable for Diamond {
        fn constructors() -> Vec<Constructor<Self>> {
            let shared = ServiceType::of::<Shared>();
            vec![Constructor::new([shared, shared], |args| {
                args.get::<Shared>(0)?;
                args.get::<Shared>(1)?;
                Ok(Diamond)
            })]
        }
    }

    let container = Container::new();
    assert!(container.get::<Diamond>().unwrap().is_some());
}

#[test]
fn test_depth_limit() {
    #[derive(Default)]
    struct Level0;
    impl Injectable for Level0 {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::from_default()]
        }
    }
    struct Level1;
    impl Injectable for Level1 {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::new([ServiceType::of::<Level0>()], |_| Ok(Level1))]
        }
    }
    struct Level2;
    impl Injectable for Level2 {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::new([ServiceType::of::<Level1>()], |_| Ok(Level2))]
        }
    }

    let shallow = ContainerBuilder::new()
        .options(ContainerOptions::new().max_depth(2))
        .build();
    assert!(matches!(shallow.get::<Level2>(), Err(DiError::DepthExceeded(2))));
    assert!(shallow.get::<Level1>().unwrap().is_some());

    let deep = ContainerBuilder::new()
        .options(ContainerOptions::new().max_depth(3))
        .build();
    assert!(deep.get::<Level2>().unwrap().is_some());
}

#[test]
fn test_required_panics_on_cycle() {
    let container = Container::new();
    let result = catch_unwind(AssertUnwindSafe(|| {
        container.get_required::<ServiceA>();
    }));

    let payload = result.expect_err("expected a panic");
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(message.contains("Circular dependency"), "got: {message}");
}

#[test]
fn test_guard_state_recovers_after_cycle() {
    let container = Container::new();
    for _ in 0..3 {
        match container.get::<ServiceA>() {
            Err(DiError::Circular(path)) => assert_eq!(path.len(), 3),
            other => panic!("expected Circular, got {:?}", other.map(|v| v.is_some())),
        }
    }

    container.register_instance(String::from("unrelated"));
    assert_eq!(*container.get_registered_required::<String>(), "unrelated");
}
