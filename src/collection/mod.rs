//! Registrar surface of the container.
//!
//! Registration takes `&self`: the tables are concurrent, so services may be
//! registered from any thread, including while other threads resolve. Each
//! method returns the container again for chaining.

use std::sync::Arc;

use crate::activation::{self, Injectable};
use crate::error::{DiError, DiResult};
use crate::key::{downcast, erase_trait, AnyArc, ServiceType};
use crate::lifetime::Lifetime;
use crate::provider::{Container, ResolverContext};
use crate::registration::Factory;
use crate::traits::ResolverCore;

mod builder;

pub use builder::ContainerBuilder;

impl Container {
    /// Registers an erased factory for `ty`.
    ///
    /// The factory must produce the stored representation of `ty`: `Arc<T>`
    /// for a concrete type and `Arc<Arc<dyn Trait>>` for a trait. Every
    /// unnamed registration also joins the collection of `ty`.
    pub fn register_type<F>(&self, ty: ServiceType, lifetime: Lifetime, factory: F) -> &Self
    where
        F: Fn(&ResolverContext<'_>) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.inner().registry.register(ty, lifetime, Arc::new(factory));
        self
    }

    /// Registers an erased factory for `ty` under `name`.
    pub fn register_named_type<F>(&self, name: &str, ty: ServiceType, lifetime: Lifetime, factory: F) -> &Self
    where
        F: Fn(&ResolverContext<'_>) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.inner()
            .registry
            .register_named(name, ty, lifetime, Arc::new(factory));
        self
    }

    /// Registers a parameterless factory for the concrete type `T`.
    pub fn register<T, F>(&self, factory: F, lifetime: Lifetime) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_with(move |_| Ok(factory()), lifetime)
    }

    /// Registers a dependency-aware factory for the concrete type `T`.
    ///
    /// ```rust
    /// use ferrous_ioc::{Container, Lifetime, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Config { port: u16 }
    /// struct Server { config: Arc<Config> }
    ///
    /// let container = Container::new();
    /// container
    ///     .register(|| Config { port: 8080 }, Lifetime::Permanent)
    ///     .register_with(|r| Ok(Server { config: r.get_registered_required::<Config>() }), Lifetime::AlwaysNew);
    ///
    /// assert_eq!(container.get_registered_required::<Server>().config.port, 8080);
    /// ```
    pub fn register_with<T, F>(&self, factory: F, lifetime: Lifetime) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.inner()
            .registry
            .register(ServiceType::registered::<T>(), lifetime, concrete_factory(factory));
        self
    }

    /// Registers a parameterless factory for the trait `T`.
    pub fn register_trait<T, F>(&self, factory: F, lifetime: Lifetime) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register_trait_with::<T, _>(move |_| Ok(factory()), lifetime)
    }

    /// Registers a dependency-aware factory for the trait `T`.
    pub fn register_trait_with<T, F>(&self, factory: F, lifetime: Lifetime) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.inner()
            .registry
            .register(ServiceType::of_trait::<T>(), lifetime, trait_factory(factory));
        self
    }

    /// Maps the trait `T` onto the concrete type `C`.
    ///
    /// Each resolution of `T` resolves `C` (through its own registration or
    /// by automatic construction) and converts it with `upcast`.
    ///
    /// ```rust
    /// use ferrous_ioc::{Container, Constructor, Injectable, Lifetime, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Repo: Send + Sync {}
    ///
    /// #[derive(Default)]
    /// struct MemoryRepo;
    /// impl Repo for MemoryRepo {}
    /// impl Injectable for MemoryRepo {
    ///     fn constructors() -> Vec<Constructor<Self>> {
    ///         vec![Constructor::from_default()]
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.register_trait_as::<dyn Repo, MemoryRepo>(|c| c as Arc<dyn Repo>, Lifetime::Permanent);
    ///
    /// let a = container.get_required_trait::<dyn Repo>();
    /// let b = container.get_required_trait::<dyn Repo>();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn register_trait_as<T, C>(&self, upcast: fn(Arc<C>) -> Arc<T>, lifetime: Lifetime) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
        C: Injectable,
    {
        self.register_trait_with::<T, _>(
            move |r| {
                let concrete = ServiceType::of::<C>();
                match r.resolve(&concrete)? {
                    Some(instance) => Ok(upcast(downcast::<C>(instance)?)),
                    None => Err(DiError::UnregisteredType(concrete.name())),
                }
            },
            lifetime,
        )
    }

    /// Registers the constructible type `T` under a lifetime.
    ///
    /// Instances are built through `T`'s widest constructor exactly as for an
    /// unregistered type, but reuse follows `lifetime`.
    ///
    /// ```rust
    /// use ferrous_ioc::{Container, Constructor, Injectable, Lifetime, Resolver};
    /// use std::sync::Arc;
    ///
    /// #[derive(Default)]
    /// struct Clock(u8);
    /// impl Injectable for Clock {
    ///     fn constructors() -> Vec<Constructor<Self>> {
    ///         vec![Constructor::from_default()]
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// assert!(!Arc::ptr_eq(&container.get_required::<Clock>(), &container.get_required::<Clock>()));
    ///
    /// container.register_constructed::<Clock>(Lifetime::Permanent);
    /// assert!(Arc::ptr_eq(&container.get_required::<Clock>(), &container.get_required::<Clock>()));
    /// ```
    pub fn register_constructed<T: Injectable>(&self, lifetime: Lifetime) -> &Self {
        let ty = ServiceType::of::<T>();
        self.inner().registry.register(ty, lifetime, self.constructing_factory(ty));
        self
    }

    /// Factory that activates `ty` with this container's constructor plans.
    ///
    /// Holds the container weakly so a registration never keeps its own
    /// container alive.
    pub(crate) fn constructing_factory(&self, ty: ServiceType) -> Factory {
        let container = self.downgrade();
        Arc::new(move |r: &ResolverContext<'_>| {
            let inner = container.upgrade().ok_or_else(|| DiError::Construction {
                type_name: ty.name(),
                message: "container dropped".to_string(),
            })?;
            activation::activate(&inner.activations, &ty, r)
        })
    }

    /// Registers a fixed instance; every resolution returns the same `Arc`.
    pub fn register_instance<T: Send + Sync + 'static>(&self, value: T) -> &Self {
        let instance: AnyArc = Arc::new(value);
        self.register_type(ServiceType::registered::<T>(), Lifetime::AlwaysNew, move |_| {
            Ok(instance.clone())
        })
    }

    /// Registers a fixed trait instance; every resolution returns the same `Arc`.
    pub fn register_trait_instance<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>) -> &Self {
        let instance = erase_trait(value);
        self.register_type(ServiceType::of_trait::<T>(), Lifetime::AlwaysNew, move |_| {
            Ok(instance.clone())
        })
    }

    /// Registers a parameterless factory for `T` under `name`.
    pub fn register_named<T, F>(&self, name: &str, factory: F, lifetime: Lifetime) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_named_with(name, move |_| Ok(factory()), lifetime)
    }

    /// Registers a dependency-aware factory for `T` under `name`.
    pub fn register_named_with<T, F>(&self, name: &str, factory: F, lifetime: Lifetime) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.inner().registry.register_named(
            name,
            ServiceType::registered::<T>(),
            lifetime,
            concrete_factory(factory),
        );
        self
    }

    /// Registers a parameterless factory for the trait `T` under `name`.
    pub fn register_named_trait<T, F>(&self, name: &str, factory: F, lifetime: Lifetime) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register_named_trait_with::<T, _>(name, move |_| Ok(factory()), lifetime)
    }

    /// Registers a dependency-aware factory for the trait `T` under `name`.
    pub fn register_named_trait_with<T, F>(&self, name: &str, factory: F, lifetime: Lifetime) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.inner().registry.register_named(
            name,
            ServiceType::of_trait::<T>(),
            lifetime,
            trait_factory(factory),
        );
        self
    }

    /// Registers a fixed instance under `name`.
    pub fn register_named_instance<T: Send + Sync + 'static>(&self, name: &str, value: T) -> &Self {
        let instance: AnyArc = Arc::new(value);
        self.register_named_type(name, ServiceType::registered::<T>(), Lifetime::AlwaysNew, move |_| {
            Ok(instance.clone())
        })
    }
}

fn concrete_factory<T, F>(factory: F) -> Factory
where
    T: Send + Sync + 'static,
    F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
{
    Arc::new(move |r: &ResolverContext<'_>| factory(r).map(|value| Arc::new(value) as AnyArc))
}

fn trait_factory<T, F>(factory: F) -> Factory
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
{
    Arc::new(move |r: &ResolverContext<'_>| factory(r).map(erase_trait))
}
