//! Host framework adapter.
//!
//! A hosting framework usually keeps its own declarative service list. This
//! module models that list as [`ServiceDescriptor`]s, imports it into a
//! container with [`Container::populate`], and exposes the container back to
//! the host through the [`ServiceProvider`] trait.

use std::fmt;
use std::sync::Arc;

use crate::activation::Injectable;
use crate::error::{DiError, DiResult};
use crate::key::{erase_trait, AnyArc, ServiceType};
use crate::lifetime::Lifetime;
use crate::provider::{Container, ResolverContext};
use crate::traits::ResolverCore;

/// The host's lifetime vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum ServiceLifetime {
    Singleton,
    Scoped,
    Transient,
}

impl From<ServiceLifetime> for Lifetime {
    fn from(lifetime: ServiceLifetime) -> Self {
        match lifetime {
            ServiceLifetime::Singleton => Lifetime::Permanent,
            ServiceLifetime::Scoped => Lifetime::Scoped,
            ServiceLifetime::Transient => Lifetime::AlwaysNew,
        }
    }
}

type DescriptorFactory = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Where a described service comes from.
#[derive(Clone)]
pub enum ServiceSource {
    /// A ready-made instance in its stored representation
    Instance(AnyArc),
    /// A factory producing the stored representation
    Factory(DescriptorFactory),
    /// Automatic construction of the service type itself
    Constructed,
}

/// One entry of a host's service list.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Resolver, ServiceDescriptor, ServiceLifetime, ServiceProvider, ServiceType};
///
/// struct Settings { name: &'static str }
/// struct Greeting(String);
///
/// let container = Container::new();
/// container.populate(vec![
///     ServiceDescriptor::instance(Settings { name: "app" }),
///     ServiceDescriptor::factory(ServiceLifetime::Transient, |r| {
///         let settings = r.get_registered_required::<Settings>();
///         Ok(Greeting(format!("hello from {}", settings.name)))
///     }),
/// ]);
///
/// let greeting = container
///     .get_required_service(&ServiceType::registered::<Greeting>())
///     .unwrap()
///     .downcast::<Greeting>()
///     .unwrap();
/// assert_eq!(greeting.0, "hello from app");
/// assert!(container.get_service(&ServiceType::registered::<u8>()).is_none());
/// ```
#[derive(Clone)]
pub struct ServiceDescriptor {
    /// The requested type
    pub service_type: ServiceType,
    /// Host lifetime, translated on import
    pub lifetime: ServiceLifetime,
    /// Instance, factory or automatic construction
    pub source: ServiceSource,
    /// Name for the named table, `None` for the unnamed one
    pub name: Option<String>,
}

impl ServiceDescriptor {
    /// Singleton instance of a concrete type.
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            service_type: ServiceType::registered::<T>(),
            lifetime: ServiceLifetime::Singleton,
            source: ServiceSource::Instance(Arc::new(value)),
            name: None,
        }
    }

    /// Singleton instance of a trait.
    pub fn trait_instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            service_type: ServiceType::of_trait::<T>(),
            lifetime: ServiceLifetime::Singleton,
            source: ServiceSource::Instance(erase_trait(value)),
            name: None,
        }
    }

    /// Factory for a concrete type.
    pub fn factory<T, F>(lifetime: ServiceLifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            service_type: ServiceType::registered::<T>(),
            lifetime,
            source: ServiceSource::Factory(Arc::new(move |r: &ResolverContext<'_>| {
                factory(r).map(|value| Arc::new(value) as AnyArc)
            })),
            name: None,
        }
    }

    /// Factory for a trait.
    pub fn trait_factory<T, F>(lifetime: ServiceLifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            service_type: ServiceType::of_trait::<T>(),
            lifetime,
            source: ServiceSource::Factory(Arc::new(move |r: &ResolverContext<'_>| {
                factory(r).map(erase_trait)
            })),
            name: None,
        }
    }

    /// A constructible type built by the container.
    pub fn constructed<T: Injectable>(lifetime: ServiceLifetime) -> Self {
        Self {
            service_type: ServiceType::of::<T>(),
            lifetime,
            source: ServiceSource::Constructed,
            name: None,
        }
    }

    /// Moves the descriptor into the named table.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.service_type.name()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            ServiceSource::Instance(_) => "instance",
            ServiceSource::Factory(_) => "factory",
            ServiceSource::Constructed => "constructed",
        };
        f.debug_struct("ServiceDescriptor")
            .field("service_type", &self.service_type.name())
            .field("lifetime", &self.lifetime)
            .field("source", &source)
            .field("name", &self.name)
            .finish()
    }
}

impl Container {
    /// Imports a host service list, one registration per descriptor.
    ///
    /// Lifetimes map Singleton to `Permanent`, Scoped to `Scoped` and
    /// Transient to `AlwaysNew`. Instances keep their identity whatever the
    /// declared lifetime.
    pub fn populate<I>(&self, descriptors: I) -> &Self
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        let mut imported = 0usize;
        for descriptor in descriptors {
            let lifetime = Lifetime::from(descriptor.lifetime);
            let factory = match descriptor.source {
                ServiceSource::Instance(instance) => {
                    Arc::new(move |_: &ResolverContext<'_>| Ok(instance.clone())) as DescriptorFactory
                }
                ServiceSource::Factory(factory) => factory,
                ServiceSource::Constructed => self.constructing_factory(descriptor.service_type),
            };

            match &descriptor.name {
                Some(name) => self
                    .inner()
                    .registry
                    .register_named(name, descriptor.service_type, lifetime, factory),
                None => self
                    .inner()
                    .registry
                    .register(descriptor.service_type, lifetime, factory),
            }
            imported += 1;
        }
        tracing::debug!(imported, "populated from host descriptors");
        self
    }
}

/// Host-facing provider contract.
pub trait ServiceProvider {
    /// The service for `ty`, or `None` when it is unavailable for any reason.
    fn get_service(&self, ty: &ServiceType) -> Option<AnyArc>;

    /// The service for `ty`, failing when it is unavailable.
    fn get_required_service(&self, ty: &ServiceType) -> DiResult<AnyArc>;
}

impl ServiceProvider for Container {
    fn get_service(&self, ty: &ServiceType) -> Option<AnyArc> {
        match self.resolve(ty) {
            Ok(found) => found,
            Err(error) => {
                tracing::debug!(service = ty.name(), %error, "get_service swallowed error");
                None
            }
        }
    }

    fn get_required_service(&self, ty: &ServiceType) -> DiResult<AnyArc> {
        self.resolve(ty)?
            .ok_or(DiError::UnregisteredType(ty.name()))
    }
}
