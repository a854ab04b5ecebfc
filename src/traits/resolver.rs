//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::activation::Injectable;
use crate::error::{DiError, DiResult};
use crate::key::{downcast, downcast_trait, AnyArc, ServiceType};
use crate::scope::ScopeStore;

/// Core resolver trait for object-safe service resolution.
///
/// Lookups are keyed by [`ServiceType`] and return type-erased instances.
/// `Ok(None)` is the lenient "not found" outcome; with strictness enabled the
/// same lookup reports [`DiError::UnregisteredType`] or
/// [`DiError::UnregisteredNamedType`] instead.
///
/// Most callers use the typed [`Resolver`] methods built on top.
pub trait ResolverCore: Send + Sync {
    /// Resolves the unnamed service `ty`.
    ///
    /// Consults the registration first, then automatic construction for
    /// constructible concrete types, then the fallback candidates for abstract
    /// types.
    fn resolve(&self, ty: &ServiceType) -> DiResult<Option<AnyArc>>;

    /// Resolves `ty` registered under `name`.
    ///
    /// Only the named table is consulted.
    fn resolve_named(&self, name: &str, ty: &ServiceType) -> DiResult<Option<AnyArc>>;

    /// Every unnamed registration of `ty`, oldest first.
    ///
    /// Never constructs automatically; empty when nothing was registered.
    fn resolve_all(&self, ty: &ServiceType) -> DiResult<Vec<AnyArc>>;

    /// The scope store `Scoped` registrations memoize into, if any.
    fn current_scope(&self) -> Option<Arc<dyn ScopeStore>>;
}

/// High-level resolver interface with generic methods for type-safe service
/// resolution.
///
/// Implemented for every [`ResolverCore`], including the
/// [`ResolverContext`](crate::ResolverContext) handed to factories.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let container = Container::new();
/// container.register_instance(42usize);
/// container.register_trait::<dyn Logger, _>(|| Arc::new(ConsoleLogger), Lifetime::Permanent);
///
/// let number = container.get_registered_required::<usize>();
/// assert_eq!(*number, 42);
///
/// let logger = container.get_required_trait::<dyn Logger>();
/// assert_eq!(logger.log("ready"), "LOG: ready");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service, constructing it automatically when it is
    /// not registered.
    fn get<T: Injectable>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve(&ServiceType::of::<T>())?
            .map(downcast::<T>)
            .transpose()
    }

    /// Resolves a concrete service that can only come from a registration.
    fn get_registered<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve(&ServiceType::registered::<T>())?
            .map(downcast::<T>)
            .transpose()
    }

    /// Resolves a trait service, falling back to candidate sets when it is not
    /// registered.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve(&ServiceType::of_trait::<T>())?
            .map(downcast_trait::<T>)
            .transpose()
    }

    /// Resolves a concrete service registered under `name`.
    fn get_named<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        self.resolve_named(name, &ServiceType::registered::<T>())?
            .map(downcast::<T>)
            .transpose()
    }

    /// Resolves a trait service registered under `name`.
    fn get_named_trait<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        self.resolve_named(name, &ServiceType::of_trait::<T>())?
            .map(downcast_trait::<T>)
            .transpose()
    }

    /// Every registration of a concrete service, oldest first.
    fn get_all<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(&ServiceType::registered::<T>())?
            .into_iter()
            .map(downcast::<T>)
            .collect()
    }

    /// Every registration of a trait service, oldest first.
    fn get_all_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(&ServiceType::of_trait::<T>())?
            .into_iter()
            .map(downcast_trait::<T>)
            .collect()
    }

    /// Resolves `Vec<Arc<T>>` as a service in its own right.
    ///
    /// The sequence is memoized until the next registration of `T`.
    fn get_sequence<T: Send + Sync + 'static>(&self) -> DiResult<Arc<Vec<Arc<T>>>> {
        match self.resolve(&ServiceType::sequence_of::<T>())? {
            Some(any) => downcast::<Vec<Arc<T>>>(any),
            None => Ok(Arc::new(Vec::new())),
        }
    }

    /// Resolves `Vec<Arc<dyn T>>` as a service in its own right.
    fn get_trait_sequence<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<Vec<Arc<T>>>> {
        match self.resolve(&ServiceType::sequence_of_trait::<T>())? {
            Some(any) => downcast::<Vec<Arc<T>>>(any),
            None => Ok(Arc::new(Vec::new())),
        }
    }

    /// Like [`get`](Resolver::get), panicking when the service is unavailable.
    fn get_required<T: Injectable>(&self) -> Arc<T> {
        required(self.get::<T>(), std::any::type_name::<T>())
    }

    /// Like [`get_registered`](Resolver::get_registered), panicking when the
    /// service is unavailable.
    fn get_registered_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        required(self.get_registered::<T>(), std::any::type_name::<T>())
    }

    /// Like [`get_trait`](Resolver::get_trait), panicking when the service is
    /// unavailable.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        required(self.get_trait::<T>(), std::any::type_name::<T>())
    }

    /// Like [`get_named`](Resolver::get_named), panicking when the service is
    /// unavailable.
    fn get_named_required<T: Send + Sync + 'static>(&self, name: &str) -> Arc<T> {
        required(self.get_named::<T>(name), std::any::type_name::<T>())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn required<T: ?Sized>(result: DiResult<Option<Arc<T>>>, type_name: &'static str) -> Arc<T> {
    match result {
        Ok(Some(value)) => value,
        Ok(None) => panic!("Failed to resolve {}: {}", type_name, DiError::UnregisteredType(type_name)),
        Err(e) => panic!("Failed to resolve {}: {}", type_name, e),
    }
}
