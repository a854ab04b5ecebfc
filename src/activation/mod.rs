//! Constructor declarations and object activation.
//!
//! Rust has no constructor reflection, so a concrete type opts into automatic
//! construction by implementing [`Injectable`] and declaring one or more
//! [`Constructor`]s. Each constructor lists its parameter types positionally;
//! the container resolves those parameters and hands them to the build
//! closure as [`Arguments`].
//!
//! Erased constructors implement [`Activator`]. The [`ActivationCache`]
//! selects the widest constructor once per type and reuses it for the
//! lifetime of the container.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::{DiError, DiResult};
use crate::key::{downcast, downcast_trait, AnyArc, ServiceType};
use crate::traits::ResolverCore;

mod cache;

pub use cache::ActivationCache;

pub(crate) type ArgValues = SmallVec<[Option<AnyArc>; 4]>;
type BuildFn<T> = dyn Fn(&Arguments<'_>) -> DiResult<T> + Send + Sync;

/// A concrete type the container may construct without a registration.
///
/// Implementations list every constructor the type offers. When the type is
/// resolved without a registration, the container picks the constructor with
/// the most parameters (the first declared one on ties), resolves each
/// parameter and calls it.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Constructor, Injectable, Lifetime, Resolver, ServiceType};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { 42 }
/// }
///
/// struct Scheduler {
///     clock: Arc<dyn Clock>,
/// }
///
/// impl Injectable for Scheduler {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new([ServiceType::of_trait::<dyn Clock>()], |args| {
///             Ok(Scheduler { clock: args.get_trait::<dyn Clock>(0)? })
///         })]
///     }
/// }
///
/// let container = Container::new();
/// container.register_trait::<dyn Clock, _>(|| Arc::new(FixedClock), Lifetime::Permanent);
///
/// let scheduler = container.get_required::<Scheduler>();
/// assert_eq!(scheduler.clock.now(), 42);
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Constructors in declaration order.
    fn constructors() -> Vec<Constructor<Self>>;
}

/// A declared constructor: parameter types plus a build closure.
pub struct Constructor<T> {
    params: SmallVec<[ServiceType; 4]>,
    build: Arc<BuildFn<T>>,
}

impl<T: Injectable> Constructor<T> {
    /// Declares a constructor taking `params` in order.
    pub fn new<P, F>(params: P, build: F) -> Self
    where
        P: IntoIterator<Item = ServiceType>,
        F: Fn(&Arguments<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            params: params.into_iter().collect(),
            build: Arc::new(build),
        }
    }

    /// Declares a constructor without parameters.
    pub fn parameterless<F>(build: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(std::iter::empty(), move |_| Ok(build()))
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl<T: Injectable + Default> Constructor<T> {
    /// Parameterless constructor backed by `T::default()`.
    pub fn from_default() -> Self {
        Self::parameterless(T::default)
    }
}

impl<T> Clone for Constructor<T> {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            build: self.build.clone(),
        }
    }
}

/// Erased, cached invoker for one constructor of one concrete type.
///
/// Calling [`activate`](Activator::activate) twice yields two distinct
/// instances; any sharing is the business of the lifetime layer above.
pub trait Activator: Send + Sync {
    /// The type this activator produces.
    fn service_type(&self) -> ServiceType;

    /// Parameter types, in positional order.
    fn parameters(&self) -> &[ServiceType];

    /// Builds a new instance from resolved arguments.
    fn activate(&self, args: &Arguments<'_>) -> DiResult<AnyArc>;
}

impl<T: Injectable> Activator for Constructor<T> {
    fn service_type(&self) -> ServiceType {
        ServiceType::of::<T>()
    }

    fn parameters(&self) -> &[ServiceType] {
        &self.params
    }

    fn activate(&self, args: &Arguments<'_>) -> DiResult<AnyArc> {
        let value = (self.build)(args)?;
        Ok(Arc::new(value))
    }
}

/// Erased constructor discovery for `T`, stored inside [`ServiceType::of`].
pub(crate) fn discover<T: Injectable>() -> Vec<Arc<dyn Activator>> {
    T::constructors()
        .into_iter()
        .map(|ctor| Arc::new(ctor) as Arc<dyn Activator>)
        .collect()
}

/// Builds `ty` through its cached widest constructor, resolving every
/// parameter through `resolver`.
///
/// Absent parameters stay empty slots; failing on them is the constructor's
/// call.
pub(crate) fn activate(cache: &ActivationCache, ty: &ServiceType, resolver: &dyn ResolverCore) -> DiResult<AnyArc> {
    let activator = cache.activator(ty)?;
    let params = activator.parameters();
    if params.is_empty() {
        return activator.activate(&Arguments::empty());
    }

    let mut values = ArgValues::with_capacity(params.len());
    for param in params {
        values.push(resolver.resolve(param)?);
    }
    activator.activate(&Arguments::new(values, params))
}

/// Positional constructor arguments.
///
/// A slot is empty when its parameter could not be resolved and the container
/// is lenient. Reading an empty slot through [`get`](Arguments::get) fails with
/// [`DiError::MissingArgument`]; [`optional`](Arguments::optional) lets a
/// constructor accept the absence.
pub struct Arguments<'a> {
    values: ArgValues,
    params: &'a [ServiceType],
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(values: ArgValues, params: &'a [ServiceType]) -> Self {
        Self { values, params }
    }

    /// Arguments for a parameterless constructor.
    pub fn empty() -> Arguments<'static> {
        Arguments {
            values: SmallVec::new(),
            params: &[],
        }
    }

    /// Number of argument slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true when the slot at `position` holds a value.
    pub fn is_present(&self, position: usize) -> bool {
        matches!(self.values.get(position), Some(Some(_)))
    }

    /// The concrete argument at `position`.
    pub fn get<T: Send + Sync + 'static>(&self, position: usize) -> DiResult<Arc<T>> {
        let value = self.slot(position, std::any::type_name::<T>())?;
        downcast::<T>(value)
    }

    /// The trait argument at `position`.
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self, position: usize) -> DiResult<Arc<T>> {
        let value = self.slot(position, std::any::type_name::<T>())?;
        downcast_trait::<T>(value)
    }

    /// The sequence argument at `position` (`Vec<Arc<T>>`).
    pub fn get_sequence<T: ?Sized + Send + Sync + 'static>(
        &self,
        position: usize,
    ) -> DiResult<Arc<Vec<Arc<T>>>> {
        self.get::<Vec<Arc<T>>>(position)
    }

    /// The concrete argument at `position`, if present and of type `T`.
    pub fn optional<T: Send + Sync + 'static>(&self, position: usize) -> Option<Arc<T>> {
        self.values
            .get(position)
            .cloned()
            .flatten()
            .and_then(|value| downcast::<T>(value).ok())
    }

    /// The trait argument at `position`, if present and of type `T`.
    pub fn optional_trait<T: ?Sized + Send + Sync + 'static>(&self, position: usize) -> Option<Arc<T>> {
        self.values
            .get(position)
            .cloned()
            .flatten()
            .and_then(|value| downcast_trait::<T>(value).ok())
    }

    fn slot(&self, position: usize, requested: &'static str) -> DiResult<AnyArc> {
        match self.values.get(position) {
            Some(Some(value)) => Ok(value.clone()),
            _ => Err(DiError::MissingArgument {
                type_name: self.params.get(position).map_or(requested, |p| p.name()),
                position,
            }),
        }
    }
}
