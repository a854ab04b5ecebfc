//! Per-type activation cache.

use std::any::TypeId;
use std::sync::Arc;

use ahash::RandomState;
use dashmap::DashMap;

use super::{ArgValues, Activator, Arguments};
use crate::error::{DiError, DiResult};
use crate::key::{AnyArc, ServiceType, Shape};

/// Memoized constructor plans keyed by concrete type.
///
/// The first activation of a type discovers its constructors and keeps the
/// widest one; every later activation reuses the stored [`Activator`] without
/// consulting the type's constructor declarations again.
///
/// # Performance Characteristics
///
/// - **First activation**: constructor discovery + selection under the
///   shard's write lock, so concurrent first activations derive the plan once
/// - **Subsequent activations**: one sharded read + the build closure
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ActivationCache, Constructor, Injectable, ServiceType};
///
/// #[derive(Default)]
/// struct Counter { hits: u32 }
///
/// impl Injectable for Counter {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::from_default()]
///     }
/// }
///
/// let cache = ActivationCache::new();
/// let first = cache.create_instance(&ServiceType::of::<Counter>(), Vec::new()).unwrap();
/// let second = cache.create_instance(&ServiceType::of::<Counter>(), Vec::new()).unwrap();
///
/// assert!(first.downcast_ref::<Counter>().is_some());
/// assert!(!std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Default)]
pub struct ActivationCache {
    activators: DashMap<TypeId, Arc<dyn Activator>, RandomState>,
}

impl ActivationCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The widest constructor of `ty`, derived on first use.
    pub fn activator(&self, ty: &ServiceType) -> DiResult<Arc<dyn Activator>> {
        if let Some(found) = self.activators.get(&ty.id()) {
            return Ok(found.clone());
        }

        let discover = match ty.shape() {
            Shape::Concrete(Some(discover)) => discover,
            _ => return Err(DiError::UnregisteredType(ty.name())),
        };

        let entry = self
            .activators
            .entry(ty.id())
            .or_try_insert_with(|| {
                tracing::trace!(service = ty.name(), "deriving constructor plan");
                widest(discover()).ok_or(DiError::NoConstructor(ty.name()))
            })?;
        Ok(entry.value().clone())
    }

    /// Activates `ty` with already resolved arguments.
    ///
    /// An empty `values` list takes the parameterless fast path; otherwise the
    /// values are matched positionally against the cached constructor.
    pub fn create_instance(&self, ty: &ServiceType, values: Vec<Option<AnyArc>>) -> DiResult<AnyArc> {
        let activator = self.activator(ty)?;
        if values.is_empty() {
            return activator.activate(&Arguments::empty());
        }
        let values: ArgValues = values.into_iter().collect();
        activator.activate(&Arguments::new(values, activator.parameters()))
    }

    /// Returns true when a plan for `ty` is cached.
    pub fn contains(&self, ty: &ServiceType) -> bool {
        self.activators.contains_key(&ty.id())
    }

    /// Number of cached plans.
    pub fn len(&self) -> usize {
        self.activators.len()
    }

    /// Returns true when no plan has been derived yet.
    pub fn is_empty(&self) -> bool {
        self.activators.is_empty()
    }
}

/// First constructor of maximal arity, in declaration order.
fn widest(constructors: Vec<Arc<dyn Activator>>) -> Option<Arc<dyn Activator>> {
    let mut best: Option<Arc<dyn Activator>> = None;
    for candidate in constructors {
        let wider = match &best {
            Some(current) => candidate.parameters().len() > current.parameters().len(),
            None => true,
        };
        if wider {
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{Constructor, Injectable};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DISCOVERIES: AtomicUsize = AtomicUsize::new(0);

    struct Tagged(&'static str);

    impl Injectable for Tagged {
        fn constructors() -> Vec<Constructor<Self>> {
            DISCOVERIES.fetch_add(1, Ordering::SeqCst);
            let u32_ty = ServiceType::registered::<u32>();
            vec![
                Constructor::parameterless(|| Tagged("zero")),
                Constructor::new([u32_ty, u32_ty], |_| Ok(Tagged("first-wide"))),
                Constructor::new([u32_ty], |_| Ok(Tagged("one"))),
                Constructor::new([u32_ty, u32_ty], |_| Ok(Tagged("second-wide"))),
            ]
        }
    }

    struct Nothing;

    impl Injectable for Nothing {
        fn constructors() -> Vec<Constructor<Self>> {
            Vec::new()
        }
    }

    #[test]
    fn picks_first_constructor_of_maximal_arity_once() {
        let cache = ActivationCache::new();
        let ty = ServiceType::of::<Tagged>();

        let first = cache.activator(&ty).unwrap();
        let second = cache.activator(&ty).unwrap();
        assert_eq!(first.parameters().len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(DISCOVERIES.load(Ordering::SeqCst), 1);

        let instance = cache
            .create_instance(&ty, vec![Some(Arc::new(1u32) as AnyArc), None])
            .unwrap();
        assert_eq!(instance.downcast_ref::<Tagged>().unwrap().0, "first-wide");
        assert_eq!(DISCOVERIES.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn type_without_constructors_is_reported_and_not_cached() {
        let cache = ActivationCache::new();
        let err = cache.activator(&ServiceType::of::<Nothing>()).err().unwrap();
        assert!(matches!(err, DiError::NoConstructor(_)));
        assert!(cache.is_empty());
    }

    #[test]
    fn registered_only_types_cannot_be_activated() {
        let cache = ActivationCache::new();
        let err = cache.activator(&ServiceType::registered::<String>()).err().unwrap();
        assert!(matches!(err, DiError::UnregisteredType(_)));
    }
}
