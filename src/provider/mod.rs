//! The container and its resolution engine.
//!
//! [`Container`] is a cheap, clonable handle over one set of registration
//! tables. The registrar half lives in [`collection`](crate::collection); this
//! module holds the shared state and the resolver half.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::activation::ActivationCache;
use crate::error::DiResult;
use crate::fallback::CandidateSet;
use crate::key::{AnyArc, NamedKey, ServiceType};
use crate::observer::{DiObserver, Observers};
use crate::options::ContainerOptions;
use crate::registration::Registry;
use crate::scope::{ScopeAccessor, ScopeStore};
use crate::traits::ResolverCore;

pub mod context;
mod engine;

pub use context::ResolverContext;

static NEXT_CONTAINER: AtomicU64 = AtomicU64::new(1);

/// Registrar and resolver over one independent set of tables.
///
/// Cloning yields another handle to the same tables. Two containers created
/// separately never share registrations, memoized instances or caches.
/// Dropping the last handle releases everything; the container owns no
/// external resources, so there is nothing to dispose.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Foo: Send + Sync {}
/// struct RealFoo;
/// impl Foo for RealFoo {}
///
/// let container = Container::new();
/// container.register_trait::<dyn Foo, _>(|| Arc::new(RealFoo), Lifetime::Permanent);
///
/// let a = container.get_required_trait::<dyn Foo>();
/// let b = container.get_required_trait::<dyn Foo>();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let other = Container::new();
/// assert!(other.get_trait::<dyn Foo>().unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) id: u64,
    pub(crate) registry: Registry,
    pub(crate) activations: ActivationCache,
    pub(crate) fallback: Vec<CandidateSet>,
    pub(crate) strict: AtomicBool,
    pub(crate) max_depth: usize,
    pub(crate) scope_accessor: RwLock<Option<Arc<dyn ScopeAccessor>>>,
    pub(crate) observers: Observers,
}

impl Container {
    /// Creates an empty, lenient container without fallback candidates.
    pub fn new() -> Self {
        Self::from_parts(ContainerOptions::default(), Vec::new(), None, Vec::new())
    }

    /// Starts a [`ContainerBuilder`](crate::ContainerBuilder).
    pub fn builder() -> crate::ContainerBuilder {
        crate::ContainerBuilder::new()
    }

    pub(crate) fn from_parts(
        options: ContainerOptions,
        fallback: Vec<CandidateSet>,
        scope_accessor: Option<Arc<dyn ScopeAccessor>>,
        observers: Vec<Arc<dyn DiObserver>>,
    ) -> Self {
        let inner = ContainerInner {
            id: NEXT_CONTAINER.fetch_add(1, Ordering::Relaxed),
            registry: Registry::new(),
            activations: ActivationCache::new(),
            fallback,
            strict: AtomicBool::new(options.throw_if_cant_resolve),
            max_depth: options.max_depth,
            scope_accessor: RwLock::new(scope_accessor),
            observers: Observers::default(),
        };
        for observer in observers {
            inner.observers.add(observer);
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ContainerInner {
        &self.inner
    }

    pub(crate) fn downgrade(&self) -> Weak<ContainerInner> {
        Arc::downgrade(&self.inner)
    }

    /// Switches "not found" between an absent result (`false`, the default)
    /// and an `UnregisteredType` / `UnregisteredNamedType` error (`true`).
    ///
    /// Applies to every resolution entry point from the next call on.
    pub fn set_throw_if_cant_resolve(&self, strict: bool) {
        self.inner.strict.store(strict, Ordering::Relaxed);
    }

    /// Whether "not found" is reported as an error.
    pub fn throw_if_cant_resolve(&self) -> bool {
        self.inner.strict.load(Ordering::Relaxed)
    }

    /// Installs the collaborator consulted by `Scoped` registrations.
    pub fn set_scope_accessor(&self, accessor: Arc<dyn ScopeAccessor>) {
        *self.inner.scope_accessor.write() = Some(accessor);
    }

    /// Adds an observer notified of every resolution event.
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) {
        self.inner.observers.add(observer);
    }

    /// Returns true when `ty` has an unnamed registration.
    pub fn is_registered(&self, ty: &ServiceType) -> bool {
        self.inner.registry.contains(ty.id())
    }

    /// Returns true when `ty` is registered under `name`.
    pub fn is_registered_named(&self, name: &str, ty: &ServiceType) -> bool {
        self.inner.registry.contains_named(&NamedKey::new(ty, name))
    }

    /// The constructor plans derived so far.
    pub fn activation_cache(&self) -> &ActivationCache {
        &self.inner.activations
    }

    /// The fallback candidate sets, in search order.
    pub fn fallback_sources(&self) -> &[CandidateSet] {
        &self.inner.fallback
    }

    /// Human-readable dump of the registration tables.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut out = String::from("== registrations ==\n");
        out.push_str(&self.inner.registry.describe());
        out.push_str(&format!(
            "== constructor plans: {} ==\n== fallback sources: {} ==\n",
            self.inner.activations.len(),
            self.inner.fallback.len()
        ));
        out
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("throw_if_cant_resolve", &self.throw_if_cant_resolve())
            .field("max_depth", &self.inner.max_depth)
            .field("fallback_sources", &self.inner.fallback.len())
            .finish()
    }
}

impl ResolverCore for Container {
    fn resolve(&self, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        self.resolve_unnamed(ty)
    }

    fn resolve_named(&self, name: &str, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        self.resolve_by_name(name, ty)
    }

    fn resolve_all(&self, ty: &ServiceType) -> DiResult<Vec<AnyArc>> {
        self.collect_all(ty)
    }

    fn current_scope(&self) -> Option<Arc<dyn ScopeStore>> {
        let accessor = self.inner.scope_accessor.read().clone()?;
        accessor.current()
    }
}
