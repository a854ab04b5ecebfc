//! Diagnostic observers for resolution traceability.
//!
//! Observers receive a callback for each resolution event. They run
//! synchronously on the resolving thread, so implementations should stay
//! cheap. [`TracingObserver`] forwards every event to `tracing`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::DiError;
use crate::key::{NamedKey, ServiceType};

/// Observer trait for resolution events.
///
/// Every method has an empty default body, so an observer only implements
/// the events it cares about.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, DiObserver, NamedKey, Resolver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     misses: AtomicUsize,
/// }
///
/// impl DiObserver for CountingObserver {
///     fn not_found(&self, _key: &NamedKey) {
///         self.misses.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let observer = Arc::new(CountingObserver::default());
/// let container = Container::new();
/// container.add_observer(observer.clone());
///
/// assert!(container.get_registered::<String>().unwrap().is_none());
/// assert_eq!(observer.misses.load(Ordering::Relaxed), 1);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a key is looked up.
    fn resolving(&self, _key: &NamedKey) {}

    /// Called after a key produced an instance.
    fn resolved(&self, _key: &NamedKey, _duration: Duration) {}

    /// Called when a key produced no instance.
    fn not_found(&self, _key: &NamedKey) {}

    /// Called when resolving a key failed.
    fn failed(&self, _key: &NamedKey, _error: &DiError) {}

    /// Called after an unregistered concrete type was built automatically.
    fn auto_constructed(&self, _ty: &ServiceType) {}

    /// Called when a fallback candidate was chosen for an abstract type.
    fn fallback_selected(&self, _requested: &ServiceType, _candidate: &ServiceType, _source: &str) {}
}

/// The observers registered on one container.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Vec<Arc<dyn DiObserver>>>,
}

impl Observers {
    pub(crate) fn add(&self, observer: Arc<dyn DiObserver>) {
        self.observers.write().push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.read().is_empty()
    }

    // Snapshot so no lock is held while an observer runs
    fn each(&self, f: impl Fn(&dyn DiObserver)) {
        let observers = self.observers.read().clone();
        for observer in &observers {
            f(observer.as_ref());
        }
    }

    pub(crate) fn resolving(&self, key: &NamedKey) {
        self.each(|o| o.resolving(key));
    }

    pub(crate) fn resolved(&self, key: &NamedKey, duration: Duration) {
        self.each(|o| o.resolved(key, duration));
    }

    pub(crate) fn not_found(&self, key: &NamedKey) {
        self.each(|o| o.not_found(key));
    }

    pub(crate) fn failed(&self, key: &NamedKey, error: &DiError) {
        self.each(|o| o.failed(key, error));
    }

    pub(crate) fn auto_constructed(&self, ty: &ServiceType) {
        self.each(|o| o.auto_constructed(ty));
    }

    pub(crate) fn fallback_selected(&self, requested: &ServiceType, candidate: &ServiceType, source: &str) {
        self.each(|o| o.fallback_selected(requested, candidate, source));
    }
}

/// Observer that forwards events to `tracing`.
///
/// Lookups are traced at `TRACE`; misses, failures, automatic construction and
/// fallback selection at `DEBUG`.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: &'static str,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self {
            label: "ferrous_ioc",
        }
    }

    /// Tags events with `label` in the `container` field.
    pub fn with_label(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_key(key: &NamedKey) -> String {
    match key.service_name() {
        Some(name) => format!("{}[{}]", key.type_name(), name),
        None => key.type_name().to_string(),
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &NamedKey) {
        tracing::trace!(container = self.label, service = %describe_key(key), "resolving");
    }

    fn resolved(&self, key: &NamedKey, duration: Duration) {
        tracing::trace!(
            container = self.label,
            service = %describe_key(key),
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn not_found(&self, key: &NamedKey) {
        tracing::debug!(container = self.label, service = %describe_key(key), "not found");
    }

    fn failed(&self, key: &NamedKey, error: &DiError) {
        tracing::debug!(container = self.label, service = %describe_key(key), %error, "resolution failed");
    }

    fn auto_constructed(&self, ty: &ServiceType) {
        tracing::debug!(container = self.label, service = ty.name(), "constructed automatically");
    }

    fn fallback_selected(&self, requested: &ServiceType, candidate: &ServiceType, source: &str) {
        tracing::debug!(
            container = self.label,
            requested = requested.name(),
            candidate = candidate.name(),
            source,
            "fallback candidate selected"
        );
    }
}
