use std::sync::Arc;

use crate::fallback::CandidateSet;
use crate::observer::DiObserver;
use crate::options::ContainerOptions;
use crate::provider::Container;
use crate::scope::ScopeAccessor;

/// Collects the collaborators that are fixed for a container's lifetime.
///
/// Fallback candidate sets can only be supplied here; they are read-only once
/// the container is built.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{CandidateSet, ContainerBuilder, ContainerOptions, ThreadScopeAccessor, TracingObserver};
/// use std::sync::Arc;
///
/// let container = ContainerBuilder::new()
///     .options(ContainerOptions::new().throw_if_cant_resolve(true))
///     .fallback(CandidateSet::new("plugins"))
///     .scope_accessor(Arc::new(ThreadScopeAccessor::new()))
///     .observer(Arc::new(TracingObserver::new()))
///     .build();
///
/// assert!(container.throw_if_cant_resolve());
/// assert_eq!(container.fallback_sources().len(), 1);
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    options: ContainerOptions,
    fallback: Vec<CandidateSet>,
    scope_accessor: Option<Arc<dyn ScopeAccessor>>,
    observers: Vec<Arc<dyn DiObserver>>,
}

impl ContainerBuilder {
    /// Builder with default options and no collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all options at once.
    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the initial strictness for unresolvable requests.
    pub fn throw_if_cant_resolve(mut self, strict: bool) -> Self {
        self.options.throw_if_cant_resolve = strict;
        self
    }

    /// Appends a candidate set; sets are searched in the order added.
    pub fn fallback(mut self, set: CandidateSet) -> Self {
        self.fallback.push(set);
        self
    }

    /// Supplies the current scope to `Scoped` registrations.
    pub fn scope_accessor(mut self, accessor: Arc<dyn ScopeAccessor>) -> Self {
        self.scope_accessor = Some(accessor);
        self
    }

    /// Adds a resolution observer.
    pub fn observer(mut self, observer: Arc<dyn DiObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds an empty container.
    pub fn build(self) -> Container {
        tracing::debug!(
            fallback_sources = self.fallback.len(),
            observers = self.observers.len(),
            strict = self.options.throw_if_cant_resolve,
            "building container"
        );
        Container::from_parts(self.options, self.fallback, self.scope_accessor, self.observers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resolver;

    #[test]
    fn later_strictness_overrides_options() {
        let container = ContainerBuilder::new()
            .options(ContainerOptions::new().throw_if_cant_resolve(true))
            .throw_if_cant_resolve(false)
            .build();
        assert!(!container.throw_if_cant_resolve());
        assert!(container.get_registered::<u8>().unwrap().is_none());
    }

    #[test]
    fn default_builder_matches_new_container() {
        let built = ContainerBuilder::new().build();
        assert!(!built.throw_if_cant_resolve());
        assert!(built.fallback_sources().is_empty());
    }
}
