//! Registration tables.

use std::any::TypeId;
use std::sync::Arc;

use ahash::RandomState;
use dashmap::DashMap;

use crate::error::{DiError, DiResult};
use crate::key::{AnyArc, NamedKey, ServiceType, Shape};
use crate::lifetime::{self, Lifetime};
use crate::provider::ResolverContext;
use crate::scope::ScopeKey;
use crate::traits::ResolverCore;

/// Type-erased factory as stored in the tables.
pub(crate) type Factory =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Service registration with lifetime and factory
///
/// The factory is lifetime-wrapped once, on construction. Replacing a
/// registration creates a new `Registration`; instances memoized by the
/// previous one stay with it.
pub(crate) struct Registration {
    pub(crate) service: ServiceType,
    pub(crate) lifetime: Lifetime,
    pub(crate) scope_key: ScopeKey,
    factory: Factory,
}

impl Registration {
    pub(crate) fn new(service: ServiceType, lifetime: Lifetime, factory: Factory) -> Self {
        let scope_key = ScopeKey::next();
        Self {
            service,
            lifetime,
            scope_key,
            factory: lifetime::wrap(lifetime, scope_key, factory),
        }
    }

    #[inline]
    pub(crate) fn invoke(&self, ctx: &ResolverContext<'_>) -> DiResult<AnyArc> {
        (self.factory)(ctx)
    }
}

/// Service registry holding all registrations
///
/// Lookups hand out cloned `Arc<Registration>` snapshots so no table guard is
/// ever held while a factory runs.
#[derive(Default)]
pub(crate) struct Registry {
    /// Current unnamed registration per type
    unnamed: DashMap<TypeId, Arc<Registration>, RandomState>,
    /// Named registrations
    named: DashMap<NamedKey, Arc<Registration>, RandomState>,
    /// Every unnamed registration per type, oldest first
    collections: DashMap<TypeId, Vec<Arc<Registration>>, RandomState>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Installs `factory` as the current registration of `service` and appends
    /// it to the service's collection.
    pub(crate) fn register(&self, service: ServiceType, lifetime: Lifetime, factory: Factory) {
        let registration = Arc::new(Registration::new(service, lifetime, factory));
        let id = service.id();

        self.unnamed.insert(id, registration.clone());
        let count = {
            let mut entry = self.collections.entry(id).or_default();
            entry.push(registration);
            entry.len()
        };

        if let Some(sequence) = service.sequence() {
            self.unnamed
                .insert(sequence.id(), Arc::new(sequence_registration(service, sequence)));
        }

        tracing::trace!(
            service = service.name(),
            ?lifetime,
            collection_len = count,
            "registered"
        );
    }

    /// Installs `factory` under `(service, name)`. Named registrations never
    /// join a collection.
    pub(crate) fn register_named(
        &self,
        name: &str,
        service: ServiceType,
        lifetime: Lifetime,
        factory: Factory,
    ) {
        let registration = Arc::new(Registration::new(service, lifetime, factory));
        self.named.insert(NamedKey::new(&service, name), registration);
        tracing::trace!(service = service.name(), name, ?lifetime, "registered named");
    }

    pub(crate) fn unnamed(&self, id: TypeId) -> Option<Arc<Registration>> {
        self.unnamed.get(&id).map(|found| found.value().clone())
    }

    pub(crate) fn named(&self, key: &NamedKey) -> Option<Arc<Registration>> {
        self.named.get(key).map(|found| found.value().clone())
    }

    /// Snapshot of the collection of `id`, oldest first.
    pub(crate) fn collection(&self, id: TypeId) -> Vec<Arc<Registration>> {
        self.collections
            .get(&id)
            .map(|found| found.value().clone())
            .unwrap_or_default()
    }

    pub(crate) fn contains(&self, id: TypeId) -> bool {
        self.unnamed.contains_key(&id)
    }

    pub(crate) fn contains_named(&self, key: &NamedKey) -> bool {
        self.named.contains_key(key)
    }

    #[cfg(feature = "diagnostics")]
    pub(crate) fn describe(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let mut unnamed: Vec<_> = self
            .unnamed
            .iter()
            .map(|e| (e.value().service.name(), e.value().lifetime))
            .collect();
        unnamed.sort_by_key(|(name, _)| *name);
        for (name, lifetime) in unnamed {
            let _ = writeln!(out, "{name} ({lifetime:?})");
        }

        let mut named: Vec<_> = self
            .named
            .iter()
            .map(|e| {
                (
                    e.key().type_name(),
                    e.key().service_name().unwrap_or_default().to_string(),
                    e.value().lifetime,
                )
            })
            .collect();
        named.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        for (type_name, name, lifetime) in named {
            let _ = writeln!(out, "{type_name}[{name}] ({lifetime:?})");
        }

        let mut collections: Vec<_> = self
            .collections
            .iter()
            .filter_map(|e| e.value().first().map(|r| (r.service.name(), e.value().len())))
            .collect();
        collections.sort();
        for (name, len) in collections {
            let _ = writeln!(out, "{name} x{len}");
        }
        out
    }
}

/// Permanent registration of `Vec<Arc<E>>` that materializes the current
/// collection of `element` on first use.
fn sequence_registration(element: ServiceType, sequence: ServiceType) -> Registration {
    let factory: Factory = Arc::new(move |ctx: &ResolverContext<'_>| {
        let items = ctx.resolve_all(&element)?;
        match sequence.shape() {
            Shape::Sequence { collect, .. } => collect(items),
            _ => Err(DiError::TypeMismatch(sequence.name())),
        }
    });
    Registration::new(sequence, Lifetime::Permanent, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;

    fn constant(value: u32) -> Factory {
        Arc::new(move |_: &ResolverContext<'_>| Ok(Arc::new(value) as AnyArc))
    }

    #[test]
    fn every_unnamed_registration_appends() {
        let registry = Registry::new();
        let ty = ServiceType::registered::<u32>();

        registry.register(ty, Lifetime::AlwaysNew, constant(1));
        assert_eq!(registry.collection(ty.id()).len(), 1);

        registry.register(ty, Lifetime::AlwaysNew, constant(2));
        let container = Container::new();
        let ctx = ResolverContext::new(&container);
        let current = registry.unnamed(ty.id()).unwrap().invoke(&ctx).unwrap();
        assert_eq!(*current.downcast::<u32>().unwrap(), 2);
        assert_eq!(registry.collection(ty.id()).len(), 2);
        assert!(registry.contains(ServiceType::sequence_of::<u32>().id()));
    }

    #[test]
    fn named_registrations_stay_out_of_collections() {
        let registry = Registry::new();
        let ty = ServiceType::registered::<u32>();

        registry.register_named("port", ty, Lifetime::AlwaysNew, constant(8080));
        assert!(registry.contains_named(&NamedKey::new(&ty, "port")));
        assert!(!registry.contains_named(&NamedKey::new(&ty, "host")));
        assert!(!registry.contains(ty.id()));
        assert!(registry.collection(ty.id()).is_empty());
    }

    #[test]
    fn registrations_get_distinct_scope_keys() {
        let ty = ServiceType::registered::<u32>();
        let a = Registration::new(ty, Lifetime::Scoped, constant(1));
        let b = Registration::new(ty, Lifetime::Scoped, constant(1));
        assert_ne!(a.scope_key, b.scope_key);
    }
}
