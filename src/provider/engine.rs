//! Resolution algorithm: registrations, automatic construction, fallback.

use std::any::TypeId;
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::activation;
use crate::error::{DiError, DiResult};
use crate::internal::ResolutionGuard;
use crate::key::{AnyArc, NamedKey, ServiceType, Shape};
use crate::provider::{Container, ResolverContext};

impl Container {
    pub(crate) fn resolve_unnamed(&self, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        let found = self.locate(ty)?;
        self.require(found, || DiError::UnregisteredType(ty.name()))
    }

    pub(crate) fn resolve_by_name(&self, name: &str, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        let key = NamedKey::new(ty, name);
        let found = self.observed(&key, || match self.inner().registry.named(&key) {
            Some(registration) => registration.invoke(&ResolverContext::new(self)).map(Some),
            None => Ok(None),
        })?;
        self.require(found, || DiError::UnregisteredNamedType {
            type_name: ty.name(),
            name: name.to_string(),
        })
    }

    pub(crate) fn collect_all(&self, ty: &ServiceType) -> DiResult<Vec<AnyArc>> {
        self.invoke_collection(ty.id(), ty.name())
    }

    fn invoke_collection(&self, id: TypeId, name: &'static str) -> DiResult<Vec<AnyArc>> {
        let registrations = self.inner().registry.collection(id);
        tracing::trace!(service = name, count = registrations.len(), "resolving collection");

        let inner = self.inner();
        let ctx = ResolverContext::new(self);
        registrations
            .iter()
            .map(|r| {
                let key = NamedKey::unnamed(&r.service);
                ResolutionGuard::enter(inner.id, &key, inner.max_depth).and_then(|_guard| r.invoke(&ctx))
            })
            .collect()
    }

    /// Unnamed lookup without the strictness policy.
    fn locate(&self, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        self.observed(&NamedKey::unnamed(ty), || self.locate_unobserved(ty))
    }

    fn locate_unobserved(&self, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        if let Some(registration) = self.inner().registry.unnamed(ty.id()) {
            return registration.invoke(&ResolverContext::new(self)).map(Some);
        }

        match ty.shape() {
            Shape::Concrete(Some(_)) => self.construct(ty).map(Some),
            Shape::Concrete(None) => Ok(None),
            Shape::Sequence {
                element,
                element_name,
                collect,
            } => {
                // Nothing registered for the element yet
                let items = self.invoke_collection(element, element_name)?;
                collect(items).map(Some)
            }
            Shape::Abstract => self.fallback(ty),
        }
    }

    /// Builds an unregistered concrete type through its widest constructor.
    fn construct(&self, ty: &ServiceType) -> DiResult<AnyArc> {
        let instance = activation::activate(&self.inner().activations, ty, self)?;
        self.inner().observers.auto_constructed(ty);
        Ok(instance)
    }

    fn fallback(&self, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        let mut matches = self
            .inner()
            .fallback
            .iter()
            .flat_map(|set| set.candidates().iter().map(move |c| (set.name(), c)))
            .filter(|(_, c)| c.is_assignable_to(ty));

        let Some((source, candidate)) = matches.next() else {
            return Ok(None);
        };
        let concrete = candidate.concrete();

        let ignored = matches.count();
        if ignored > 0 {
            tracing::debug!(
                requested = ty.name(),
                chosen = concrete.name(),
                ignored,
                "several fallback candidates match, using the first"
            );
        }
        tracing::debug!(requested = ty.name(), candidate = concrete.name(), source, "resolving through fallback");
        self.inner().observers.fallback_selected(ty, &concrete, source);

        match self.locate(&concrete)? {
            Some(instance) => candidate.upcast(ty, instance).transpose(),
            None => Ok(None),
        }
    }

    fn require(&self, found: Option<AnyArc>, missing: impl FnOnce() -> DiError) -> DiResult<Option<AnyArc>> {
        if found.is_some() {
            return Ok(found);
        }
        let error = missing();
        tracing::debug!(%error, "not found");
        if self.inner().strict.load(Ordering::Relaxed) {
            Err(error)
        } else {
            Ok(None)
        }
    }

    /// Runs `lookup` under the cycle guard and reports the outcome to the
    /// observers.
    fn observed(
        &self,
        key: &NamedKey,
        lookup: impl FnOnce() -> DiResult<Option<AnyArc>>,
    ) -> DiResult<Option<AnyArc>> {
        let inner = self.inner();
        let observers = &inner.observers;

        let started = observers.has_observers().then(|| {
            observers.resolving(key);
            Instant::now()
        });

        let outcome = ResolutionGuard::enter(inner.id, key, inner.max_depth).and_then(|_guard| lookup());

        if let Some(started) = started {
            match &outcome {
                Ok(Some(_)) => observers.resolved(key, started.elapsed()),
                Ok(None) => observers.not_found(key),
                Err(error) => observers.failed(key, error),
            }
        }
        outcome
    }
}
