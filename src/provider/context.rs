//! Resolver context handed to factories.

use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{AnyArc, ServiceType};
use crate::scope::ScopeStore;
use crate::traits::ResolverCore;

/// Context passed to factory functions for resolving dependencies.
///
/// Wraps the resolving container so factories can ask for other services
/// through the [`Resolver`](crate::Resolver) methods. Resolutions made
/// through a context take part in the same cycle detection as the outer
/// resolution.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let container = Container::new();
/// container.register_instance(Database {
///     url: "postgres://localhost".to_string(),
/// });
/// container.register_with(|resolver| {
///     Ok(UserService {
///         db: resolver.get_registered_required::<Database>(),
///     })
/// }, Lifetime::AlwaysNew);
///
/// let users = container.get_registered_required::<UserService>();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    /// Creates a new ResolverContext wrapping the given resolver.
    pub(crate) fn new<T>(resolver: &'a T) -> Self
    where
        T: ResolverCore,
    {
        Self { resolver }
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve(&self, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        self.resolver.resolve(ty)
    }

    fn resolve_named(&self, name: &str, ty: &ServiceType) -> DiResult<Option<AnyArc>> {
        self.resolver.resolve_named(name, ty)
    }

    fn resolve_all(&self, ty: &ServiceType) -> DiResult<Vec<AnyArc>> {
        self.resolver.resolve_all(ty)
    }

    fn current_scope(&self) -> Option<Arc<dyn ScopeStore>> {
        self.resolver.current_scope()
    }
}
