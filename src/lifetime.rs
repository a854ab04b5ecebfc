//! Service lifetimes and the factory wrapping that enforces them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use once_cell::sync::OnceCell;

use crate::key::AnyArc;
use crate::provider::ResolverContext;
use crate::registration::Factory;
use crate::scope::ScopeKey;
use crate::traits::ResolverCore;

/// Service lifetimes controlling instance reuse
///
/// A lifetime is attached to a registration and decides how many distinct
/// instances that registration yields over the container's life.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct RequestModel { id: u32 }
///
/// let container = Container::new();
///
/// // Permanent: one instance for the whole container
/// container.register(|| Database { url: "postgres://localhost".to_string() }, Lifetime::Permanent);
///
/// // AlwaysNew: a fresh instance every time
/// container.register(|| RequestModel { id: 12345 }, Lifetime::AlwaysNew);
///
/// let db1 = container.get_registered_required::<Database>();
/// let db2 = container.get_registered_required::<Database>();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let m1 = container.get_registered_required::<RequestModel>();
/// let m2 = container.get_registered_required::<RequestModel>();
/// assert!(!Arc::ptr_eq(&m1, &m2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// New instance per resolution, never cached
    #[default]
    AlwaysNew,
    /// Single instance per registration, shared by every caller and thread
    ///
    /// Concurrent first resolutions race on an atomic get-or-create, so
    /// exactly one instance is ever observed.
    Permanent,
    /// Single instance per registration and accessing thread
    ///
    /// Each thread's instances are dropped when that thread exits.
    Thread,
    /// Single instance per registration within the current external scope
    ///
    /// The scope is obtained from the container's
    /// [`ScopeAccessor`](crate::ScopeAccessor). Without an active scope the
    /// factory runs uncached.
    Scoped,
}

/// Wraps `factory` so that repeated invocation obeys `lifetime`.
///
/// Each call creates fresh memo state; wrapping is done once per registration
/// and replacing a registration never touches an earlier memo.
pub(crate) fn wrap(lifetime: Lifetime, key: ScopeKey, factory: Factory) -> Factory {
    match lifetime {
        Lifetime::AlwaysNew => factory,
        Lifetime::Permanent => permanent(factory),
        Lifetime::Thread => per_thread(key, factory),
        Lifetime::Scoped => scoped(key, factory),
    }
}

fn permanent(factory: Factory) -> Factory {
    let cell = OnceCell::new();
    Arc::new(move |r: &ResolverContext<'_>| cell.get_or_try_init(|| factory(r)).cloned())
}

// Dropped with the owning thread
thread_local! {
    static THREAD_VALUES: RefCell<HashMap<ScopeKey, AnyArc, RandomState>> = RefCell::new(HashMap::default());
}

fn per_thread(key: ScopeKey, factory: Factory) -> Factory {
    Arc::new(move |r: &ResolverContext<'_>| {
        if let Some(found) = THREAD_VALUES.with(|values| values.borrow().get(&key).cloned()) {
            return Ok(found);
        }
        // Borrow released; the factory may re-enter
        let value = factory(r)?;
        Ok(THREAD_VALUES.with(|values| values.borrow_mut().entry(key).or_insert(value).clone()))
    })
}

fn scoped(key: ScopeKey, factory: Factory) -> Factory {
    Arc::new(move |r: &ResolverContext<'_>| {
        let Some(scope) = r.current_scope() else {
            return factory(r);
        };
        if let Some(found) = scope.get(key) {
            return Ok(found);
        }
        let value = factory(r)?;
        Ok(scope.get_or_insert(key, value))
    })
}
