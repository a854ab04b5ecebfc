//! External scope collaborator for the `Scoped` lifetime.
//!
//! The container never creates scopes itself. A host decides what "the current
//! scope" is (a request, a job, a unit of work) and exposes it through a
//! [`ScopeAccessor`]. `Scoped` registrations memoize their instances in the
//! [`ScopeStore`] that accessor returns; ending the scope is a matter of
//! dropping the store.
//!
//! [`LocalScope`] is a ready-made store and [`ThreadScopeAccessor`] binds
//! stores to the calling thread for hosts without an ambient context of their
//! own.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::RandomState;
use dashmap::DashMap;

use crate::key::AnyArc;

static NEXT_SCOPE_KEY: AtomicU64 = AtomicU64::new(1);
static NEXT_ACCESSOR: AtomicU64 = AtomicU64::new(1);

/// Slot identity of one registration inside a scope store.
///
/// Every registration draws a fresh key, so two registrations never share a
/// slot even when they produce the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey(u64);

impl ScopeKey {
    pub(crate) fn next() -> Self {
        ScopeKey(NEXT_SCOPE_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw key value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Per-scope value storage.
pub trait ScopeStore: Send + Sync {
    /// The value stored under `key`, if any.
    fn get(&self, key: ScopeKey) -> Option<AnyArc>;

    /// Stores `value` under `key` unless a value is already present, and
    /// returns whichever value the slot holds afterwards.
    fn get_or_insert(&self, key: ScopeKey, value: AnyArc) -> AnyArc;
}

/// Tells the container which scope, if any, is current.
pub trait ScopeAccessor: Send + Sync {
    /// The active scope store, or `None` outside any scope.
    fn current(&self) -> Option<Arc<dyn ScopeStore>>;
}

/// Concurrent in-memory scope store.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Lifetime, LocalScope, Resolver, ThreadScopeAccessor};
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
///
/// struct RequestId(u64);
///
/// let accessor = Arc::new(ThreadScopeAccessor::new());
/// let container = Container::new();
/// container.set_scope_accessor(accessor.clone());
///
/// let counter = AtomicU64::new(0);
/// container.register(
///     move || RequestId(counter.fetch_add(1, Ordering::SeqCst)),
///     Lifetime::Scoped,
/// );
///
/// let first = {
///     let _scope = accessor.enter(Arc::new(LocalScope::new()));
///     let a = container.get_registered_required::<RequestId>();
///     let b = container.get_registered_required::<RequestId>();
///     assert!(Arc::ptr_eq(&a, &b));
///     a.0
/// };
///
/// let _scope = accessor.enter(Arc::new(LocalScope::new()));
/// let c = container.get_registered_required::<RequestId>();
/// assert_ne!(c.0, first);
/// ```
#[derive(Default)]
pub struct LocalScope {
    values: DashMap<ScopeKey, AnyArc, RandomState>,
}

impl LocalScope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ScopeStore for LocalScope {
    fn get(&self, key: ScopeKey) -> Option<AnyArc> {
        self.values.get(&key).map(|found| found.value().clone())
    }

    fn get_or_insert(&self, key: ScopeKey, value: AnyArc) -> AnyArc {
        self.values.entry(key).or_insert(value).value().clone()
    }
}

impl std::fmt::Debug for LocalScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalScope")
            .field("values", &self.values.len())
            .finish()
    }
}

thread_local! {
    static ACTIVE_SCOPES: RefCell<Vec<ActiveScope>> = const { RefCell::new(Vec::new()) };
}

struct ActiveScope {
    accessor: u64,
    token: u64,
    store: Arc<dyn ScopeStore>,
}

/// Scope accessor backed by a per-thread stack of entered scopes.
///
/// Scopes entered through one accessor are invisible to every other
/// accessor, and to other threads.
pub struct ThreadScopeAccessor {
    id: u64,
}

impl ThreadScopeAccessor {
    /// Creates an accessor with no scope entered.
    pub fn new() -> Self {
        Self {
            id: NEXT_ACCESSOR.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Makes `store` the current scope on this thread until the returned guard
    /// is dropped. Nested calls shadow outer scopes.
    pub fn enter(&self, store: Arc<dyn ScopeStore>) -> ScopeGuard {
        let token = NEXT_SCOPE_KEY.fetch_add(1, Ordering::Relaxed);
        ACTIVE_SCOPES.with(|stack| {
            stack.borrow_mut().push(ActiveScope {
                accessor: self.id,
                token,
                store,
            })
        });
        ScopeGuard {
            token,
            _not_send: PhantomData,
        }
    }
}

impl Default for ThreadScopeAccessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeAccessor for ThreadScopeAccessor {
    fn current(&self) -> Option<Arc<dyn ScopeStore>> {
        ACTIVE_SCOPES.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|active| active.accessor == self.id)
                .map(|active| active.store.clone())
        })
    }
}

/// Leaves a scope entered with [`ThreadScopeAccessor::enter`] when dropped.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    token: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        ACTIVE_SCOPES.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|active| active.token == self.token) {
                stack.remove(pos);
            }
        });
    }
}
