//! # ferrous-ioc
//!
//! Runtime inversion-of-control container for Rust: register factories for
//! concrete types and traits, then resolve them by type with lifetime-aware
//! memoization.
//!
//! ## Features
//!
//! - **Lifetimes**: `AlwaysNew`, `Permanent`, per-`Thread` and `Scoped` instances
//! - **Trait services**: resolve `Arc<dyn Trait>` from factories, instances or fallback candidates
//! - **Automatic construction**: unregistered [`Injectable`] types are built through their widest constructor
//! - **Collections**: every unnamed registration is kept, resolvable as a list or as `Vec<Arc<T>>`
//! - **Named registrations**: a separate `(type, name)` table
//! - **Thread-safe**: registration and resolution from any thread, concurrently
//! - **Circular dependency detection**: cycles fail with the full resolution path
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{Container, Lifetime, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//! container
//!     .register_instance(Database {
//!         connection_string: "postgres://localhost".to_string(),
//!     })
//!     .register_with(
//!         |r| Ok(UserService { db: r.get_registered_required::<Database>() }),
//!         Lifetime::AlwaysNew,
//!     );
//!
//! let user_service = container.get_registered_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Lifetimes
//!
//! - **AlwaysNew**: the factory runs on every resolution
//! - **Permanent**: created once per registration and shared everywhere
//! - **Thread**: created once per registration and thread
//! - **Scoped**: created once per registration and scope, as reported by the
//!   container's [`ScopeAccessor`]; without a current scope the factory runs
//!   uncached
//!
//! ## Collections
//!
//! ```rust
//! use ferrous_ioc::{Container, Lifetime, Resolver};
//! use std::sync::Arc;
//!
//! trait Plugin: Send + Sync {
//!     fn name(&self) -> &'static str;
//! }
//!
//! struct Audit;
//! impl Plugin for Audit {
//!     fn name(&self) -> &'static str { "audit" }
//! }
//!
//! struct Cache;
//! impl Plugin for Cache {
//!     fn name(&self) -> &'static str { "cache" }
//! }
//!
//! let container = Container::new();
//! container
//!     .register_trait::<dyn Plugin, _>(|| Arc::new(Audit), Lifetime::Permanent)
//!     .register_trait::<dyn Plugin, _>(|| Arc::new(Cache), Lifetime::Permanent);
//!
//! // The latest registration wins a single lookup
//! assert_eq!(container.get_required_trait::<dyn Plugin>().name(), "cache");
//!
//! let names: Vec<_> = container
//!     .get_all_trait::<dyn Plugin>()
//!     .unwrap()
//!     .iter()
//!     .map(|p| p.name())
//!     .collect();
//! assert_eq!(names, ["audit", "cache"]);
//! ```
//!
//! ## Scoped Services
//!
//! ```rust
//! use ferrous_ioc::{ContainerBuilder, Lifetime, LocalScope, Resolver, ThreadScopeAccessor};
//! use std::sync::Arc;
//!
//! struct Transaction;
//!
//! let accessor = Arc::new(ThreadScopeAccessor::new());
//! let container = ContainerBuilder::new().scope_accessor(accessor.clone()).build();
//! container.register(|| Transaction, Lifetime::Scoped);
//!
//! let request_a = Arc::new(LocalScope::new());
//! let request_b = Arc::new(LocalScope::new());
//!
//! let a = {
//!     let _scope = accessor.enter(request_a);
//!     container.get_registered_required::<Transaction>()
//! };
//! let b = {
//!     let _scope = accessor.enter(request_b);
//!     container.get_registered_required::<Transaction>()
//! };
//! assert!(!Arc::ptr_eq(&a, &b));
//! ```

pub mod activation;
pub mod collection;
pub mod descriptors;
pub mod error;
pub mod fallback;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod options;
pub mod provider;
pub mod scope;
pub mod traits;

// Internal modules
mod internal;
mod registration;

pub use activation::{ActivationCache, Activator, Arguments, Constructor, Injectable};
pub use collection::ContainerBuilder;
pub use descriptors::{ServiceDescriptor, ServiceLifetime, ServiceProvider, ServiceSource};
pub use error::{DiError, DiResult};
pub use fallback::{Candidate, CandidateBuilder, CandidateSet};
pub use key::{AnyArc, NamedKey, ServiceType};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, TracingObserver};
pub use options::{ContainerOptions, DEFAULT_MAX_DEPTH};
pub use provider::{Container, ResolverContext};
pub use scope::{LocalScope, ScopeAccessor, ScopeGuard, ScopeKey, ScopeStore, ThreadScopeAccessor};
pub use traits::{Resolver, ResolverCore};
