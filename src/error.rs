//! Error types for the inversion-of-control container.

use thiserror::Error;

/// Container errors
///
/// Represents the failure conditions that can occur while resolving or
/// constructing services. Only [`UnregisteredType`](DiError::UnregisteredType)
/// and [`UnregisteredNamedType`](DiError::UnregisteredNamedType) are subject to
/// the container's strictness flag; every other variant always surfaces as an
/// error.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError, Resolver};
///
/// struct Missing;
///
/// let container = Container::new();
/// container.set_throw_if_cant_resolve(true);
///
/// match container.get_registered::<Missing>() {
///     Err(DiError::UnregisteredType(name)) => assert!(name.ends_with("Missing")),
///     other => panic!("unexpected: {:?}", other.map(|v| v.is_some())),
/// }
/// ```
///
/// ```rust
/// use ferrous_ioc::DiError;
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// No registration, no automatic construction and no fallback candidate
    #[error("No registration for {0}")]
    UnregisteredType(&'static str),
    /// No named registration for the given name and type
    #[error("No registration for {type_name} named {name}")]
    UnregisteredNamedType {
        type_name: &'static str,
        name: String,
    },
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// An `Injectable` type declared no constructors
    #[error("No constructor declared for {0}")]
    NoConstructor(&'static str),
    /// A constructor read an argument that could not be resolved
    #[error("Missing argument {position} ({type_name})")]
    MissingArgument {
        type_name: &'static str,
        position: usize,
    },
    /// A user constructor reported a failure of its own
    #[error("Construction of {type_name} failed: {message}")]
    Construction {
        type_name: &'static str,
        message: String,
    },
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Container options could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DiError {
    /// Returns true for the two "not found" kinds governed by strictness.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DiError::UnregisteredType(_) | DiError::UnregisteredNamedType { .. }
        )
    }

    /// Convenience constructor for [`DiError::Construction`].
    pub fn construction<T: ?Sized>(message: impl Into<String>) -> Self {
        DiError::Construction {
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
