//! Container options.

#[cfg(feature = "config")]
use crate::error::{DiError, DiResult};

/// Default bound on nested resolution depth.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Options fixed when a container is built.
///
/// `throw_if_cant_resolve` can still be toggled later through
/// [`Container::set_throw_if_cant_resolve`](crate::Container::set_throw_if_cant_resolve).
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ContainerBuilder, ContainerOptions, DiError, Resolver};
///
/// let options = ContainerOptions::new().throw_if_cant_resolve(true).max_depth(64);
/// let container = ContainerBuilder::new().options(options).build();
///
/// assert!(matches!(
///     container.get_registered::<String>(),
///     Err(DiError::UnregisteredType(_))
/// ));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Report "not found" as an error instead of an absent result
    pub throw_if_cant_resolve: bool,
    /// Longest chain of nested resolutions before failing with `DepthExceeded`
    pub max_depth: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            throw_if_cant_resolve: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn throw_if_cant_resolve(mut self, strict: bool) -> Self {
        self.throw_if_cant_resolve = strict;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Parses options from JSON; absent fields keep their defaults.
    ///
    /// ```rust
    /// use ferrous_ioc::ContainerOptions;
    ///
    /// let options = ContainerOptions::from_json(r#"{ "throw_if_cant_resolve": true }"#).unwrap();
    /// assert!(options.throw_if_cant_resolve);
    /// assert_eq!(options.max_depth, 1024);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::Config(e.to_string()))
    }

    /// Reads and parses a JSON options file.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> DiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DiError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }
}
