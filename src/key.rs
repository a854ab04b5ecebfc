//! Service type descriptors and identity keys.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::activation::{self, Activator, Injectable};
use crate::error::{DiError, DiResult};

/// Type-erased, shareable service instance.
///
/// Concrete services are stored as `Arc<T>`, trait services as
/// `Arc<Arc<dyn Trait>>` and sequences as `Arc<Vec<Arc<T>>>`.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type DiscoverFn = fn() -> Vec<Arc<dyn Activator>>;
pub(crate) type CollectFn = fn(Vec<AnyArc>) -> DiResult<AnyArc>;

#[derive(Clone, Copy)]
pub(crate) enum Shape {
    /// Concrete type; `Some` when it declares constructors
    Concrete(Option<DiscoverFn>),
    /// Trait object or other interface-like type
    Abstract,
    /// `Vec<Arc<E>>` built from the collection entry of `E`
    Sequence {
        element: TypeId,
        element_name: &'static str,
        collect: CollectFn,
    },
}

#[derive(Clone, Copy)]
struct SequenceOf {
    id: TypeId,
    name: &'static str,
    collect: CollectFn,
}

/// Runtime descriptor of a requested service type.
///
/// `ServiceType` is what the container reflects on: it carries the `TypeId`
/// used for lookups, a display name, whether the type is concrete or
/// abstract, and (for [`Injectable`] types) how to discover its constructors.
///
/// Equality and hashing use the `TypeId` only, so descriptors created through
/// different constructors for the same Rust type are interchangeable.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::ServiceType;
///
/// trait Logger: Send + Sync {}
///
/// let concrete = ServiceType::registered::<String>();
/// let abstract_ty = ServiceType::of_trait::<dyn Logger>();
///
/// assert!(!concrete.is_abstract());
/// assert!(abstract_ty.is_abstract());
/// assert_eq!(concrete, ServiceType::registered::<String>());
/// assert_ne!(concrete, abstract_ty);
/// ```
#[derive(Clone, Copy)]
pub struct ServiceType {
    id: TypeId,
    name: &'static str,
    shape: Shape,
    sequence: Option<SequenceOf>,
}

impl ServiceType {
    /// Descriptor for a concrete type that can be constructed automatically.
    pub fn of<T: Injectable>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape: Shape::Concrete(Some(activation::discover::<T>)),
            sequence: Some(SequenceOf {
                id: TypeId::of::<Vec<Arc<T>>>(),
                name: std::any::type_name::<Vec<Arc<T>>>(),
                collect: collect_concrete::<T>,
            }),
        }
    }

    /// Descriptor for a concrete type without declared constructors.
    ///
    /// Such a type resolves only through a registration.
    pub fn registered<T: Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape: Shape::Concrete(None),
            sequence: Some(SequenceOf {
                id: TypeId::of::<Vec<Arc<T>>>(),
                name: std::any::type_name::<Vec<Arc<T>>>(),
                collect: collect_concrete::<T>,
            }),
        }
    }

    /// Descriptor for an abstract type, typically `dyn Trait`.
    pub fn of_trait<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape: Shape::Abstract,
            sequence: Some(SequenceOf {
                id: TypeId::of::<Vec<Arc<T>>>(),
                name: std::any::type_name::<Vec<Arc<T>>>(),
                collect: collect_trait::<T>,
            }),
        }
    }

    /// Descriptor for `Vec<Arc<T>>`, the sequence of a concrete type.
    pub fn sequence_of<T: Send + Sync + 'static>() -> Self {
        Self::registered::<T>().sequence_unchecked()
    }

    /// Descriptor for `Vec<Arc<T>>`, the sequence of an abstract type.
    pub fn sequence_of_trait<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self::of_trait::<T>().sequence_unchecked()
    }

    /// The `TypeId` this descriptor is keyed by.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The `std::any::type_name` of the described type.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true for trait objects and other interface-like types.
    pub fn is_abstract(&self) -> bool {
        matches!(self.shape, Shape::Abstract)
    }

    /// Returns true when the type declares constructors.
    pub fn is_constructible(&self) -> bool {
        matches!(self.shape, Shape::Concrete(Some(_)))
    }

    /// Returns true for sequence descriptors.
    pub fn is_sequence(&self) -> bool {
        matches!(self.shape, Shape::Sequence { .. })
    }

    /// The descriptor of `Vec<Arc<Self>>`, or `None` for sequence types.
    pub fn sequence(&self) -> Option<ServiceType> {
        self.sequence.map(|seq| ServiceType {
            id: seq.id,
            name: seq.name,
            shape: Shape::Sequence {
                element: self.id,
                element_name: self.name,
                collect: seq.collect,
            },
            sequence: None,
        })
    }

    fn sequence_unchecked(self) -> ServiceType {
        match self.sequence() {
            Some(seq) => seq,
            None => self,
        }
    }

    #[inline]
    pub(crate) fn shape(&self) -> Shape {
        self.shape
    }
}

impl PartialEq for ServiceType {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.shape {
            Shape::Concrete(Some(_)) => "constructible",
            Shape::Concrete(None) => "registered",
            Shape::Abstract => "abstract",
            Shape::Sequence { .. } => "sequence",
        };
        f.debug_struct("ServiceType")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity key for the named registration table.
///
/// A key is the pair of requested type and optional name. Two keys are equal
/// iff both the `TypeId` and the name match, with an absent name only equal to
/// another absent name. The type's display name is carried for diagnostics
/// and ignored by equality and hashing.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{NamedKey, ServiceType};
///
/// let ty = ServiceType::registered::<u32>();
/// assert_eq!(NamedKey::new(&ty, "port"), NamedKey::new(&ty, "port"));
/// assert_ne!(NamedKey::new(&ty, "port"), NamedKey::unnamed(&ty));
/// assert_eq!(NamedKey::unnamed(&ty), NamedKey::unnamed(&ty));
/// ```
#[derive(Debug, Clone)]
pub struct NamedKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<String>,
}

impl NamedKey {
    /// Key for `ty` qualified by `name`.
    pub fn new(ty: &ServiceType, name: impl Into<String>) -> Self {
        Self {
            type_id: ty.id(),
            type_name: ty.name(),
            name: Some(name.into()),
        }
    }

    /// Key for `ty` without a name.
    pub fn unnamed(ty: &ServiceType) -> Self {
        Self {
            type_id: ty.id(),
            type_name: ty.name(),
            name: None,
        }
    }

    /// The display name of the keyed type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The service name, or `None` for unnamed keys.
    pub fn service_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for NamedKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for NamedKey {}

impl Hash for NamedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

/// Downcasts a stored concrete instance.
pub(crate) fn downcast<T: Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Downcasts a stored trait instance (`Arc<Arc<dyn Trait>>` pattern).
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Erases a trait instance into its stored representation.
pub(crate) fn erase_trait<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
    Arc::new(value)
}

fn collect_concrete<T: Send + Sync + 'static>(items: Vec<AnyArc>) -> DiResult<AnyArc> {
    let typed = items
        .into_iter()
        .map(downcast::<T>)
        .collect::<DiResult<Vec<Arc<T>>>>()?;
    Ok(Arc::new(typed))
}

fn collect_trait<T: ?Sized + Send + Sync + 'static>(items: Vec<AnyArc>) -> DiResult<AnyArc> {
    let typed = items
        .into_iter()
        .map(downcast_trait::<T>)
        .collect::<DiResult<Vec<Arc<T>>>>()?;
    Ok(Arc::new(typed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Marker: Send + Sync {}

    #[test]
    fn identity_ignores_descriptor_kind() {
        assert_eq!(ServiceType::registered::<u8>(), ServiceType::registered::<u8>());
        assert_ne!(ServiceType::registered::<u8>(), ServiceType::registered::<u16>());

        let mut set = HashSet::new();
        set.insert(ServiceType::registered::<u8>());
        set.insert(ServiceType::registered::<u8>());
        set.insert(ServiceType::of_trait::<dyn Marker>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn sequence_descriptor_matches_vec_of_arc() {
        let seq = ServiceType::of_trait::<dyn Marker>().sequence().unwrap();
        assert!(seq.is_sequence());
        assert_eq!(seq.id(), TypeId::of::<Vec<Arc<dyn Marker>>>());
        assert_eq!(seq, ServiceType::sequence_of_trait::<dyn Marker>());
        assert!(seq.sequence().is_none());
    }

    #[test]
    fn named_key_treats_absent_name_consistently() {
        let ty = ServiceType::registered::<String>();
        let mut set = HashSet::new();
        set.insert(NamedKey::unnamed(&ty));
        set.insert(NamedKey::unnamed(&ty));
        set.insert(NamedKey::new(&ty, "a"));
        set.insert(NamedKey::new(&ty, "a"));
        set.insert(NamedKey::new(&ty, "b"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn collect_rejects_foreign_items() {
        let items: Vec<AnyArc> = vec![Arc::new(1u32), Arc::new("nope")];
        let err = collect_concrete::<u32>(items).unwrap_err();
        assert_eq!(err, DiError::TypeMismatch("u32"));
    }
}
