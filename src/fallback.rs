//! Fallback candidates for abstract types without a registration.
//!
//! A [`CandidateSet`] lists concrete types together with the abstract types
//! each of them can stand in for. When an abstract type is requested and no
//! registration exists, the container scans its candidate sets in order and
//! resolves the first assignable candidate as if its concrete type had been
//! requested directly.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::activation::Injectable;
use crate::error::DiResult;
use crate::key::{downcast, erase_trait, AnyArc, ServiceType};

type UpcastFn = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;

#[derive(Clone)]
struct Upcast {
    target: TypeId,
    target_name: &'static str,
    cast: UpcastFn,
}

/// A concrete type and the abstract types it is assignable to.
///
/// Built through [`Candidate::of`] or [`Candidate::registered`] and one
/// [`implements`](CandidateBuilder::implements) call per abstract type.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Candidate, CandidateSet, ContainerBuilder, Constructor, Injectable, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
/// impl Injectable for English {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::from_default()]
///     }
/// }
///
/// let container = ContainerBuilder::new()
///     .fallback(
///         CandidateSet::new("greeters")
///             .with(Candidate::of::<English>().implements::<dyn Greeter>(|c| c as Arc<dyn Greeter>)),
///     )
///     .build();
///
/// let greeter = container.get_required_trait::<dyn Greeter>();
/// assert_eq!(greeter.greet(), "hello");
/// ```
#[derive(Clone)]
pub struct Candidate {
    concrete: ServiceType,
    upcasts: SmallVec<[Upcast; 2]>,
}

impl Candidate {
    /// Candidate whose concrete type can be constructed automatically.
    pub fn of<C: Injectable>() -> CandidateBuilder<C> {
        CandidateBuilder::new(ServiceType::of::<C>())
    }

    /// Candidate whose concrete type resolves only through a registration.
    pub fn registered<C: Send + Sync + 'static>() -> CandidateBuilder<C> {
        CandidateBuilder::new(ServiceType::registered::<C>())
    }

    /// The concrete type this candidate resolves.
    pub fn concrete(&self) -> ServiceType {
        self.concrete
    }

    /// Returns true when this candidate can satisfy `ty`.
    pub fn is_assignable_to(&self, ty: &ServiceType) -> bool {
        self.upcasts.iter().any(|u| u.target == ty.id())
    }

    /// Names of the abstract types this candidate declares.
    pub fn implemented(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.upcasts.iter().map(|u| u.target_name)
    }

    /// Converts a resolved instance of the concrete type into `ty`.
    ///
    /// `None` when `ty` is not one of the declared abstract types.
    pub(crate) fn upcast(&self, ty: &ServiceType, instance: AnyArc) -> Option<DiResult<AnyArc>> {
        self.upcasts
            .iter()
            .find(|u| u.target == ty.id())
            .map(|u| (u.cast)(instance))
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("concrete", &self.concrete.name())
            .field("implements", &self.implemented().collect::<Vec<_>>())
            .finish()
    }
}

/// Typed builder for a [`Candidate`] with concrete type `C`.
pub struct CandidateBuilder<C> {
    candidate: Candidate,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> CandidateBuilder<C> {
    fn new(concrete: ServiceType) -> Self {
        Self {
            candidate: Candidate {
                concrete,
                upcasts: SmallVec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Declares that `C` is assignable to `I`, converting with `upcast`.
    pub fn implements<I>(mut self, upcast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let cast: UpcastFn = Arc::new(move |instance: AnyArc| {
            let concrete = downcast::<C>(instance)?;
            Ok(erase_trait::<I>(upcast(concrete)))
        });
        self.candidate.upcasts.push(Upcast {
            target: TypeId::of::<I>(),
            target_name: std::any::type_name::<I>(),
            cast,
        });
        self
    }

    /// Finishes the candidate.
    pub fn build(self) -> Candidate {
        self.candidate
    }
}

impl<C> From<CandidateBuilder<C>> for Candidate {
    fn from(builder: CandidateBuilder<C>) -> Self {
        builder.candidate
    }
}

/// An ordered, named source of fallback candidates.
#[derive(Clone, Debug)]
pub struct CandidateSet {
    name: String,
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Creates an empty set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
        }
    }

    /// Appends a candidate, builder style.
    pub fn with(mut self, candidate: impl Into<Candidate>) -> Self {
        self.push(candidate);
        self
    }

    /// Appends a candidate.
    pub fn push(&mut self, candidate: impl Into<Candidate>) {
        self.candidates.push(candidate.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
