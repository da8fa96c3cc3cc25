//! Ordered converter registries
//!
//! Each registry holds two ordered tables of `(TypeMatcher, converter)`
//! rows: one for scalar and structural types, one for set members. The first
//! matching row wins. Registries are built once and only read afterwards.

use std::fmt;
use std::sync::Arc;

use crate::mapping::{DeclaredType, MappingError, MappingResult, ScalarKind};

use super::marshaller::{Marshaller, Unmarshaller};

/// A closed predicate over declared types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMatcher {
    /// Exactly this scalar kind
    Kind(ScalarKind),
    /// Any integer or float kind
    Numeric,
    /// `String` or `char`
    Textual,
    /// A list of any element type
    List,
    /// A map of any key and value type
    Map,
    /// Every type; only meaningful as the last row
    Any,
}

impl TypeMatcher {
    pub fn matches(&self, declared: &DeclaredType) -> bool {
        match (self, declared) {
            (TypeMatcher::Any, _) => true,
            (TypeMatcher::Kind(kind), DeclaredType::Scalar(other)) => kind == other,
            (TypeMatcher::Numeric, DeclaredType::Scalar(kind)) => kind.is_numeric(),
            (TypeMatcher::Textual, DeclaredType::Scalar(kind)) => kind.is_textual(),
            (TypeMatcher::List, DeclaredType::List(_)) => true,
            (TypeMatcher::Map, DeclaredType::Map(_)) => true,
            _ => false,
        }
    }
}

/// What a scalar table row resolves to.
///
/// `List`, `Map` and `Document` are placeholders that the converter
/// augments with member converters derived from the declared type.
pub enum Rule<C: ?Sized> {
    Convert(Arc<C>),
    List,
    Map,
    Document,
}

impl<C: ?Sized> Clone for Rule<C> {
    fn clone(&self) -> Self {
        match self {
            Rule::Convert(converter) => Rule::Convert(Arc::clone(converter)),
            Rule::List => Rule::List,
            Rule::Map => Rule::Map,
            Rule::Document => Rule::Document,
        }
    }
}

impl<C: ?Sized + fmt::Debug> fmt::Debug for Rule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Convert(converter) => f.debug_tuple("Convert").field(converter).finish(),
            Rule::List => write!(f, "List"),
            Rule::Map => write!(f, "Map"),
            Rule::Document => write!(f, "Document"),
        }
    }
}

/// Ordered scalar and set-member tables for one conversion direction.
pub struct Registry<C: ?Sized> {
    scalars: Vec<(TypeMatcher, Rule<C>)>,
    sets: Vec<(TypeMatcher, Arc<C>)>,
}

pub type MarshallerRegistry = Registry<dyn Marshaller>;
pub type UnmarshallerRegistry = Registry<dyn Unmarshaller>;

impl<C: ?Sized> Registry<C> {
    pub fn new() -> Self {
        Self {
            scalars: Vec::new(),
            sets: Vec::new(),
        }
    }

    pub fn push_scalar(&mut self, matcher: TypeMatcher, rule: Rule<C>) {
        self.scalars.push((matcher, rule));
    }

    /// Inserts a row ahead of every existing one.
    pub fn push_scalar_first(&mut self, matcher: TypeMatcher, rule: Rule<C>) {
        self.scalars.insert(0, (matcher, rule));
    }

    pub fn push_set(&mut self, matcher: TypeMatcher, converter: Arc<C>) {
        self.sets.push((matcher, converter));
    }

    pub fn push_set_first(&mut self, matcher: TypeMatcher, converter: Arc<C>) {
        self.sets.insert(0, (matcher, converter));
    }

    /// First matching scalar row.
    pub fn resolve_scalar(&self, declared: &DeclaredType) -> MappingResult<Rule<C>> {
        self.scalars
            .iter()
            .find(|(matcher, _)| matcher.matches(declared))
            .map(|(_, rule)| rule.clone())
            .ok_or_else(|| MappingError::unresolvable(declared.type_name()))
    }

    /// First matching set-member row for a set of `member`.
    pub fn resolve_set(&self, member: &DeclaredType) -> MappingResult<Arc<C>> {
        self.sets
            .iter()
            .find(|(matcher, _)| matcher.matches(member))
            .map(|(_, converter)| Arc::clone(converter))
            .ok_or_else(|| {
                MappingError::unresolvable(DeclaredType::set_of(member.clone()).type_name())
            })
    }

    pub fn scalar_rows(&self) -> usize {
        self.scalars.len()
    }

    pub fn set_rows(&self) -> usize {
        self.sets.len()
    }
}

impl<C: ?Sized> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> Clone for Registry<C> {
    fn clone(&self) -> Self {
        Self {
            scalars: self.scalars.clone(),
            sets: self
                .sets
                .iter()
                .map(|(matcher, converter)| (*matcher, Arc::clone(converter)))
                .collect(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("scalars", &self.scalars.iter().map(|(m, _)| m).collect::<Vec<_>>())
            .field("sets", &self.sets.iter().map(|(m, _)| m).collect::<Vec<_>>())
            .finish()
    }
}
