//! Domain type registration
//!
//! Explicit registration stands in for runtime reflection:
//! - [`Attribute`] describes a Rust field type at compile time
//! - [`Document`] marks a type convertible as a whole item
//! - [`DocumentModel`] lists a document's properties in declaration order
//!
//! # Invariants
//!
//! - Resolution dispatches on [`DeclaredType`], never on runtime values
//! - Absent values (`None`) are never written

mod attribute;
mod declared;
mod errors;
mod model;
mod value;

pub use attribute::{Attribute, Binary};
pub use declared::{DeclaredType, DocumentType, ObjectType, ScalarKind};
pub use errors::{BoxError, FieldContext, MappingError, MappingResult, ValueError};
pub use model::{Document, DocumentModel, FieldConfig, ModelBuilder, PropertyDef};
pub use value::{format_date, parse_date, ObjectData, ObjectValue, Value};

