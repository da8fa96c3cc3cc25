//! Conversion between documents and items
//!
//! - [`ConversionSchema`]: ordered marshaller and unmarshaller registries
//! - [`ItemConverter`]: recursive document conversion under one schema
//! - [`FieldModelCache`]: resolved field models, owned by each converter
//!
//! # Invariants
//!
//! - A marshaller produces exactly one wire type
//! - Wire types are checked before any parsing
//! - Resolution dispatches on declared types, first match wins

mod converter;
mod custom;
mod field;
mod marshaller;
mod registry;
mod schema;

pub use converter::ItemConverter;
pub use custom::{CustomMarshaller, JsonMarshaller};
pub use field::{FieldModel, FieldModelCache};
pub use marshaller::{
    unmarshall_checked, BinaryMarshaller, BinarySetMarshaller, BinarySetUnmarshaller,
    BinaryUnmarshaller, BoolSetToList, BoolSetToNumberSet, BoolSetUnmarshaller, BoolToBool,
    BoolToNumber, BoolUnmarshaller, DocumentMarshaller, DocumentUnmarshaller, ListMarshaller,
    ListUnmarshaller, MapMarshaller, MapUnmarshaller, Marshaller, NumberMarshaller,
    NumberSetMarshaller, NumberSetUnmarshaller, NumberUnmarshaller, ObjectSetToStringSet,
    StringSetMarshaller, StringSetUnmarshaller, TextMarshaller, TextUnmarshaller, Unmarshaller,
};
pub use registry::{MarshallerRegistry, Registry, Rule, TypeMatcher, UnmarshallerRegistry};
pub use schema::{ConversionSchema, ConversionSchemaKind, SchemaBuilder};
