//! Declared property types
//!
//! A closed description of the shape a property was declared with. This is
//! what converter resolution dispatches on; runtime values are never
//! inspected for subtype-specific behavior.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::attribute::Item;
use crate::convert::ItemConverter;

use super::errors::{MappingError, MappingResult};
use super::model::Document;
use super::value::ObjectValue;

/// Scalar kinds with built-in converters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
    Binary,
    Date,
    Uuid,
    S3Link,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "String",
            ScalarKind::Binary => "Binary",
            ScalarKind::Date => "DateTime<Utc>",
            ScalarKind::Uuid => "Uuid",
            ScalarKind::S3Link => "S3Link",
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.is_signed() || self.is_unsigned() || self.is_float()
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::U64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, ScalarKind::String | ScalarKind::Char)
    }
}

/// The declared shape of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    Scalar(ScalarKind),
    /// Set of a member type
    Set(Box<DeclaredType>),
    /// List with its element type; `None` for an untyped list
    List(Option<Box<DeclaredType>>),
    /// Map with key and value types; `None` for an untyped map
    Map(Option<(Box<DeclaredType>, Box<DeclaredType>)>),
    /// Any other type, optionally marked as a document
    Object(ObjectType),
}

impl DeclaredType {
    pub fn scalar(kind: ScalarKind) -> Self {
        DeclaredType::Scalar(kind)
    }

    pub fn set_of(member: DeclaredType) -> Self {
        DeclaredType::Set(Box::new(member))
    }

    /// A set whose member type is unknown
    pub fn untyped_set() -> Self {
        DeclaredType::Set(Box::new(DeclaredType::Object(ObjectType::opaque("Object"))))
    }

    pub fn list_of(element: DeclaredType) -> Self {
        DeclaredType::List(Some(Box::new(element)))
    }

    pub fn map_of(key: DeclaredType, value: DeclaredType) -> Self {
        DeclaredType::Map(Some((Box::new(key), Box::new(value))))
    }

    pub fn document<T: Document>() -> Self {
        DeclaredType::Object(ObjectType::document::<T>())
    }

    pub fn opaque(type_name: &'static str) -> Self {
        DeclaredType::Object(ObjectType::opaque(type_name))
    }

    /// Human-readable type name, e.g. `Vec<String>`
    pub fn type_name(&self) -> String {
        match self {
            DeclaredType::Scalar(kind) => kind.name().to_string(),
            DeclaredType::Set(member) => format!("Set<{}>", member.type_name()),
            DeclaredType::List(Some(element)) => format!("List<{}>", element.type_name()),
            DeclaredType::List(None) => "List".to_string(),
            DeclaredType::Map(Some((key, value))) => {
                format!("Map<{}, {}>", key.type_name(), value.type_name())
            }
            DeclaredType::Map(None) => "Map".to_string(),
            DeclaredType::Object(object) => object.name().to_string(),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A non-builtin type. Carries a [`DocumentType`] when it is convertible as
/// a nested document.
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: &'static str,
    document: Option<DocumentType>,
}

impl ObjectType {
    pub fn opaque(name: &'static str) -> Self {
        Self {
            name,
            document: None,
        }
    }

    pub fn document<T: Document>() -> Self {
        let document = DocumentType::of::<T>();
        Self {
            name: document.name,
            document: Some(document),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn document_type(&self) -> Option<&DocumentType> {
        self.document.as_ref()
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.document.as_ref().map(|d| d.type_id)
                == other.document.as_ref().map(|d| d.type_id)
    }
}

impl Eq for ObjectType {}

impl Hash for ObjectType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.document.as_ref().map(|d| d.type_id).hash(state);
    }
}

type MarshalFn = fn(&ObjectValue, &ItemConverter) -> MappingResult<Item>;
type UnmarshalFn = fn(&Item, &ItemConverter) -> MappingResult<ObjectValue>;

/// Conversion entry points of a nested document type.
#[derive(Clone)]
pub struct DocumentType {
    type_id: TypeId,
    name: &'static str,
    marshal: MarshalFn,
    unmarshal: UnmarshalFn,
}

impl DocumentType {
    pub fn of<T: Document>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
            marshal: |value, converter| {
                let document = value.downcast_ref::<T>().ok_or_else(|| {
                    MappingError::invalid_value(format!(
                        "expected {} but found {}",
                        std::any::type_name::<T>(),
                        value.type_name()
                    ))
                })?;
                converter.to_item(document)
            },
            unmarshal: |item, converter| {
                converter.from_item::<T>(Some(item)).map(ObjectValue::new)
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn marshal(
        &self,
        value: &ObjectValue,
        converter: &ItemConverter,
    ) -> MappingResult<Item> {
        (self.marshal)(value, converter)
    }

    pub(crate) fn unmarshal(
        &self,
        item: &Item,
        converter: &ItemConverter,
    ) -> MappingResult<ObjectValue> {
        (self.unmarshal)(item, converter)
    }
}

impl fmt::Debug for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentType")
            .field("name", &self.name)
            .finish()
    }
}

/// Strips the module path from a type name (`a::b::Order` -> `Order`).
fn short_type_name(full: &'static str) -> &'static str {
    if full.contains('<') {
        return full;
    }
    match full.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
