//! Compile-time type descriptors for property types
//!
//! [`Attribute`] ties a Rust type to its [`DeclaredType`] and to the
//! [`Value`] it reads and writes. Registering a property through the model
//! builder picks these up, so declared types never need to be spelled out.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use uuid::Uuid;

use crate::s3link::S3Link;

use super::declared::{DeclaredType, ScalarKind};
use super::errors::ValueError;
use super::model::Document;
use super::value::{ObjectValue, Value};

/// A property type the converter knows how to describe.
pub trait Attribute: Sized + 'static {
    /// The declared type used for converter resolution
    fn declared_type() -> DeclaredType;

    /// Reads the value. `None` means absent and is skipped on marshal.
    fn to_value(&self) -> Option<Value>;

    /// Builds the field value from an unmarshalled value.
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

/// Binary content stored as a `B` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Binary(pub Vec<u8>);

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Binary(bytes)
    }
}

impl From<&[u8]> for Binary {
    fn from(bytes: &[u8]) -> Self {
        Binary(bytes.to_vec())
    }
}

impl Attribute for bool {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Bool)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ValueError::wrong_shape("bool", other.kind_name())),
        }
    }
}

macro_rules! signed_attribute {
    ($($ty:ty => $kind:ident),*) => {$(
        impl Attribute for $ty {
            fn declared_type() -> DeclaredType {
                DeclaredType::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::Int(*self as i64))
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                let out_of_range = |v: String| ValueError::OutOfRange {
                    value: v,
                    target: stringify!($ty),
                };
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range(i.to_string())),
                    Value::UInt(u) => <$ty>::try_from(u).map_err(|_| out_of_range(u.to_string())),
                    other => Err(ValueError::wrong_shape(stringify!($ty), other.kind_name())),
                }
            }
        }
    )*};
}

macro_rules! unsigned_attribute {
    ($($ty:ty => $kind:ident),*) => {$(
        impl Attribute for $ty {
            fn declared_type() -> DeclaredType {
                DeclaredType::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::UInt(*self as u64))
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                let out_of_range = |v: String| ValueError::OutOfRange {
                    value: v,
                    target: stringify!($ty),
                };
                match value {
                    Value::UInt(u) => <$ty>::try_from(u).map_err(|_| out_of_range(u.to_string())),
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range(i.to_string())),
                    other => Err(ValueError::wrong_shape(stringify!($ty), other.kind_name())),
                }
            }
        }
    )*};
}

signed_attribute!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
unsigned_attribute!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);

impl Attribute for f64 {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::F64)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::UInt(u) => Ok(u as f64),
            other => Err(ValueError::wrong_shape("f64", other.kind_name())),
        }
    }
}

impl Attribute for f32 {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::F32)
    }

    /// Widens through the shortest text form so `1.1f32` stays `1.1`.
    fn to_value(&self) -> Option<Value> {
        let widened = self.to_string().parse().unwrap_or(f64::from(*self));
        Some(Value::Float(widened))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl Attribute for char {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Char)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Char(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Char(c) => Ok(c),
            other => Err(ValueError::wrong_shape("char", other.kind_name())),
        }
    }
}

impl Attribute for String {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::String)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::String(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(ValueError::wrong_shape("string", other.kind_name())),
        }
    }
}

impl Attribute for Binary {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Binary)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Binary(self.0.clone()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Binary(b) => Ok(Binary(b)),
            other => Err(ValueError::wrong_shape("binary", other.kind_name())),
        }
    }
}

impl Attribute for DateTime<Utc> {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Date)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Date(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(ValueError::wrong_shape("date", other.kind_name())),
        }
    }
}

impl Attribute for Uuid {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::Uuid)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Uuid(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Uuid(u) => Ok(u),
            other => Err(ValueError::wrong_shape("uuid", other.kind_name())),
        }
    }
}

impl Attribute for S3Link {
    fn declared_type() -> DeclaredType {
        DeclaredType::Scalar(ScalarKind::S3Link)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::S3Link(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::S3Link(link) => Ok(link),
            other => Err(ValueError::wrong_shape("s3link", other.kind_name())),
        }
    }
}

impl<T: Attribute> Attribute for Option<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type()
    }

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(Attribute::to_value)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Attribute> Attribute for Vec<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::list_of(T::declared_type())
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::List(
            self.iter()
                .map(|v| v.to_value().unwrap_or(Value::Null))
                .collect(),
        ))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::wrong_shape("list", other.kind_name())),
        }
    }
}

/// Empty sets cannot be stored, so they read as absent.
fn set_value<'a, T: Attribute + 'a>(members: impl Iterator<Item = &'a T>) -> Option<Value> {
    let values: Vec<Value> = members.filter_map(Attribute::to_value).collect();
    if values.is_empty() {
        None
    } else {
        Some(Value::Set(values))
    }
}

impl<T: Attribute + Eq + Hash> Attribute for HashSet<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::set_of(T::declared_type())
    }

    fn to_value(&self) -> Option<Value> {
        set_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Set(items) | Value::List(items) => {
                items.into_iter().map(T::from_value).collect()
            }
            // An empty set was written as absent
            Value::Null => Ok(Self::new()),
            other => Err(ValueError::wrong_shape("set", other.kind_name())),
        }
    }
}

impl<T: Attribute + Ord> Attribute for BTreeSet<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::set_of(T::declared_type())
    }

    fn to_value(&self) -> Option<Value> {
        set_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Set(items) | Value::List(items) => {
                items.into_iter().map(T::from_value).collect()
            }
            // An empty set was written as absent
            Value::Null => Ok(Self::new()),
            other => Err(ValueError::wrong_shape("set", other.kind_name())),
        }
    }
}

fn map_value<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Option<Value>
where
    K: Attribute + 'a,
    V: Attribute + 'a,
{
    let mut out = BTreeMap::new();
    for (key, value) in entries {
        // Non-text keys are rejected at resolution, before this value is marshalled
        let Some(key) = key.to_value().and_then(|k| k.render()) else {
            continue;
        };
        out.insert(key, value.to_value().unwrap_or(Value::Null));
    }
    Some(Value::Map(out))
}

impl<K, V> Attribute for HashMap<K, V>
where
    K: Attribute + Eq + Hash,
    V: Attribute,
{
    fn declared_type() -> DeclaredType {
        DeclaredType::map_of(K::declared_type(), V::declared_type())
    }

    fn to_value(&self) -> Option<Value> {
        map_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(Value::String(k))?, V::from_value(v)?)))
                .collect(),
            other => Err(ValueError::wrong_shape("map", other.kind_name())),
        }
    }
}

impl<K, V> Attribute for BTreeMap<K, V>
where
    K: Attribute + Ord,
    V: Attribute,
{
    fn declared_type() -> DeclaredType {
        DeclaredType::map_of(K::declared_type(), V::declared_type())
    }

    fn to_value(&self) -> Option<Value> {
        map_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(Value::String(k))?, V::from_value(v)?)))
                .collect(),
            other => Err(ValueError::wrong_shape("map", other.kind_name())),
        }
    }
}

impl<T: Document> Attribute for T {
    fn declared_type() -> DeclaredType {
        DeclaredType::document::<T>()
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Object(ObjectValue::new(self.clone())))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Object(object) => object
                .downcast::<T>()
                .map_err(|found| ValueError::wrong_shape(std::any::type_name::<T>(), found)),
            other => Err(ValueError::wrong_shape("document", other.kind_name())),
        }
    }
}
