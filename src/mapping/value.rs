//! Domain-side dynamic values
//!
//! Getters produce a [`Value`]; setters consume one. Marshallers translate
//! between [`Value`] and the wire [`AttributeValue`](crate::attribute::AttributeValue).

use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::s3link::S3Link;

/// A domain value read from, or written to, a document property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null element inside a collection
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    String(String),
    Binary(Vec<u8>),
    Date(DateTime<Utc>),
    Uuid(Uuid),
    S3Link(S3Link),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A nested document or an opaque user type
    Object(ObjectValue),
}

impl Value {
    /// Returns a short name of the variant for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Date(_) => "date",
            Value::Uuid(_) => "uuid",
            Value::S3Link(_) => "s3link",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Renders a scalar as text. Returns `None` for collections, objects and
    /// binary data.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::UInt(u) => Some(u.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Char(c) => Some(c.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Date(d) => Some(format_date(d)),
            Value::Uuid(u) => Some(u.hyphenated().to_string()),
            Value::S3Link(link) => link.to_json().ok(),
            Value::Null
            | Value::Binary(_)
            | Value::List(_)
            | Value::Set(_)
            | Value::Map(_)
            | Value::Object(_) => None,
        }
    }

    pub fn object<T: ObjectData>(value: T) -> Self {
        Value::Object(ObjectValue::new(value))
    }
}

/// Formats a date the way the store keeps them: ISO-8601, UTC, milliseconds.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parses an ISO-8601 date into UTC.
pub fn parse_date(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|d| d.with_timezone(&Utc))
}

/// Data that can travel inside [`Value::Object`].
pub trait ObjectData: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_data(&self) -> Box<dyn ObjectData>;
    fn eq_data(&self, other: &dyn ObjectData) -> bool;
    fn data_type_name(&self) -> &'static str;
}

impl<T> ObjectData for T
where
    T: Any + fmt::Debug + Clone + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_data(&self) -> Box<dyn ObjectData> {
        Box::new(self.clone())
    }

    fn eq_data(&self, other: &dyn ObjectData) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn data_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A type-erased object value.
pub struct ObjectValue(Box<dyn ObjectData>);

impl ObjectValue {
    pub fn new<T: ObjectData>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn type_name(&self) -> &'static str {
        self.0.data_type_name()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Recovers the concrete value, or returns the stored type name.
    pub fn downcast<T: Any>(self) -> Result<T, &'static str> {
        let name = self.type_name();
        self.0.into_any().downcast::<T>().map(|b| *b).map_err(|_| name)
    }
}

impl Clone for ObjectValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_data())
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_data(other.0.as_ref())
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_object_roundtrip() {
        let value = ObjectValue::new(Point { x: 1, y: 2 });
        assert!(value.type_name().ends_with("Point"));
        assert_eq!(value.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
        assert_eq!(value.downcast::<Point>().unwrap(), Point { x: 1, y: 2 });
    }

    #[test]
    fn test_object_wrong_downcast() {
        let value = ObjectValue::new(Point { x: 1, y: 2 });
        let err = value.downcast::<String>().unwrap_err();
        assert!(err.ends_with("Point"));
    }

    #[test]
    fn test_object_equality() {
        let a = Value::object(Point { x: 1, y: 2 });
        let b = a.clone();
        let c = Value::object(Point { x: 3, y: 4 });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Value::object("other".to_string()));
    }

    #[test]
    fn test_date_format() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(format_date(&date), "2024-03-09T14:05:00.000Z");
        assert_eq!(parse_date("2024-03-09T14:05:00.000Z").unwrap(), date);
        assert!(parse_date("March 9th").is_err());
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::Int(-3).render().as_deref(), Some("-3"));
        assert_eq!(Value::Char('x').render().as_deref(), Some("x"));
        assert!(Value::List(vec![]).render().is_none());
    }
}
