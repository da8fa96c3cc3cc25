//! Marshaller and unmarshaller contracts and the standard converters
//!
//! A marshaller produces exactly one wire type. An unmarshaller declares the
//! wire types it accepts; the converter checks them before any parsing.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::attribute::{AttributeType, AttributeValue};
use crate::mapping::{format_date, parse_date, DocumentType, MappingError, MappingResult, ScalarKind, Value};
use crate::s3link::S3Link;

use super::converter::ItemConverter;

/// Converts a domain value into a wire value.
pub trait Marshaller: Send + Sync + fmt::Debug {
    /// Wire type produced
    fn attribute_type(&self) -> AttributeType;

    fn marshall(&self, value: &Value, converter: &ItemConverter) -> MappingResult<AttributeValue>;
}

/// Converts a wire value into a domain value.
pub trait Unmarshaller: Send + Sync + fmt::Debug {
    /// Wire types accepted
    fn accepts(&self) -> &[AttributeType];

    fn unmarshall(&self, value: &AttributeValue, converter: &ItemConverter)
        -> MappingResult<Value>;
}

/// Checks the wire type, then unmarshalls. `NULL` always reads as [`Value::Null`].
pub fn unmarshall_checked(
    unmarshaller: &dyn Unmarshaller,
    value: &AttributeValue,
    converter: &ItemConverter,
) -> MappingResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let actual = value.attribute_type();
    if !unmarshaller.accepts().contains(&actual) {
        return Err(MappingError::type_mismatch(unmarshaller.accepts(), actual));
    }
    unmarshaller.unmarshall(value, converter)
}

fn unexpected(expected: &str, value: &Value) -> MappingError {
    MappingError::invalid_value(format!("expected {} but found {}", expected, value.kind_name()))
}

/// Short rendering of a wire value for error messages.
pub(crate) fn describe(value: &AttributeValue) -> String {
    let text = format!("{:?}", value);
    if text.len() > 64 {
        let mut end = 61;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text
    }
}

fn number_text(value: &Value) -> MappingResult<String> {
    match value {
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        Value::Float(f) if f.is_finite() => Ok(f.to_string()),
        Value::Float(f) => Err(MappingError::invalid_value(format!(
            "{} cannot be stored as a number",
            f
        ))),
        other => Err(unexpected("number", other)),
    }
}

fn parse_number(kind: ScalarKind, text: &str) -> MappingResult<Value> {
    let trimmed = text.trim();
    if kind.is_signed() {
        trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| MappingError::parse_failure(text, e))
    } else if kind.is_unsigned() {
        trimmed
            .parse::<u64>()
            .map(Value::UInt)
            .map_err(|e| MappingError::parse_failure(text, e))
    } else {
        trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| MappingError::parse_failure(text, e))
    }
}

fn bool_number(value: &Value) -> MappingResult<String> {
    match value {
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok("0".to_string()),
        other => Err(unexpected("bool", other)),
    }
}

fn text_scalar(kind: ScalarKind, text: &str) -> MappingResult<Value> {
    match kind {
        ScalarKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(MappingError::parse_failure(
                    text,
                    "expected exactly one character",
                )),
            }
        }
        ScalarKind::Date => parse_date(text)
            .map(Value::Date)
            .map_err(|e| MappingError::parse_failure(text, e)),
        ScalarKind::Uuid => Uuid::parse_str(text)
            .map(Value::Uuid)
            .map_err(|e| MappingError::parse_failure(text, e)),
        ScalarKind::S3Link => S3Link::from_json(text)
            .map(Value::S3Link)
            .map_err(|e| MappingError::parse_failure(text, e)),
        _ => Ok(Value::String(text.to_string())),
    }
}

fn scalar_text(value: &Value) -> MappingResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Char(c) => Ok(c.to_string()),
        Value::Date(d) => Ok(format_date(d)),
        Value::Uuid(u) => Ok(u.hyphenated().to_string()),
        Value::S3Link(link) => link
            .to_json()
            .map_err(|e| MappingError::invalid_value(format!("unserializable link: {}", e))),
        other => Err(unexpected("text", other)),
    }
}

fn members<'a>(value: &'a Value) -> MappingResult<&'a [Value]> {
    match value {
        Value::Set(items) | Value::List(items) => Ok(items),
        other => Err(unexpected("set", other)),
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Boolean as `N` with `1` / `0`.
#[derive(Debug)]
pub struct BoolToNumber;

impl Marshaller for BoolToNumber {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::N
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        bool_number(value).map(AttributeValue::N)
    }
}

/// Boolean as native `BOOL`.
#[derive(Debug)]
pub struct BoolToBool;

impl Marshaller for BoolToBool {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::Bool
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        match value {
            Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
            other => Err(unexpected("bool", other)),
        }
    }
}

/// Reads booleans from the listed wire types. `N` is true only for `"1"`.
#[derive(Debug)]
pub struct BoolUnmarshaller {
    accepts: Vec<AttributeType>,
}

impl BoolUnmarshaller {
    pub fn number_only() -> Self {
        Self {
            accepts: vec![AttributeType::N],
        }
    }

    pub fn lenient() -> Self {
        Self {
            accepts: vec![AttributeType::Bool, AttributeType::N],
        }
    }
}

impl Unmarshaller for BoolUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &self.accepts
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
            AttributeValue::N(n) => Ok(Value::Bool(n.trim() == "1")),
            other => Err(MappingError::type_mismatch(&self.accepts, other.attribute_type())),
        }
    }
}

/// Any numeric kind as `N`.
#[derive(Debug)]
pub struct NumberMarshaller;

impl Marshaller for NumberMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::N
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        number_text(value).map(AttributeValue::N)
    }
}

/// Reads `N` into the numeric family of `kind`.
#[derive(Debug)]
pub struct NumberUnmarshaller {
    kind: ScalarKind,
}

impl NumberUnmarshaller {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl Unmarshaller for NumberUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::N]
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::N(n) => parse_number(self.kind, n),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

/// Text-like scalars (strings, chars, dates, uuids, links) as `S`.
#[derive(Debug)]
pub struct TextMarshaller;

impl Marshaller for TextMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::S
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        scalar_text(value).map(AttributeValue::S)
    }
}

/// Reads `S` into the text-like scalar `kind`.
#[derive(Debug)]
pub struct TextUnmarshaller {
    kind: ScalarKind,
}

impl TextUnmarshaller {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl Unmarshaller for TextUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::S]
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::S(s) => text_scalar(self.kind, s),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

/// Binary as `B`.
#[derive(Debug)]
pub struct BinaryMarshaller;

impl Marshaller for BinaryMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::B
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        match value {
            Value::Binary(b) => Ok(AttributeValue::B(b.clone())),
            other => Err(unexpected("binary", other)),
        }
    }
}

#[derive(Debug)]
pub struct BinaryUnmarshaller;

impl Unmarshaller for BinaryUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::B]
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::B(b) => Ok(Value::Binary(b.clone())),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

// ---------------------------------------------------------------------------
// Sets
// ---------------------------------------------------------------------------

/// Text-like set members as `SS`.
#[derive(Debug)]
pub struct StringSetMarshaller;

impl Marshaller for StringSetMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::Ss
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        members(value)?
            .iter()
            .map(scalar_text)
            .collect::<MappingResult<Vec<_>>>()
            .map(AttributeValue::Ss)
    }
}

#[derive(Debug)]
pub struct StringSetUnmarshaller {
    kind: ScalarKind,
}

impl StringSetUnmarshaller {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl Unmarshaller for StringSetUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::Ss]
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::Ss(ss) => ss
                .iter()
                .map(|s| text_scalar(self.kind, s))
                .collect::<MappingResult<Vec<_>>>()
                .map(Value::Set),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

/// Numeric set members as `NS`.
#[derive(Debug)]
pub struct NumberSetMarshaller;

impl Marshaller for NumberSetMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::Ns
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        members(value)?
            .iter()
            .map(number_text)
            .collect::<MappingResult<Vec<_>>>()
            .map(AttributeValue::Ns)
    }
}

#[derive(Debug)]
pub struct NumberSetUnmarshaller {
    kind: ScalarKind,
}

impl NumberSetUnmarshaller {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl Unmarshaller for NumberSetUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::Ns]
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::Ns(ns) => ns
                .iter()
                .map(|n| parse_number(self.kind, n))
                .collect::<MappingResult<Vec<_>>>()
                .map(Value::Set),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

/// Binary set members as `BS`.
#[derive(Debug)]
pub struct BinarySetMarshaller;

impl Marshaller for BinarySetMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::Bs
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        members(value)?
            .iter()
            .map(|member| match member {
                Value::Binary(b) => Ok(b.clone()),
                other => Err(unexpected("binary", other)),
            })
            .collect::<MappingResult<Vec<_>>>()
            .map(AttributeValue::Bs)
    }
}

#[derive(Debug)]
pub struct BinarySetUnmarshaller;

impl Unmarshaller for BinarySetUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::Bs]
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::Bs(bs) => Ok(Value::Set(bs.iter().cloned().map(Value::Binary).collect())),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

/// Boolean set members as `NS` of `1` / `0`.
#[derive(Debug)]
pub struct BoolSetToNumberSet;

impl Marshaller for BoolSetToNumberSet {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::Ns
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        members(value)?
            .iter()
            .map(bool_number)
            .collect::<MappingResult<Vec<_>>>()
            .map(AttributeValue::Ns)
    }
}

/// Boolean set members as an `L` of `BOOL`; there is no native boolean set.
#[derive(Debug)]
pub struct BoolSetToList;

impl Marshaller for BoolSetToList {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::L
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        members(value)?
            .iter()
            .map(|member| match member {
                Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
                other => Err(unexpected("bool", other)),
            })
            .collect::<MappingResult<Vec<_>>>()
            .map(AttributeValue::L)
    }
}

/// Reads boolean sets from `NS` and / or an `L` of `BOOL`.
#[derive(Debug)]
pub struct BoolSetUnmarshaller {
    accepts: Vec<AttributeType>,
}

impl BoolSetUnmarshaller {
    pub fn number_set_only() -> Self {
        Self {
            accepts: vec![AttributeType::Ns],
        }
    }

    pub fn lenient() -> Self {
        Self {
            accepts: vec![AttributeType::L, AttributeType::Ns],
        }
    }
}

impl Unmarshaller for BoolSetUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &self.accepts
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::Ns(ns) => Ok(Value::Set(
                ns.iter().map(|n| Value::Bool(n.trim() == "1")).collect(),
            )),
            AttributeValue::L(items) => items
                .iter()
                .map(|item| match item {
                    AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
                    other => Err(MappingError::type_mismatch(
                        &[AttributeType::Bool],
                        other.attribute_type(),
                    )),
                })
                .collect::<MappingResult<Vec<_>>>()
                .map(Value::Set),
            other => Err(MappingError::type_mismatch(&self.accepts, other.attribute_type())),
        }
    }
}

/// Legacy catch-all: renders any scalar member as text into an `SS`.
#[derive(Debug)]
pub struct ObjectSetToStringSet;

impl Marshaller for ObjectSetToStringSet {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::Ss
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        members(value)?
            .iter()
            .map(|member| {
                member.render().ok_or_else(|| {
                    MappingError::invalid_value(format!(
                        "set member of kind {} has no text form",
                        member.kind_name()
                    ))
                })
            })
            .collect::<MappingResult<Vec<_>>>()
            .map(AttributeValue::Ss)
    }
}

// ---------------------------------------------------------------------------
// Augmented collection and document converters
// ---------------------------------------------------------------------------

/// `L` whose elements use `member`.
#[derive(Debug)]
pub struct ListMarshaller {
    member: Arc<dyn Marshaller>,
}

impl ListMarshaller {
    pub fn new(member: Arc<dyn Marshaller>) -> Self {
        Self { member }
    }
}

impl Marshaller for ListMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::L
    }

    fn marshall(&self, value: &Value, converter: &ItemConverter) -> MappingResult<AttributeValue> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(unexpected("list", other)),
        };
        items
            .iter()
            .map(|item| match item {
                Value::Null => Ok(AttributeValue::Null),
                item => self.member.marshall(item, converter),
            })
            .collect::<MappingResult<Vec<_>>>()
            .map(AttributeValue::L)
    }
}

#[derive(Debug)]
pub struct ListUnmarshaller {
    member: Arc<dyn Unmarshaller>,
}

impl ListUnmarshaller {
    pub fn new(member: Arc<dyn Unmarshaller>) -> Self {
        Self { member }
    }
}

impl Unmarshaller for ListUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::L]
    }

    fn unmarshall(&self, value: &AttributeValue, converter: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::L(items) => items
                .iter()
                .map(|item| unmarshall_checked(self.member.as_ref(), item, converter))
                .collect::<MappingResult<Vec<_>>>()
                .map(Value::List),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

/// `M` whose values use `member`. Keys are always text.
#[derive(Debug)]
pub struct MapMarshaller {
    member: Arc<dyn Marshaller>,
}

impl MapMarshaller {
    pub fn new(member: Arc<dyn Marshaller>) -> Self {
        Self { member }
    }
}

impl Marshaller for MapMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::M
    }

    fn marshall(&self, value: &Value, converter: &ItemConverter) -> MappingResult<AttributeValue> {
        let entries = match value {
            Value::Map(entries) => entries,
            other => return Err(unexpected("map", other)),
        };
        let mut out = HashMap::with_capacity(entries.len());
        for (key, item) in entries {
            let wire = match item {
                Value::Null => AttributeValue::Null,
                item => self.member.marshall(item, converter)?,
            };
            out.insert(key.clone(), wire);
        }
        Ok(AttributeValue::M(out))
    }
}

#[derive(Debug)]
pub struct MapUnmarshaller {
    member: Arc<dyn Unmarshaller>,
}

impl MapUnmarshaller {
    pub fn new(member: Arc<dyn Unmarshaller>) -> Self {
        Self { member }
    }
}

impl Unmarshaller for MapUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::M]
    }

    fn unmarshall(&self, value: &AttributeValue, converter: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::M(entries) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    let value = unmarshall_checked(self.member.as_ref(), item, converter)?;
                    out.insert(key.clone(), value);
                }
                Ok(Value::Map(out))
            }
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

/// Nested document as `M`, converted through the same converter.
#[derive(Debug)]
pub struct DocumentMarshaller {
    document: DocumentType,
}

impl DocumentMarshaller {
    pub fn new(document: DocumentType) -> Self {
        Self { document }
    }
}

impl Marshaller for DocumentMarshaller {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::M
    }

    fn marshall(&self, value: &Value, converter: &ItemConverter) -> MappingResult<AttributeValue> {
        match value {
            Value::Object(object) => self
                .document
                .marshal(object, converter)
                .map(AttributeValue::M),
            other => Err(unexpected(self.document.name(), other)),
        }
    }
}

#[derive(Debug)]
pub struct DocumentUnmarshaller {
    document: DocumentType,
}

impl DocumentUnmarshaller {
    pub fn new(document: DocumentType) -> Self {
        Self { document }
    }
}

impl Unmarshaller for DocumentUnmarshaller {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::M]
    }

    fn unmarshall(&self, value: &AttributeValue, converter: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::M(item) => self
                .document
                .unmarshal(item, converter)
                .map(Value::Object),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}
