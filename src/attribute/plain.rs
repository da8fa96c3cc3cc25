//! Bridge between typed items and plain JSON documents
//!
//! Typed → plain drops the type tags (sets become arrays, binary becomes
//! base64 text). Plain → typed infers S / N / BOOL / NULL / L / M and never
//! produces sets.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use thiserror::Error;

use super::value::{AttributeValue, Item};

/// Errors converting between typed and plain forms
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlainError {
    #[error("Invalid number text: {0}")]
    InvalidNumber(String),

    #[error("Plain document root must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// Converts a typed value into plain JSON.
pub fn to_plain(value: &AttributeValue) -> Result<Value, PlainError> {
    Ok(match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::B(b) => Value::String(STANDARD.encode(b)),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Ss(ss) => Value::Array(ss.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(ns) => Value::Array(
            ns.iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Bs(bs) => Value::Array(
            bs.iter()
                .map(|b| Value::String(STANDARD.encode(b)))
                .collect(),
        ),
        AttributeValue::L(l) => Value::Array(l.iter().map(to_plain).collect::<Result<_, _>>()?),
        AttributeValue::M(m) => Value::Object(map_to_plain(m)?),
        AttributeValue::Null => Value::Null,
    })
}

/// Converts a whole item into a plain JSON object.
pub fn item_to_plain(item: &Item) -> Result<Value, PlainError> {
    Ok(Value::Object(map_to_plain(item)?))
}

/// Converts plain JSON into a typed value.
pub fn from_plain(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(a) => AttributeValue::L(a.iter().map(from_plain).collect()),
        Value::Object(o) => AttributeValue::M(
            o.iter()
                .map(|(k, v)| (k.clone(), from_plain(v)))
                .collect(),
        ),
    }
}

/// Converts a plain JSON object into an item.
pub fn item_from_plain(value: &Value) -> Result<Item, PlainError> {
    match value {
        Value::Object(o) => Ok(o
            .iter()
            .map(|(k, v)| (k.clone(), from_plain(v)))
            .collect()),
        other => Err(PlainError::NotAnObject(json_type_name(other))),
    }
}

fn map_to_plain(map: &HashMap<String, AttributeValue>) -> Result<Map<String, Value>, PlainError> {
    // Sorted for stable output
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut out = Map::new();
    for key in keys {
        out.insert(key.clone(), to_plain(&map[key])?);
    }
    Ok(out)
}

fn parse_number(text: &str) -> Result<Number, PlainError> {
    text.trim()
        .parse::<Number>()
        .map_err(|_| PlainError::InvalidNumber(text.to_string()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
