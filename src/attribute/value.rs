//! Typed attribute values as exchanged with the store
//!
//! Wire shape (one key per value):
//! - `{"S": "text"}`, `{"N": "12.5"}`, `{"B": "<base64>"}`, `{"BOOL": true}`
//! - `{"SS": [..]}`, `{"NS": [..]}`, `{"BS": [..]}`
//! - `{"L": [..]}`, `{"M": {..}}`, `{"NULL": true}`

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A stored item: attribute name to typed value.
pub type Item = HashMap<String, AttributeValue>;

/// Type tag of an [`AttributeValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeType {
    S,
    N,
    B,
    Bool,
    Ss,
    Ns,
    Bs,
    L,
    M,
    Null,
}

impl AttributeType {
    /// Returns the wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::S => "S",
            AttributeType::N => "N",
            AttributeType::B => "B",
            AttributeType::Bool => "BOOL",
            AttributeType::Ss => "SS",
            AttributeType::Ns => "NS",
            AttributeType::Bs => "BS",
            AttributeType::L => "L",
            AttributeType::M => "M",
            AttributeType::Null => "NULL",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single typed value. Exactly one variant is ever populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireValue", into = "WireValue")]
pub enum AttributeValue {
    /// UTF-8 string
    S(String),
    /// Number in decimal text form
    N(String),
    /// Raw bytes
    B(Vec<u8>),
    /// Native boolean
    Bool(bool),
    /// String set
    Ss(Vec<String>),
    /// Number set (decimal text)
    Ns(Vec<String>),
    /// Binary set
    Bs(Vec<Vec<u8>>),
    /// Ordered list of values
    L(Vec<AttributeValue>),
    /// Nested map of values
    M(HashMap<String, AttributeValue>),
    /// Explicit null marker
    Null,
}

impl AttributeValue {
    /// Returns the type tag of the populated variant
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::S(_) => AttributeType::S,
            AttributeValue::N(_) => AttributeType::N,
            AttributeValue::B(_) => AttributeType::B,
            AttributeValue::Bool(_) => AttributeType::Bool,
            AttributeValue::Ss(_) => AttributeType::Ss,
            AttributeValue::Ns(_) => AttributeType::Ns,
            AttributeValue::Bs(_) => AttributeType::Bs,
            AttributeValue::L(_) => AttributeType::L,
            AttributeValue::M(_) => AttributeType::M,
            AttributeValue::Null => AttributeType::Null,
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::L(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_m(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            AttributeValue::M(m) => Some(m),
            _ => None,
        }
    }

    /// Returns true for the explicit null marker
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Serde intermediate mirroring the store's ten optional members.
#[derive(Default, Serialize, Deserialize)]
struct WireValue {
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    s: Option<String>,
    #[serde(rename = "N", default, skip_serializing_if = "Option::is_none")]
    n: Option<String>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    b: Option<String>,
    #[serde(rename = "BOOL", default, skip_serializing_if = "Option::is_none")]
    bool: Option<bool>,
    #[serde(rename = "SS", default, skip_serializing_if = "Option::is_none")]
    ss: Option<Vec<String>>,
    #[serde(rename = "NS", default, skip_serializing_if = "Option::is_none")]
    ns: Option<Vec<String>>,
    #[serde(rename = "BS", default, skip_serializing_if = "Option::is_none")]
    bs: Option<Vec<String>>,
    #[serde(rename = "L", default, skip_serializing_if = "Option::is_none")]
    l: Option<Vec<AttributeValue>>,
    #[serde(rename = "M", default, skip_serializing_if = "Option::is_none")]
    m: Option<HashMap<String, AttributeValue>>,
    #[serde(rename = "NULL", default, skip_serializing_if = "Option::is_none")]
    null: Option<bool>,
}

impl From<AttributeValue> for WireValue {
    fn from(value: AttributeValue) -> Self {
        let mut wire = WireValue::default();
        match value {
            AttributeValue::S(s) => wire.s = Some(s),
            AttributeValue::N(n) => wire.n = Some(n),
            AttributeValue::B(b) => wire.b = Some(STANDARD.encode(b)),
            AttributeValue::Bool(b) => wire.bool = Some(b),
            AttributeValue::Ss(ss) => wire.ss = Some(ss),
            AttributeValue::Ns(ns) => wire.ns = Some(ns),
            AttributeValue::Bs(bs) => {
                wire.bs = Some(bs.iter().map(|b| STANDARD.encode(b)).collect())
            }
            AttributeValue::L(l) => wire.l = Some(l),
            AttributeValue::M(m) => wire.m = Some(m),
            AttributeValue::Null => wire.null = Some(true),
        }
        wire
    }
}

impl TryFrom<WireValue> for AttributeValue {
    type Error = String;

    fn try_from(wire: WireValue) -> Result<Self, Self::Error> {
        let mut found = Vec::with_capacity(1);

        if let Some(s) = wire.s {
            found.push(AttributeValue::S(s));
        }
        if let Some(n) = wire.n {
            found.push(AttributeValue::N(n));
        }
        if let Some(b) = wire.b {
            let bytes = STANDARD
                .decode(b.as_bytes())
                .map_err(|e| format!("invalid base64 in B: {}", e))?;
            found.push(AttributeValue::B(bytes));
        }
        if let Some(b) = wire.bool {
            found.push(AttributeValue::Bool(b));
        }
        if let Some(ss) = wire.ss {
            found.push(AttributeValue::Ss(ss));
        }
        if let Some(ns) = wire.ns {
            found.push(AttributeValue::Ns(ns));
        }
        if let Some(bs) = wire.bs {
            let decoded = bs
                .iter()
                .map(|b| STANDARD.decode(b.as_bytes()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("invalid base64 in BS: {}", e))?;
            found.push(AttributeValue::Bs(decoded));
        }
        if let Some(l) = wire.l {
            found.push(AttributeValue::L(l));
        }
        if let Some(m) = wire.m {
            found.push(AttributeValue::M(m));
        }
        if let Some(null) = wire.null {
            if !null {
                return Err("NULL member must be true".into());
            }
            found.push(AttributeValue::Null);
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err("attribute value has no member populated".into()),
            n => Err(format!(
                "attribute value has {} members populated, expected exactly one",
                n
            )),
        }
    }
}
