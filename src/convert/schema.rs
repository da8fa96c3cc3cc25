//! Conversion schemas
//!
//! A schema pairs a marshaller registry with an unmarshaller registry. The
//! three predefined schemas differ only in how booleans and sets of
//! arbitrary objects are encoded:
//!
//! | schema          | bool out | bool in   | set<bool> out | set<object>  |
//! |-----------------|----------|-----------|---------------|--------------|
//! | `V1`            | N 1/0    | N         | NS            | SS           |
//! | `V2_COMPATIBLE` | N 1/0    | N or BOOL | NS            | SS           |
//! | `V2`            | BOOL     | BOOL or N | L of BOOL     | unresolvable |

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::mapping::ScalarKind;

use super::marshaller::*;
use super::registry::{MarshallerRegistry, Rule, TypeMatcher, UnmarshallerRegistry};

/// Names a predefined schema in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSchemaKind {
    V1,
    V2Compatible,
    #[default]
    V2,
}

impl ConversionSchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionSchemaKind::V1 => "V1",
            ConversionSchemaKind::V2Compatible => "V2_COMPATIBLE",
            ConversionSchemaKind::V2 => "V2",
        }
    }
}

impl fmt::Display for ConversionSchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable pair of registries. Cloning shares them.
#[derive(Clone)]
pub struct ConversionSchema {
    name: Arc<str>,
    marshallers: Arc<MarshallerRegistry>,
    unmarshallers: Arc<UnmarshallerRegistry>,
}

const TEXT_KINDS: [ScalarKind; 5] = [
    ScalarKind::String,
    ScalarKind::Char,
    ScalarKind::Date,
    ScalarKind::Uuid,
    ScalarKind::S3Link,
];

const NUMERIC_KINDS: [ScalarKind; 10] = [
    ScalarKind::I8,
    ScalarKind::I16,
    ScalarKind::I32,
    ScalarKind::I64,
    ScalarKind::U8,
    ScalarKind::U16,
    ScalarKind::U32,
    ScalarKind::U64,
    ScalarKind::F32,
    ScalarKind::F64,
];

impl ConversionSchema {
    /// Legacy: booleans as numbers, read only from numbers.
    pub fn v1() -> Self {
        static SCHEMA: OnceLock<ConversionSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| Self::standard(ConversionSchemaKind::V1))
            .clone()
    }

    /// Legacy writes, lenient reads.
    pub fn v2_compatible() -> Self {
        static SCHEMA: OnceLock<ConversionSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| Self::standard(ConversionSchemaKind::V2Compatible))
            .clone()
    }

    /// Native booleans; no catch-all for sets of objects.
    pub fn v2() -> Self {
        static SCHEMA: OnceLock<ConversionSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| Self::standard(ConversionSchemaKind::V2))
            .clone()
    }

    pub fn from_kind(kind: ConversionSchemaKind) -> Self {
        match kind {
            ConversionSchemaKind::V1 => Self::v1(),
            ConversionSchemaKind::V2Compatible => Self::v2_compatible(),
            ConversionSchemaKind::V2 => Self::v2(),
        }
    }

    /// Starts a custom schema from a predefined one.
    pub fn builder(base: ConversionSchemaKind) -> SchemaBuilder {
        let schema = Self::from_kind(base);
        SchemaBuilder {
            name: format!("{}+custom", base.as_str()),
            marshallers: (*schema.marshallers).clone(),
            unmarshallers: (*schema.unmarshallers).clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marshallers(&self) -> &MarshallerRegistry {
        &self.marshallers
    }

    pub fn unmarshallers(&self) -> &UnmarshallerRegistry {
        &self.unmarshallers
    }

    /// True if both schemas share the same registries
    pub fn same_as(&self, other: &ConversionSchema) -> bool {
        Arc::ptr_eq(&self.marshallers, &other.marshallers)
            && Arc::ptr_eq(&self.unmarshallers, &other.unmarshallers)
    }

    fn standard(kind: ConversionSchemaKind) -> Self {
        let legacy = kind != ConversionSchemaKind::V2;
        let mut marshallers = MarshallerRegistry::new();
        let mut unmarshallers = UnmarshallerRegistry::new();

        // Scalars
        let bool_out: Arc<dyn Marshaller> = if legacy {
            Arc::new(BoolToNumber)
        } else {
            Arc::new(BoolToBool)
        };
        let bool_in: Arc<dyn Unmarshaller> = if kind == ConversionSchemaKind::V1 {
            Arc::new(BoolUnmarshaller::number_only())
        } else {
            Arc::new(BoolUnmarshaller::lenient())
        };
        marshallers.push_scalar(TypeMatcher::Kind(ScalarKind::Bool), Rule::Convert(bool_out));
        unmarshallers.push_scalar(TypeMatcher::Kind(ScalarKind::Bool), Rule::Convert(bool_in));

        marshallers.push_scalar(TypeMatcher::Numeric, Rule::Convert(Arc::new(NumberMarshaller)));
        for scalar in NUMERIC_KINDS {
            unmarshallers.push_scalar(
                TypeMatcher::Kind(scalar),
                Rule::Convert(Arc::new(NumberUnmarshaller::new(scalar))),
            );
        }

        for scalar in TEXT_KINDS {
            marshallers.push_scalar(TypeMatcher::Kind(scalar), Rule::Convert(Arc::new(TextMarshaller)));
            unmarshallers.push_scalar(
                TypeMatcher::Kind(scalar),
                Rule::Convert(Arc::new(TextUnmarshaller::new(scalar))),
            );
        }

        marshallers.push_scalar(TypeMatcher::Kind(ScalarKind::Binary), Rule::Convert(Arc::new(BinaryMarshaller)));
        unmarshallers.push_scalar(TypeMatcher::Kind(ScalarKind::Binary), Rule::Convert(Arc::new(BinaryUnmarshaller)));

        // Structural placeholders; the document catch-all stays last
        marshallers.push_scalar(TypeMatcher::List, Rule::List);
        unmarshallers.push_scalar(TypeMatcher::List, Rule::List);
        marshallers.push_scalar(TypeMatcher::Map, Rule::Map);
        unmarshallers.push_scalar(TypeMatcher::Map, Rule::Map);
        marshallers.push_scalar(TypeMatcher::Any, Rule::Document);
        unmarshallers.push_scalar(TypeMatcher::Any, Rule::Document);

        // Set members
        if legacy {
            marshallers.push_set(TypeMatcher::Kind(ScalarKind::Bool), Arc::new(BoolSetToNumberSet));
        } else {
            marshallers.push_set(TypeMatcher::Kind(ScalarKind::Bool), Arc::new(BoolSetToList));
        }
        let bool_set_in = match kind {
            ConversionSchemaKind::V1 => BoolSetUnmarshaller::number_set_only(),
            _ => BoolSetUnmarshaller::lenient(),
        };
        unmarshallers.push_set(TypeMatcher::Kind(ScalarKind::Bool), Arc::new(bool_set_in));

        marshallers.push_set(TypeMatcher::Numeric, Arc::new(NumberSetMarshaller));
        for scalar in NUMERIC_KINDS {
            unmarshallers.push_set(TypeMatcher::Kind(scalar), Arc::new(NumberSetUnmarshaller::new(scalar)));
        }

        for scalar in TEXT_KINDS {
            marshallers.push_set(TypeMatcher::Kind(scalar), Arc::new(StringSetMarshaller));
            unmarshallers.push_set(TypeMatcher::Kind(scalar), Arc::new(StringSetUnmarshaller::new(scalar)));
        }

        marshallers.push_set(TypeMatcher::Kind(ScalarKind::Binary), Arc::new(BinarySetMarshaller));
        unmarshallers.push_set(TypeMatcher::Kind(ScalarKind::Binary), Arc::new(BinarySetUnmarshaller));

        if legacy {
            marshallers.push_set(TypeMatcher::Any, Arc::new(ObjectSetToStringSet));
            unmarshallers.push_set(
                TypeMatcher::Any,
                Arc::new(StringSetUnmarshaller::new(ScalarKind::String)),
            );
        }

        Self {
            name: Arc::from(kind.as_str()),
            marshallers: Arc::new(marshallers),
            unmarshallers: Arc::new(unmarshallers),
        }
    }
}

impl fmt::Debug for ConversionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionSchema")
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ConversionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builds a schema from a predefined base with extra leading rows.
pub struct SchemaBuilder {
    name: String,
    marshallers: MarshallerRegistry,
    unmarshallers: UnmarshallerRegistry,
}

impl SchemaBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers converters for `matcher` ahead of every predefined row.
    pub fn add_first_type(
        mut self,
        matcher: TypeMatcher,
        marshaller: Arc<dyn Marshaller>,
        unmarshaller: Arc<dyn Unmarshaller>,
    ) -> Self {
        self.marshallers.push_scalar_first(matcher, Rule::Convert(marshaller));
        self.unmarshallers.push_scalar_first(matcher, Rule::Convert(unmarshaller));
        self
    }

    /// Registers set-member converters for `matcher` ahead of every predefined row.
    pub fn add_first_set_type(
        mut self,
        matcher: TypeMatcher,
        marshaller: Arc<dyn Marshaller>,
        unmarshaller: Arc<dyn Unmarshaller>,
    ) -> Self {
        self.marshallers.push_set_first(matcher, marshaller);
        self.unmarshallers.push_set_first(matcher, unmarshaller);
        self
    }

    pub fn build(self) -> ConversionSchema {
        ConversionSchema {
            name: Arc::from(self.name),
            marshallers: Arc::new(self.marshallers),
            unmarshallers: Arc::new(self.unmarshallers),
        }
    }
}
