//! Mapping error types
//!
//! Error codes:
//! - DYNAMAP_UNRESOLVABLE_TYPE
//! - DYNAMAP_MALFORMED_GENERIC_TYPE
//! - DYNAMAP_MISSING_DOCUMENT
//! - DYNAMAP_TYPE_MISMATCH
//! - DYNAMAP_PARSE_FAILURE
//! - DYNAMAP_INSTANTIATION_FAILED
//! - DYNAMAP_CUSTOM_CONVERSION
//! - DYNAMAP_INVALID_VALUE
//! - DYNAMAP_INVALID_CONFIGURATION
//!
//! Every kind is fatal to the conversion in progress. Nothing is retried.

use std::fmt;
use thiserror::Error;

use crate::attribute::AttributeType;

/// Boxed error used to carry original causes across conversion boundaries
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

/// The property a conversion failed on.
///
/// Empty until the error crosses a property boundary; the innermost property
/// wins when conversions nest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldContext {
    pub declaring_type: String,
    pub property: String,
}

impl FieldContext {
    pub fn is_empty(&self) -> bool {
        self.declaring_type.is_empty() && self.property.is_empty()
    }
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<value>")
        } else {
            write!(f, "{}.{}", self.declaring_type, self.property)
        }
    }
}

/// Mapping errors
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("No converter registered for type {type_name} at {field}")]
    UnresolvableType { field: FieldContext, type_name: String },

    #[error("Malformed generic type at {field}: {reason}")]
    MalformedGenericType { field: FieldContext, reason: String },

    #[error("Type {type_name} at {field} is not a document and has no custom marshaller")]
    MissingDocumentAnnotation { field: FieldContext, type_name: String },

    #[error("Expected {expected} at {field} but found {actual}")]
    TypeMismatch {
        field: FieldContext,
        expected: String,
        actual: AttributeType,
    },

    #[error("Could not unmarshall {value} at {field}: {source}")]
    ParseFailure {
        field: FieldContext,
        value: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to instantiate {type_name}: {reason}")]
    Instantiation { type_name: String, reason: String },

    #[error("Custom marshaller failed at {field}: {source}")]
    CustomConversion {
        field: FieldContext,
        #[source]
        source: BoxError,
    },

    #[error("Invalid value at {field}: {reason}")]
    InvalidValue { field: FieldContext, reason: String },

    #[error("Invalid field configuration at {field}: {reason}")]
    InvalidConfiguration { field: FieldContext, reason: String },
}

impl MappingError {
    pub fn unresolvable(type_name: impl Into<String>) -> Self {
        MappingError::UnresolvableType {
            field: FieldContext::default(),
            type_name: type_name.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        MappingError::MalformedGenericType {
            field: FieldContext::default(),
            reason: reason.into(),
        }
    }

    pub fn missing_document(type_name: impl Into<String>) -> Self {
        MappingError::MissingDocumentAnnotation {
            field: FieldContext::default(),
            type_name: type_name.into(),
        }
    }

    pub fn type_mismatch(expected: &[AttributeType], actual: AttributeType) -> Self {
        let expected = expected
            .iter()
            .map(AttributeType::as_str)
            .collect::<Vec<_>>()
            .join(" or ");
        MappingError::TypeMismatch {
            field: FieldContext::default(),
            expected,
            actual,
        }
    }

    pub fn parse_failure(value: impl Into<String>, source: impl Into<BoxError>) -> Self {
        MappingError::ParseFailure {
            field: FieldContext::default(),
            value: value.into(),
            source: source.into(),
        }
    }

    pub fn instantiation(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        MappingError::Instantiation {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn custom(source: impl Into<BoxError>) -> Self {
        MappingError::CustomConversion {
            field: FieldContext::default(),
            source: source.into(),
        }
    }

    pub fn invalid_value(reason: impl Into<String>) -> Self {
        MappingError::InvalidValue {
            field: FieldContext::default(),
            reason: reason.into(),
        }
    }

    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        MappingError::InvalidConfiguration {
            field: FieldContext::default(),
            reason: reason.into(),
        }
    }

    /// Binds the error to a property unless it already names one.
    pub fn in_field(mut self, declaring_type: &str, property: &str) -> Self {
        if let Some(field) = self.field_mut() {
            if field.is_empty() {
                field.declaring_type = declaring_type.to_string();
                field.property = property.to_string();
            }
        }
        self
    }

    /// Returns the property the error is bound to, if any
    pub fn field(&self) -> Option<&FieldContext> {
        match self {
            MappingError::UnresolvableType { field, .. }
            | MappingError::MalformedGenericType { field, .. }
            | MappingError::MissingDocumentAnnotation { field, .. }
            | MappingError::TypeMismatch { field, .. }
            | MappingError::ParseFailure { field, .. }
            | MappingError::CustomConversion { field, .. }
            | MappingError::InvalidValue { field, .. }
            | MappingError::InvalidConfiguration { field, .. } => Some(field),
            MappingError::Instantiation { .. } => None,
        }
    }

    fn field_mut(&mut self) -> Option<&mut FieldContext> {
        match self {
            MappingError::UnresolvableType { field, .. }
            | MappingError::MalformedGenericType { field, .. }
            | MappingError::MissingDocumentAnnotation { field, .. }
            | MappingError::TypeMismatch { field, .. }
            | MappingError::ParseFailure { field, .. }
            | MappingError::CustomConversion { field, .. }
            | MappingError::InvalidValue { field, .. }
            | MappingError::InvalidConfiguration { field, .. } => Some(field),
            MappingError::Instantiation { .. } => None,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            MappingError::UnresolvableType { .. } => "DYNAMAP_UNRESOLVABLE_TYPE",
            MappingError::MalformedGenericType { .. } => "DYNAMAP_MALFORMED_GENERIC_TYPE",
            MappingError::MissingDocumentAnnotation { .. } => "DYNAMAP_MISSING_DOCUMENT",
            MappingError::TypeMismatch { .. } => "DYNAMAP_TYPE_MISMATCH",
            MappingError::ParseFailure { .. } => "DYNAMAP_PARSE_FAILURE",
            MappingError::Instantiation { .. } => "DYNAMAP_INSTANTIATION_FAILED",
            MappingError::CustomConversion { .. } => "DYNAMAP_CUSTOM_CONVERSION",
            MappingError::InvalidValue { .. } => "DYNAMAP_INVALID_VALUE",
            MappingError::InvalidConfiguration { .. } => "DYNAMAP_INVALID_CONFIGURATION",
        }
    }
}

/// Failure converting a domain [`Value`](super::Value) into a Rust field type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueError {
    #[error("expected {expected} but found {found}")]
    WrongShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
}

impl ValueError {
    pub fn wrong_shape(expected: &'static str, found: &'static str) -> Self {
        ValueError::WrongShape { expected, found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_field_wins() {
        let err = MappingError::unresolvable("Widget")
            .in_field("Inner", "widget")
            .in_field("Outer", "inner");

        let field = err.field().unwrap();
        assert_eq!(field.declaring_type, "Inner");
        assert_eq!(field.property, "widget");
    }

    #[test]
    fn test_display_names_property() {
        let err = MappingError::missing_document("Money").in_field("Order", "total");
        let display = err.to_string();
        assert!(display.contains("Money"));
        assert!(display.contains("Order.total"));
        assert_eq!(err.code(), "DYNAMAP_MISSING_DOCUMENT");
    }

    #[test]
    fn test_type_mismatch_lists_expected() {
        let err = MappingError::type_mismatch(&[AttributeType::N, AttributeType::Bool], AttributeType::S);
        assert!(err.to_string().contains("N or BOOL"));
        assert!(err.to_string().contains("found S"));
    }

    #[test]
    fn test_parse_failure_keeps_cause() {
        let cause = "abc".parse::<i64>().unwrap_err();
        let err = MappingError::parse_failure("abc", cause).in_field("User", "age");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("invalid digit"));
    }

    #[test]
    fn test_instantiation_has_no_field() {
        let err = MappingError::instantiation("User", "factory refused").in_field("X", "y");
        assert!(err.field().is_none());
        assert_eq!(err.code(), "DYNAMAP_INSTANTIATION_FAILED");
    }
}
