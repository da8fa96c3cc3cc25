//! Per-field custom marshallers
//!
//! A custom marshaller stores a property as a single `S` attribute. It takes
//! priority over every other rule for the field it is attached to.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::attribute::{AttributeType, AttributeValue};
use crate::mapping::{BoxError, MappingError, MappingResult, Value};

use super::converter::ItemConverter;
use super::marshaller::{Marshaller, Unmarshaller};

/// User-supplied string encoding for one property.
pub trait CustomMarshaller: Send + Sync {
    fn marshall(&self, value: &Value) -> Result<String, BoxError>;

    fn unmarshall(&self, text: &str) -> Result<Value, BoxError>;
}

/// Stores an opaque value of type `T` as its JSON text.
pub struct JsonMarshaller<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonMarshaller<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonMarshaller<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CustomMarshaller for JsonMarshaller<T>
where
    T: Serialize + DeserializeOwned + Clone + fmt::Debug + PartialEq + Send + Sync + 'static,
{
    fn marshall(&self, value: &Value) -> Result<String, BoxError> {
        match value {
            Value::Object(object) => {
                let typed = object.downcast_ref::<T>().ok_or_else(|| {
                    format!(
                        "expected {} but found {}",
                        std::any::type_name::<T>(),
                        object.type_name()
                    )
                })?;
                Ok(serde_json::to_string(typed)?)
            }
            other => Err(format!("expected object but found {}", other.kind_name()).into()),
        }
    }

    fn unmarshall(&self, text: &str) -> Result<Value, BoxError> {
        let typed: T = serde_json::from_str(text)?;
        Ok(Value::object(typed))
    }
}

/// Adapts a [`CustomMarshaller`] to the marshaller contract.
pub(crate) struct CustomField(pub(crate) Arc<dyn CustomMarshaller>);

impl fmt::Debug for CustomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomField")
    }
}

impl Marshaller for CustomField {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::S
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        self.0
            .marshall(value)
            .map(AttributeValue::S)
            .map_err(MappingError::custom)
    }
}

impl Unmarshaller for CustomField {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::S]
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        match value {
            AttributeValue::S(text) => self.0.unmarshall(text).map_err(MappingError::custom),
            other => Err(MappingError::type_mismatch(self.accepts(), other.attribute_type())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Money {
        amount: i64,
        currency: String,
    }

    #[test]
    fn test_json_marshaller_roundtrip() {
        let marshaller = JsonMarshaller::<Money>::new();
        let money = Money {
            amount: 1250,
            currency: "EUR".into(),
        };

        let text = marshaller.marshall(&Value::object(money.clone())).unwrap();
        assert!(text.contains("\"currency\":\"EUR\""));

        let back = marshaller.unmarshall(&text).unwrap();
        assert_eq!(back, Value::object(money));
    }

    #[test]
    fn test_json_marshaller_wrong_type() {
        let marshaller = JsonMarshaller::<Money>::new();
        assert!(marshaller.marshall(&Value::Int(3)).is_err());
        assert!(marshaller.marshall(&Value::object("text".to_string())).is_err());
        assert!(marshaller.unmarshall("{not json").is_err());
    }
}
