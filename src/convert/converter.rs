//! Recursive item converter
//!
//! Converts registered documents to items and back under one conversion
//! schema. Nested lists, maps and documents recurse through the same
//! converter, so they share its schema and its cache.
//!
//! # Marshal
//!
//! Properties are visited in declaration order. Absent values are skipped.
//!
//! # Unmarshal
//!
//! A fresh instance comes from the model factory. For each property whose
//! attribute is present the wire type is checked first, then the value is
//! parsed, then the setter applied. Attributes without a property are
//! ignored.

use std::any::TypeId;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::attribute::{AttributeValue, Item};
use crate::mapping::{
    DeclaredType, Document, DocumentModel, DocumentType, MappingError, MappingResult,
    PropertyDef, ScalarKind, Value,
};
use crate::observability::MetricsRegistry;

use super::custom::CustomField;
use super::field::{FieldModel, FieldModelCache, MemberConverters};
use super::marshaller::*;
use super::registry::Rule;
use super::schema::ConversionSchema;

/// Converts documents to and from items under one schema.
#[derive(Debug)]
pub struct ItemConverter {
    schema: ConversionSchema,
    cache: FieldModelCache,
    metrics: Arc<MetricsRegistry>,
}

impl ItemConverter {
    pub fn new(schema: ConversionSchema) -> Self {
        Self::with_metrics(schema, Arc::new(MetricsRegistry::new()))
    }

    /// Creates a converter that reports into a shared registry.
    pub fn with_metrics(schema: ConversionSchema, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            schema,
            cache: FieldModelCache::new(Arc::clone(&metrics)),
            metrics,
        }
    }

    pub fn schema(&self) -> &ConversionSchema {
        &self.schema
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn cache(&self) -> &FieldModelCache {
        &self.cache
    }

    /// The registered model of `T`, built once per converter.
    pub fn model<T: Document>(&self) -> Arc<DocumentModel<T>> {
        self.cache.model_or_insert_with(T::model)
    }

    /// The resolved field model of a property of `T`.
    pub fn field_model<T: Document>(&self, property: &str) -> MappingResult<Arc<FieldModel>> {
        let model = self.model::<T>();
        let def = model.property(property).ok_or_else(|| {
            MappingError::invalid_configuration(format!(
                "{} has no registered property {}",
                model.type_name(),
                property
            ))
        })?;
        self.resolve_field(&model, def)
    }

    /// Converts a document to an item.
    pub fn to_item<T: Document>(&self, object: &T) -> MappingResult<Item> {
        let model = self.model::<T>();
        let mut item = Item::with_capacity(model.properties().len());

        for property in model.properties() {
            let Some(value) = property.get(object) else {
                continue;
            };
            let bind = |e: MappingError| e.in_field(model.type_name(), property.name());
            let field = self.resolve_field(&model, property).map_err(bind)?;
            let wire = field.marshall(&value, self).map_err(bind)?;
            item.insert(field.attribute_name().to_string(), wire);
        }

        self.metrics.increment_items_marshalled();
        trace!(
            event = "ITEM_MARSHALLED",
            type_name = model.type_name(),
            attributes = item.len(),
            "document marshalled"
        );
        Ok(item)
    }

    /// Null in, null out.
    pub fn to_item_opt<T: Document>(&self, object: Option<&T>) -> MappingResult<Option<Item>> {
        object.map(|object| self.to_item(object)).transpose()
    }

    /// Converts an item to a document. A missing or empty item yields a
    /// fresh instance.
    pub fn from_item<T: Document>(&self, item: Option<&Item>) -> MappingResult<T> {
        let model = self.model::<T>();
        let mut object = model
            .instantiate()
            .map_err(|reason| MappingError::instantiation(model.type_name(), reason))?;

        let Some(item) = item else {
            return Ok(object);
        };

        for property in model.properties() {
            let Some(wire) = item.get(property.attribute_name()) else {
                continue;
            };
            let bind = |e: MappingError| e.in_field(model.type_name(), property.name());

            if wire.is_null() {
                // Properties that cannot hold null keep their default
                if property.set(&mut object, Value::Null).is_err() {
                    trace!(
                        event = "NULL_ATTRIBUTE_SKIPPED",
                        type_name = model.type_name(),
                        property = property.name(),
                        "null attribute left at default"
                    );
                }
                continue;
            }

            let field = self.resolve_field(&model, property).map_err(bind)?;
            let value = field.unmarshall(wire, self).map_err(bind)?;
            property
                .set(&mut object, value)
                .map_err(|e| bind(MappingError::parse_failure(describe(wire), e)))?;
        }

        self.metrics.increment_items_unmarshalled();
        trace!(
            event = "ITEM_UNMARSHALLED",
            type_name = model.type_name(),
            attributes = item.len(),
            "item unmarshalled"
        );
        Ok(object)
    }

    /// Marshals a single value of the given declared type.
    pub fn marshal_value(&self, declared: &DeclaredType, value: &Value) -> MappingResult<AttributeValue> {
        if let Value::Null = value {
            return Ok(AttributeValue::Null);
        }
        self.converters(declared)?.marshaller.marshall(value, self)
    }

    /// Unmarshals a single wire value of the given declared type.
    pub fn unmarshal_value(&self, declared: &DeclaredType, value: &AttributeValue) -> MappingResult<Value> {
        let converters = self.converters(declared)?;
        unmarshall_checked(converters.unmarshaller.as_ref(), value, self)
    }

    fn resolve_field<T: Document>(
        &self,
        model: &DocumentModel<T>,
        property: &PropertyDef<T>,
    ) -> MappingResult<Arc<FieldModel>> {
        self.cache
            .field_or_insert_with(TypeId::of::<T>(), property.name(), || {
                let field = self.build_field(property)?;
                debug!(
                    event = "FIELD_MODEL_RESOLVED",
                    type_name = model.type_name(),
                    property = property.name(),
                    attribute = field.attribute_name(),
                    attribute_type = %field.attribute_type(),
                    schema = self.schema.name(),
                    "field model resolved"
                );
                Ok(field)
            })
    }

    /// Custom marshaller, then native boolean override, then schema default.
    fn build_field<T>(&self, property: &PropertyDef<T>) -> MappingResult<FieldModel> {
        let config = property.config();
        let declared = property.declared_type();

        if let Some(custom) = &config.custom {
            let field = Arc::new(CustomField(Arc::clone(custom)));
            let marshaller: Arc<dyn Marshaller> = field.clone();
            let unmarshaller: Arc<dyn Unmarshaller> = field;
            return Ok(FieldModel::new(property.attribute_name(), marshaller, unmarshaller));
        }

        if config.native_bool {
            let (marshaller, unmarshaller) = native_bool_converters(declared)?;
            return Ok(FieldModel::new(property.attribute_name(), marshaller, unmarshaller));
        }

        let converters = self.converters(declared)?;
        Ok(FieldModel::new(
            property.attribute_name(),
            Arc::clone(&converters.marshaller),
            Arc::clone(&converters.unmarshaller),
        ))
    }

    fn converters(&self, declared: &DeclaredType) -> MappingResult<Arc<MemberConverters>> {
        self.cache.member_or_insert_with(declared, || {
            Ok(MemberConverters {
                marshaller: self.resolve_marshaller(declared)?,
                unmarshaller: self.resolve_unmarshaller(declared)?,
            })
        })
    }

    fn resolve_marshaller(&self, declared: &DeclaredType) -> MappingResult<Arc<dyn Marshaller>> {
        let registry = self.schema.marshallers();
        if let DeclaredType::Set(member) = declared {
            return registry.resolve_set(member);
        }
        match registry.resolve_scalar(declared)? {
            Rule::Convert(marshaller) => Ok(marshaller),
            Rule::List => {
                let element = self.converters(list_element(declared)?)?;
                Ok(Arc::new(ListMarshaller::new(Arc::clone(&element.marshaller))))
            }
            Rule::Map => {
                let value = self.converters(map_value(declared)?)?;
                Ok(Arc::new(MapMarshaller::new(Arc::clone(&value.marshaller))))
            }
            Rule::Document => Ok(Arc::new(DocumentMarshaller::new(document_type(declared)?))),
        }
    }

    fn resolve_unmarshaller(&self, declared: &DeclaredType) -> MappingResult<Arc<dyn Unmarshaller>> {
        let registry = self.schema.unmarshallers();
        if let DeclaredType::Set(member) = declared {
            return registry.resolve_set(member);
        }
        match registry.resolve_scalar(declared)? {
            Rule::Convert(unmarshaller) => Ok(unmarshaller),
            Rule::List => {
                let element = self.converters(list_element(declared)?)?;
                Ok(Arc::new(ListUnmarshaller::new(Arc::clone(&element.unmarshaller))))
            }
            Rule::Map => {
                let value = self.converters(map_value(declared)?)?;
                Ok(Arc::new(MapUnmarshaller::new(Arc::clone(&value.unmarshaller))))
            }
            Rule::Document => Ok(Arc::new(DocumentUnmarshaller::new(document_type(declared)?))),
        }
    }
}

fn list_element(declared: &DeclaredType) -> MappingResult<&DeclaredType> {
    match declared {
        DeclaredType::List(Some(element)) => Ok(element),
        DeclaredType::List(None) => Err(MappingError::malformed(
            "list has no element type",
        )),
        other => Err(MappingError::unresolvable(other.type_name())),
    }
}

fn map_value(declared: &DeclaredType) -> MappingResult<&DeclaredType> {
    match declared {
        DeclaredType::Map(Some((key, value))) => match key.as_ref() {
            DeclaredType::Scalar(ScalarKind::String) => Ok(value),
            other => Err(MappingError::malformed(format!(
                "map keys must be String, found {}",
                other
            ))),
        },
        DeclaredType::Map(None) => Err(MappingError::malformed(
            "map has no key and value types",
        )),
        other => Err(MappingError::unresolvable(other.type_name())),
    }
}

fn document_type(declared: &DeclaredType) -> MappingResult<DocumentType> {
    match declared {
        DeclaredType::Object(object) => object
            .document_type()
            .cloned()
            .ok_or_else(|| MappingError::missing_document(object.name())),
        other => Err(MappingError::unresolvable(other.type_name())),
    }
}

fn native_bool_converters(
    declared: &DeclaredType,
) -> MappingResult<(Arc<dyn Marshaller>, Arc<dyn Unmarshaller>)> {
    match declared {
        DeclaredType::Scalar(ScalarKind::Bool) => Ok((
            Arc::new(BoolToBool) as Arc<dyn Marshaller>,
            Arc::new(BoolUnmarshaller::lenient()) as Arc<dyn Unmarshaller>,
        )),
        DeclaredType::Set(member) if **member == DeclaredType::Scalar(ScalarKind::Bool) => Ok((
            Arc::new(BoolSetToList) as Arc<dyn Marshaller>,
            Arc::new(BoolSetUnmarshaller::lenient()) as Arc<dyn Unmarshaller>,
        )),
        other => Err(MappingError::invalid_configuration(format!(
            "native boolean encoding does not apply to {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap, HashSet};

    use crate::mapping::FieldConfig;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Address {
        city: String,
        zip: Option<String>,
    }

    impl Document for Address {
        fn model() -> DocumentModel<Self> {
            DocumentModel::builder("Address")
                .field("city", |a: &Address| &a.city, |a: &mut Address| &mut a.city)
                .field("zip", |a: &Address| &a.zip, |a: &mut Address| &mut a.zip)
                .build()
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Customer {
        id: String,
        active: bool,
        visits: u32,
        tags: HashSet<String>,
        home: Option<Address>,
        previous: Vec<Address>,
        scores: BTreeMap<String, f64>,
    }

    impl Document for Customer {
        fn model() -> DocumentModel<Self> {
            DocumentModel::builder("Customer")
                .table("customers")
                .hash_key("id", |c: &Customer| &c.id, |c: &mut Customer| &mut c.id)
                .field("active", |c: &Customer| &c.active, |c: &mut Customer| &mut c.active)
                .field("visits", |c: &Customer| &c.visits, |c: &mut Customer| &mut c.visits)
                .field("tags", |c: &Customer| &c.tags, |c: &mut Customer| &mut c.tags)
                .field("home", |c: &Customer| &c.home, |c: &mut Customer| &mut c.home)
                .field("previous", |c: &Customer| &c.previous, |c: &mut Customer| &mut c.previous)
                .field("scores", |c: &Customer| &c.scores, |c: &mut Customer| &mut c.scores)
                .build()
        }
    }

    fn sample() -> Customer {
        Customer {
            id: "c-1".into(),
            active: true,
            visits: 12,
            tags: ["gold".to_string()].into_iter().collect(),
            home: Some(Address {
                city: "Lisbon".into(),
                zip: None,
            }),
            previous: vec![Address {
                city: "Porto".into(),
                zip: Some("4000".into()),
            }],
            scores: [("q1".to_string(), 0.5)].into_iter().collect(),
        }
    }

    #[test]
    fn test_roundtrip_nested() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let customer = sample();

        let item = converter.to_item(&customer).unwrap();
        assert_eq!(item.get("active"), Some(&AttributeValue::Bool(true)));
        assert_eq!(item.get("visits"), Some(&AttributeValue::N("12".into())));
        let home = item.get("home").and_then(AttributeValue::as_m).unwrap();
        assert!(!home.contains_key("zip"));

        let back: Customer = converter.from_item(Some(&item)).unwrap();
        assert_eq!(back, customer);
    }

    #[test]
    fn test_absent_values_skipped() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let item = converter.to_item(&Customer::default()).unwrap();
        assert!(!item.contains_key("home"));
        // Empty sets cannot be stored
        assert!(!item.contains_key("tags"));
    }

    #[test]
    fn test_none_and_empty_item() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let empty: Customer = converter.from_item(None).unwrap();
        assert_eq!(empty, Customer::default());
        let from_empty: Customer = converter.from_item(Some(&Item::new())).unwrap();
        assert_eq!(from_empty, Customer::default());
        assert_eq!(converter.to_item_opt::<Customer>(None).unwrap(), None);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let mut item = converter.to_item(&sample()).unwrap();
        item.insert("legacy_flag".into(), AttributeValue::S("x".into()));
        let back: Customer = converter.from_item(Some(&item)).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_type_mismatch_names_property() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let mut item = Item::new();
        item.insert("visits".into(), AttributeValue::S("twelve".into()));

        let err = converter.from_item::<Customer>(Some(&item)).unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_TYPE_MISMATCH");
        let field = err.field().unwrap();
        assert_eq!(field.declaring_type, "Customer");
        assert_eq!(field.property, "visits");
    }

    #[test]
    fn test_setter_range_failure_is_parse_failure() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let mut item = Item::new();
        item.insert("visits".into(), AttributeValue::N("-4".into()));

        let err = converter.from_item::<Customer>(Some(&item)).unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_PARSE_FAILURE");
        assert_eq!(err.field().unwrap().property, "visits");
    }

    #[test]
    fn test_nested_error_keeps_inner_field() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let mut home = HashMap::new();
        home.insert("city".to_string(), AttributeValue::N("5".into()));
        let mut item = Item::new();
        item.insert("home".into(), AttributeValue::M(home));

        let err = converter.from_item::<Customer>(Some(&item)).unwrap_err();
        let field = err.field().unwrap();
        assert_eq!(field.declaring_type, "Address");
        assert_eq!(field.property, "city");
    }

    #[test]
    fn test_null_attribute_reads_as_absent() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let mut item = converter.to_item(&sample()).unwrap();
        item.insert("home".into(), AttributeValue::Null);
        item.insert("visits".into(), AttributeValue::Null);

        let back: Customer = converter.from_item(Some(&item)).unwrap();
        assert_eq!(back.home, None);
        assert_eq!(back.visits, 0);
    }

    #[test]
    fn test_field_model_cached() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let first = converter.field_model::<Customer>("visits").unwrap();
        let hits = converter.metrics().cache_hits();
        let second = converter.field_model::<Customer>("visits").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(converter.metrics().cache_hits(), hits + 1);
        assert!(converter.field_model::<Customer>("nope").is_err());
    }

    #[test]
    fn test_concurrent_resolution_shares_one_field_model() {
        let converter = Arc::new(ItemConverter::new(ConversionSchema::v2()));
        let resolved: Vec<Arc<FieldModel>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| converter.field_model::<Customer>("visits").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let first = &resolved[0];
        assert!(resolved.iter().all(|field| Arc::ptr_eq(field, first)));
        assert!(Arc::ptr_eq(first, &converter.field_model::<Customer>("visits").unwrap()));
        assert_eq!(converter.cache().len(), 1);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Money(i64);

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Invoice {
        total: Option<Money>,
        paid: bool,
        flags: Vec<String>,
    }

    fn invoice_model(config: FieldConfig) -> DocumentModel<Invoice> {
        DocumentModel::builder("Invoice")
            .property(PropertyDef::new(
                "total",
                DeclaredType::opaque("Money"),
                |i: &Invoice| i.total.clone().map(Value::object),
                |i: &mut Invoice, v: Value| {
                    i.total = match v {
                        Value::Object(o) => o.downcast::<Money>().ok(),
                        _ => None,
                    };
                    Ok(())
                },
            ))
            .field_with("paid", config, |i: &Invoice| &i.paid, |i: &mut Invoice| &mut i.paid)
            .field("flags", |i: &Invoice| &i.flags, |i: &mut Invoice| &mut i.flags)
            .build()
    }

    impl Document for Invoice {
        fn model() -> DocumentModel<Self> {
            invoice_model(FieldConfig::new().native_bool())
        }
    }

    #[test]
    fn test_missing_document_annotation() {
        let converter = ItemConverter::new(ConversionSchema::v1());
        let invoice = Invoice {
            total: Some(Money(10)),
            ..Default::default()
        };
        let err = converter.to_item(&invoice).unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_MISSING_DOCUMENT");
        assert!(err.to_string().contains("Money"));
        assert_eq!(err.field().unwrap().property, "total");
    }

    #[test]
    fn test_native_bool_overrides_schema() {
        let converter = ItemConverter::new(ConversionSchema::v1());
        let item = converter.to_item(&Invoice::default()).unwrap();
        assert_eq!(item.get("paid"), Some(&AttributeValue::Bool(false)));
    }

    #[test]
    fn test_marshal_value_direct() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let declared = DeclaredType::list_of(DeclaredType::scalar(ScalarKind::I32));
        let wire = converter
            .marshal_value(&declared, &Value::List(vec![Value::Int(3)]))
            .unwrap();
        assert_eq!(wire, AttributeValue::L(vec![AttributeValue::N("3".into())]));
        assert_eq!(
            converter.unmarshal_value(&declared, &wire).unwrap(),
            Value::List(vec![Value::Int(3)])
        );
    }

    #[test]
    fn test_malformed_generic_types() {
        let converter = ItemConverter::new(ConversionSchema::v2());
        let raw = converter
            .marshal_value(&DeclaredType::List(None), &Value::List(vec![]))
            .unwrap_err();
        assert_eq!(raw.code(), "DYNAMAP_MALFORMED_GENERIC_TYPE");

        let int_keys = DeclaredType::map_of(
            DeclaredType::scalar(ScalarKind::I32),
            DeclaredType::scalar(ScalarKind::String),
        );
        let err = converter
            .marshal_value(&int_keys, &Value::Map(BTreeMap::new()))
            .unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_MALFORMED_GENERIC_TYPE");
    }
}
