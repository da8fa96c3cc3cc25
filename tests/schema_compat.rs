//! Conversion Schema Compatibility Tests
//!
//! Boolean and set encodings differ between schemas:
//! - V1 writes and reads booleans as N
//! - V2_COMPATIBLE writes N but also reads native BOOL
//! - V2 writes native BOOL, and boolean sets as a list of BOOL

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{sample_order, Order};
use dynamap::attribute::{AttributeType, AttributeValue, Item};
use dynamap::convert::{
    BoolSetToNumberSet, BoolSetUnmarshaller, ConversionSchema, ConversionSchemaKind,
    ItemConverter, Marshaller, TypeMatcher, Unmarshaller,
};
use dynamap::mapping::{DeclaredType, MappingError, MappingResult, ScalarKind, Value};

fn bool_item(gift: AttributeValue) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttributeValue::S("o-1".into()));
    item.insert("gift".into(), gift);
    item
}

// =============================================================================
// Booleans
// =============================================================================

#[test]
fn test_v1_and_v2_boolean_encodings() {
    let order = sample_order("o-1");

    let v1 = ItemConverter::new(ConversionSchema::v1()).to_item(&order).unwrap();
    assert_eq!(v1["gift"], AttributeValue::N("1".into()));
    assert_eq!(v1["flags"], AttributeValue::Ns(vec!["0".into(), "1".into()]));

    let compat = ItemConverter::new(ConversionSchema::v2_compatible()).to_item(&order).unwrap();
    assert_eq!(compat["gift"], AttributeValue::N("1".into()));

    let v2 = ItemConverter::new(ConversionSchema::v2()).to_item(&order).unwrap();
    assert_eq!(v2["gift"], AttributeValue::Bool(true));
    assert_eq!(
        v2["flags"],
        AttributeValue::L(vec![AttributeValue::Bool(false), AttributeValue::Bool(true)])
    );
}

#[test]
fn test_native_bool_field_ignores_schema() {
    for schema in [ConversionSchema::v1(), ConversionSchema::v2()] {
        let item = ItemConverter::new(schema).to_item(&sample_order("o-1")).unwrap();
        assert_eq!(item["express"], AttributeValue::Bool(false));
    }
}

#[test]
fn test_v2_compatible_reads_both_encodings() {
    let converter = ItemConverter::new(ConversionSchema::v2_compatible());
    let from_number: Order = converter
        .from_item(Some(&bool_item(AttributeValue::N("1".into()))))
        .unwrap();
    let from_bool: Order = converter
        .from_item(Some(&bool_item(AttributeValue::Bool(true))))
        .unwrap();
    assert!(from_number.gift);
    assert!(from_bool.gift);
}

#[test]
fn test_v1_rejects_native_bool() {
    let converter = ItemConverter::new(ConversionSchema::v1());
    let err = converter
        .from_item::<Order>(Some(&bool_item(AttributeValue::Bool(true))))
        .unwrap_err();
    assert_eq!(err.code(), "DYNAMAP_TYPE_MISMATCH");
    assert_eq!(err.field().unwrap().property, "gift");
}

#[test]
fn test_number_other_than_one_is_false() {
    let converter = ItemConverter::new(ConversionSchema::v1());
    let order: Order = converter
        .from_item(Some(&bool_item(AttributeValue::N("2".into()))))
        .unwrap();
    assert!(!order.gift);
}

#[test]
fn test_v2_reads_legacy_boolean_sets() {
    let converter = ItemConverter::new(ConversionSchema::v2());
    let mut item = bool_item(AttributeValue::Bool(false));
    item.insert("flags".into(), AttributeValue::Ns(vec!["1".into()]));
    let order: Order = converter.from_item(Some(&item)).unwrap();
    assert_eq!(order.flags, [true].into_iter().collect::<BTreeSet<_>>());
}

// =============================================================================
// Untyped Sets
// =============================================================================

#[test]
fn test_object_set_catch_all_is_legacy_only() {
    let declared = DeclaredType::set_of(DeclaredType::opaque("Color"));
    let value = Value::Set(vec![Value::String("red".into())]);

    for kind in [ConversionSchemaKind::V1, ConversionSchemaKind::V2Compatible] {
        let converter = ItemConverter::new(ConversionSchema::from_kind(kind));
        assert_eq!(
            converter.marshal_value(&declared, &value).unwrap(),
            AttributeValue::Ss(vec!["red".into()])
        );
    }

    let v2 = ItemConverter::new(ConversionSchema::v2());
    let err = v2.marshal_value(&declared, &value).unwrap_err();
    assert_eq!(err.code(), "DYNAMAP_UNRESOLVABLE_TYPE");
}

// =============================================================================
// Custom Schemas
// =============================================================================

/// Booleans as `S` "yes" / "no".
#[derive(Debug)]
struct YesNo;

impl Marshaller for YesNo {
    fn attribute_type(&self) -> AttributeType {
        AttributeType::S
    }

    fn marshall(&self, value: &Value, _: &ItemConverter) -> MappingResult<AttributeValue> {
        match value {
            Value::Bool(true) => Ok(AttributeValue::S("yes".into())),
            Value::Bool(false) => Ok(AttributeValue::S("no".into())),
            other => Err(MappingError::invalid_value(format!("not a bool: {}", other.kind_name()))),
        }
    }
}

impl Unmarshaller for YesNo {
    fn accepts(&self) -> &[AttributeType] {
        &[AttributeType::S]
    }

    fn unmarshall(&self, value: &AttributeValue, _: &ItemConverter) -> MappingResult<Value> {
        Ok(Value::Bool(value.as_s() == Some("yes")))
    }
}

#[test]
fn test_builder_rows_take_precedence() {
    let yes_no = Arc::new(YesNo);
    let schema = ConversionSchema::builder(ConversionSchemaKind::V2)
        .add_first_type(
            TypeMatcher::Kind(ScalarKind::Bool),
            yes_no.clone() as Arc<dyn Marshaller>,
            yes_no as Arc<dyn Unmarshaller>,
        )
        .add_first_set_type(
            TypeMatcher::Kind(ScalarKind::Bool),
            Arc::new(BoolSetToNumberSet) as Arc<dyn Marshaller>,
            Arc::new(BoolSetUnmarshaller::number_set_only()) as Arc<dyn Unmarshaller>,
        )
        .build();
    assert_eq!(schema.name(), "V2+custom");

    let converter = ItemConverter::new(schema);
    let order = sample_order("o-1");
    let item = converter.to_item(&order).unwrap();
    assert_eq!(item["gift"], AttributeValue::S("yes".into()));
    assert_eq!(item["flags"], AttributeValue::Ns(vec!["0".into(), "1".into()]));
    // Field configuration still wins over schema rows
    assert_eq!(item["express"], AttributeValue::Bool(false));

    let back: Order = converter.from_item(Some(&item)).unwrap();
    assert_eq!(back, order);
}

#[test]
fn test_predefined_schemas_are_shared() {
    assert!(ConversionSchema::v2().same_as(&ConversionSchema::from_kind(ConversionSchemaKind::V2)));
    assert!(!ConversionSchema::v1().same_as(&ConversionSchema::v2()));
}
