//! Mapper Operation Tests
//!
//! Save, load and delete through the in-memory client under each schema,
//! plus S3 links resolved against a local object store.

mod common;

use std::sync::Arc;

use common::{sample_order, Order};
use dynamap::attribute::AttributeValue;
use dynamap::convert::ConversionSchemaKind;
use dynamap::mapper::{Mapper, MapperConfig, MemoryTableClient, TableClient};
use dynamap::s3link::LocalObjectStore;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_mapper(config: MapperConfig) -> Mapper<MemoryTableClient> {
    let client = Arc::new(MemoryTableClient::new());
    client.create_table(&config.table_name("orders"), "id", None);
    Mapper::new(client, config).unwrap()
}

// =============================================================================
// Save / Load / Delete
// =============================================================================

#[test]
fn test_save_then_load_every_schema() {
    for kind in [
        ConversionSchemaKind::V1,
        ConversionSchemaKind::V2Compatible,
        ConversionSchemaKind::V2,
    ] {
        let mapper = setup_mapper(MapperConfig {
            conversion_schema: kind,
            ..Default::default()
        });
        let order = sample_order("o-1");
        mapper.save(&order).unwrap();

        let loaded: Option<Order> = mapper.load("o-1".to_string()).unwrap();
        assert_eq!(loaded, Some(order), "schema {}", kind);
    }
}

#[test]
fn test_save_replaces_existing_item() {
    let mapper = setup_mapper(MapperConfig::default());
    let mut order = sample_order("o-1");
    mapper.save(&order).unwrap();

    order.note = None;
    order.gift = false;
    mapper.save(&order).unwrap();

    let loaded: Order = mapper.load("o-1".to_string()).unwrap().unwrap();
    assert_eq!(loaded.note, None);
    assert!(!loaded.gift);
    assert_eq!(mapper.client().item_count("orders"), 1);
}

#[test]
fn test_load_missing_and_delete() {
    let mapper = setup_mapper(MapperConfig::default());
    assert!(mapper.load::<Order, _>("nope".to_string()).unwrap().is_none());

    let order = sample_order("o-2");
    mapper.save(&order).unwrap();
    mapper.delete(&order).unwrap();
    assert!(mapper.load::<Order, _>("o-2".to_string()).unwrap().is_none());
}

#[test]
fn test_key_item_uses_schema_encoding() {
    let mapper = setup_mapper(MapperConfig::default());
    let key = mapper.key_of(&sample_order("o-3")).unwrap();
    assert_eq!(key.len(), 1);
    assert_eq!(key["id"], AttributeValue::S("o-3".into()));
}

#[test]
fn test_table_override() {
    let mapper = setup_mapper(MapperConfig {
        table_name_override: Some("all_documents".into()),
        ..Default::default()
    });
    mapper.save(&sample_order("o-4")).unwrap();
    assert_eq!(mapper.client().item_count("all_documents"), 1);
    assert_eq!(mapper.client().item_count("orders"), 0);
}

#[test]
fn test_stored_item_is_readable_raw() {
    let mapper = setup_mapper(MapperConfig {
        conversion_schema: ConversionSchemaKind::V1,
        ..Default::default()
    });
    mapper.save(&sample_order("o-5")).unwrap();

    let key = mapper.key_of(&sample_order("o-5")).unwrap();
    let raw = mapper.client().get_item("orders", &key, true).unwrap().unwrap();
    assert_eq!(raw["gift"], AttributeValue::N("1".into()));
}

// =============================================================================
// S3 Links
// =============================================================================

#[test]
fn test_s3link_content_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let store = LocalObjectStore::new(tmp.path());
    let mapper = setup_mapper(MapperConfig::default());

    let order = sample_order("o-6");
    let receipt = order.receipt.clone().unwrap();
    receipt.upload(&store, b"%PDF-1.7 receipt").unwrap();
    mapper.save(&order).unwrap();

    let loaded: Order = mapper.load("o-6".to_string()).unwrap().unwrap();
    let link = loaded.receipt.unwrap();
    assert_eq!(link, receipt);
    assert!(link.exists(&store).unwrap());
    assert_eq!(link.download(&store).unwrap(), b"%PDF-1.7 receipt");

    link.delete(&store).unwrap();
    assert!(!link.exists(&store).unwrap());
}
