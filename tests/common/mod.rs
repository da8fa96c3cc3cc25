//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dynamap::attribute::Item;
use dynamap::convert::JsonMarshaller;
use dynamap::mapper::{MemoryTableClient, TableClient};
use dynamap::mapping::{
    BoxError, DeclaredType, Document, DocumentModel, FieldConfig, PropertyDef, Value,
};
use dynamap::s3link::S3Link;
use dynamap::scan::{ScanClient, ScanPage, ScanRequest};

// =============================================================================
// Documents
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItem {
    pub sku: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl Document for LineItem {
    fn model() -> DocumentModel<Self> {
        DocumentModel::builder("LineItem")
            .field("sku", |l: &LineItem| &l.sku, |l: &mut LineItem| &mut l.sku)
            .field("quantity", |l: &LineItem| &l.quantity, |l: &mut LineItem| &mut l.quantity)
            .field("unit_price", |l: &LineItem| &l.unit_price, |l: &mut LineItem| &mut l.unit_price)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub id: String,
    pub customer: Uuid,
    pub placed_at: chrono::DateTime<Utc>,
    pub gift: bool,
    pub express: bool,
    pub note: Option<String>,
    pub tags: BTreeSet<String>,
    pub flags: BTreeSet<bool>,
    pub lines: Vec<LineItem>,
    pub totals: BTreeMap<String, i64>,
    pub shipping: Option<LineItem>,
    pub packaging: Option<Dimensions>,
    pub receipt: Option<S3Link>,
}

impl Document for Order {
    fn model() -> DocumentModel<Self> {
        DocumentModel::builder("Order")
            .table("orders")
            .hash_key("id", |o: &Order| &o.id, |o: &mut Order| &mut o.id)
            .field("customer", |o: &Order| &o.customer, |o: &mut Order| &mut o.customer)
            .field("placed_at", |o: &Order| &o.placed_at, |o: &mut Order| &mut o.placed_at)
            .field("gift", |o: &Order| &o.gift, |o: &mut Order| &mut o.gift)
            .field_with(
                "express",
                FieldConfig::new().native_bool(),
                |o: &Order| &o.express,
                |o: &mut Order| &mut o.express,
            )
            .field_with(
                "note",
                FieldConfig::new().attribute("memo"),
                |o: &Order| &o.note,
                |o: &mut Order| &mut o.note,
            )
            .field("tags", |o: &Order| &o.tags, |o: &mut Order| &mut o.tags)
            .field("flags", |o: &Order| &o.flags, |o: &mut Order| &mut o.flags)
            .field("lines", |o: &Order| &o.lines, |o: &mut Order| &mut o.lines)
            .field("totals", |o: &Order| &o.totals, |o: &mut Order| &mut o.totals)
            .field("shipping", |o: &Order| &o.shipping, |o: &mut Order| &mut o.shipping)
            .property(
                PropertyDef::new(
                    "packaging",
                    DeclaredType::opaque("Dimensions"),
                    |o: &Order| o.packaging.clone().map(Value::object),
                    |o: &mut Order, v: Value| {
                        o.packaging = match v {
                            Value::Object(object) => object.downcast::<Dimensions>().ok(),
                            _ => None,
                        };
                        Ok(())
                    },
                )
                .with_config(FieldConfig::new().custom(Arc::new(JsonMarshaller::<Dimensions>::new()))),
            )
            .field("receipt", |o: &Order| &o.receipt, |o: &mut Order| &mut o.receipt)
            .build()
    }
}

pub fn sample_order(id: &str) -> Order {
    Order {
        id: id.to_string(),
        customer: Uuid::from_u128(0x1234_5678_9abc_def0),
        placed_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap(),
        gift: true,
        express: false,
        note: Some("leave at door".into()),
        tags: ["fragile".to_string(), "priority".to_string()].into_iter().collect(),
        flags: [true, false].into_iter().collect(),
        lines: vec![
            LineItem {
                sku: "A-100".into(),
                quantity: 2,
                unit_price: 9.5,
            },
            LineItem {
                sku: "B-7".into(),
                quantity: 1,
                unit_price: 120.0,
            },
        ],
        totals: [("net".to_string(), 139), ("tax".to_string(), 28)].into_iter().collect(),
        shipping: Some(LineItem {
            sku: "SHIP".into(),
            quantity: 1,
            unit_price: 4.99,
        }),
        packaging: Some(Dimensions {
            width: 30,
            height: 20,
        }),
        receipt: Some(S3Link::in_default_region("receipts", format!("{}.pdf", id))),
    }
}

// =============================================================================
// Clients
// =============================================================================

/// Memory client whose scans fail for one chosen segment.
#[derive(Debug, Default)]
pub struct FlakyClient {
    pub inner: MemoryTableClient,
    pub failing_segment: Mutex<Option<u32>>,
}

impl FlakyClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_segment(&self, segment: Option<u32>) {
        *self.failing_segment.lock().unwrap() = segment;
    }
}

impl ScanClient for FlakyClient {
    fn scan(&self, request: &ScanRequest) -> Result<ScanPage, BoxError> {
        if request.segment.is_some() && *self.failing_segment.lock().unwrap() == request.segment {
            return Err("provisioned throughput exceeded".into());
        }
        self.inner.scan(request)
    }
}

impl TableClient for FlakyClient {
    fn get_item(&self, table: &str, key: &Item, consistent_read: bool) -> Result<Option<Item>, BoxError> {
        self.inner.get_item(table, key, consistent_read)
    }

    fn put_item(&self, table: &str, item: Item) -> Result<(), BoxError> {
        self.inner.put_item(table, item)
    }

    fn delete_item(&self, table: &str, key: &Item) -> Result<(), BoxError> {
        self.inner.delete_item(table, key)
    }
}

pub fn ids(orders: &[Order]) -> HashSet<String> {
    orders.iter().map(|o| o.id.clone()).collect()
}
