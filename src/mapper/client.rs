//! Table clients
//!
//! [`TableClient`] is the seam between the mapper and a table service.
//! [`MemoryTableClient`] keeps tables in process; it backs tests and the
//! command line tool.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use crate::attribute::{AttributeValue, Item};
use crate::mapping::BoxError;
use crate::scan::{ScanClient, ScanPage, ScanRequest};

/// Item reads and writes against named tables.
///
/// Scans come from the [`ScanClient`] supertrait so one client serves both
/// the mapper and its parallel scans.
pub trait TableClient: ScanClient {
    fn get_item(&self, table: &str, key: &Item, consistent_read: bool) -> Result<Option<Item>, BoxError>;

    /// Replaces any item with the same key.
    fn put_item(&self, table: &str, item: Item) -> Result<(), BoxError>;

    /// Deleting a missing item is not an error.
    fn delete_item(&self, table: &str, key: &Item) -> Result<(), BoxError>;
}

#[derive(Debug)]
struct MemoryTable {
    hash_key: String,
    range_key: Option<String>,
    /// Keyed by key signature, so scans page in a stable order
    items: BTreeMap<String, Item>,
}

impl MemoryTable {
    fn signature(&self, item: &Item) -> Result<String, BoxError> {
        let mut parts: Vec<&AttributeValue> = Vec::with_capacity(2);
        for name in std::iter::once(&self.hash_key).chain(self.range_key.iter()) {
            let value = item
                .get(name)
                .ok_or_else(|| format!("missing key attribute {}", name))?;
            parts.push(value);
        }
        Ok(serde_json::to_string(&parts)?)
    }

    fn key_of(&self, item: &Item) -> Item {
        let mut key = Item::new();
        for name in std::iter::once(&self.hash_key).chain(self.range_key.iter()) {
            if let Some(value) = item.get(name) {
                key.insert(name.clone(), value.clone());
            }
        }
        key
    }
}

/// In-process tables with hash and optional range keys.
///
/// Items are assigned to scan segments by a stable hash of their key.
#[derive(Debug, Default)]
pub struct MemoryTableClient {
    tables: Mutex<HashMap<String, MemoryTable>>,
}

impl MemoryTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table; an existing table is left untouched.
    pub fn create_table(&self, name: &str, hash_key: &str, range_key: Option<&str>) {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.entry(name.to_string()).or_insert_with(|| MemoryTable {
            hash_key: hash_key.to_string(),
            range_key: range_key.map(str::to_string),
            items: BTreeMap::new(),
        });
    }

    pub fn item_count(&self, table: &str) -> usize {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.get(table).map(|t| t.items.len()).unwrap_or(0)
    }

    fn with_table<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut MemoryTable) -> Result<R, BoxError>,
    ) -> Result<R, BoxError> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .get_mut(name)
            .ok_or_else(|| format!("table not found: {}", name))?;
        f(table)
    }
}

impl ScanClient for MemoryTableClient {
    fn scan(&self, request: &ScanRequest) -> Result<ScanPage, BoxError> {
        let total = request.total_segments.unwrap_or(1).max(1);
        let segment = request.segment.unwrap_or(0);
        if segment >= total {
            return Err(format!("segment {} out of range for {} segments", segment, total).into());
        }

        self.with_table(&request.table_name, |table| {
            let start = match &request.exclusive_start_key {
                Some(key) => Some(table.signature(key)?),
                None => None,
            };
            let limit = request.limit.map(|l| l as usize).unwrap_or(usize::MAX);

            let mut candidates = table
                .items
                .iter()
                .filter(|(sig, _)| start.as_ref().map_or(true, |s| sig.as_str() > s.as_str()))
                .filter(|(sig, _)| segment_of(sig, total) == segment);

            let page: Vec<&Item> = candidates.by_ref().take(limit).map(|(_, item)| item).collect();
            let last_key = match candidates.next() {
                Some(_) => page.last().map(|item| table.key_of(item)),
                None => None,
            };
            let items = page
                .into_iter()
                .map(|item| project(item, &request.attributes_to_get))
                .collect();
            Ok(ScanPage::new(items, last_key))
        })
    }
}

impl TableClient for MemoryTableClient {
    fn get_item(&self, table: &str, key: &Item, _consistent_read: bool) -> Result<Option<Item>, BoxError> {
        self.with_table(table, |t| {
            let signature = t.signature(key)?;
            Ok(t.items.get(&signature).cloned())
        })
    }

    fn put_item(&self, table: &str, item: Item) -> Result<(), BoxError> {
        self.with_table(table, |t| {
            let signature = t.signature(&item)?;
            t.items.insert(signature, item);
            Ok(())
        })
    }

    fn delete_item(&self, table: &str, key: &Item) -> Result<(), BoxError> {
        self.with_table(table, |t| {
            let signature = t.signature(key)?;
            t.items.remove(&signature);
            Ok(())
        })
    }
}

/// FNV-1a over the key signature
fn segment_of(signature: &str, total: u32) -> u32 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in signature.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    (hash % u64::from(total)) as u32
}

fn project(item: &Item, attributes: &[String]) -> Item {
    if attributes.is_empty() {
        return item.clone();
    }
    item.iter()
        .filter(|(name, _)| attributes.iter().any(|a| a == *name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
