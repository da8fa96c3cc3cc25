//! Document mapper
//!
//! Ties an [`ItemConverter`] to a [`TableClient`]: documents are saved,
//! loaded and deleted by their registered keys, and scanned in parallel.

use std::sync::Arc;

use tracing::{debug, info};

use crate::attribute::Item;
use crate::convert::ItemConverter;
use crate::mapping::{Attribute, Document, DocumentModel, MappingError, PropertyDef, Value};
use crate::observability::{MetricsRegistry, ObservationScope};
use crate::scan::{ParallelScanTask, ParallelScanner, ScanClient, ScanRequest};

use super::client::TableClient;
use super::config::MapperConfig;
use super::errors::{MapperError, MapperResult};

/// Maps documents onto the tables of one client.
#[derive(Debug)]
pub struct Mapper<C> {
    client: Arc<C>,
    config: MapperConfig,
    converter: ItemConverter,
}

impl<C: TableClient + 'static> Mapper<C> {
    /// Validates the configuration and builds a converter for its schema.
    pub fn new(client: Arc<C>, config: MapperConfig) -> MapperResult<Self> {
        config.validate()?;
        let converter = ItemConverter::new(config.schema());
        info!(
            event = "MAPPER_CREATED",
            schema = converter.schema().name(),
            scan_segments = config.scan_segments,
            "mapper created"
        );
        Ok(Self {
            client,
            config,
            converter,
        })
    }

    /// Uses a converter built elsewhere, for example with a custom schema.
    pub fn with_converter(client: Arc<C>, config: MapperConfig, converter: ItemConverter) -> MapperResult<Self> {
        config.validate()?;
        Ok(Self {
            client,
            config,
            converter,
        })
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn converter(&self) -> &ItemConverter {
        &self.converter
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        self.converter.metrics()
    }

    /// Resolved table name of `T`.
    pub fn table_name<T: Document>(&self) -> MapperResult<String> {
        let model = self.converter.model::<T>();
        table_of(&model, &self.config)
    }

    /// Writes `object`, replacing any item with the same key.
    pub fn save<T: Document>(&self, object: &T) -> MapperResult<()> {
        let model = self.converter.model::<T>();
        let table = table_of(&model, &self.config)?;
        // Fails on an unset key before anything is written
        self.key_of(object)?;

        let item = self.converter.to_item(object)?;
        let attributes = item.len();
        self.client
            .put_item(&table, item)
            .map_err(|e| MapperError::client(&table, e))?;
        debug!(event = "ITEM_SAVED", table = %table, type_name = model.type_name(), attributes, "item saved");
        Ok(())
    }

    /// Loads the document with the given hash key.
    pub fn load<T: Document, H: Attribute>(&self, hash: H) -> MapperResult<Option<T>> {
        let model = self.converter.model::<T>();
        let hash_key = hash_property(&model)?;
        if model.range_key().is_some() {
            return Err(MappingError::invalid_configuration(format!(
                "{} has a range key; use load_with_range",
                model.type_name()
            ))
            .into());
        }
        let mut key = Item::new();
        self.insert_key::<T>(&mut key, hash_key, hash.to_value())?;
        self.load_key(&model, key)
    }

    /// Loads the document with the given hash and range keys.
    pub fn load_with_range<T: Document, H: Attribute, R: Attribute>(
        &self,
        hash: H,
        range: R,
    ) -> MapperResult<Option<T>> {
        let model = self.converter.model::<T>();
        let hash_key = hash_property(&model)?;
        let range_key = model.range_key().ok_or_else(|| MapperError::MissingKey {
            type_name: model.type_name().to_string(),
            key: "range",
        })?;
        let mut key = Item::new();
        self.insert_key::<T>(&mut key, hash_key, hash.to_value())?;
        self.insert_key::<T>(&mut key, range_key, range.to_value())?;
        self.load_key(&model, key)
    }

    /// Deletes the item keyed like `object`.
    pub fn delete<T: Document>(&self, object: &T) -> MapperResult<()> {
        let model = self.converter.model::<T>();
        let table = table_of(&model, &self.config)?;
        let key = self.key_of(object)?;
        self.client
            .delete_item(&table, &key)
            .map_err(|e| MapperError::client(&table, e))?;
        debug!(event = "ITEM_DELETED", table = %table, type_name = model.type_name(), "item deleted");
        Ok(())
    }

    /// The key item of `object`: its hash key and, when registered, its
    /// range key.
    pub fn key_of<T: Document>(&self, object: &T) -> MapperResult<Item> {
        let model = self.converter.model::<T>();
        let mut key = Item::new();
        let hash_key = hash_property(&model)?;
        self.insert_key::<T>(&mut key, hash_key, hash_key.get(object))?;
        if let Some(range_key) = model.range_key() {
            self.insert_key::<T>(&mut key, range_key, range_key.get(object))?;
        }
        Ok(key)
    }

    /// Starts a parallel scan of `T`'s table with the configured number of
    /// segments.
    pub fn parallel_scan<T: Document>(&self) -> MapperResult<ParallelScanner<'_, T>> {
        self.parallel_scan_with::<T>(self.config.scan_segments)
    }

    pub fn parallel_scan_with<T: Document>(&self, total_segments: u32) -> MapperResult<ParallelScanner<'_, T>> {
        if total_segments == 0 {
            return Err(MapperError::InvalidConfig(
                "a parallel scan needs at least one segment".to_string(),
            ));
        }
        let table = self.table_name::<T>()?;
        let mut base = ScanRequest::new(&table).with_consistent_read(self.config.consistent_reads);
        if let Some(limit) = self.config.scan_page_limit {
            base = base.with_limit(limit);
        }

        let client: Arc<dyn ScanClient> = self.client.clone();
        let task = ParallelScanTask::new(client, base.segmented(total_segments))?
            .with_metrics(Arc::clone(self.converter.metrics()));
        debug!(event = "SCAN_STARTED", table = %table, segments = total_segments, "parallel scan started");
        Ok(ParallelScanner::new(task, &self.converter))
    }

    /// Scans the whole table of `T`.
    pub fn scan_all<T: Document>(&self) -> MapperResult<Vec<T>> {
        let scanner = self.parallel_scan::<T>()?;
        let scope = ObservationScope::new("SCAN_ALL");
        match scanner.collect_all() {
            Ok(objects) => {
                scope.complete();
                Ok(objects)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e.into())
            }
        }
    }

    fn load_key<T: Document>(&self, model: &DocumentModel<T>, key: Item) -> MapperResult<Option<T>> {
        let table = table_of(model, &self.config)?;
        let item = self
            .client
            .get_item(&table, &key, self.config.consistent_reads)
            .map_err(|e| MapperError::client(&table, e))?;
        match item {
            Some(item) => Ok(Some(self.converter.from_item(Some(&item))?)),
            None => {
                debug!(event = "ITEM_NOT_FOUND", table = %table, type_name = model.type_name(), "no item for key");
                Ok(None)
            }
        }
    }

    fn insert_key<T: Document>(
        &self,
        key: &mut Item,
        property: &PropertyDef<T>,
        value: Option<Value>,
    ) -> MapperResult<()> {
        let type_name = self.converter.model::<T>().type_name();
        let value = value.ok_or_else(|| {
            MappingError::invalid_value(format!("key {} is not set", property.name()))
                .in_field(type_name, property.name())
        })?;
        let field = self.converter.field_model::<T>(property.name())?;
        let wire = field
            .marshall(&value, &self.converter)
            .map_err(|e| e.in_field(type_name, property.name()))?;
        key.insert(field.attribute_name().to_string(), wire);
        Ok(())
    }
}

fn table_of<T: 'static>(model: &DocumentModel<T>, config: &MapperConfig) -> MapperResult<String> {
    let table = model.table().ok_or_else(|| MapperError::MissingTable {
        type_name: model.type_name().to_string(),
    })?;
    Ok(config.table_name(table))
}

fn hash_property<T: 'static>(model: &DocumentModel<T>) -> MapperResult<&PropertyDef<T>> {
    model.hash_key().ok_or_else(|| MapperError::MissingKey {
        type_name: model.type_name().to_string(),
        key: "hash",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MemoryTableClient;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Note {
        author: String,
        posted: i64,
        body: Option<String>,
    }

    impl Document for Note {
        fn model() -> DocumentModel<Self> {
            DocumentModel::builder("Note")
                .table("notes")
                .hash_key("author", |n: &Note| &n.author, |n: &mut Note| &mut n.author)
                .range_key("posted", |n: &Note| &n.posted, |n: &mut Note| &mut n.posted)
                .field("body", |n: &Note| &n.body, |n: &mut Note| &mut n.body)
                .build()
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Loose {
        text: String,
    }

    impl Document for Loose {
        fn model() -> DocumentModel<Self> {
            DocumentModel::builder("Loose")
                .field("text", |l: &Loose| &l.text, |l: &mut Loose| &mut l.text)
                .build()
        }
    }

    fn mapper(config: MapperConfig) -> Mapper<MemoryTableClient> {
        let client = Arc::new(MemoryTableClient::new());
        client.create_table(&config.table_name("notes"), "author", Some("posted"));
        Mapper::new(client, config).unwrap()
    }

    #[test]
    fn test_save_load_delete_with_range() {
        let mapper = mapper(MapperConfig::default());
        let note = Note {
            author: "ana".into(),
            posted: 7,
            body: Some("hello".into()),
        };
        mapper.save(&note).unwrap();

        let loaded: Option<Note> = mapper.load_with_range("ana".to_string(), 7i64).unwrap();
        assert_eq!(loaded, Some(note.clone()));
        assert!(mapper.load_with_range::<Note, _, _>("ana".to_string(), 8i64).unwrap().is_none());

        mapper.delete(&note).unwrap();
        assert!(mapper.load_with_range::<Note, _, _>("ana".to_string(), 7i64).unwrap().is_none());
    }

    #[test]
    fn test_load_without_range_rejected() {
        let mapper = mapper(MapperConfig::default());
        let err = mapper.load::<Note, _>("ana".to_string()).unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_INVALID_CONFIGURATION");
    }

    #[test]
    fn test_prefixed_table() {
        let mapper = mapper(MapperConfig {
            table_name_prefix: Some("test_".into()),
            ..Default::default()
        });
        assert_eq!(mapper.table_name::<Note>().unwrap(), "test_notes");
        mapper.save(&Note::default()).unwrap();
        assert_eq!(mapper.client().item_count("test_notes"), 1);
    }

    #[test]
    fn test_unmapped_type() {
        let mapper = mapper(MapperConfig::default());
        let err = mapper.save(&Loose::default()).unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_MISSING_TABLE");
    }

    #[test]
    fn test_client_error_names_table() {
        let client = Arc::new(MemoryTableClient::new());
        let mapper = Mapper::new(client, MapperConfig::default()).unwrap();
        let err = mapper.save(&Note::default()).unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_CLIENT_FAILED");
        assert!(err.to_string().contains("notes"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MapperConfig {
            scan_segments: 0,
            ..Default::default()
        };
        assert!(Mapper::new(Arc::new(MemoryTableClient::new()), config).is_err());
    }
}
