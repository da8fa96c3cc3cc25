//! Mapper configuration
//!
//! Loaded from a JSON file; every field is optional.
//!
//! ```json
//! {
//!   "conversion_schema": "v2_compatible",
//!   "table_name_prefix": "staging_",
//!   "scan_segments": 8
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::convert::{ConversionSchema, ConversionSchemaKind};

use super::errors::{MapperError, MapperResult};

/// Mapper configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Conversion schema (default: v2)
    #[serde(default)]
    pub conversion_schema: ConversionSchemaKind,

    /// Prepended to every model table name
    #[serde(default)]
    pub table_name_prefix: Option<String>,

    /// Replaces every model table name
    #[serde(default)]
    pub table_name_override: Option<String>,

    /// Strongly consistent reads for load (default: false)
    #[serde(default)]
    pub consistent_reads: bool,

    /// Segments used by parallel scans (default: 4)
    #[serde(default = "default_scan_segments")]
    pub scan_segments: u32,

    /// Page size per segment request
    #[serde(default)]
    pub scan_page_limit: Option<u32>,
}

fn default_scan_segments() -> u32 {
    4
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            conversion_schema: ConversionSchemaKind::default(),
            table_name_prefix: None,
            table_name_override: None,
            consistent_reads: false,
            scan_segments: default_scan_segments(),
            scan_page_limit: None,
        }
    }
}

impl MapperConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> MapperResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| MapperError::ConfigIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: MapperConfig =
            serde_json::from_str(&text).map_err(|e| MapperError::ConfigIo {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MapperResult<()> {
        if self.scan_segments == 0 {
            return Err(MapperError::InvalidConfig(
                "scan_segments must be at least 1".to_string(),
            ));
        }
        if self.scan_page_limit == Some(0) {
            return Err(MapperError::InvalidConfig(
                "scan_page_limit must be at least 1".to_string(),
            ));
        }
        if matches!(self.table_name_override.as_deref(), Some("")) {
            return Err(MapperError::InvalidConfig(
                "table_name_override must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn schema(&self) -> ConversionSchema {
        ConversionSchema::from_kind(self.conversion_schema)
    }

    /// Resolves the table name for a model table.
    pub fn table_name(&self, model_table: &str) -> String {
        if let Some(name) = &self.table_name_override {
            return name.clone();
        }
        match &self.table_name_prefix {
            Some(prefix) => format!("{}{}", prefix, model_table),
            None => model_table.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config: MapperConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MapperConfig::default());
        assert_eq!(config.conversion_schema, ConversionSchemaKind::V2);
        assert_eq!(config.scan_segments, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_table_names() {
        let mut config = MapperConfig {
            table_name_prefix: Some("dev_".into()),
            ..Default::default()
        };
        assert_eq!(config.table_name("orders"), "dev_orders");

        config.table_name_override = Some("shared".into());
        assert_eq!(config.table_name("orders"), "shared");
    }

    #[test]
    fn test_validate_rejects_zero_segments() {
        let config = MapperConfig {
            scan_segments: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_CONFIG_INVALID");
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"conversion_schema":"v1","scan_segments":2,"consistent_reads":true}}"#
        )
        .unwrap();

        let config = MapperConfig::load(file.path()).unwrap();
        assert_eq!(config.conversion_schema, ConversionSchemaKind::V1);
        assert_eq!(config.scan_segments, 2);
        assert!(config.consistent_reads);
        assert!(config.schema().same_as(&ConversionSchema::v1()));
    }

    #[test]
    fn test_load_errors() {
        let err = MapperConfig::load(Path::new("/nonexistent/dynamap.json")).unwrap_err();
        assert_eq!(err.code(), "DYNAMAP_CONFIG_IO");

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"conversion_schema":"v3"}}"#).unwrap();
        assert!(MapperConfig::load(file.path()).is_err());
    }
}
