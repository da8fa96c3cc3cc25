//! Links from items to objects in blob storage
//!
//! A link is stored as an `S` attribute holding
//! `{"s3":{"bucket":"…","key":"…","region":"…"}}`.

use serde::{Deserialize, Serialize};

use super::errors::ObjectStoreResult;
use super::store::ObjectStore;

pub const DEFAULT_REGION: &str = "us-east-1";

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Points at one object in blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct S3Link {
    pub bucket: String,
    pub key: String,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Serialize, Deserialize)]
struct LinkEnvelope {
    s3: S3Link,
}

impl S3Link {
    pub fn new(region: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            region: region.into(),
        }
    }

    /// Link in the default region
    pub fn in_default_region(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(DEFAULT_REGION, bucket, key)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&LinkEnvelope { s3: self.clone() })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<LinkEnvelope>(text).map(|envelope| envelope.s3)
    }

    /// Stores `data` at this link.
    pub fn upload(&self, store: &dyn ObjectStore, data: &[u8]) -> ObjectStoreResult<()> {
        store.put(&self.region, &self.bucket, &self.key, data)
    }

    /// Reads the object this link points at.
    pub fn download(&self, store: &dyn ObjectStore) -> ObjectStoreResult<Vec<u8>> {
        store.get(&self.region, &self.bucket, &self.key)
    }

    pub fn exists(&self, store: &dyn ObjectStore) -> ObjectStoreResult<bool> {
        store.exists(&self.region, &self.bucket, &self.key)
    }

    pub fn delete(&self, store: &dyn ObjectStore) -> ObjectStoreResult<()> {
        store.delete(&self.region, &self.bucket, &self.key)
    }
}
