//! Object stores backing [`S3Link`](super::S3Link)

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::errors::{ObjectStoreError, ObjectStoreResult};

/// Blob storage addressed by region, bucket and key.
pub trait ObjectStore: Send + Sync {
    fn put(&self, region: &str, bucket: &str, key: &str, data: &[u8]) -> ObjectStoreResult<()>;

    fn get(&self, region: &str, bucket: &str, key: &str) -> ObjectStoreResult<Vec<u8>>;

    fn delete(&self, region: &str, bucket: &str, key: &str) -> ObjectStoreResult<()>;

    fn exists(&self, region: &str, bucket: &str, key: &str) -> ObjectStoreResult<bool>;
}

/// Filesystem store laid out as `root/region/bucket/key`
#[derive(Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, region: &str, bucket: &str, key: &str) -> ObjectStoreResult<PathBuf> {
        let mut path = self.root.clone();
        for part in [region, bucket, key] {
            let relative = Path::new(part);
            let safe = !part.is_empty()
                && relative
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !safe {
                return Err(ObjectStoreError::InvalidPath(format!(
                    "{}/{}/{}",
                    region, bucket, key
                )));
            }
            path.push(relative);
        }
        Ok(path)
    }
}

fn io_error(e: io::Error, path: &str) -> ObjectStoreError {
    if e.kind() == io::ErrorKind::NotFound {
        ObjectStoreError::ObjectNotFound(path.to_string())
    } else {
        ObjectStoreError::IoError(e.to_string())
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, region: &str, bucket: &str, key: &str, data: &[u8]) -> ObjectStoreResult<()> {
        let full_path = self.full_path(region, bucket, key)?;

        // Create parent directories
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ObjectStoreError::IoError(e.to_string()))?;
        }

        fs::write(&full_path, data).map_err(|e| ObjectStoreError::IoError(e.to_string()))
    }

    fn get(&self, region: &str, bucket: &str, key: &str) -> ObjectStoreResult<Vec<u8>> {
        let full_path = self.full_path(region, bucket, key)?;
        fs::read(&full_path).map_err(|e| io_error(e, key))
    }

    fn delete(&self, region: &str, bucket: &str, key: &str) -> ObjectStoreResult<()> {
        let full_path = self.full_path(region, bucket, key)?;
        fs::remove_file(&full_path).map_err(|e| io_error(e, key))
    }

    fn exists(&self, region: &str, bucket: &str, key: &str) -> ObjectStoreResult<bool> {
        Ok(self.full_path(region, bucket, key)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_get() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());

        store.put("eu-west-1", "photos", "cat.png", b"meow").unwrap();
        let data = store.get("eu-west-1", "photos", "cat.png").unwrap();
        assert_eq!(data, b"meow");
        assert!(temp.path().join("eu-west-1/photos/cat.png").is_file());
    }

    #[test]
    fn test_nested_key() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());

        store.put("us-east-1", "docs", "a/b/c.txt", b"nested").unwrap();
        assert_eq!(store.get("us-east-1", "docs", "a/b/c.txt").unwrap(), b"nested");
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());

        store.put("us-east-1", "b", "delete-me", b"bye").unwrap();
        assert!(store.exists("us-east-1", "b", "delete-me").unwrap());

        store.delete("us-east-1", "b", "delete-me").unwrap();
        assert!(!store.exists("us-east-1", "b", "delete-me").unwrap());
    }

    #[test]
    fn test_not_found() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());

        let result = store.get("us-east-1", "b", "missing");
        assert!(matches!(result, Err(ObjectStoreError::ObjectNotFound(_))));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());

        let result = store.put("us-east-1", "b", "../../etc/passwd", b"x");
        assert!(matches!(result, Err(ObjectStoreError::InvalidPath(_))));
        let result = store.put("us-east-1", "", "key", b"x");
        assert!(matches!(result, Err(ObjectStoreError::InvalidPath(_))));
    }
}
