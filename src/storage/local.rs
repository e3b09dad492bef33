//! Object store backed by a local directory (`<root>/<bucket>/<key>`).

use std::path::{Component, Path, PathBuf};

use super::ObjectStore;
use crate::Result;
use crate::error::OddsError;

/// Directory-backed [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File path of `bucket/key`, refusing keys that escape the bucket.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for part in [bucket, key] {
            let relative = Path::new(part);
            let escapes = relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if part.is_empty() || escapes {
                return Err(OddsError::Storage(format!("invalid object name {part:?}")));
            }
            path.push(relative);
        }
        Ok(path)
    }
}

impl ObjectStore for LocalStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::read(&path).await.map_err(|e| {
            OddsError::Storage(format!("cannot read {bucket}/{key} ({}): {e}", path.display()))
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        Ok(())
    }
}
