//! Local disk storage, served back under `/uploads/`.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use super::{UploadError, UploadProvider};

const PROVIDER: &str = "local";

/// Writes uploads into a directory. Always available.
pub struct LocalDiskProvider {
    dir: PathBuf,
}

impl LocalDiskProvider {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl UploadProvider for LocalDiskProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn upload(&self, data: Bytes, object_name: &str) -> Result<String, UploadError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| UploadError::failed(PROVIDER, e))?;

        let path = self.dir.join(object_name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| UploadError::failed(PROVIDER, format!("{}: {}", path.display(), e)))?;

        Ok(format!("/uploads/{}", object_name))
    }
}
