//! On-disk upload store.
//!
//! Files are written under a generated name (`<uuid>.<ext>`) so the client-supplied name never
//! reaches the filesystem; the router serves the directory read-only at `/files`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::validation::{allowed_extension, sanitize_filename};

/// A file persisted by [`UploadStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Generated name the file is stored and served under
    pub name: String,
    /// Sanitized form of the client-supplied filename
    pub original_name: String,
    pub size_bytes: usize,
}

#[derive(Debug)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the store, creating its directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create upload directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate `filename` and write `data` under a freshly generated name.
    #[instrument(skip(self, data), fields(size_bytes = data.len()))]
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<StoredUpload> {
        if filename.is_empty() {
            return Err(Error::BadRequest {
                message: "No selected file".to_string(),
            });
        }

        let original_name = sanitize_filename(filename);
        let extension = allowed_extension(&original_name)?;
        let name = format!("{}.{}", Uuid::new_v4().simple(), extension);

        let path = self.dir.join(&name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("write upload to {}", path.display()))?;

        info!(stored_as = %name, original_name = %original_name, "Upload stored");

        Ok(StoredUpload {
            name,
            original_name,
            size_bytes: data.len(),
        })
    }
}
