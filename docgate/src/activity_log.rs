//! Bounded activity log persisted as a JSON array file.
//!
//! Appends are serialized behind an async mutex and written through a temporary file that is
//! renamed over the log, so concurrent requests in one process cannot lose each other's entries
//! and readers never observe a half-written file. Sharing one file between processes is not
//! supported.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Upload,
    Ocr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    /// What the activity was about: a stored filename or a document URL
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, subject: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            subject: subject.into(),
            detail,
        }
    }
}

#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    max_entries: usize,
    write_lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All retained entries, oldest first. A missing or unreadable file reads as empty.
    pub async fn entries(&self) -> Vec<ActivityEntry> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read activity log: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "Activity log is not a JSON array, starting afresh: {}", e);
            Vec::new()
        })
    }

    /// Append `entry`, evicting the oldest entries beyond the configured bound.
    pub async fn append(&self, entry: ActivityEntry) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.entries().await;
        entries.push(entry);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        let json = serde_json::to_vec_pretty(&entries).context("serialize activity log")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create activity log directory {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;

        debug!(entries = entries.len(), "Activity log updated");
        Ok(())
    }

    /// Append without failing the caller; errors are logged.
    pub async fn record(&self, entry: ActivityEntry) {
        if let Err(e) = self.append(entry).await {
            warn!("Failed to record activity: {:#}", e);
        }
    }
}
