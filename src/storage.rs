//! Persistent counter and scratch payload files for the volume-demo routes.
//!
//! Everything lives under one data directory, typically a mounted volume:
//! `counter.txt` holds a bare integer, and each write-route call produces a
//! `data_YYYYMMDD_HHMMSS.json` file. Two writes within the same second land
//! on the same name and silently overwrite.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::Result;

const COUNTER_FILE: &str = "counter.txt";

/// On-disk storage for the counter and written payloads.
///
/// Counter increments serialize on an async mutex so concurrent requests
/// cannot lose updates. Payload files are written without coordination.
#[derive(Debug)]
pub struct Storage {
    data_dir: PathBuf,
    counter_lock: Mutex<()>,
}

/// Metadata for one file previously written via the write route.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// File name within the data directory.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last-modified time, RFC 3339.
    pub modified: String,
}

impl Storage {
    /// Create storage rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            counter_lock: Mutex::new(()),
        }
    }

    /// The data directory this storage writes into.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create the data directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    fn counter_path(&self) -> PathBuf {
        self.data_dir.join(COUNTER_FILE)
    }

    /// Current counter value. Missing or corrupt files read as zero.
    async fn read_counter(&self) -> u64 {
        match fs::read_to_string(self.counter_path()).await {
            Ok(contents) => contents.trim().parse().unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Increment the persistent counter and return the new value.
    pub async fn increment_counter(&self) -> Result<u64> {
        let _guard = self.counter_lock.lock().await;

        let count = self.read_counter().await + 1;
        fs::write(self.counter_path(), count.to_string()).await?;
        Ok(count)
    }

    /// Write a payload to a timestamp-named JSON file, returning its path.
    pub async fn write_payload(&self, payload: &Value) -> Result<String> {
        let stamp = OffsetDateTime::now_utc()
            .format(format_description!("[year][month][day]_[hour][minute][second]"))?;

        let path = self.data_dir.join(format!("data_{stamp}.json"));
        fs::write(&path, serde_json::to_vec(payload)?).await?;
        Ok(path.display().to_string())
    }

    /// List the JSON payload files in the data directory, sorted by name.
    pub async fn list_files(&self) -> Result<Vec<FileEntry>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let metadata = entry.metadata().await?;
            let modified = OffsetDateTime::from(metadata.modified()?).format(&Rfc3339)?;

            files.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified,
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}
