//! JSON file storage
//!
//! One pretty-printed UTF-8 JSON document per store. Writes go to a
//! sibling temp file first and are renamed over the target.

use std::path::PathBuf;

use async_trait::async_trait;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use super::{AccessLogStore, OccupancyStore, PlateStore, ReservationStore};
use crate::domain::{AccessLogEntry, DomainResult, LedgerSnapshot, OccupancySnapshot, PlateEntry};
use crate::support::errors::InfraError;

/// A single JSON document on disk
pub struct JsonFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read and decode the document. A missing file is `Ok(None)`.
    pub async fn read<T: DeserializeOwned>(&self) -> Result<Option<T>, InfraError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`read`](Self::read), but an undecodable document counts as
    /// absent. I/O errors are still reported.
    pub async fn read_lenient<T: DeserializeOwned>(&self) -> Result<Option<T>, InfraError> {
        match self.read().await {
            Err(InfraError::Serialization(e)) => {
                warn!(
                    "Ignoring unreadable JSON in {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
            other => other,
        }
    }

    pub async fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), InfraError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let _guard = self.write_lock.lock().await;
        self.write_locked(&bytes).await
    }

    async fn write_locked(&self, bytes: &[u8]) -> Result<(), InfraError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

// ── Reservations ───────────────────────────────────────────────

pub struct JsonReservationStore {
    file: JsonFile,
}

impl JsonReservationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }
}

#[async_trait]
impl ReservationStore for JsonReservationStore {
    async fn load(&self) -> DomainResult<Option<LedgerSnapshot>> {
        Ok(self.file.read().await?)
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> DomainResult<()> {
        Ok(self.file.write(snapshot).await?)
    }
}

// ── Plates ─────────────────────────────────────────────────────

pub struct JsonPlateStore {
    file: JsonFile,
}

impl JsonPlateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }
}

#[async_trait]
impl PlateStore for JsonPlateStore {
    async fn load(&self) -> DomainResult<Vec<PlateEntry>> {
        Ok(self
            .file
            .read_lenient::<Vec<PlateEntry>>()
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, entries: &[PlateEntry]) -> DomainResult<()> {
        Ok(self.file.write(entries).await?)
    }
}

// ── Access log ─────────────────────────────────────────────────

pub struct JsonAccessLogStore {
    file: JsonFile,
}

impl JsonAccessLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }
}

#[async_trait]
impl AccessLogStore for JsonAccessLogStore {
    async fn load(&self) -> DomainResult<Vec<AccessLogEntry>> {
        Ok(self
            .file
            .read_lenient::<Vec<AccessLogEntry>>()
            .await?
            .unwrap_or_default())
    }

    async fn append(&self, entry: &AccessLogEntry) -> DomainResult<()> {
        // read-modify-write must not interleave with another append
        let _guard = self.file.write_lock.lock().await;
        let mut entries: Vec<AccessLogEntry> =
            self.file.read_lenient().await?.unwrap_or_default();
        entries.push(entry.clone());
        let bytes = serde_json::to_vec_pretty(&entries).map_err(InfraError::from)?;
        Ok(self.file.write_locked(&bytes).await?)
    }
}

// ── Sensors ────────────────────────────────────────────────────

pub struct JsonOccupancyStore {
    file: JsonFile,
}

impl JsonOccupancyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }
}

#[async_trait]
impl OccupancyStore for JsonOccupancyStore {
    async fn load(&self) -> DomainResult<Option<OccupancySnapshot>> {
        Ok(self.file.read().await?)
    }

    async fn save(&self, snapshot: &OccupancySnapshot) -> DomainResult<()> {
        Ok(self.file.write(snapshot).await?)
    }
}

// ── Tests ──────────────────────────────────────────────────────
