//! Storage trait definitions
//!
//! Each store receives immutable snapshots to write and hands back the
//! previously written snapshot at startup. In-memory state stays
//! authoritative after load.

use async_trait::async_trait;

use crate::domain::{AccessLogEntry, DomainResult, LedgerSnapshot, OccupancySnapshot, PlateEntry};

/// Durable store for the reservation ledger
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Previously saved snapshot, `None` when nothing was ever saved
    async fn load(&self) -> DomainResult<Option<LedgerSnapshot>>;
    async fn save(&self, snapshot: &LedgerSnapshot) -> DomainResult<()>;
}

/// Durable store for the spot → plate table
#[async_trait]
pub trait PlateStore: Send + Sync {
    async fn load(&self) -> DomainResult<Vec<PlateEntry>>;
    async fn save(&self, entries: &[PlateEntry]) -> DomainResult<()>;
}

/// Append-only store for plate verification attempts
#[async_trait]
pub trait AccessLogStore: Send + Sync {
    async fn load(&self) -> DomainResult<Vec<AccessLogEntry>>;
    async fn append(&self, entry: &AccessLogEntry) -> DomainResult<()>;
}

/// Durable store for sensor occupancy
#[async_trait]
pub trait OccupancyStore: Send + Sync {
    async fn load(&self) -> DomainResult<Option<OccupancySnapshot>>;
    async fn save(&self, snapshot: &OccupancySnapshot) -> DomainResult<()>;
}
