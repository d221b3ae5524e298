//! In-memory storage implementation
//!
//! Used for development and tests. Every store can be switched into a
//! failing mode to simulate a broken disk.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AccessLogStore, OccupancyStore, PlateStore, ReservationStore};
use crate::domain::{
    AccessLogEntry, DomainError, DomainResult, LedgerSnapshot, OccupancySnapshot, PlateEntry,
};

#[derive(Default)]
struct FailSwitch {
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl FailSwitch {
    fn set(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Count a write attempt and fail it when the switch is on
    fn write(&self, store: &str) -> DomainResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Persistence(format!("{} store unavailable", store)));
        }
        Ok(())
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Reservations ───────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryReservationStore {
    snapshot: Mutex<Option<LedgerSnapshot>>,
    switch: FailSwitch,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            switch: FailSwitch::default(),
        }
    }

    pub fn fail_writes(&self, failing: bool) {
        self.switch.set(failing);
    }

    /// Last successfully written snapshot
    pub fn saved(&self) -> Option<LedgerSnapshot> {
        lock(&self.snapshot).clone()
    }

    /// Number of write attempts, failed ones included
    pub fn write_count(&self) -> usize {
        self.switch.writes()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn load(&self) -> DomainResult<Option<LedgerSnapshot>> {
        Ok(self.saved())
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> DomainResult<()> {
        self.switch.write("reservation")?;
        *lock(&self.snapshot) = Some(snapshot.clone());
        Ok(())
    }
}

// ── Plates ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryPlateStore {
    entries: Mutex<Vec<PlateEntry>>,
    switch: FailSwitch,
}

impl InMemoryPlateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<PlateEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            switch: FailSwitch::default(),
        }
    }

    pub fn fail_writes(&self, failing: bool) {
        self.switch.set(failing);
    }

    pub fn saved(&self) -> Vec<PlateEntry> {
        lock(&self.entries).clone()
    }

    pub fn write_count(&self) -> usize {
        self.switch.writes()
    }
}

#[async_trait]
impl PlateStore for InMemoryPlateStore {
    async fn load(&self) -> DomainResult<Vec<PlateEntry>> {
        Ok(self.saved())
    }

    async fn save(&self, entries: &[PlateEntry]) -> DomainResult<()> {
        self.switch.write("plate")?;
        *lock(&self.entries) = entries.to_vec();
        Ok(())
    }
}

// ── Access log ─────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAccessLogStore {
    entries: Mutex<Vec<AccessLogEntry>>,
    switch: FailSwitch,
}

impl InMemoryAccessLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.switch.set(failing);
    }

    pub fn saved(&self) -> Vec<AccessLogEntry> {
        lock(&self.entries).clone()
    }
}

#[async_trait]
impl AccessLogStore for InMemoryAccessLogStore {
    async fn load(&self) -> DomainResult<Vec<AccessLogEntry>> {
        Ok(self.saved())
    }

    async fn append(&self, entry: &AccessLogEntry) -> DomainResult<()> {
        self.switch.write("access log")?;
        lock(&self.entries).push(entry.clone());
        Ok(())
    }
}

// ── Sensors ────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryOccupancyStore {
    snapshot: Mutex<Option<OccupancySnapshot>>,
    switch: FailSwitch,
}

impl InMemoryOccupancyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: OccupancySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            switch: FailSwitch::default(),
        }
    }

    pub fn fail_writes(&self, failing: bool) {
        self.switch.set(failing);
    }

    pub fn saved(&self) -> Option<OccupancySnapshot> {
        lock(&self.snapshot).clone()
    }
}

#[async_trait]
impl OccupancyStore for InMemoryOccupancyStore {
    async fn load(&self) -> DomainResult<Option<OccupancySnapshot>> {
        Ok(self.saved())
    }

    async fn save(&self, snapshot: &OccupancySnapshot) -> DomainResult<()> {
        self.switch.write("sensor")?;
        *lock(&self.snapshot) = Some(snapshot.clone());
        Ok(())
    }
}
