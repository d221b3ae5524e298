//! Plate registry: spot → plate assignments, plate-based gate checks and
//! the access log.
//!
//! The plate table has its own lock; the access log is appended under a
//! separate mutex so concurrent verifications only share a read lock on
//! the table.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    normalize_plate, AccessLogEntry, DomainError, DomainResult, PlateEntry, PlateVerdict,
};
use crate::infrastructure::{AccessLogStore, PlateStore};

pub struct PlateRegistry {
    entries: RwLock<Vec<PlateEntry>>,
    access_log: Mutex<Vec<AccessLogEntry>>,
    store: Arc<dyn PlateStore>,
    log_store: Arc<dyn AccessLogStore>,
}

impl PlateRegistry {
    pub fn new(store: Arc<dyn PlateStore>, log_store: Arc<dyn AccessLogStore>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            access_log: Mutex::new(Vec::new()),
            store,
            log_store,
        }
    }

    /// Registry restored from its stores. Unreadable stores are logged and
    /// treated as empty.
    pub async fn load(store: Arc<dyn PlateStore>, log_store: Arc<dyn AccessLogStore>) -> Self {
        let registry = Self::new(store.clone(), log_store.clone());

        match store.load().await {
            Ok(entries) => {
                info!("Loaded {} plate assignments", entries.len());
                *registry.entries.write().await = entries;
            }
            Err(e) => error!("Failed to load plates, starting empty: {}", e),
        }

        match log_store.load().await {
            Ok(log) => *registry.access_log.lock().await = log,
            Err(e) => error!("Failed to load access log, starting empty: {}", e),
        }

        registry
    }

    /// Current assignments, as stored
    pub async fn list(&self) -> Vec<PlateEntry> {
        self.entries.read().await.clone()
    }

    /// Assign `plate` to `spot`, replacing any previous assignment of that
    /// spot. No upper bound is enforced on `spot`.
    pub async fn upsert(&self, spot: i64, plate: &str) -> DomainResult<PlateEntry> {
        if spot < 1 {
            return Err(DomainError::InvalidInput(format!(
                "spot must be a positive integer, got {}",
                spot
            )));
        }
        let plate = plate.trim();
        if plate.is_empty() {
            return Err(DomainError::InvalidInput("plate must not be empty".to_string()));
        }

        let entry = PlateEntry::new(spot, plate);
        let mut entries = self.entries.write().await;
        match entries.iter().position(|e| e.spot == spot) {
            Some(pos) => {
                entries[pos].plate = entry.plate.clone();
                // bulk replace may have left duplicates of this spot behind
                let mut seen = false;
                entries.retain(|e| {
                    if e.spot != spot {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
                info!("Plate for spot {} updated to {}", spot, plate);
            }
            None => {
                entries.push(entry.clone());
                info!("Plate {} assigned to spot {}", plate, spot);
            }
        }
        entries.sort_by_key(|e| e.spot);

        self.persist(&entries).await;
        Ok(entry)
    }

    /// Remove the assignment of `spot`. Removing an unassigned spot is not
    /// an error; returns whether anything was removed.
    pub async fn remove(&self, spot: i64) -> DomainResult<bool> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.spot != spot);
        let removed = entries.len() != before;

        if removed {
            info!("Plate assignment for spot {} removed", spot);
        } else {
            info!("No plate assigned to spot {}, nothing to remove", spot);
        }
        self.persist(&entries).await;
        Ok(removed)
    }

    /// Remove every assignment whose plate matches `plate` after
    /// normalization. Returns the number of entries removed.
    pub async fn remove_by_plate(&self, plate: &str) -> DomainResult<usize> {
        let normalized = normalize_plate(plate);
        if normalized.is_empty() {
            return Err(DomainError::InvalidInput("plate must not be empty".to_string()));
        }

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !e.matches(&normalized));
        let removed = before - entries.len();

        if removed > 0 {
            info!("Removed {} assignment(s) of plate {}", removed, plate);
            self.persist(&entries).await;
        }
        Ok(removed)
    }

    /// Overwrite the whole table. Entries are stored as given; duplicate
    /// spots are not collapsed here.
    pub async fn replace_all(&self, new_entries: Vec<PlateEntry>) -> DomainResult<()> {
        let mut entries = self.entries.write().await;
        *entries = new_entries;
        info!("Plate table replaced ({} entries)", entries.len());
        self.persist(&entries).await;
        Ok(())
    }

    /// Check a plate at the gate. Every call appends exactly one access
    /// log entry, granted or not.
    pub async fn verify_plate(&self, submitted: &str) -> DomainResult<PlateVerdict> {
        if submitted.is_empty() {
            return Err(DomainError::InvalidInput("plate must not be empty".to_string()));
        }

        // whitespace-only input is checked and logged, but never matches
        let normalized = normalize_plate(submitted);
        let matched = if normalized.is_empty() {
            None
        } else {
            let entries = self.entries.read().await;
            entries.iter().find(|e| e.matches(&normalized)).map(|e| e.spot)
        };

        let (entry, verdict) = match matched {
            Some(spot) => (
                AccessLogEntry::granted(submitted, spot),
                PlateVerdict {
                    granted: true,
                    spot: Some(spot),
                },
            ),
            None => (
                AccessLogEntry::denied(submitted),
                PlateVerdict {
                    granted: false,
                    spot: None,
                },
            ),
        };

        self.record_access(entry).await;

        let granted = if verdict.granted { "true" } else { "false" };
        metrics::counter!("parking_access_checks_total", "method" => "plate", "granted" => granted)
            .increment(1);
        match verdict.spot {
            Some(spot) => info!("Plate {} granted access to spot {}", submitted, spot),
            None => info!("Plate {} denied", submitted),
        }
        Ok(verdict)
    }

    /// Last `limit` access log entries, newest first
    pub async fn recent_access(&self, limit: usize) -> Vec<AccessLogEntry> {
        let log = self.access_log.lock().await;
        log.iter().rev().take(limit).cloned().collect()
    }

    async fn record_access(&self, entry: AccessLogEntry) {
        let mut log = self.access_log.lock().await;
        if let Err(e) = self.log_store.append(&entry).await {
            metrics::counter!("parking_persistence_failures_total", "store" => "access_log")
                .increment(1);
            warn!("Failed to persist access log entry (kept in memory): {}", e);
        }
        log.push(entry);
    }

    async fn persist(&self, entries: &[PlateEntry]) {
        if let Err(e) = self.store.save(entries).await {
            metrics::counter!("parking_persistence_failures_total", "store" => "plates")
                .increment(1);
            error!("Failed to persist plates (in-memory state kept): {}", e);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::{InMemoryAccessLogStore, InMemoryPlateStore};

    struct Fixture {
        registry: PlateRegistry,
        plates: Arc<InMemoryPlateStore>,
        log: Arc<InMemoryAccessLogStore>,
    }

    fn fixture() -> Fixture {
        let plates = Arc::new(InMemoryPlateStore::new());
        let log = Arc::new(InMemoryAccessLogStore::new());
        Fixture {
            registry: PlateRegistry::new(plates.clone(), log.clone()),
            plates,
            log,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_table_sorted_and_persists() {
        let f = fixture();
        f.registry.upsert(7, "ZG-777").await.unwrap();
        f.registry.upsert(2, "ST-222").await.unwrap();
        f.registry.upsert(5, "RI-555").await.unwrap();

        let spots: Vec<i64> = f.registry.list().await.iter().map(|e| e.spot).collect();
        assert_eq!(spots, vec![2, 5, 7]);
        assert_eq!(f.plates.saved(), f.registry.list().await);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_spot() {
        let f = fixture();
        f.registry.upsert(3, "OLD-1").await.unwrap();
        f.registry.upsert(3, "NEW-1").await.unwrap();
        assert_eq!(f.registry.list().await, vec![PlateEntry::new(3, "NEW-1")]);
    }

    #[tokio::test]
    async fn upsert_validates_input() {
        let f = fixture();
        assert!(matches!(
            f.registry.upsert(0, "A").await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            f.registry.upsert(-4, "A").await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            f.registry.upsert(1, "  ").await,
            Err(DomainError::InvalidInput(_))
        ));
        assert_eq!(f.plates.write_count(), 0);
    }

    #[tokio::test]
    async fn upsert_accepts_spots_beyond_lot_size() {
        let f = fixture();
        f.registry.upsert(999, "FAR-AWAY").await.unwrap();
        assert_eq!(f.registry.list().await[0].spot, 999);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let f = fixture();
        f.registry.upsert(1, "A-1").await.unwrap();
        f.registry.upsert(2, "B-2").await.unwrap();

        assert!(f.registry.remove(1).await.unwrap());
        let after_first = f.registry.list().await;
        assert!(!f.registry.remove(1).await.unwrap());
        assert_eq!(f.registry.list().await, after_first);
        assert_eq!(f.plates.saved(), after_first);
    }

    #[tokio::test]
    async fn remove_by_plate_uses_normalization() {
        let f = fixture();
        f.registry.upsert(1, "ABC-123").await.unwrap();
        f.registry.upsert(2, "XYZ-999").await.unwrap();

        assert_eq!(f.registry.remove_by_plate("abc -123").await.unwrap(), 1);
        assert_eq!(f.registry.list().await, vec![PlateEntry::new(2, "XYZ-999")]);
        assert_eq!(f.registry.remove_by_plate("nothing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn replace_all_keeps_duplicates_until_next_upsert() {
        let f = fixture();
        f.registry
            .replace_all(vec![
                PlateEntry::new(4, "D-1"),
                PlateEntry::new(1, "A-1"),
                PlateEntry::new(4, "D-2"),
            ])
            .await
            .unwrap();
        assert_eq!(f.registry.list().await.len(), 3);
        assert_eq!(f.plates.saved().len(), 3);

        f.registry.upsert(4, "D-3").await.unwrap();
        assert_eq!(
            f.registry.list().await,
            vec![PlateEntry::new(1, "A-1"), PlateEntry::new(4, "D-3")]
        );
    }

    #[tokio::test]
    async fn verify_is_whitespace_and_case_insensitive_only() {
        let f = fixture();
        f.registry.upsert(1, "ABC-123").await.unwrap();

        let ok = f.registry.verify_plate("ab c-123").await.unwrap();
        assert_eq!(ok, PlateVerdict { granted: true, spot: Some(1) });

        let denied = f.registry.verify_plate("AB-C123").await.unwrap();
        assert_eq!(denied, PlateVerdict { granted: false, spot: None });
    }

    #[tokio::test]
    async fn hyphen_is_not_normalized_away() {
        let f = fixture();
        f.registry.upsert(3, "XY-001").await.unwrap();
        let verdict = f.registry.verify_plate("xy001").await.unwrap();
        assert!(!verdict.granted);
        assert!(f.registry.verify_plate(" x y-0 01 ").await.unwrap().granted);
    }

    #[tokio::test]
    async fn every_verification_logs_once() {
        let f = fixture();
        f.registry.upsert(2, "ST-222").await.unwrap();

        f.registry.verify_plate("st-2 22").await.unwrap();
        f.registry.verify_plate("unknown").await.unwrap();

        let persisted = f.log.saved();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].plate, "st-2 22");
        assert_eq!(persisted[0].spot, Some(2));
        assert!(persisted[0].granted);
        assert_eq!(persisted[1].spot, None);
        assert!(!persisted[1].granted);

        let recent = f.registry.recent_access(10).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].plate, "unknown");
        assert_eq!(f.registry.recent_access(1).await.len(), 1);
    }

    #[tokio::test]
    async fn empty_plate_is_rejected_without_logging() {
        let f = fixture();
        assert!(matches!(
            f.registry.verify_plate("").await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(f.log.saved().is_empty());
        assert!(f.registry.recent_access(10).await.is_empty());
    }

    #[tokio::test]
    async fn whitespace_plate_is_denied_and_logged() {
        let f = fixture();
        f.registry
            .replace_all(vec![PlateEntry::new(4, "")])
            .await
            .unwrap();

        let verdict = f.registry.verify_plate(" \t").await.unwrap();
        assert_eq!(verdict, PlateVerdict { granted: false, spot: None });

        let persisted = f.log.saved();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].plate, " \t");
        assert!(!persisted[0].granted);
    }

    #[tokio::test]
    async fn log_failure_keeps_entry_in_memory() {
        let f = fixture();
        f.log.fail_writes(true);
        let verdict = f.registry.verify_plate("NOPE").await.unwrap();
        assert!(!verdict.granted);
        assert!(f.log.saved().is_empty());
        assert_eq!(f.registry.recent_access(5).await.len(), 1);
    }

    #[tokio::test]
    async fn plate_write_failure_keeps_memory_state() {
        let f = fixture();
        f.plates.fail_writes(true);
        f.registry.upsert(1, "A-1").await.unwrap();
        assert!(f.plates.saved().is_empty());
        assert!(f.registry.verify_plate("a-1").await.unwrap().granted);
    }

    #[tokio::test]
    async fn load_restores_plates_and_log() {
        let plates = Arc::new(InMemoryPlateStore::with_entries(vec![PlateEntry::new(1, "A-1")]));
        let log = Arc::new(InMemoryAccessLogStore::new());
        log.append(&AccessLogEntry::denied("old")).await.unwrap();

        let registry = PlateRegistry::load(plates, log).await;
        assert_eq!(registry.list().await.len(), 1);
        assert_eq!(registry.recent_access(10).await[0].plate, "old");
    }
}
