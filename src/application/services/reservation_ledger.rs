//! Reservation ledger: capacity accounting, token issuance and token
//! verification.
//!
//! All state sits behind one lock per ledger. Mutations persist the full
//! snapshot while still holding the write lock, so the stored copy always
//! reflects a consistent ledger. A failed write is logged and counted; it
//! never undoes the in-memory change.

use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::RwLock;

use crate::config::ParkingConfig;
use crate::domain::reservation::match_code;
use crate::domain::{DomainError, DomainResult, LedgerSnapshot, Reservation, SpotCategory};
use crate::infrastructure::{CodeRenderer, ReservationStore};

/// Free spots per pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub available_total: i64,
    pub available_accessible: i64,
}

impl Availability {
    /// Free spots outside the accessible pool
    pub fn available_standard(&self) -> i64 {
        self.available_total - self.available_accessible
    }
}

/// Result of a successful reservation
#[derive(Debug, Clone)]
pub struct ReservationOutcome {
    pub reservation: Reservation,
    /// Rendered code image, `None` if rendering failed
    pub image: Option<Vec<u8>>,
}

/// Read-only view for status displays
#[derive(Debug, Clone)]
pub struct LedgerStatus {
    pub total_spots: u32,
    pub accessible_spots: u32,
    pub available_total: i64,
    pub available_accessible: i64,
    pub reserved_count: usize,
    pub reservations: Vec<Reservation>,
}

struct LedgerState {
    reservations: Vec<Reservation>,
    next_id: u64,
}

impl LedgerState {
    fn availability(&self, total: u32, accessible: u32) -> Availability {
        let reserved_accessible = self
            .reservations
            .iter()
            .filter(|r| r.category == SpotCategory::Accessible)
            .count() as i64;
        let reserved_standard = self.reservations.len() as i64 - reserved_accessible;

        let available_accessible = accessible as i64 - reserved_accessible;
        let available_standard = (total as i64 - accessible as i64) - reserved_standard;

        Availability {
            available_total: available_standard + available_accessible,
            available_accessible,
        }
    }

    fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            reservations: self.reservations.clone(),
            next_id: self.next_id,
            last_saved: Some(Utc::now()),
        }
    }
}

pub struct ReservationLedger {
    total_spots: u32,
    accessible_spots: u32,
    default_holder: String,
    state: RwLock<LedgerState>,
    store: Arc<dyn ReservationStore>,
    renderer: Arc<dyn CodeRenderer>,
}

impl ReservationLedger {
    /// Empty ledger. Fails if the accessible pool is larger than the lot.
    pub fn new(
        config: &ParkingConfig,
        store: Arc<dyn ReservationStore>,
        renderer: Arc<dyn CodeRenderer>,
    ) -> DomainResult<Self> {
        if config.accessible_spots > config.total_spots {
            return Err(DomainError::InvalidInput(format!(
                "accessible spots ({}) exceed total spots ({})",
                config.accessible_spots, config.total_spots
            )));
        }

        let default_holder = if config.default_holder.trim().is_empty() {
            "Unknown".to_string()
        } else {
            config.default_holder.clone()
        };

        Ok(Self {
            total_spots: config.total_spots,
            accessible_spots: config.accessible_spots,
            default_holder,
            state: RwLock::new(LedgerState {
                reservations: Vec::new(),
                next_id: 1,
            }),
            store,
            renderer,
        })
    }

    /// Ledger restored from the store's last snapshot. An unreadable store
    /// is logged and the ledger starts empty.
    pub async fn load(
        config: &ParkingConfig,
        store: Arc<dyn ReservationStore>,
        renderer: Arc<dyn CodeRenderer>,
    ) -> DomainResult<Self> {
        let ledger = Self::new(config, store.clone(), renderer)?;

        match store.load().await {
            Ok(Some(snapshot)) => {
                let mut state = ledger.state.write().await;
                let max_id = snapshot.reservations.iter().map(|r| r.id).max().unwrap_or(0);
                if snapshot.next_id <= max_id {
                    warn!(
                        "Stored next id {} is not above highest reservation id {}, bumping",
                        snapshot.next_id, max_id
                    );
                }
                state.next_id = snapshot.next_id.max(max_id + 1);
                state.reservations = snapshot.reservations;
                info!(
                    "Loaded {} reservations (next id {})",
                    state.reservations.len(),
                    state.next_id
                );
            }
            Ok(None) => info!("No previous reservation data"),
            Err(e) => error!("Failed to load reservations, starting empty: {}", e),
        }

        ledger.publish_gauges().await;
        Ok(ledger)
    }

    pub fn total_spots(&self) -> u32 {
        self.total_spots
    }

    pub fn accessible_spots(&self) -> u32 {
        self.accessible_spots
    }

    /// Free spots per pool
    pub async fn available_counts(&self) -> Availability {
        self.state
            .read()
            .await
            .availability(self.total_spots, self.accessible_spots)
    }

    /// Reserve a spot in `category`.
    ///
    /// Accessible requests only draw from the accessible pool and never
    /// fall back to a standard spot.
    pub async fn reserve(
        &self,
        category: SpotCategory,
        holder_name: Option<&str>,
    ) -> DomainResult<ReservationOutcome> {
        let holder = holder_name
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(&self.default_holder)
            .to_string();

        let reservation = {
            let mut state = self.state.write().await;
            let available = state.availability(self.total_spots, self.accessible_spots);

            let full = match category {
                SpotCategory::Accessible => available.available_accessible <= 0,
                SpotCategory::Standard => {
                    available.available_total <= 0 || available.available_standard() <= 0
                }
            };
            if full {
                metrics::counter!("parking_reservations_total", "category" => category.as_str(), "outcome" => "rejected")
                    .increment(1);
                info!("Reservation rejected: no free {} spots", category);
                return Err(DomainError::CapacityExceeded {
                    category: category.as_str(),
                });
            }

            let id = state.next_id;
            state.next_id += 1;
            let reservation = Reservation::new(id, category, holder, Utc::now());
            state.reservations.push(reservation.clone());

            let snapshot = state.snapshot();
            self.persist(&snapshot).await;
            reservation
        };

        metrics::counter!("parking_reservations_total", "category" => category.as_str(), "outcome" => "accepted")
            .increment(1);
        self.publish_gauges().await;
        info!(
            "Reservation {} created: category={}, holder={}",
            reservation.id, reservation.category, reservation.holder_name
        );

        let image = match self.renderer.render(&reservation.token) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("Failed to render code for reservation {}: {}", reservation.id, e);
                None
            }
        };

        Ok(ReservationOutcome { reservation, image })
    }

    /// Remove a live reservation. Its id and token never match again.
    pub async fn cancel(&self, id: u64) -> DomainResult<Reservation> {
        let removed = {
            let mut state = self.state.write().await;
            let Some(pos) = state.reservations.iter().position(|r| r.id == id) else {
                metrics::counter!("parking_cancellations_total", "outcome" => "not_found").increment(1);
                return Err(DomainError::NotFound {
                    entity: "Reservation",
                    field: "id",
                    value: id.to_string(),
                });
            };
            let removed = state.reservations.remove(pos);

            let snapshot = state.snapshot();
            self.persist(&snapshot).await;
            removed
        };

        metrics::counter!("parking_cancellations_total", "outcome" => "cancelled").increment(1);
        self.publish_gauges().await;
        info!("Reservation {} cancelled", id);
        Ok(removed)
    }

    /// Match a scanned code against live reservations.
    pub async fn verify_token(&self, code: &str) -> DomainResult<Reservation> {
        let state = self.state.read().await;
        match match_code(&state.reservations, code) {
            Some((reservation, tier)) => {
                metrics::counter!("parking_access_checks_total", "method" => "token", "granted" => "true")
                    .increment(1);
                info!(
                    "Access granted for reservation {} ({} match)",
                    reservation.id,
                    tier.as_str()
                );
                Ok(reservation.clone())
            }
            None => {
                metrics::counter!("parking_access_checks_total", "method" => "token", "granted" => "false")
                    .increment(1);
                info!("Access denied for scanned code");
                Err(DomainError::AccessDenied(
                    "code does not match any live reservation".to_string(),
                ))
            }
        }
    }

    /// Live reservation by id
    pub async fn find(&self, id: u64) -> Option<Reservation> {
        self.state
            .read()
            .await
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Re-render the code image of a live reservation
    pub async fn render_code(&self, id: u64) -> DomainResult<Vec<u8>> {
        let reservation = self.find(id).await.ok_or_else(|| DomainError::NotFound {
            entity: "Reservation",
            field: "id",
            value: id.to_string(),
        })?;
        self.renderer
            .render(&reservation.token)
            .map_err(|e| DomainError::Rendering(e.to_string()))
    }

    pub fn image_content_type(&self) -> &'static str {
        self.renderer.content_type()
    }

    pub async fn snapshot(&self) -> LedgerStatus {
        let state = self.state.read().await;
        let available = state.availability(self.total_spots, self.accessible_spots);
        LedgerStatus {
            total_spots: self.total_spots,
            accessible_spots: self.accessible_spots,
            available_total: available.available_total,
            available_accessible: available.available_accessible,
            reserved_count: state.reservations.len(),
            reservations: state.reservations.clone(),
        }
    }

    async fn persist(&self, snapshot: &LedgerSnapshot) {
        if let Err(e) = self.store.save(snapshot).await {
            metrics::counter!("parking_persistence_failures_total", "store" => "reservations")
                .increment(1);
            error!("Failed to persist reservations (in-memory state kept): {}", e);
        }
    }

    async fn publish_gauges(&self) {
        let available = self.available_counts().await;
        metrics::gauge!("parking_available_spots", "category" => "total")
            .set(available.available_total as f64);
        metrics::gauge!("parking_available_spots", "category" => "accessible")
            .set(available.available_accessible as f64);
    }
}

// ── Tests ──────────────────────────────────────────────────────
