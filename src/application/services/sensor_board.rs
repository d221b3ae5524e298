//! Sensor board: occupancy reported by per-spot sensors.
//!
//! Kept apart from the reservation ledger. A spot can be reserved and
//! reported free (or the opposite) at the same time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{error, info, warn};
use tokio::sync::Mutex;

use crate::domain::sensor::spot_key;
use crate::domain::{DomainError, DomainResult, OccupancySnapshot, SensorReading, SpotSensor};
use crate::infrastructure::OccupancyStore;

/// Result of a sensor update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotUpdate {
    pub spot_number: u32,
    pub occupied: bool,
    pub old_status: bool,
    pub timestamp: DateTime<Utc>,
}

/// Board-wide occupancy view
#[derive(Debug, Clone)]
pub struct BoardStatus {
    pub total_spots: u32,
    pub free_spots: u32,
    pub occupied_spots: u32,
    /// Percentage, rounded to two decimals
    pub occupancy_rate: f64,
    pub spots: Vec<SpotSensor>,
    pub timestamp: DateTime<Utc>,
}

pub struct SensorBoard {
    total_spots: u32,
    sensors: DashMap<u32, SpotSensor>,
    store: Arc<dyn OccupancyStore>,
    /// Orders update+save so the stored snapshot never goes backwards.
    write_lock: Mutex<()>,
}

impl SensorBoard {
    /// Board with spots `1..=total_spots`, all free
    pub fn new(total_spots: u32, store: Arc<dyn OccupancyStore>) -> Self {
        let sensors = DashMap::new();
        for n in 1..=total_spots {
            sensors.insert(n, SpotSensor::free(n));
        }
        Self {
            total_spots,
            sensors,
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Board overlaid with the last persisted readings. Readings for spots
    /// outside `1..=total_spots` are dropped.
    pub async fn load(total_spots: u32, store: Arc<dyn OccupancyStore>) -> Self {
        let board = Self::new(total_spots, store.clone());

        match store.load().await {
            Ok(Some(snapshot)) => {
                for sensor in snapshot.sensors.into_values() {
                    match board.sensors.get_mut(&sensor.spot_number) {
                        Some(mut slot) => *slot = sensor,
                        None => warn!(
                            "Ignoring stored reading for unknown spot {}",
                            sensor.spot_number
                        ),
                    }
                }
                info!("Sensor readings restored for {} spots", board.total_spots);
            }
            Ok(None) => info!("No previous sensor data"),
            Err(e) => error!("Failed to load sensor data, all spots free: {}", e),
        }
        board
    }

    pub fn total_spots(&self) -> u32 {
        self.total_spots
    }

    pub async fn update_spot(&self, spot_number: u32, occupied: bool) -> DomainResult<SpotUpdate> {
        let _guard = self.write_lock.lock().await;
        let update = {
            let mut sensor = self
                .sensors
                .get_mut(&spot_number)
                .ok_or_else(|| DomainError::NotFound {
                    entity: "Spot",
                    field: "spot_number",
                    value: spot_number.to_string(),
                })?;
            let old_status = sensor.occupied;
            sensor.occupied = occupied;
            sensor.last_update = Utc::now();
            SpotUpdate {
                spot_number,
                occupied,
                old_status,
                timestamp: sensor.last_update,
            }
        };

        info!(
            "Spot {} {}",
            spot_number,
            if occupied { "occupied" } else { "freed" }
        );
        metrics::gauge!("parking_sensor_occupied_spots").set(self.occupied_count() as f64);

        let snapshot = self.snapshot();
        if let Err(e) = self.store.save(&snapshot).await {
            metrics::counter!("parking_persistence_failures_total", "store" => "sensors")
                .increment(1);
            error!("Failed to persist sensor data (in-memory state kept): {}", e);
        }
        Ok(update)
    }

    /// Apply a raw sensor line such as `SPOT:3:OCCUPIED`
    pub async fn ingest(&self, line: &str) -> DomainResult<SpotUpdate> {
        let reading: SensorReading = line.parse()?;
        self.update_spot(reading.spot_number, reading.occupied).await
    }

    pub fn spot(&self, spot_number: u32) -> DomainResult<SpotSensor> {
        self.sensors
            .get(&spot_number)
            .map(|s| s.clone())
            .ok_or_else(|| DomainError::NotFound {
                entity: "Spot",
                field: "spot_number",
                value: spot_number.to_string(),
            })
    }

    pub fn status(&self) -> BoardStatus {
        let mut spots: Vec<SpotSensor> = self.sensors.iter().map(|s| s.value().clone()).collect();
        spots.sort_by_key(|s| s.spot_number);

        let occupied = spots.iter().filter(|s| s.occupied).count() as u32;
        let rate = if self.total_spots == 0 {
            0.0
        } else {
            (occupied as f64 / self.total_spots as f64 * 10_000.0).round() / 100.0
        };

        BoardStatus {
            total_spots: self.total_spots,
            free_spots: spots.len() as u32 - occupied,
            occupied_spots: occupied,
            occupancy_rate: rate,
            spots,
            timestamp: Utc::now(),
        }
    }

    fn occupied_count(&self) -> usize {
        self.sensors.iter().filter(|s| s.occupied).count()
    }

    fn snapshot(&self) -> OccupancySnapshot {
        OccupancySnapshot {
            sensors: self
                .sensors
                .iter()
                .map(|s| (spot_key(*s.key()), s.value().clone()))
                .collect(),
            last_updated: Some(Utc::now()),
            total_spots: self.total_spots,
        }
    }
}
