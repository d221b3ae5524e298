//! Core parking entities: reservations, plates and sensor readings

pub mod plate;
pub mod reservation;
pub mod sensor;

// Re-export commonly used types
pub use plate::{normalize_plate, AccessLogEntry, PlateEntry, PlateVerdict};
pub use reservation::{LedgerSnapshot, MatchTier, Reservation, SpotCategory};
pub use sensor::{OccupancySnapshot, SensorReading, SpotSensor};

// Re-export DomainError from support for convenience
pub use crate::support::errors::{DomainError, DomainResult};
