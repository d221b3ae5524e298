//! Application services

mod plate_registry;
mod reservation_ledger;
mod sensor_board;

pub use plate_registry::PlateRegistry;
pub use reservation_ledger::{Availability, LedgerStatus, ReservationLedger, ReservationOutcome};
pub use sensor_board::{BoardStatus, SensorBoard, SpotUpdate};
