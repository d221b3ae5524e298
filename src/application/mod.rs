pub mod services;

// Re-export key types for convenience
pub use services::{
    Availability, BoardStatus, LedgerStatus, PlateRegistry, ReservationLedger, ReservationOutcome,
    SensorBoard, SpotUpdate,
};
