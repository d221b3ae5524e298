//! Plate aggregate

pub mod model;

pub use model::{normalize_plate, AccessLogEntry, PlateEntry, PlateVerdict};
