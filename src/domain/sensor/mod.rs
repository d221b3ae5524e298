//! Sensor aggregate

pub mod model;

pub use model::{spot_key, OccupancySnapshot, SensorReading, SpotSensor};
