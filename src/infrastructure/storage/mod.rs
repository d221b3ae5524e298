//! Storage traits and implementations

mod json;
mod memory;
mod traits;

pub use json::{JsonAccessLogStore, JsonFile, JsonOccupancyStore, JsonPlateStore, JsonReservationStore};
pub use memory::{
    InMemoryAccessLogStore, InMemoryOccupancyStore, InMemoryPlateStore, InMemoryReservationStore,
};
pub use traits::{AccessLogStore, OccupancyStore, PlateStore, ReservationStore};
