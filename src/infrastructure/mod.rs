//! Infrastructure layer - external concerns

pub mod render;
pub mod storage;

pub use render::{CodeRenderer, QrPngRenderer};
pub use storage::{AccessLogStore, OccupancyStore, PlateStore, ReservationStore};
