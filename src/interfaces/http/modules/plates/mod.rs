//! Plate registry endpoints and plate-based access checks

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
