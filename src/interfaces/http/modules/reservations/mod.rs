//! Reservation endpoints: booking, cancellation, code images and token checks

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
