//! # Smart Parking
//!
//! Reservation and access-verification service for a small parking lot.
//!
//! ## Architecture
//!
//! - **domain**: reservations, plate assignments, sensor readings
//! - **application**: the reservation ledger, plate registry and sensor board
//! - **infrastructure**: JSON file stores and the QR code renderer
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod support;

pub use application::{PlateRegistry, ReservationLedger, SensorBoard};
pub use config::{default_config_path, AppConfig};
pub use interfaces::http::create_api_router;
pub use support::errors::{DomainError, InfraError};
