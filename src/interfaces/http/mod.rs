//! HTTP REST API
//!
//! - `common`: response envelope, error mapping, validated JSON bodies
//! - `modules`: handlers and DTOs per resource, plus request id and metrics
//! - `router`: route table with Swagger documentation

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ParkingAppState};
