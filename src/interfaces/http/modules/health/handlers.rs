//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::{ReservationLedger, SensorBoard};

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub ledger: Arc<ReservationLedger>,
    pub board: Arc<SensorBoard>,
    pub started_at: Arc<Instant>,
}

/// Service health response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Spots still free for reservation
    pub available_spots: i64,
    /// Spots reported occupied by sensors
    pub occupied_spots: u32,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let available = state.ledger.available_counts().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        available_spots: available.available_total,
        occupied_spots: state.board.status().occupied_spots,
    })
}
