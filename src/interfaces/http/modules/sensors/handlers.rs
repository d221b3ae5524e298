//! Sensor HTTP handlers

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::application::SensorBoard;
use crate::interfaces::http::common::{
    domain_error, ApiPath, ApiResponse, ApiResult, ValidatedJson,
};

use super::dto::*;

#[derive(Clone)]
pub struct SensorAppState {
    pub board: Arc<SensorBoard>,
}

#[utoipa::path(
    get,
    path = "/api/sensors",
    tag = "Sensors",
    responses(
        (status = 200, description = "Occupancy of every spot", body = ApiResponse<SensorStatusDto>)
    )
)]
pub async fn get_sensor_status(
    State(state): State<SensorAppState>,
) -> Json<ApiResponse<SensorStatusDto>> {
    Json(ApiResponse::success(state.board.status().into()))
}

#[utoipa::path(
    get,
    path = "/api/sensors/{spot}",
    tag = "Sensors",
    params(("spot" = u32, Path, description = "Spot number")),
    responses(
        (status = 200, description = "One spot", body = ApiResponse<SensorDto>),
        (status = 404, description = "Unknown spot")
    )
)]
pub async fn get_sensor(
    State(state): State<SensorAppState>,
    ApiPath(spot): ApiPath<u32>,
) -> ApiResult<SensorDto> {
    let sensor = state.board.spot(spot).map_err(domain_error)?;
    Ok(Json(ApiResponse::success(sensor.into())))
}

#[utoipa::path(
    put,
    path = "/api/sensors/{spot}",
    tag = "Sensors",
    params(("spot" = u32, Path, description = "Spot number")),
    request_body = UpdateSensorRequest,
    responses(
        (status = 200, description = "Spot updated", body = ApiResponse<SpotUpdateDto>),
        (status = 404, description = "Unknown spot")
    )
)]
pub async fn update_sensor(
    State(state): State<SensorAppState>,
    ApiPath(spot): ApiPath<u32>,
    ValidatedJson(request): ValidatedJson<UpdateSensorRequest>,
) -> ApiResult<SpotUpdateDto> {
    let update = state
        .board
        .update_spot(spot, request.occupied)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(update.into())))
}

#[utoipa::path(
    post,
    path = "/api/sensors/reading",
    tag = "Sensors",
    request_body = SensorReadingRequest,
    responses(
        (status = 200, description = "Reading applied", body = ApiResponse<SpotUpdateDto>),
        (status = 400, description = "Malformed line"),
        (status = 404, description = "Unknown spot")
    )
)]
pub async fn ingest_reading(
    State(state): State<SensorAppState>,
    ValidatedJson(request): ValidatedJson<SensorReadingRequest>,
) -> ApiResult<SpotUpdateDto> {
    let update = state
        .board
        .ingest(&request.line)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(update.into())))
}
