//! Plate registry HTTP handlers

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::application::PlateRegistry;
use crate::interfaces::http::common::{
    domain_error, ApiPath, ApiQuery, ApiResponse, ApiResult, ValidatedJson,
};

use super::dto::*;

#[derive(Clone)]
pub struct PlateAppState {
    pub registry: Arc<PlateRegistry>,
    pub total_spots: u32,
    /// Default page size of `GET /api/access_log`
    pub access_log_limit: usize,
}

#[utoipa::path(
    get,
    path = "/api/plates",
    tag = "Plates",
    responses(
        (status = 200, description = "Current plate assignments", body = ApiResponse<PlateListDto>)
    )
)]
pub async fn list_plates(State(state): State<PlateAppState>) -> Json<ApiResponse<PlateListDto>> {
    let plates = state.registry.list().await.into_iter().map(Into::into).collect();
    Json(ApiResponse::success(PlateListDto {
        plates,
        total_spots: state.total_spots,
    }))
}

#[utoipa::path(
    post,
    path = "/api/plates",
    tag = "Plates",
    request_body = ReplacePlatesRequest,
    responses(
        (status = 200, description = "Registry replaced", body = ApiResponse<PlateListDto>),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn replace_plates(
    State(state): State<PlateAppState>,
    ValidatedJson(request): ValidatedJson<ReplacePlatesRequest>,
) -> ApiResult<PlateListDto> {
    let entries = request.plates.into_iter().map(Into::into).collect();
    state.registry.replace_all(entries).await.map_err(domain_error)?;

    let plates = state.registry.list().await.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(PlateListDto {
        plates,
        total_spots: state.total_spots,
    })))
}

#[utoipa::path(
    put,
    path = "/api/plates/{spot}",
    tag = "Plates",
    params(("spot" = i64, Path, description = "Spot number")),
    request_body = UpdatePlateRequest,
    responses(
        (status = 200, description = "Plate assigned", body = ApiResponse<PlateDto>),
        (status = 400, description = "Missing plate or invalid spot")
    )
)]
pub async fn update_plate(
    State(state): State<PlateAppState>,
    ApiPath(spot): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<UpdatePlateRequest>,
) -> ApiResult<PlateDto> {
    let entry = state
        .registry
        .upsert(spot, &request.plate)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(entry.into())))
}

#[utoipa::path(
    delete,
    path = "/api/plates/{spot}",
    tag = "Plates",
    params(("spot" = i64, Path, description = "Spot number")),
    responses(
        (status = 200, description = "Assignment removed (idempotent)", body = ApiResponse<RemovePlateResponse>)
    )
)]
pub async fn delete_plate(
    State(state): State<PlateAppState>,
    ApiPath(spot): ApiPath<i64>,
) -> ApiResult<RemovePlateResponse> {
    let removed = state.registry.remove(spot).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(RemovePlateResponse { spot, removed })))
}

#[utoipa::path(
    delete,
    path = "/api/plates",
    tag = "Plates",
    params(RemoveByPlateQuery),
    responses(
        (status = 200, description = "Every assignment of the plate removed", body = ApiResponse<RemoveByPlateResponse>),
        (status = 400, description = "Blank plate")
    )
)]
pub async fn delete_plate_everywhere(
    State(state): State<PlateAppState>,
    ApiQuery(query): ApiQuery<RemoveByPlateQuery>,
) -> ApiResult<RemoveByPlateResponse> {
    let removed = state
        .registry
        .remove_by_plate(&query.plate)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(RemoveByPlateResponse { removed })))
}

/// Always 200 when the plate was checked; the verdict is in the payload.
#[utoipa::path(
    post,
    path = "/api/verify_plate",
    tag = "Plates",
    request_body = VerifyPlateRequest,
    responses(
        (status = 200, description = "Plate checked", body = ApiResponse<PlateVerdictDto>),
        (status = 400, description = "Missing plate")
    )
)]
pub async fn verify_plate(
    State(state): State<PlateAppState>,
    ValidatedJson(request): ValidatedJson<VerifyPlateRequest>,
) -> ApiResult<PlateVerdictDto> {
    let verdict = state
        .registry
        .verify_plate(&request.plate)
        .await
        .map_err(domain_error)?;

    if verdict.granted {
        Ok(Json(ApiResponse::success(verdict.into())))
    } else {
        Ok(Json(ApiResponse::rejected(verdict.into(), "No spot assigned to this plate")))
    }
}

#[utoipa::path(
    get,
    path = "/api/access_log",
    tag = "Plates",
    params(AccessLogQuery),
    responses(
        (status = 200, description = "Recent plate checks, newest first", body = ApiResponse<Vec<AccessLogEntryDto>>)
    )
)]
pub async fn get_access_log(
    State(state): State<PlateAppState>,
    ApiQuery(query): ApiQuery<AccessLogQuery>,
) -> Json<ApiResponse<Vec<AccessLogEntryDto>>> {
    let limit = query.limit.unwrap_or(state.access_log_limit);
    let entries = state
        .registry
        .recent_access(limit)
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    Json(ApiResponse::success(entries))
}
