//! Reservation HTTP handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::application::ReservationLedger;
use crate::domain::SpotCategory;
use crate::interfaces::http::common::{
    domain_error, ApiPath, ApiResponse, ApiResult, ValidatedJson,
};

use super::dto::*;

/// Application state for reservation handlers.
#[derive(Clone)]
pub struct ReservationAppState {
    pub ledger: Arc<ReservationLedger>,
}

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "Reservations",
    responses(
        (status = 200, description = "Capacity and live reservations", body = ApiResponse<StatusDto>)
    )
)]
pub async fn get_status(State(state): State<ReservationAppState>) -> Json<ApiResponse<StatusDto>> {
    Json(ApiResponse::success(state.ledger.snapshot().await.into()))
}

#[utoipa::path(
    get,
    path = "/api/reservations",
    tag = "Reservations",
    responses(
        (status = 200, description = "Live reservations", body = ApiResponse<ReservationListDto>)
    )
)]
pub async fn list_reservations(
    State(state): State<ReservationAppState>,
) -> Json<ApiResponse<ReservationListDto>> {
    let status = state.ledger.snapshot().await;
    let reservations: Vec<ReservationDto> =
        status.reservations.into_iter().map(Into::into).collect();
    Json(ApiResponse::success(ReservationListDto {
        total_count: reservations.len(),
        reservations,
    }))
}

#[utoipa::path(
    post,
    path = "/api/reserve",
    tag = "Reservations",
    request_body = ReserveRequest,
    responses(
        (status = 200, description = "Reservation created", body = ApiResponse<ReserveResponse>),
        (status = 400, description = "Unknown spot type"),
        (status = 409, description = "No free spot in the requested category")
    )
)]
pub async fn reserve(
    State(state): State<ReservationAppState>,
    ValidatedJson(request): ValidatedJson<ReserveRequest>,
) -> ApiResult<ReserveResponse> {
    let category = match request.spot_type.as_deref() {
        Some(raw) => SpotCategory::parse(raw).map_err(domain_error)?,
        None => SpotCategory::Standard,
    };

    let outcome = state
        .ledger
        .reserve(category, request.user_name.as_deref())
        .await
        .map_err(domain_error)?;

    let r = outcome.reservation;
    Ok(Json(ApiResponse::success(ReserveResponse {
        message: format!("Reserved a {} spot for {}", r.category, r.holder_name),
        reservation_id: r.id,
        timestamp: r.created_at.to_rfc3339(),
        qr_code_png: outcome.image.map(|png| BASE64.encode(png)),
        qr_code_url: format!("/api/qr/{}", r.id),
        token: r.token,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/cancel/{id}",
    tag = "Reservations",
    params(("id" = u64, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled", body = ApiResponse<CancelResponse>),
        (status = 404, description = "No live reservation with this id")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ReservationAppState>,
    ApiPath(id): ApiPath<u64>,
) -> ApiResult<CancelResponse> {
    let removed = state.ledger.cancel(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(CancelResponse {
        message: format!("Reservation {} cancelled", id),
        reservation: removed.into(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/qr/{id}",
    tag = "Reservations",
    params(("id" = u64, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "QR code image (image/png)"),
        (status = 404, description = "No live reservation with this id")
    )
)]
pub async fn get_qr_code(
    State(state): State<ReservationAppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiResponse<()>>)> {
    let png = state.ledger.render_code(id).await.map_err(domain_error)?;
    Ok((
        [(header::CONTENT_TYPE, state.ledger.image_content_type())],
        png,
    ))
}

#[utoipa::path(
    post,
    path = "/api/verify",
    tag = "Reservations",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Access granted", body = ApiResponse<VerifyResponse>),
        (status = 400, description = "Missing code"),
        (status = 403, description = "Access denied")
    )
)]
pub async fn verify_code(
    State(state): State<ReservationAppState>,
    ValidatedJson(request): ValidatedJson<VerifyRequest>,
) -> ApiResult<VerifyResponse> {
    let reservation = state
        .ledger
        .verify_token(&request.code)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(VerifyResponse {
        message: "Access granted".to_string(),
        reservation: reservation.into(),
    })))
}
