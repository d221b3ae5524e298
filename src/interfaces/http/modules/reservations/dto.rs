//! Reservation DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::LedgerStatus;
use crate::domain::Reservation;

/// Request to reserve a spot
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ReserveRequest {
    /// `standard` (alias `obicno`) or `accessible` (alias `invalid`).
    /// Defaults to `standard`.
    #[serde(default)]
    pub spot_type: Option<String>,
    /// Holder name; blank or absent falls back to the configured default
    #[serde(default)]
    #[validate(length(max = 100))]
    pub user_name: Option<String>,
}

/// Reservation as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationDto {
    pub id: u64,
    /// `standard` or `accessible`
    pub category: String,
    pub holder_name: String,
    /// RFC 3339
    pub created_at: String,
    pub token: String,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            category: r.category.as_str().to_string(),
            holder_name: r.holder_name,
            created_at: r.created_at.to_rfc3339(),
            token: r.token,
        }
    }
}

/// Result of a successful reservation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReserveResponse {
    pub message: String,
    pub reservation_id: u64,
    /// Token encoded in the QR code
    pub token: String,
    pub timestamp: String,
    /// Base64 PNG of the QR code. Absent when rendering failed.
    pub qr_code_png: Option<String>,
    /// Where the QR image can be fetched again
    pub qr_code_url: String,
}

/// Lot status with live reservations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusDto {
    pub total_spots: u32,
    pub accessible_spots: u32,
    pub available_total: i64,
    pub available_accessible: i64,
    pub available_standard: i64,
    pub reserved_count: usize,
    pub reservations: Vec<ReservationDto>,
}

impl From<LedgerStatus> for StatusDto {
    fn from(s: LedgerStatus) -> Self {
        Self {
            total_spots: s.total_spots,
            accessible_spots: s.accessible_spots,
            available_total: s.available_total,
            available_accessible: s.available_accessible,
            available_standard: s.available_total - s.available_accessible,
            reserved_count: s.reserved_count,
            reservations: s.reservations.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationListDto {
    pub reservations: Vec<ReservationDto>,
    pub total_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    pub message: String,
    pub reservation: ReservationDto,
}

/// Scanned code to check
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[validate(length(min = 1, message = "Missing code"))]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub message: String,
    pub reservation: ReservationDto,
}
