//! Plate registry DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{AccessLogEntry, PlateEntry, PlateVerdict};

/// Plate assigned to a spot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlateDto {
    pub spot: i64,
    pub plate: String,
}

impl From<PlateEntry> for PlateDto {
    fn from(e: PlateEntry) -> Self {
        Self {
            spot: e.spot,
            plate: e.plate,
        }
    }
}

impl From<PlateDto> for PlateEntry {
    fn from(d: PlateDto) -> Self {
        PlateEntry::new(d.spot, d.plate)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlateListDto {
    pub plates: Vec<PlateDto>,
    /// Spots the lot is configured with
    pub total_spots: u32,
}

/// Full replacement of the registry. Entries are stored as given.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplacePlatesRequest {
    pub plates: Vec<PlateDto>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePlateRequest {
    #[validate(length(min = 1, message = "Missing plate"))]
    pub plate: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemovePlateResponse {
    pub spot: i64,
    /// `false` when the spot had no plate
    pub removed: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyPlateRequest {
    #[validate(length(min = 1, message = "Missing plate"))]
    pub plate: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlateVerdictDto {
    pub granted: bool,
    pub spot: Option<i64>,
}

impl From<PlateVerdict> for PlateVerdictDto {
    fn from(v: PlateVerdict) -> Self {
        Self {
            granted: v.granted,
            spot: v.spot,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AccessLogQuery {
    /// Maximum entries, newest first
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessLogEntryDto {
    /// RFC 3339
    pub time: String,
    /// Plate as it was entered
    pub plate: String,
    pub spot: Option<i64>,
    pub granted: bool,
}

impl From<AccessLogEntry> for AccessLogEntryDto {
    fn from(e: AccessLogEntry) -> Self {
        Self {
            time: e.time.to_rfc3339(),
            plate: e.plate,
            spot: e.spot,
            granted: e.granted,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RemoveByPlateQuery {
    /// Plate to unassign everywhere; matched after normalization
    pub plate: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoveByPlateResponse {
    pub removed: usize,
}
