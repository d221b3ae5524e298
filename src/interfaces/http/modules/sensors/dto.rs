//! Sensor DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::{BoardStatus, SpotUpdate};
use crate::domain::SpotSensor;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SensorDto {
    pub spot_number: u32,
    pub occupied: bool,
    /// RFC 3339
    pub last_update: String,
    pub sensor_id: String,
}

impl From<SpotSensor> for SensorDto {
    fn from(s: SpotSensor) -> Self {
        Self {
            spot_number: s.spot_number,
            occupied: s.occupied,
            last_update: s.last_update.to_rfc3339(),
            sensor_id: s.sensor_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorStatusDto {
    pub total_spots: u32,
    pub free_spots: u32,
    pub occupied_spots: u32,
    /// Percent, two decimals
    pub occupancy_rate: f64,
    pub spots: Vec<SensorDto>,
    pub timestamp: String,
}

impl From<BoardStatus> for SensorStatusDto {
    fn from(s: BoardStatus) -> Self {
        Self {
            total_spots: s.total_spots,
            free_spots: s.free_spots,
            occupied_spots: s.occupied_spots,
            occupancy_rate: s.occupancy_rate,
            spots: s.spots.into_iter().map(Into::into).collect(),
            timestamp: s.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSensorRequest {
    pub occupied: bool,
}

/// Raw line in the sensor wire format, e.g. `SPOT:3:OCCUPIED`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SensorReadingRequest {
    #[validate(length(min = 1, max = 64, message = "Missing sensor line"))]
    pub line: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotUpdateDto {
    pub spot_number: u32,
    pub occupied: bool,
    pub old_status: bool,
    /// `occupied` or `freed`
    pub action: String,
    pub timestamp: String,
}

impl From<SpotUpdate> for SpotUpdateDto {
    fn from(u: SpotUpdate) -> Self {
        Self {
            spot_number: u.spot_number,
            occupied: u.occupied,
            old_status: u.old_status,
            action: if u.occupied { "occupied" } else { "freed" }.to_string(),
            timestamp: u.timestamp.to_rfc3339(),
        }
    }
}
