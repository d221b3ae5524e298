//! Occupancy sensor entities
//!
//! Sensor occupancy is tracked independently of reservations; nothing
//! reconciles the two.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Last reported state of one spot sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotSensor {
    pub spot_number: u32,
    pub occupied: bool,
    pub last_update: DateTime<Utc>,
    pub sensor_id: String,
}

impl SpotSensor {
    pub fn free(spot_number: u32) -> Self {
        Self {
            spot_number,
            occupied: false,
            last_update: Utc::now(),
            sensor_id: format!("SENSOR_{}", spot_number),
        }
    }
}

/// Key used for a spot in the persisted sensor map
pub fn spot_key(spot_number: u32) -> String {
    format!("spot_{}", spot_number)
}

/// Durable shape of the sensor board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    #[serde(default)]
    pub sensors: BTreeMap<String, SpotSensor>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_spots: u32,
}

/// A decoded sensor line: `SPOT:<n>:<OCCUPIED|FREE>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub spot_number: u32,
    pub occupied: bool,
}

impl FromStr for SensorReading {
    type Err = DomainError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.trim().split(':').collect();
        if parts.len() != 3 || parts[0] != "SPOT" {
            return Err(DomainError::InvalidInput(format!(
                "malformed sensor line '{}'",
                line.trim()
            )));
        }

        let spot_number = parts[1].trim().parse::<u32>().map_err(|_| {
            DomainError::InvalidInput(format!("bad spot number '{}'", parts[1]))
        })?;

        let occupied = match parts[2].to_uppercase().as_str() {
            "OCCUPIED" => true,
            "FREE" => false,
            other => {
                return Err(DomainError::InvalidInput(format!(
                    "unknown sensor status '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            spot_number,
            occupied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_occupied_and_free() {
        let r: SensorReading = "SPOT:3:OCCUPIED".parse().unwrap();
        assert_eq!(r, SensorReading { spot_number: 3, occupied: true });

        let r: SensorReading = "  SPOT:1:free\r\n".parse().unwrap();
        assert_eq!(r, SensorReading { spot_number: 1, occupied: false });
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in ["", "SPOT:1", "spot:1:FREE", "SPOT:x:FREE", "SPOT:1:PARKED", "SPOT:1:FREE:extra"] {
            assert!(
                matches!(line.parse::<SensorReading>(), Err(DomainError::InvalidInput(_))),
                "line {:?} should be rejected",
                line
            );
        }
    }

    #[test]
    fn free_sensor_has_stable_id() {
        let s = SpotSensor::free(4);
        assert_eq!(s.sensor_id, "SENSOR_4");
        assert!(!s.occupied);
        assert_eq!(spot_key(4), "spot_4");
    }
}
