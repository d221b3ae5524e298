//! Vehicle plate registry entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plate assigned to a parking spot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateEntry {
    pub spot: i64,
    pub plate: String,
}

impl PlateEntry {
    pub fn new(spot: i64, plate: impl Into<String>) -> Self {
        Self {
            spot,
            plate: plate.into(),
        }
    }

    /// Does the stored plate match `normalized` (already passed through
    /// [`normalize_plate`])?
    pub fn matches(&self, normalized: &str) -> bool {
        normalize_plate(&self.plate) == normalized
    }
}

/// Strip all whitespace and upper-case the rest.
///
/// Punctuation is kept: `"ab c-123"` becomes `"ABC-123"` but `"xy001"`
/// never equals `"XY-001"`.
pub fn normalize_plate(s: &str) -> String {
    s.split_whitespace().collect::<String>().to_uppercase()
}

/// One plate verification attempt. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub time: DateTime<Utc>,
    /// Plate exactly as it was entered
    pub plate: String,
    pub spot: Option<i64>,
    pub granted: bool,
}

impl AccessLogEntry {
    pub fn granted(plate: impl Into<String>, spot: i64) -> Self {
        Self {
            time: Utc::now(),
            plate: plate.into(),
            spot: Some(spot),
            granted: true,
        }
    }

    pub fn denied(plate: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            plate: plate.into(),
            spot: None,
            granted: false,
        }
    }
}

/// Outcome of a plate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateVerdict {
    pub granted: bool,
    pub spot: Option<i64>,
}
