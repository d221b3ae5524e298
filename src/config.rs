//! Configuration module
//!
//! Settings come from a TOML file (default
//! `~/.config/smart-parking/config.toml`). Every section and field is
//! optional and falls back to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::support::errors::InfraError;

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub parking: ParkingConfig,
    pub plates: PlatesConfig,
    pub sensors: SensorsConfig,
    pub storage: StorageConfig,
    pub qr: QrConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            shutdown_timeout: 10,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reservation capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    pub total_spots: u32,
    /// Spots set aside for the accessible category; part of `total_spots`
    pub accessible_spots: u32,
    /// Holder name recorded when a request carries none
    pub default_holder: String,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            total_spots: 15,
            accessible_spots: 1,
            default_holder: "Unknown".to_string(),
        }
    }
}

/// Plate registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatesConfig {
    /// Number of spots admins are expected to assign. Shown to clients,
    /// not enforced.
    pub total_spots: u32,
    /// Default page size of the access log listing
    pub access_log_limit: usize,
}

impl Default for PlatesConfig {
    fn default() -> Self {
        Self {
            total_spots: 15,
            access_log_limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    pub total_spots: u32,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self { total_spots: 5 }
    }
}

/// Locations of the JSON data files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub reservations_file: String,
    pub plates_file: String,
    pub access_log_file: String,
    pub sensors_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            reservations_file: "parking_data.json".to_string(),
            plates_file: "plates_data.json".to_string(),
            access_log_file: "access_log.json".to_string(),
            sensors_file: "sensor_data.json".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn reservations_path(&self) -> PathBuf {
        self.data_dir.join(&self.reservations_file)
    }

    pub fn plates_path(&self) -> PathBuf {
        self.data_dir.join(&self.plates_file)
    }

    pub fn access_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.access_log_file)
    }

    pub fn sensors_path(&self) -> PathBuf {
        self.data_dir.join(&self.sensors_file)
    }
}

/// QR image settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Pixels per QR module
    pub module_size: u32,
    pub quiet_zone: bool,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            module_size: 10,
            quiet_zone: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. `info` or `smart_parking=debug`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let config = Self::from_toml(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        toml::from_str(raw).map_err(|e| InfraError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, InfraError> {
        toml::to_string_pretty(self).map_err(|e| InfraError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        let p = &self.parking;
        if p.total_spots == 0 {
            return Err(InfraError::Config("parking.total_spots must be positive".into()));
        }
        if p.accessible_spots > p.total_spots {
            return Err(InfraError::Config(format!(
                "parking.accessible_spots ({}) exceeds parking.total_spots ({})",
                p.accessible_spots, p.total_spots
            )));
        }
        if self.sensors.total_spots == 0 {
            return Err(InfraError::Config("sensors.total_spots must be positive".into()));
        }
        if self.logging.level.trim().is_empty() {
            return Err(InfraError::Config("logging.level must not be empty".into()));
        }
        Ok(())
    }
}

/// Default config location: `<config dir>/smart-parking/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smart-parking")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.parking.total_spots, 15);
        assert_eq!(cfg.parking.accessible_spots, 1);
        assert_eq!(cfg.server.address(), "0.0.0.0:5000");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [parking]
            total_spots = 40

            [storage]
            data_dir = "/var/lib/parking"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.parking.total_spots, 40);
        assert_eq!(cfg.parking.accessible_spots, 1);
        assert_eq!(
            cfg.storage.plates_path(),
            PathBuf::from("/var/lib/parking/plates_data.json")
        );
    }

    #[test]
    fn accessible_above_total_is_rejected() {
        let cfg = AppConfig::from_toml(
            "[parking]\ntotal_spots = 2\naccessible_spots = 3\n",
        )
        .unwrap();
        assert!(matches!(cfg.validate(), Err(InfraError::Config(_))));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir()
            .join(format!("smart-parking-{}", uuid::Uuid::new_v4()))
            .join("config.toml");
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn toml_roundtrip_of_defaults() {
        let raw = AppConfig::default().to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&raw).unwrap(), AppConfig::default());
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        assert!(default_config_path().ends_with("smart-parking/config.toml"));
    }
}
