//! Smart parking server
//!
//! Reads configuration from a TOML file
//! (`PARKING_CONFIG`, default `~/.config/smart-parking/config.toml`).
//! For command-line overrides use the `parking-service` binary.

use std::path::PathBuf;

use tracing::{error, info};

use smart_parking::server::{init_tracing, ServerHandle, ServerOptions};
use smart_parking::{default_config_path, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("PARKING_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let config = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let cfg = AppConfig::default();
            init_tracing(&cfg);
            error!("Failed to load config: {}. Using defaults.", e);
            cfg
        }
    };

    let handle = ServerHandle::start(ServerOptions { config }).await?;
    handle.install_signal_handler();
    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}
