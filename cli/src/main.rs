//! Smart parking CLI server
//!
//! Headless reservation and gate-access service, suitable for a systemd
//! unit, a container or a plain process.
//!
//! ```sh
//! # Run with default config (~/.config/smart-parking/config.toml)
//! parking-service
//!
//! # Custom config path
//! parking-service --config /etc/smart-parking/config.toml
//!
//! # Override the port
//! parking-service --port 8080
//!
//! # Validate config without starting
//! parking-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use smart_parking::config::AppConfig;
use smart_parking::server::{init_tracing, ServerHandle, ServerOptions};

/// Smart parking: reservations, QR and plate based gate access, occupancy sensors.
#[derive(Parser, Debug)]
#[command(
    name = "parking-service",
    version,
    about = "Smart parking reservation and access service",
    long_about = "REST API server for parking spot reservations, QR code and \
                  plate verification at the gate, and per-spot occupancy sensors.\n\n\
                  Default config: ~/.config/smart-parking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the effective configuration and exit without starting the server.
    #[arg(long)]
    check: bool,
}

fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(smart_parking::default_config_path);

    let loaded = AppConfig::load(&config_path);

    if cli.check {
        let mut config = loaded?;
        apply_overrides(&cli, &mut config);
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!();
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let (mut config, load_error) = match loaded {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    apply_overrides(&cli, &mut config);
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }
    if cli.port.is_some() || cli.log_level.is_some() {
        info!(
            "CLI overrides: port = {:?}, log_level = {:?}",
            cli.port, cli.log_level
        );
    }

    let handle = ServerHandle::start(ServerOptions { config }).await?;
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
