//! Reusable smart parking server runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: JSON stores, the reservation
//! ledger, plate registry and sensor board, metrics, the REST API and
//! graceful shutdown. The binaries only parse options and wait.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info, warn};

use crate::application::{PlateRegistry, ReservationLedger, SensorBoard};
use crate::config::AppConfig;
use crate::infrastructure::storage::{
    JsonAccessLogStore, JsonOccupancyStore, JsonPlateStore, JsonReservationStore,
};
use crate::infrastructure::QrPngRenderer;
use crate::interfaces::http::{create_api_router, ParkingAppState};
use crate::support::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the server.
#[derive(Default)]
pub struct ServerOptions {
    pub config: AppConfig,
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running parking server.
///
/// ```rust,no_run
/// use smart_parking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub ledger: Arc<ReservationLedger>,
    pub registry: Arc<PlateRegistry>,
    pub board: Arc<SensorBoard>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address actually bound (port 0 resolves to the assigned port).
    pub local_addr: std::net::SocketAddr,

    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

/// The global metrics recorder can only be installed once per process;
/// a restart within the same process reuses it. When another recorder is
/// already installed the handle is detached and `/metrics` stays empty.
fn prometheus_handle() -> PrometheusHandle {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("📊 Prometheus metrics recorder installed");
                handle
            }
            Err(e) => {
                warn!("Prometheus recorder not installed: {}", e);
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

impl ServerHandle {
    /// Start the server:
    /// 1. install the Prometheus recorder
    /// 2. restore reservations, plates, access log and sensor readings
    /// 3. bind and serve the REST API with graceful shutdown
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let cfg = opts.config;
        cfg.validate()?;

        info!("Starting smart parking server...");
        let metrics = prometheus_handle();

        // ── Stores & services ──────────────────────────────────
        let storage = &cfg.storage;
        info!("Data directory: {}", storage.data_dir.display());

        let renderer = Arc::new(QrPngRenderer::new(cfg.qr.module_size, cfg.qr.quiet_zone));
        let ledger = ReservationLedger::load(
            &cfg.parking,
            Arc::new(JsonReservationStore::new(storage.reservations_path())),
            renderer,
        )
        .await?;
        let registry = PlateRegistry::load(
            Arc::new(JsonPlateStore::new(storage.plates_path())),
            Arc::new(JsonAccessLogStore::new(storage.access_log_path())),
        )
        .await;
        let board = SensorBoard::load(
            cfg.sensors.total_spots,
            Arc::new(JsonOccupancyStore::new(storage.sensors_path())),
        )
        .await;

        let ledger = Arc::new(ledger);
        let registry = Arc::new(registry);
        let board = Arc::new(board);

        // ── REST API ───────────────────────────────────────────
        let router = create_api_router(ParkingAppState {
            ledger: ledger.clone(),
            registry: registry.clone(),
            board: board.clone(),
            metrics,
            plate_spots: cfg.plates.total_spots,
            access_log_limit: cfg.plates.access_log_limit,
            started_at: Arc::new(Instant::now()),
        });

        let listener = tokio::net::TcpListener::bind(cfg.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let shutdown = ShutdownCoordinator::new(cfg.server.shutdown_timeout);
        let api_shutdown = shutdown.signal();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Smart parking server started");

        Ok(Self {
            ledger,
            registry,
            board,
            config: cfg,
            local_addr,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Send the shutdown signal without waiting.
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait until shutdown has been triggered and in-flight requests drained,
    /// bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let api_task = self.api_task;
        let abort = api_task.abort_handle();

        let drained = self
            .shutdown
            .shutdown_with_cleanup(|| async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task failed: {}", e),
                }
            })
            .await;

        if !drained {
            warn!("Aborting REST API server with requests still in flight");
            abort.abort();
        }
        info!("👋 Smart parking shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down smart parking server...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the application config.
///
/// Call once at process startup, before [`ServerHandle::start`]. `RUST_LOG`
/// takes precedence over `logging.level`. Records emitted through the `log`
/// macros are picked up by the subscriber as well.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 0;
        cfg.server.shutdown_timeout = 2;
        cfg.storage.data_dir =
            std::env::temp_dir().join(format!("smart-parking-server-{}", uuid::Uuid::new_v4()));
        cfg
    }

    #[tokio::test]
    async fn starts_persists_and_stops() {
        let cfg = test_config();
        let data_dir = cfg.storage.data_dir.clone();

        let handle = ServerHandle::start(ServerOptions { config: cfg }).await.unwrap();
        assert!(handle.is_running());
        assert_ne!(handle.local_addr.port(), 0);

        let outcome = handle
            .ledger
            .reserve(crate::domain::SpotCategory::Standard, Some("Ana"))
            .await
            .unwrap();
        assert!(outcome.image.is_some());
        assert!(data_dir.join("parking_data.json").exists());

        handle.shutdown().await;
        let _ = std::fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut cfg = test_config();
        cfg.parking.accessible_spots = cfg.parking.total_spots + 1;
        assert!(ServerHandle::start(ServerOptions { config: cfg }).await.is_err());
    }
}
