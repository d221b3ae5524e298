//! API Router with Swagger UI

use std::any::Any as PanicPayload;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{PlateRegistry, ReservationLedger, SensorBoard};
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::modules::metrics::{
    http_metrics_middleware, prometheus_metrics, MetricsState,
};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::{health, plates, reservations, sensors};

/// Unified state for every route. Each handler keeps its own narrow
/// `State<T>` extractor, resolved via `FromRef`.
#[derive(Clone)]
pub struct ParkingAppState {
    pub ledger: Arc<ReservationLedger>,
    pub registry: Arc<PlateRegistry>,
    pub board: Arc<SensorBoard>,
    pub metrics: PrometheusHandle,
    /// Spots shown by the plate admin listing
    pub plate_spots: u32,
    pub access_log_limit: usize,
    pub started_at: Arc<Instant>,
}

impl FromRef<ParkingAppState> for reservations::ReservationAppState {
    fn from_ref(s: &ParkingAppState) -> Self {
        reservations::ReservationAppState {
            ledger: Arc::clone(&s.ledger),
        }
    }
}

impl FromRef<ParkingAppState> for plates::PlateAppState {
    fn from_ref(s: &ParkingAppState) -> Self {
        plates::PlateAppState {
            registry: Arc::clone(&s.registry),
            total_spots: s.plate_spots,
            access_log_limit: s.access_log_limit,
        }
    }
}

impl FromRef<ParkingAppState> for sensors::SensorAppState {
    fn from_ref(s: &ParkingAppState) -> Self {
        sensors::SensorAppState {
            board: Arc::clone(&s.board),
        }
    }
}

impl FromRef<ParkingAppState> for health::HealthState {
    fn from_ref(s: &ParkingAppState) -> Self {
        health::HealthState {
            ledger: Arc::clone(&s.ledger),
            board: Arc::clone(&s.board),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ParkingAppState> for MetricsState {
    fn from_ref(s: &ParkingAppState) -> Self {
        MetricsState {
            handle: s.metrics.clone(),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        // Reservations
        reservations::get_status,
        reservations::list_reservations,
        reservations::reserve,
        reservations::cancel_reservation,
        reservations::get_qr_code,
        reservations::verify_code,
        // Plates
        plates::list_plates,
        plates::replace_plates,
        plates::update_plate,
        plates::delete_plate,
        plates::delete_plate_everywhere,
        plates::verify_plate,
        plates::get_access_log,
        // Sensors
        sensors::get_sensor_status,
        sensors::get_sensor,
        sensors::update_sensor,
        sensors::ingest_reading,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            reservations::ReserveRequest,
            reservations::ReserveResponse,
            reservations::ReservationDto,
            reservations::ReservationListDto,
            reservations::StatusDto,
            reservations::CancelResponse,
            reservations::VerifyRequest,
            reservations::VerifyResponse,
            plates::PlateDto,
            plates::PlateListDto,
            plates::ReplacePlatesRequest,
            plates::UpdatePlateRequest,
            plates::RemovePlateResponse,
            plates::RemoveByPlateResponse,
            plates::VerifyPlateRequest,
            plates::PlateVerdictDto,
            plates::AccessLogEntryDto,
            sensors::SensorDto,
            sensors::SensorStatusDto,
            sensors::UpdateSensorRequest,
            sensors::SensorReadingRequest,
            sensors::SpotUpdateDto,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Reservations", description = "Spot reservations, QR codes and token verification"),
        (name = "Plates", description = "Plate registry and plate-based gate access"),
        (name = "Sensors", description = "Per-spot occupancy sensors"),
    ),
    info(
        title = "Smart Parking API",
        version = "1.0.0",
        description = "Reservations, access verification and occupancy for a small parking lot",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

async fn route_not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("route not found")),
    )
}

/// A panicking handler answers like any other server-side failure.
fn internal_error_response(_panic: Box<dyn PanicPayload + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("internal error")),
    )
        .into_response()
}

/// Create the API router with all routes
pub fn create_api_router(state: ParkingAppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let reservation_routes = Router::new()
        .route("/status", get(reservations::get_status))
        .route("/reservations", get(reservations::list_reservations))
        .route("/reserve", post(reservations::reserve))
        .route(
            "/cancel/{id}",
            axum::routing::delete(reservations::cancel_reservation),
        )
        .route("/qr/{id}", get(reservations::get_qr_code))
        .route("/verify", post(reservations::verify_code));

    let plate_routes = Router::new()
        .route(
            "/plates",
            get(plates::list_plates)
                .post(plates::replace_plates)
                .delete(plates::delete_plate_everywhere),
        )
        .route(
            "/plates/{spot}",
            put(plates::update_plate).delete(plates::delete_plate),
        )
        .route("/verify_plate", post(plates::verify_plate))
        .route("/access_log", get(plates::get_access_log));

    let sensor_routes = Router::new()
        .route("/sensors", get(sensors::get_sensor_status))
        .route("/sensors/reading", post(sensors::ingest_reading))
        .route(
            "/sensors/{spot}",
            get(sensors::get_sensor).put(sensors::update_sensor),
        );

    let swagger_routes =
        SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api",
            reservation_routes.merge(plate_routes).merge(sensor_routes),
        )
        .fallback(route_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(internal_error_response))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use base64::Engine as _;
    use serde_json::{json, Value};

    use crate::config::ParkingConfig;
    use crate::infrastructure::storage::{
        InMemoryAccessLogStore, InMemoryOccupancyStore, InMemoryPlateStore,
        InMemoryReservationStore,
    };
    use crate::infrastructure::QrPngRenderer;

    fn app_with(total: u32, accessible: u32) -> Router {
        let parking = ParkingConfig {
            total_spots: total,
            accessible_spots: accessible,
            ..ParkingConfig::default()
        };
        let ledger = ReservationLedger::new(
            &parking,
            Arc::new(InMemoryReservationStore::new()),
            Arc::new(QrPngRenderer::new(2, false)),
        )
        .unwrap();
        let registry = PlateRegistry::new(
            Arc::new(InMemoryPlateStore::new()),
            Arc::new(InMemoryAccessLogStore::new()),
        );
        let board = SensorBoard::new(5, Arc::new(InMemoryOccupancyStore::new()));
        let metrics = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();

        create_api_router(ParkingAppState {
            ledger: Arc::new(ledger),
            registry: Arc::new(registry),
            board: Arc::new(board),
            metrics,
            plate_spots: 15,
            access_log_limit: 50,
            started_at: Arc::new(Instant::now()),
        })
    }

    fn app() -> Router {
        app_with(15, 1)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        use tower::Service;
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let mut svc = app.clone().into_service();
        let resp = svc.call(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["available_spots"], 15);
    }

    #[tokio::test]
    async fn reserve_returns_token_and_png() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/reserve",
            Some(json!({"spot_type": "standard", "user_name": "Ana"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["reservation_id"], 1);
        assert_eq!(data["qr_code_url"], "/api/qr/1");
        assert!(data["token"].as_str().unwrap().starts_with("Parking-STANDARD-1-"));

        let png = base64::engine::general_purpose::STANDARD
            .decode(data["qr_code_png"].as_str().unwrap())
            .unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn reserve_defaults_to_standard() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/reserve", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["token"].as_str().unwrap().contains("STANDARD"));

        let (_, status_body) = send(&app, "GET", "/api/status", None).await;
        assert_eq!(status_body["data"]["reservations"][0]["holder_name"], "Unknown");
    }

    #[tokio::test]
    async fn full_accessible_pool_is_conflict() {
        let app = app();
        let req = json!({"spot_type": "accessible"});
        let (first, _) = send(&app, "POST", "/api/reserve", Some(req.clone())).await;
        assert_eq!(first, StatusCode::OK);
        let (second, body) = send(&app, "POST", "/api/reserve", Some(req)).await;
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unknown_spot_type_is_bad_request() {
        let app = app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/reserve",
            Some(json!({"spot_type": "vip"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_then_cancel_then_deny() {
        let app = app();
        let (_, body) = send(&app, "POST", "/api/reserve", Some(json!({}))).await;
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let wrapped = format!("https://lot.example/scan?c={}", token);
        let (status, body) = send(&app, "POST", "/api/verify", Some(json!({"code": wrapped}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reservation"]["id"], 1);

        let (status, _) = send(&app, "DELETE", "/api/cancel/1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "POST", "/api/verify", Some(json!({"code": token}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "DELETE", "/api/cancel/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn verify_by_url_path_id() {
        let app = app();
        send(&app, "POST", "/api/reserve", Some(json!({}))).await;
        send(&app, "POST", "/api/reserve", Some(json!({}))).await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/verify",
            Some(json!({"code": "https://lot.example/r/2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reservation"]["id"], 2);
    }

    #[tokio::test]
    async fn missing_code_is_bad_request() {
        let app = app();
        let (status, _) = send(&app, "POST", "/api/verify", Some(json!({"code": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn qr_image_only_for_live_reservations() {
        use tower::Service;
        let app = app();
        send(&app, "POST", "/api/reserve", Some(json!({}))).await;

        let mut svc = app.clone().into_service();
        let resp = svc
            .call(Request::get("/api/qr/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "image/png");

        send(&app, "DELETE", "/api/cancel/1", None).await;
        let (status, _) = send(&app, "GET", "/api/qr/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reservations_listing_counts_live_only() {
        let app = app();
        send(&app, "POST", "/api/reserve", Some(json!({}))).await;
        send(&app, "POST", "/api/reserve", Some(json!({}))).await;
        send(&app, "DELETE", "/api/cancel/1", None).await;

        let (_, body) = send(&app, "GET", "/api/reservations", None).await;
        assert_eq!(body["data"]["total_count"], 1);
        assert_eq!(body["data"]["reservations"][0]["id"], 2);
    }

    #[tokio::test]
    async fn plate_admin_flow() {
        let app = app();
        let (status, _) = send(
            &app,
            "PUT",
            "/api/plates/3",
            Some(json!({"plate": "ab 123 cd"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/api/verify_plate",
            Some(json!({"plate": "AB123CD"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["granted"], true);
        assert_eq!(body["data"]["spot"], 3);

        let (status, body) = send(
            &app,
            "POST",
            "/api/verify_plate",
            Some(json!({"plate": "ZZ999"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["granted"], false);
        assert!(body["data"]["spot"].is_null());

        let (_, body) = send(&app, "GET", "/api/access_log?limit=1", None).await;
        let log = body["data"].as_array().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0]["plate"], "ZZ999");

        let (status, body) = send(&app, "DELETE", "/api/plates/3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["removed"], true);
        let (_, body) = send(&app, "DELETE", "/api/plates/3", None).await;
        assert_eq!(body["data"]["removed"], false);
    }

    #[tokio::test]
    async fn plate_bulk_replace_and_remove_everywhere() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/plates",
            Some(json!({"plates": [
                {"spot": 2, "plate": "BG-1"},
                {"spot": 1, "plate": "NS 22"},
                {"spot": 5, "plate": "bg1"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["plates"].as_array().unwrap().len(), 3);

        let (status, _) = send(&app, "POST", "/api/plates", Some(json!({"plates": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "DELETE", "/api/plates?plate=BG1", None).await;
        assert_eq!(body["data"]["removed"], 1);

        let (_, body) = send(&app, "GET", "/api/plates", None).await;
        assert_eq!(body["data"]["plates"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["total_spots"], 15);
    }

    #[tokio::test]
    async fn empty_plate_is_rejected() {
        let app = app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/verify_plate",
            Some(json!({"plate": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", "/api/access_log", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, "PUT", "/api/plates/0", Some(json!({"plate": "A1"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sensor_updates_and_readings() {
        let app = app();
        let (status, body) = send(
            &app,
            "PUT",
            "/api/sensors/2",
            Some(json!({"occupied": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["action"], "occupied");
        assert_eq!(body["data"]["old_status"], false);

        let (status, _) = send(
            &app,
            "POST",
            "/api/sensors/reading",
            Some(json!({"line": "SPOT:4:OCCUPIED"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "POST",
            "/api/sensors/reading",
            Some(json!({"line": "SPOT:x:FREE"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", "/api/sensors", None).await;
        assert_eq!(body["data"]["occupied_spots"], 2);
        assert_eq!(body["data"]["occupancy_rate"], 40.0);

        let (status, body) = send(&app, "GET", "/api/sensors/4", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sensor_id"], "SENSOR_4");

        let (status, _) = send(&app, "GET", "/api/sensors/9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_path_and_query_are_enveloped() {
        let app = app();
        for (method, uri, body) in [
            ("DELETE", "/api/cancel/abc", None),
            ("GET", "/api/qr/-1", None),
            ("DELETE", "/api/plates", None),
            ("PUT", "/api/plates/xyz", Some(json!({"plate": "A1"}))),
            ("GET", "/api/sensors/two", None),
            ("GET", "/api/access_log?limit=lots", None),
        ] {
            let (status, body) = send(&app, method, uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
            assert_eq!(body["success"], false, "{} {}", method, uri);
            assert!(body["error"].is_string(), "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn whitespace_plate_is_denied_and_logged() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/verify_plate",
            Some(json!({"plate": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["granted"], false);

        let (_, body) = send(&app, "GET", "/api/access_log", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn handler_panic_is_internal_error() {
        use tower::Service;
        async fn boom() -> &'static str {
            panic!("sensor table corrupted")
        }

        let mut svc = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(internal_error_response))
            .into_service();
        let req = Request::builder().uri("/boom").body(Body::empty()).unwrap();
        let resp = svc.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "internal error");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        use tower::Service;
        let app = app();
        let mut svc = app.into_service();
        let resp = svc
            .call(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(resp.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn metrics_endpoint_is_plain_text() {
        use tower::Service;
        let app = app();
        let mut svc = app.into_service();
        let resp = svc
            .call(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[test]
    fn openapi_lists_parking_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/reserve"));
        assert!(doc.paths.paths.contains_key("/api/verify_plate"));
        assert!(doc.paths.paths.contains_key("/api/sensors/{spot}"));
    }
}
