//! HTTP route handlers.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::store::{TransitError, TransitStore};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/summary", get(summary))
        .route("/import", post(import_file))
        .route("/export", post(export_feed))
        .route("/routes/:id", get(get_route).patch(update_route))
        .route("/routes/:id/search", get(search_route))
        .route("/stops/:id", get(get_stop).patch(update_stop))
        .route("/stops/:id/search", get(search_stop))
        .route("/trips/:id", get(get_trip).patch(update_trip))
        .route("/stop_times", get(get_stop_time).patch(update_stop_time))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn lock(store: &Mutex<TransitStore>) -> Result<MutexGuard<'_, TransitStore>, AppError> {
    store.lock().map_err(|_| AppError::Internal {
        message: "transit store is unavailable after a failed request".to_string(),
    })
}

/// Run blocking store work (file I/O) off the async workers.
async fn with_store_blocking<T, F>(state: &AppState, work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&mut TransitStore) -> Result<T, TransitError> + Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = lock(&store)?;
        work(&mut guard).map_err(AppError::from)
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("store task failed: {e}"),
    })?
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// What the store holds.
async fn summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, AppError> {
    let store = lock(&state.store)?;
    Ok(Json(SummaryResponse::from_store(&store)))
}

/// Import a feed file from the data directory.
async fn import_file(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    // Only bare names, so requests cannot reach outside the data directory
    if Path::new(&req.file).file_name().and_then(|n| n.to_str()) != Some(req.file.as_str()) {
        return Err(AppError::BadRequest {
            message: format!("{}: expected a file name, not a path", req.file),
        });
    }

    let path = state.config.data_dir.join(&req.file);
    let report = with_store_blocking(&state, move |store| store.import_file(&path)).await?;
    Ok(Json(ImportResponse::from_report(&report)))
}

/// Export every non-empty table to the export directory.
async fn export_feed(State(state): State<AppState>) -> Result<Json<ExportResponse>, AppError> {
    let dir = state.config.export_dir.clone();
    let written = with_store_blocking(&state, move |store| store.export(&dir)).await?;
    Ok(Json(ExportResponse {
        files: written.iter().map(|p| p.display().to_string()).collect(),
    }))
}

fn not_found(kind: &str, id: &str) -> AppError {
    AppError::NotFound {
        message: format!("no {kind} with id {id}"),
    }
}

async fn get_route(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<RouteResult>, AppError> {
    let store = lock(&state.store)?;
    let route = store.route(&id).ok_or_else(|| not_found("route", &id))?;
    Ok(Json(RouteResult::from_route(route)))
}

async fn get_stop(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<StopResult>, AppError> {
    let store = lock(&state.store)?;
    let stop = store.stop(&id).ok_or_else(|| not_found("stop", &id))?;
    Ok(Json(StopResult::from_stop(stop)))
}

async fn get_trip(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<TripResult>, AppError> {
    let store = lock(&state.store)?;
    let trip = store.trip(&id).ok_or_else(|| not_found("trip", &id))?;
    Ok(Json(TripResult::from_trip(trip)))
}

async fn get_stop_time(
    State(state): State<AppState>,
    Query(q): Query<StopTimeQuery>,
) -> Result<Json<StopTimeResult>, AppError> {
    let store = lock(&state.store)?;
    let st = store
        .stop_time(&q.stop_id, &q.trip_id)
        .ok_or_else(|| not_found("stop time", &format!("{}/{}", q.trip_id, q.stop_id)))?;
    Ok(Json(StopTimeResult::from_stop_time(st)))
}

/// Routes and upcoming trips at a stop.
async fn search_stop(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<SearchResponse>, AppError> {
    let mut store = lock(&state.store)?;
    let items = store.search_by_stop(&id)?;
    Ok(Json(SearchResponse::from_items(&items)))
}

/// Stops and remaining trips of a route.
async fn search_route(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<SearchResponse>, AppError> {
    let mut store = lock(&state.store)?;
    let items = store.search_by_route(&id)?;
    Ok(Json(SearchResponse::from_items(&items)))
}

async fn update_route(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<RouteResult>, AppError> {
    let mut store = lock(&state.store)?;
    store.update_route(&id, &req.field, &req.value)?;
    // The id itself may have been the field changed
    let new_id = if req.field == "route_id" { &req.value } else { &id };
    let route = store.route(new_id).ok_or_else(|| not_found("route", new_id))?;
    Ok(Json(RouteResult::from_route(route)))
}

async fn update_stop(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<StopResult>, AppError> {
    let mut store = lock(&state.store)?;
    store.update_stop(&id, &req.field, &req.value)?;
    let new_id = if req.field == "stop_id" { &req.value } else { &id };
    let stop = store.stop(new_id).ok_or_else(|| not_found("stop", new_id))?;
    Ok(Json(StopResult::from_stop(stop)))
}

async fn update_trip(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<TripResult>, AppError> {
    let mut store = lock(&state.store)?;
    store.update_trip(&id, &req.field, &req.value)?;
    let new_id = if req.field == "trip_id" { &req.value } else { &id };
    let trip = store.trip(new_id).ok_or_else(|| not_found("trip", new_id))?;
    Ok(Json(TripResult::from_trip(trip)))
}

async fn update_stop_time(
    State(state): State<AppState>,
    Query(q): Query<StopTimeQuery>,
    Json(req): Json<UpdateRequest>,
) -> Result<StatusCode, AppError> {
    let mut store = lock(&state.store)?;
    store.update_stop_time(&q.stop_id, &q.trip_id, &req.field, &req.value)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<TransitError> for AppError {
    fn from(e: TransitError) -> Self {
        let message = e.to_string();
        if e.is_not_found() {
            AppError::NotFound { message }
        } else if e.is_invalid_input() {
            AppError::BadRequest { message }
        } else {
            AppError::Internal { message }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;

    struct Fixture {
        data: TempDir,
        export: TempDir,
        app: Router,
    }

    fn fixture() -> Fixture {
        let data = tempdir().unwrap();
        let export = tempdir().unwrap();
        std::fs::write(
            data.path().join("routes.txt"),
            "route_id,route_long_name,route_color\nR1,Crosstown,ff0000\nR2,Lakefront,00FF00\n",
        )
        .unwrap();
        std::fs::write(
            data.path().join("stops.txt"),
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Main,43,-88\nS2,Oak,44,-87\n",
        )
        .unwrap();
        std::fs::write(data.path().join("trips.txt"), "route_id,trip_id\nR1,T1\n").unwrap();
        std::fs::write(
            data.path().join("stop_times.txt"),
            "trip_id,stop_id,stop_sequence,arrival_time\nT1,S1,1,23:59:59\nT1,S2,2,23:59:59\n",
        )
        .unwrap();
        std::fs::write(data.path().join("agency.txt"), "agency_id\nA\n").unwrap();

        let config = ServerConfig::default()
            .with_data_dir(data.path())
            .with_export_dir(export.path());
        let app = create_router(AppState::new(TransitStore::new(), config));
        Fixture {
            data,
            export,
            app,
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn import_all(app: &Router) {
        for file in ["stops.txt", "trips.txt", "stop_times.txt", "routes.txt"] {
            let (status, _) = send(app, Method::POST, "/import", Some(json!({ "file": file }))).await;
            assert_eq!(status, StatusCode::OK, "importing {file}");
        }
    }

    #[tokio::test]
    async fn health_check() {
        let f = fixture();
        let response = f
            .app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn import_reports_counts() {
        let f = fixture();
        let (status, body) = send(&f.app, Method::POST, "/import", Some(json!({ "file": "routes.txt" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "file": "routes.txt", "imported": 2, "skipped": 0 }));

        let (_, summary) = send(&f.app, Method::GET, "/summary", None).await;
        assert_eq!(summary["has_routes"], json!(true));
        assert_eq!(summary["has_stops"], json!(false));
        assert_eq!(summary["tables"][0]["fields"], json!(["route_id", "route_long_name", "route_color"]));
        assert_eq!(summary["map_center"], Value::Null);
    }

    #[tokio::test]
    async fn import_errors_map_to_status() {
        let f = fixture();
        let (status, body) = send(&f.app, Method::POST, "/import", Some(json!({ "file": "agency.txt" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("agency.txt"));

        let (status, _) = send(&f.app, Method::POST, "/import", Some(json!({ "file": "../routes.txt" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        std::fs::remove_file(f.data.path().join("trips.txt")).unwrap();
        let (status, _) = send(&f.app, Method::POST, "/import", Some(json!({ "file": "trips.txt" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lookups() {
        let f = fixture();
        import_all(&f.app).await;

        let (status, route) = send(&f.app, Method::GET, "/routes/R1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(route["color"], json!("#FF0000"));
        assert_eq!(route["text_color"], json!("#000000"));

        let (status, _) = send(&f.app, Method::GET, "/routes/R9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, st) = send(&f.app, Method::GET, "/stop_times?stop_id=S2&trip_id=T1", None).await;
        assert_eq!(st["stop_sequence"], json!(2));
    }

    #[tokio::test]
    async fn search_stop_returns_tagged_items() {
        let f = fixture();
        import_all(&f.app).await;

        let (status, body) = send(&f.app, Method::GET, "/stops/S1/search", None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items[0]["kind"], json!("stop"));
        assert_eq!(items[1], json!({ "kind": "section", "label": "All Routes containing stop S1" }));
        assert_eq!(items[2]["kind"], json!("route"));
        assert_eq!(items[2]["id"], json!("R1"));

        let (status, _) = send(&f.app, Method::GET, "/stops/S9/search", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_route_lists_stops() {
        let f = fixture();
        import_all(&f.app).await;

        let (_, body) = send(&f.app, Method::GET, "/routes/R1/search", None).await;
        let stops: Vec<&str> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|i| i["kind"] == "stop")
            .map(|i| i["id"].as_str().unwrap())
            .collect();
        assert_eq!(stops, ["S1", "S2"]);
    }

    #[tokio::test]
    async fn updates_validate_fields() {
        let f = fixture();
        import_all(&f.app).await;

        let (status, route) = send(
            &f.app,
            Method::PATCH,
            "/routes/R1",
            Some(json!({ "field": "route_color", "value": "0000ff" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(route["color"], json!("#0000FF"));

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            "/routes/R1",
            Some(json!({ "field": "route_type", "value": "bus" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, stop) = send(
            &f.app,
            Method::PATCH,
            "/stops/S1",
            Some(json!({ "field": "stop_id", "value": "S100" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stop["id"], json!("S100"));

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            "/stop_times?stop_id=S2&trip_id=T1",
            Some(json!({ "field": "arrival_time", "value": "7pm" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &f.app,
            Method::PATCH,
            "/trips/T404",
            Some(json!({ "field": "trip_headsign", "value": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn export_writes_files() {
        let f = fixture();
        import_all(&f.app).await;

        let (status, body) = send(&f.app, Method::POST, "/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["files"].as_array().unwrap().len(), 4);
        assert_eq!(
            std::fs::read_to_string(f.export.path().join("routes.txt")).unwrap(),
            "route_id,route_long_name,route_color\nR1,Crosstown,FF0000\nR2,Lakefront,00FF00\n"
        );
    }
}
