//! HTTP surface: watch control, status, and the Prometheus scrape endpoint.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use healer_core::{inventory, metrics, DeviceId, PublicStatus};
use serde_json::{json, Value};

use crate::watcher::WatcherRegistry;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<WatcherRegistry>,
    /// Device inventory appended to `/metrics` as fleet presence series.
    pub inventory: Option<PathBuf>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route(
            "/api/watch/:serial",
            get(get_watch).post(start_watch).delete(stop_watch),
        )
        .route("/metrics", get(scrape))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

async fn status(State(app): State<AppState>) -> Json<BTreeMap<DeviceId, PublicStatus>> {
    Json(app.registry.list_all())
}

async fn get_watch(
    State(app): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<PublicStatus>, (StatusCode, Json<Value>)> {
    app.registry
        .get(&DeviceId::from(serial))
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(json!({ "error": "not watched" }))))
}

async fn start_watch(State(app): State<AppState>, Path(serial): Path<String>) -> Json<PublicStatus> {
    Json(app.registry.start_watching(DeviceId::from(serial)))
}

async fn stop_watch(State(app): State<AppState>, Path(serial): Path<String>) -> Json<Value> {
    let removed = app.registry.stop_watching(&DeviceId::from(serial));
    Json(json!({ "ok": removed }))
}

async fn scrape(State(app): State<AppState>) -> Response {
    let snapshot = app.registry.snapshot();
    let mut body = metrics::render_watchers(&snapshot);

    if let Some(path) = app.inventory.clone() {
        let loaded = tokio::task::spawn_blocking(move || inventory::load_inventory(&path)).await;
        match loaded {
            Ok(Ok(records)) => body.push_str(&inventory::render_fleet_metrics(&records)),
            Ok(Err(err)) => tracing::warn!(error = %err, "inventory read failed, omitting fleet metrics"),
            Err(err) => tracing::warn!(error = %err, "inventory task failed, omitting fleet metrics"),
        }
    }

    ([(header::CONTENT_TYPE, metrics::CONTENT_TYPE)], body).into_response()
}

/// Permissive CORS for the dashboard; preflight requests end here with 204.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}
