// Life Tracker - Web Server
// JSON API over the same tracker the terminal UI drives

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use clap::Parser;
use life_tracker::forms::{self, FormState};
use life_tracker::logging::{enable_logging, SERVER_PREFIX};
use life_tracker::{
    render, view_for, Config, NavTag, Record, RecordType, SqliteStorage, StorageArgs, StoreError,
    SummaryView, Tracker, TrackerError, View, ViewError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};

/// Shared application state. The mutex keeps a single writer on the store.
#[derive(Clone)]
struct AppState {
    tracker: Arc<Mutex<Tracker<SqliteStorage>>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
enum ApiError {
    Tracker(TrackerError),
    UnknownType(String),
    Poisoned,
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        ApiError::Tracker(e)
    }
}

impl From<ViewError> for ApiError {
    fn from(e: ViewError) -> Self {
        ApiError::Tracker(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Tracker(TrackerError::View(ViewError::UnknownTag(_))) => {
                (StatusCode::NOT_FOUND, self.message())
            }
            ApiError::Tracker(TrackerError::View(_)) => (StatusCode::CONFLICT, self.message()),
            ApiError::Tracker(TrackerError::Form(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.message())
            }
            ApiError::Tracker(TrackerError::Store(StoreError::OutOfRange { .. })) => {
                (StatusCode::NOT_FOUND, self.message())
            }
            ApiError::Tracker(TrackerError::Store(StoreError::InvalidIndex(_))) => {
                (StatusCode::BAD_REQUEST, self.message())
            }
            ApiError::UnknownType(_) => (StatusCode::NOT_FOUND, self.message()),
            ApiError::Tracker(TrackerError::Store(_)) | ApiError::Poisoned => {
                error!("Request failed: {}", self.message());
                (StatusCode::INTERNAL_SERVER_ERROR, self.message())
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    fn message(&self) -> String {
        match self {
            ApiError::Tracker(e) => e.to_string(),
            ApiError::UnknownType(t) => format!("unknown record type {t:?}"),
            ApiError::Poisoned => "tracker state is unavailable".to_string(),
        }
    }
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Tracker<SqliteStorage>>, ApiError> {
    state.tracker.lock().map_err(|_| ApiError::Poisoned)
}

fn parse_type(raw: &str) -> Result<RecordType, ApiError> {
    raw.parse::<RecordType>()
        .map_err(|_| ApiError::UnknownType(raw.to_string()))
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Deserialize)]
struct RecordsQuery {
    #[serde(rename = "type")]
    record_type: Option<String>,
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/records - All records in store order, optionally `?type=expense`
async fn get_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<ApiResponse<Vec<Record>>>, ApiError> {
    let only = query.record_type.as_deref().map(parse_type).transpose()?;
    let tracker = lock(&state)?;

    let records = tracker
        .store()
        .list()
        .into_iter()
        .filter(|r| only.as_ref().map_or(true, |t| &r.record_type == t))
        .collect();

    Ok(Json(ApiResponse::ok(records)))
}

/// POST /api/records/:type - Submit form values for a record type
async fn add_record(
    State(state): State<AppState>,
    Path(record_type): Path<String>,
    Json(values): Json<HashMap<String, serde_json::Value>>,
) -> Result<(StatusCode, Json<ApiResponse<Record>>), ApiError> {
    let record_type = parse_type(&record_type)?;

    let mut form = FormState::from_pairs(values.into_iter().map(|(name, value)| {
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        (name, text)
    }));

    let mut tracker = lock(&state)?;
    tracker.navigate(View::Form(record_type).tag());
    let record = tracker.submit(&mut form, forms::today())?;

    info!("API added {} record", record.record_type);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// DELETE /api/records/:index - The request itself is the confirmation
async fn delete_record(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    let mut tracker = lock(&state)?;
    tracker.request_delete(&index)?;

    match tracker.resolve_delete(true)? {
        life_tracker::DeleteOutcome::Deleted(record) => Ok(Json(ApiResponse::ok(record))),
        life_tracker::DeleteOutcome::Cancelled => Err(ViewError::NoPendingDelete.into()),
    }
}

/// GET /api/summary - Cards and history rows
async fn get_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SummaryView>>, ApiError> {
    let tracker = lock(&state)?;
    Ok(Json(ApiResponse::ok(SummaryView::build(tracker.store().records()))))
}

/// GET /api/views/:tag - Render any view without changing shared state
async fn get_view(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Response, ApiError> {
    let tag = tag.parse::<NavTag>()?;
    let tracker = lock(&state)?;
    let screen = render(&view_for(tag), tracker.store().records());
    Ok(Json(ApiResponse::ok(screen)).into_response())
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/records", get(get_records))
        .route("/records/:key", delete(delete_record).post(add_record))
        .route("/summary", get(get_summary))
        .route("/views/:tag", get(get_view))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tracker-server", version, about = "JSON API for the life tracker")]
struct Args {
    #[command(flatten)]
    storage: StorageArgs,

    #[arg(long, env = "LIFE_TRACKER_ADDR", default_value = "127.0.0.1:3000")]
    addr: String,

    #[arg(long, help = "Also print logs to stderr (debug level)")]
    log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::resolve(&args.storage)?;
    enable_logging(
        SERVER_PREFIX,
        &config.log_dir(),
        args.log.then_some(LevelFilter::DEBUG),
        true,
    )?;

    let store = config.open_store()?;
    info!("Loaded {} records from {:?}", store.len(), config.db_path());

    let state = AppState {
        tracker: Arc::new(Mutex::new(Tracker::new(store))),
    };

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    info!("Server running on http://{}/api/records", args.addr);

    axum::serve(listener, app(state))
        .await
        .context("Server stopped unexpectedly")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use life_tracker::{RecordStore, DEFAULT_STORAGE_KEY};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let store = RecordStore::open(storage, DEFAULT_STORAGE_KEY).unwrap();
        AppState {
            tracker: Arc::new(Mutex::new(Tracker::new(store))),
        }
    }

    async fn call(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn expense_body(amount: Value, category: &str) -> Value {
        json!({
            "amount": amount,
            "category": category,
            "method": "Card",
            "note": "n",
            "date": "2024-01-01"
        })
    }

    #[tokio::test]
    async fn test_add_list_and_summary() {
        let state = test_state();

        let (status, body) = call(
            &state,
            "POST",
            "/api/records/expense",
            Some(expense_body(json!(20), "Food")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["amount"], 20);

        call(
            &state,
            "POST",
            "/api/records/expense",
            Some(expense_body(json!("5"), "Bus")),
        )
        .await;

        let (_, body) = call(&state, "GET", "/api/records?type=expense", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = call(&state, "GET", "/api/summary", None).await;
        assert_eq!(body["data"]["stats"]["total_expense"], 25.0);
        assert_eq!(body["data"]["history"][0]["primary_info"], "$20 • Food");
    }

    #[tokio::test]
    async fn test_validation_and_unknown_type() {
        let state = test_state();

        let (status, body) = call(
            &state,
            "POST",
            "/api/records/expense",
            Some(json!({"amount": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);

        let (status, _) = call(&state, "POST", "/api/records/sleep", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_by_index() {
        let state = test_state();
        call(&state, "POST", "/api/records/expense", Some(expense_body(json!(1), "A"))).await;
        call(&state, "POST", "/api/records/expense", Some(expense_body(json!(2), "B"))).await;

        let (status, body) = call(&state, "DELETE", "/api/records/0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["category"], "A");

        let (status, _) = call(&state, "DELETE", "/api/records/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&state, "DELETE", "/api/records/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&state, "GET", "/api/records", None).await;
        assert_eq!(body["data"][0]["category"], "B");
    }

    #[tokio::test]
    async fn test_views() {
        let state = test_state();

        let (status, body) = call(&state, "GET", "/api/views/habit", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["view"], "form");
        assert_eq!(body["data"]["title"], "Health Tracking");

        let (status, _) = call(&state, "GET", "/api/views/settings", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
