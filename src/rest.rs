/*!
chartdeck REST API Server

HTTP surface for the dashboard pipeline: upload a tabular file into a
session, preview and summarize it, narrow it with categorical filters,
render chart figures and export them as a PDF report.

## Usage

```bash
chartdeck-rest --host 127.0.0.1 --port 3334
```

## Endpoints

- `GET /api/v1/health` - Health check
- `GET /api/v1/version` - Version information
- `POST /api/v1/session` - Create a session
- `DELETE /api/v1/session/{id}` - Drop a session
- `POST /api/v1/session/{id}/dataset?filename=...` - Upload a data file (CSV, Excel, JSON, tab-delimited)
- `GET /api/v1/session/{id}/preview?rows=...` - First rows as JSON records
- `GET /api/v1/session/{id}/summary` - Numeric summary statistics
- `GET /api/v1/session/{id}/filters` - Filter state (`PUT` replaces the selection)
- `GET /api/v1/session/{id}/data.csv` - Filtered rows as CSV download
- `PUT /api/v1/session/{id}/charts?theme=...` - Build figures from a chart spec list
- `GET /api/v1/session/{id}/charts/{index}.png` - One rendered figure
- `POST /api/v1/session/{id}/report` - Assemble the PDF report
*/

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use clap::Parser;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chartdeck::dataset::{summarize, ColumnSummary};
use chartdeck::filter::{filter_options, to_csv_bytes, FilterOptions, FilterSelection};
use chartdeck::session::{Session, SessionManager};
use chartdeck::{
    build_figures, load_dataset, render_report, ChartSpec, ChartdeckError, ColumnRole, Dataset,
    Theme, VERSION,
};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// CLI arguments for the REST API server
#[derive(Parser)]
#[command(name = "chartdeck-rest")]
#[command(about = "chartdeck REST API Server")]
#[command(version = VERSION)]
struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind to
    #[arg(long, default_value = "3334")]
    port: u16,

    /// CORS allowed origins (comma-separated)
    #[arg(long, default_value = "*")]
    cors_origin: String,

    /// Seconds of inactivity before a session is dropped
    #[arg(long, default_value = "3600")]
    session_timeout_secs: u64,

    /// Maximum accepted upload body size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Maximum rows returned by the preview endpoint
    #[arg(long, default_value = "200")]
    preview_row_cap: usize,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    /// Session store shared by every handler
    sessions: Arc<SessionManager>,
    /// Maximum accepted upload body size in bytes
    max_upload_bytes: usize,
    /// Maximum rows a preview response may carry
    preview_row_cap: usize,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the dataset upload endpoint
#[derive(Debug, Deserialize)]
struct UploadParams {
    /// Name the file was uploaded under; its extension selects the parser
    filename: Option<String>,
}

/// Query parameters for the preview endpoint
#[derive(Debug, Deserialize)]
struct PreviewParams {
    /// How many leading rows to return (default 10)
    rows: Option<usize>,
}

/// Query parameters for the chart build endpoint
#[derive(Debug, Deserialize)]
struct ChartParams {
    /// Figure styling, "light" (default) or "dark"
    theme: Option<String>,
}

/// Successful API response
#[derive(Debug, Serialize)]
struct ApiSuccess<T> {
    status: String,
    data: T,
}

/// Error API response
#[derive(Debug, Serialize)]
struct ApiError {
    status: String,
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    error_type: String,
}

/// Session creation result data
#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: String,
}

/// Session deletion result data
#[derive(Debug, Serialize)]
struct SessionDeleted {
    session_id: String,
    deleted: bool,
}

/// One column's inferred role
#[derive(Debug, Serialize)]
struct RoleEntry {
    column: String,
    role: ColumnRole,
}

/// Shape and per-column roles of a stored dataset
#[derive(Debug, Serialize)]
struct DatasetProfile {
    source_name: String,
    rows: usize,
    columns: usize,
    roles: Vec<RoleEntry>,
}

/// Leading rows of the dataset as JSON records
#[derive(Debug, Serialize)]
struct Preview {
    columns: Vec<String>,
    rows: Vec<serde_json::Value>,
    total_rows: usize,
}

/// Metadata for one rendered figure
#[derive(Debug, Serialize)]
struct FigureMeta {
    index: usize,
    caption: String,
    width: u32,
    height: u32,
    bytes: usize,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    sessions: usize,
}

/// Version response
#[derive(Debug, Serialize)]
struct VersionResponse {
    version: String,
    features: Vec<String>,
}

// ============================================================================
// Error Handling
// ============================================================================

/// Custom error type for API responses
struct ApiErrorResponse {
    status: StatusCode,
    error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let json = Json(self.error);
        (self.status, json).into_response()
    }
}

impl From<ChartdeckError> for ApiErrorResponse {
    fn from(err: ChartdeckError) -> Self {
        let (status, error_type) = match &err {
            ChartdeckError::LoadError(_) => (StatusCode::BAD_REQUEST, "LoadError"),
            ChartdeckError::FilterError(_) => (StatusCode::BAD_REQUEST, "FilterError"),
            ChartdeckError::ChartError(_) => (StatusCode::BAD_REQUEST, "ChartError"),
            ChartdeckError::ExportError(_) => (StatusCode::CONFLICT, "ExportError"),
            ChartdeckError::SessionError(_) => (StatusCode::NOT_FOUND, "SessionError"),
            ChartdeckError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        ApiErrorResponse {
            status,
            error: ApiError {
                status: "error".to_string(),
                error: ErrorDetails {
                    message: err.to_string(),
                    error_type: error_type.to_string(),
                },
            },
        }
    }
}

impl From<String> for ApiErrorResponse {
    fn from(msg: String) -> Self {
        ApiErrorResponse {
            status: StatusCode::BAD_REQUEST,
            error: ApiError {
                status: "error".to_string(),
                error: ErrorDetails {
                    message: msg,
                    error_type: "BadRequest".to_string(),
                },
            },
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn session_not_found(id: &str) -> ApiErrorResponse {
    ChartdeckError::SessionError(format!("unknown session \"{id}\"")).into()
}

fn require_dataset(session: &Session) -> Result<&Dataset, ChartdeckError> {
    session
        .dataset
        .as_ref()
        .ok_or_else(|| ChartdeckError::SessionError("no dataset uploaded yet".to_string()))
}

/// Filter state for every categorical column of the session's dataset.
fn current_filter_options(session: &Session) -> Result<Vec<FilterOptions>, ChartdeckError> {
    let dataset = require_dataset(session)?;
    filter_options(dataset, &session.filters)
}

fn profile_of(source_name: &str, dataset: &Dataset) -> DatasetProfile {
    DatasetProfile {
        source_name: source_name.to_string(),
        rows: dataset.height(),
        columns: dataset.width(),
        roles: dataset
            .roles()
            .iter()
            .map(|(column, role)| RoleEntry {
                column: column.clone(),
                role: *role,
            })
            .collect(),
    }
}

/// Convert the leading rows of a dataset to JSON records, one object per row.
fn preview_of(head: &DataFrame, total_rows: usize) -> Preview {
    let columns: Vec<String> = head
        .get_columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    let rows: Vec<serde_json::Value> = (0..head.height())
        .map(|idx| {
            let mut record = serde_json::Map::new();
            for column in head.get_columns() {
                record.insert(column.name().to_string(), column_value_to_json(column, idx));
            }
            serde_json::Value::Object(record)
        })
        .collect();

    Preview {
        columns,
        rows,
        total_rows,
    }
}

/// Convert a single value from a Polars Column to JSON
fn column_value_to_json(column: &polars::prelude::Column, idx: usize) -> serde_json::Value {
    use polars::prelude::AnyValue;

    let any_value = match column.get(idx) {
        Ok(v) => v,
        Err(_) => return serde_json::Value::Null,
    };

    match any_value {
        AnyValue::Null => serde_json::Value::Null,
        AnyValue::Boolean(b) => serde_json::Value::Bool(b),
        AnyValue::Int8(v) => serde_json::Value::Number(v.into()),
        AnyValue::Int16(v) => serde_json::Value::Number(v.into()),
        AnyValue::Int32(v) => serde_json::Value::Number(v.into()),
        AnyValue::Int64(v) => serde_json::Value::Number(v.into()),
        AnyValue::UInt8(v) => serde_json::Value::Number(v.into()),
        AnyValue::UInt16(v) => serde_json::Value::Number(v.into()),
        AnyValue::UInt32(v) => serde_json::Value::Number(v.into()),
        AnyValue::UInt64(v) => serde_json::Value::Number(v.into()),
        AnyValue::Float32(v) => serde_json::Number::from_f64(v as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        AnyValue::String(s) => serde_json::Value::String(s.to_string()),
        AnyValue::StringOwned(s) => serde_json::Value::String(s.to_string()),
        AnyValue::Date(days) => {
            let unix_epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let date = unix_epoch + chrono::Duration::days(days as i64);
            serde_json::Value::String(date.format("%Y-%m-%d").to_string())
        }
        AnyValue::Datetime(us, _, _) => {
            let dt = chrono::DateTime::from_timestamp_micros(us).unwrap_or_default();
            serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        }
        other => {
            tracing::debug!("Converting unsupported Polars type to string: {:?}", other);
            serde_json::Value::String(format!("{}", other))
        }
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

/// POST /api/v1/session - Create a session
async fn create_session_handler(State(state): State<AppState>) -> Json<ApiSuccess<SessionCreated>> {
    let session_id = state.sessions.create_session();
    info!("Session {} created", session_id);

    Json(ApiSuccess {
        status: "ok".to_string(),
        data: SessionCreated { session_id },
    })
}

/// DELETE /api/v1/session/{id} - Drop a session
async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccess<SessionDeleted>>, ApiErrorResponse> {
    if !state.sessions.delete_session(&id) {
        return Err(session_not_found(&id));
    }
    info!("Session {} deleted", id);

    Ok(Json(ApiSuccess {
        status: "ok".to_string(),
        data: SessionDeleted {
            session_id: id,
            deleted: true,
        },
    }))
}

/// POST /api/v1/session/{id}/dataset - Upload and parse a data file
async fn upload_dataset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<ApiSuccess<DatasetProfile>>, ApiErrorResponse> {
    let filename = params
        .filename
        .ok_or_else(|| ApiErrorResponse::from("missing \"filename\" query parameter".to_string()))?;

    // Parse outside the session lock; a failure leaves the stored dataset as it was.
    let dataset = load_dataset(&filename, &body)?;
    let profile = profile_of(&filename, &dataset);

    state
        .sessions
        .update_session(&id, |session| session.set_dataset(filename.clone(), dataset))
        .ok_or_else(|| session_not_found(&id))??;

    info!(
        "Session {}: stored {} ({} rows x {} columns)",
        id, filename, profile.rows, profile.columns
    );

    Ok(Json(ApiSuccess {
        status: "ok".to_string(),
        data: profile,
    }))
}

/// GET /api/v1/session/{id}/preview - Leading rows as JSON records
async fn preview_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<ApiSuccess<Preview>>, ApiErrorResponse> {
    let rows = params.rows.unwrap_or(10).min(state.preview_row_cap);

    let preview = state
        .sessions
        .with_session(&id, |session| -> Result<Preview, ChartdeckError> {
            let dataset = require_dataset(session)?;
            Ok(preview_of(&dataset.head(rows), dataset.height()))
        })
        .ok_or_else(|| session_not_found(&id))??;

    Ok(Json(ApiSuccess {
        status: "ok".to_string(),
        data: preview,
    }))
}

/// GET /api/v1/session/{id}/summary - Numeric summary statistics
///
/// Describes the dataset as uploaded; the filter selection does not
/// narrow the summary.
async fn summary_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccess<Vec<ColumnSummary>>>, ApiErrorResponse> {
    let summaries = state
        .sessions
        .with_session(&id, |session| -> Result<Vec<ColumnSummary>, ChartdeckError> {
            let dataset = require_dataset(session)?;
            summarize(dataset)
        })
        .ok_or_else(|| session_not_found(&id))??;

    Ok(Json(ApiSuccess {
        status: "ok".to_string(),
        data: summaries,
    }))
}

/// GET /api/v1/session/{id}/filters - Current filter state
async fn get_filters_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccess<Vec<FilterOptions>>>, ApiErrorResponse> {
    let options = state
        .sessions
        .with_session(&id, current_filter_options)
        .ok_or_else(|| session_not_found(&id))??;

    Ok(Json(ApiSuccess {
        status: "ok".to_string(),
        data: options,
    }))
}

/// PUT /api/v1/session/{id}/filters - Replace the filter selection
async fn put_filters_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(selection): Json<FilterSelection>,
) -> Result<Json<ApiSuccess<Vec<FilterOptions>>>, ApiErrorResponse> {
    let options = state
        .sessions
        .update_session(
            &id,
            |session| -> Result<Vec<FilterOptions>, ChartdeckError> {
                session.set_filters(selection)?;
                current_filter_options(session)
            },
        )
        .ok_or_else(|| session_not_found(&id))??;

    info!("Session {}: filters replaced", id);

    Ok(Json(ApiSuccess {
        status: "ok".to_string(),
        data: options,
    }))
}

/// GET /api/v1/session/{id}/data.csv - Filtered rows as CSV download
async fn download_csv_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let csv = state
        .sessions
        .with_session(&id, |session| -> Result<Vec<u8>, ChartdeckError> {
            let narrowed = session.filtered_dataset()?;
            to_csv_bytes(&narrowed)
        })
        .ok_or_else(|| session_not_found(&id))??;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"filtered_data.csv\"",
            ),
        ],
        csv,
    ))
}

/// PUT /api/v1/session/{id}/charts - Build figures from a chart spec list
async fn build_charts_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ChartParams>,
    Json(specs): Json<Vec<ChartSpec>>,
) -> Result<Json<ApiSuccess<Vec<FigureMeta>>>, ApiErrorResponse> {
    let theme = match params.theme {
        Some(raw) => raw.parse::<Theme>().map_err(ApiErrorResponse::from)?,
        None => Theme::default(),
    };

    let meta = state
        .sessions
        .update_session(&id, |session| -> Result<Vec<FigureMeta>, ChartdeckError> {
            // A failed build leaves the figure list empty, not stale.
            session.figures.clear();
            let dataset = session.filtered_dataset()?;
            let figures = build_figures(&dataset, &specs, theme)?;
            let meta = figures
                .iter()
                .enumerate()
                .map(|(index, figure)| FigureMeta {
                    index,
                    caption: figure.caption.clone(),
                    width: figure.width,
                    height: figure.height,
                    bytes: figure.png.len(),
                })
                .collect();
            session.set_figures(figures);
            Ok(meta)
        })
        .ok_or_else(|| session_not_found(&id))??;

    info!("Session {}: built {} figure(s), theme {}", id, meta.len(), theme);

    Ok(Json(ApiSuccess {
        status: "ok".to_string(),
        data: meta,
    }))
}

/// GET /api/v1/session/{id}/charts/{index}.png - One rendered figure
async fn chart_png_handler(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let trimmed = index.strip_suffix(".png").unwrap_or(&index);
    let index: usize = trimmed
        .parse()
        .map_err(|_| ApiErrorResponse::from(format!("invalid figure index \"{trimmed}\"")))?;

    let png = state
        .sessions
        .with_session(&id, |session| -> Result<Vec<u8>, ChartdeckError> {
            session
                .figures
                .get(index)
                .map(|figure| figure.png.clone())
                .ok_or_else(|| {
                    ChartdeckError::SessionError(format!(
                        "no figure at index {index} ({} available)",
                        session.figures.len()
                    ))
                })
        })
        .ok_or_else(|| session_not_found(&id))??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// POST /api/v1/session/{id}/report - Assemble the PDF report
async fn report_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let figures = state
        .sessions
        .update_session(&id, |session| session.figures.clone())
        .ok_or_else(|| session_not_found(&id))?;

    let pdf = render_report(&figures)?;
    info!(
        "Session {}: report with {} page(s), {} bytes",
        id,
        figures.len(),
        pdf.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"report.pdf\"",
            ),
        ],
        pdf,
    ))
}

/// GET /api/v1/health - Health check
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        sessions: state.sessions.session_count(),
    })
}

/// GET /api/v1/version - Version information
async fn version_handler() -> Json<VersionResponse> {
    let mut features = Vec::new();

    #[cfg(feature = "excel")]
    features.push("excel".to_string());

    features.push("rest-api".to_string());

    Json(VersionResponse {
        version: VERSION.to_string(),
        features,
    })
}

/// Root handler
async fn root_handler() -> &'static str {
    "chartdeck REST API Server - See /api/v1/health for status"
}

// ============================================================================
// Router & Main Server
// ============================================================================

fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/", get(root_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/version", get(version_handler))
        .route("/api/v1/session", post(create_session_handler))
        .route("/api/v1/session/:id", delete(delete_session_handler))
        .route("/api/v1/session/:id/dataset", post(upload_dataset_handler))
        .route("/api/v1/session/:id/preview", get(preview_handler))
        .route("/api/v1/session/:id/summary", get(summary_handler))
        .route(
            "/api/v1/session/:id/filters",
            get(get_filters_handler).put(put_filters_handler),
        )
        .route("/api/v1/session/:id/data.csv", get(download_csv_handler))
        .route("/api/v1/session/:id/charts", put(build_charts_handler))
        .route("/api/v1/session/:id/charts/:index", get(chart_png_handler))
        .route("/api/v1/session/:id/report", post(report_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chartdeck=info,chartdeck_rest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Create application state
    let state = AppState {
        sessions: Arc::new(SessionManager::new(cli.session_timeout_secs)),
        max_upload_bytes: cli.max_upload_bytes,
        preview_row_cap: cli.preview_row_cap,
    };

    // Sweep idle sessions in the background
    let sweeper = Arc::clone(&state.sessions);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            let dropped = sweeper.remove_expired();
            if dropped > 0 {
                warn!("Removed {} expired session(s)", dropped);
            }
        }
    });

    // Configure CORS
    let cors = if cli.cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(vec![header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = cli
            .cors_origin
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(vec![header::CONTENT_TYPE])
    };

    // Build router
    let app = build_router(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .expect("Invalid host or port");

    info!("Starting chartdeck REST API server on {}", addr);
    info!("API documentation:");
    info!("  POST   /api/v1/session                      - Create a session");
    info!("  DELETE /api/v1/session/:id                  - Drop a session");
    info!("  POST   /api/v1/session/:id/dataset          - Upload a data file");
    info!("  GET    /api/v1/session/:id/preview          - Preview leading rows");
    info!("  GET    /api/v1/session/:id/summary          - Numeric summary");
    info!("  GET    /api/v1/session/:id/filters          - Filter state (PUT replaces)");
    info!("  GET    /api/v1/session/:id/data.csv         - Filtered CSV download");
    info!("  PUT    /api/v1/session/:id/charts           - Build figures");
    info!("  GET    /api/v1/session/:id/charts/:index.png - One figure as PNG");
    info!("  POST   /api/v1/session/:id/report           - PDF report");
    info!("  GET    /api/v1/health                       - Health check");
    info!("  GET    /api/v1/version                      - Version info");

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
