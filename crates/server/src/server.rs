//! Routing, handlers and error mapping

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use catalog::{list_files, resolve_in_roots, FileEntry, MediaRoot};
use downloads::{DownloadError, DownloadRegistry, DownloadStatus, DownloadStream};

use crate::pages::render_index;

/// Shared state handed to every handler
#[derive(Clone)]
struct AppState {
    registry: DownloadRegistry,
    roots: Arc<Vec<MediaRoot>>,
    allowed_extensions: Arc<Vec<String>>,
}

/// Media download server API
#[derive(Clone)]
pub struct MediaServer {
    state: AppState,
}

impl MediaServer {
    /// Create a new server over a download registry and catalog roots
    ///
    /// # Arguments
    /// * `registry` - Shared registry enforcing admission and bandwidth
    /// * `roots` - Library roots served by the catalog
    /// * `allowed_extensions` - Extension filter for listings (empty = all)
    pub fn new(
        registry: DownloadRegistry,
        roots: Vec<MediaRoot>,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            state: AppState {
                registry,
                roots: Arc::new(roots),
                allowed_extensions: Arc::new(allowed_extensions),
            },
        }
    }

    /// Create the axum router with all routes configured
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_page))
            .route("/api/files", get(api_files))
            .route("/api/download-status", get(download_status))
            .route("/download/*path", get(download_file))
            .route("/health", get(health_check))
            .with_state(self.state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the server
    ///
    /// # Arguments
    /// * `host` - Host to bind to (e.g., "0.0.0.0")
    /// * `port` - Port to bind to (e.g., 8035)
    pub async fn serve(self, host: &str, port: u16) -> crate::Result<()> {
        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("media server listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.registry.active_count();
    (
        StatusCode::OK,
        format!("Media server running. Active downloads: {}", active),
    )
}

/// HTML index listing every servable file
async fn index_page(State(state): State<AppState>) -> Html<String> {
    let files = list_files(&state.roots, &state.allowed_extensions);
    Html(render_index(&files))
}

/// JSON file listing
async fn api_files(State(state): State<AppState>) -> Json<Vec<FileEntry>> {
    Json(list_files(&state.roots, &state.allowed_extensions))
}

/// Read-only registry snapshot
async fn download_status(State(state): State<AppState>) -> Json<DownloadStatus> {
    Json(state.registry.status())
}

/// Paced file download handler
///
/// Admission happens before the file is opened; the session handle travels
/// inside the response body stream, so completion, a read error or the
/// client going away all release the slot and rebalance the remaining
/// downloads.
async fn download_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    // The wildcard capture drops the leading slash of the absolute path
    let requested = PathBuf::from(format!("/{}", path));
    let full_path = resolve_in_roots(&state.roots, &requested)
        .ok_or_else(|| AppError::NotFound(format!("no such file: {}", requested.display())))?;

    let metadata = tokio::fs::metadata(&full_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(format!("no such file: {}", full_path.display()))
        } else {
            AppError::StorageUnavailable(format!("cannot stat {}: {}", full_path.display(), e))
        }
    })?;
    let file_size = metadata.len();

    let filename = full_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());

    let limits = state.registry.limits();
    let handle = state
        .registry
        .try_admit(full_path.clone(), filename.clone(), file_size)?;
    let stream = DownloadStream::open(&full_path, handle, limits.chunk_size).await?;

    let mime_type = mime_guess::from_path(&full_path)
        .first_or_octet_stream()
        .to_string();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_LENGTH, file_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream.into_byte_stream()))
        .map_err(|e| AppError::Internal(format!("failed to build response: {}", e)))?;

    Ok(response)
}

/// Handler error types mapped to HTTP statuses
#[derive(Debug)]
enum AppError {
    NotFound(String),
    TooManyDownloads(String),
    StorageUnavailable(String),
    Internal(String),
}

impl From<DownloadError> for AppError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::AdmissionRejected { active, limit } => AppError::TooManyDownloads(
                format!("{} of {} download slots in use, retry later", active, limit),
            ),
            DownloadError::FileUnavailable { ref source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                AppError::NotFound(err.to_string())
            }
            DownloadError::FileUnavailable { .. } => AppError::StorageUnavailable(err.to_string()),
            // A disconnect during the body stream never reaches a handler;
            // keep the mapping total anyway
            DownloadError::ClientDisconnected => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::TooManyDownloads(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            AppError::StorageUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}
