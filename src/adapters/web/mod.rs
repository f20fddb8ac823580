//! Local web interface.
//!
//! Endpoints:
//! - `GET /` - Form (identifier, kind, network)
//! - `POST /analyze` - Run the pipeline, show summary and download links
//! - `GET /analyze` - Redirect to `/`
//! - `GET /download/{filename}` - Serve a generated file from the output directory
//! - `GET /health` - Health check
//! - `GET /version` - Application name and version

mod page;

use axum::{
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::{InvestigationError, Investigator};
use crate::domain::{KindHint, NetworkHint, MAX_INPUT_LEN};

/// Application state shared across handlers.
pub struct AppState {
    pub investigator: Investigator,
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn new(investigator: Investigator) -> Self {
        let output_dir = investigator.renderer().output_dir().to_path_buf();
        Self {
            investigator,
            output_dir,
        }
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/analyze", get(analyze_redirect).post(analyze_handler))
        .route("/download/{filename}", get(download_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Web interface listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await
}

async fn index_handler() -> Html<String> {
    Html(page::form_page(None, ""))
}

async fn analyze_redirect() -> Redirect {
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub network: String,
}

fn bad_request(message: &str, value: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Html(page::form_page(Some(message), value)),
    )
        .into_response()
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AnalyzeForm>,
) -> Response {
    let input = form.identifier.trim();
    if input.is_empty() {
        return bad_request("Empty input. Paste a wallet address or a transaction hash.", "");
    }
    if input.chars().count() > MAX_INPUT_LEN {
        return bad_request(
            &format!("Input too long. Maximum is {} characters.", MAX_INPUT_LEN),
            "",
        );
    }

    let kind: KindHint = match form.kind.parse() {
        Ok(kind) => kind,
        Err(e) => return bad_request(&e, input),
    };
    let network: NetworkHint = match form.network.parse() {
        Ok(network) => network,
        Err(e) => return bad_request(&e, input),
    };

    match state.investigator.investigate(input, kind, network).await {
        Ok(inv) => Html(page::result_page(&inv)).into_response(),
        Err(InvestigationError::InvalidIdentifier(e)) => {
            info!("Rejected identifier: {}", e);
            bad_request(&e.to_string(), input)
        }
        Err(e) => {
            error!("Report failed for {}: {}", input, e);
            (StatusCode::BAD_GATEWAY, Html(page::error_page(&e.to_string()))).into_response()
        }
    }
}

/// A bare file name: no separators, no parent references, no hidden files
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.contains('\0')
}

fn content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    if !is_safe_file_name(&filename) {
        warn!("Rejected download name {:?}", filename);
        return (StatusCode::BAD_REQUEST, "invalid file name").into_response();
    }

    let path = state.output_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type(&filename).to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "could not read file").into_response()
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct VersionResponse {
    name: &'static str,
    version: &'static str,
}

async fn version_handler() -> impl IntoResponse {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
