//! API request handlers
//!
//! Upload and download are thin file-system pass-throughs; all
//! transformation happens in [`Pipeline`](crate::core::Pipeline).

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::server::AppState;
use crate::core::{seeded_or_entropy, ProcessedFile};
use crate::error::SalesPgmResult;
use crate::output::is_plain_file_name;

/// MIME type of .xlsx downloads
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(RootResponse {
        name: "SalesPGM Server".to_string(),
        version: state.version.clone(),
        description: "Sales program registration normalizer".to_string(),
        endpoints: vec![
            endpoint("/health", "GET", "Health check endpoint"),
            endpoint("/version", "GET", "Get server version"),
            endpoint("/upload", "POST", "Upload a registration sheet (multipart field 'file')"),
            endpoint("/download/:filename", "GET", "Download a processed workbook"),
        ],
    }))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub variant: String,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        variant: state.pipeline.config().variant.name().to_string(),
    }))
}

/// Upload response
#[derive(Serialize, Default, Debug)]
pub struct UploadResponse {
    pub input_file: String,
    pub output_file: String,
    pub download_url: String,
    pub rows_in: usize,
    pub rows_out: usize,
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn reject<T: Serialize>(status: StatusCode, message: impl Into<String>) -> Reply<T> {
    (status, Json(ApiResponse::err(message)))
}

/// POST /upload - Process an uploaded sheet
pub async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Reply<UploadResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return reject(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)),
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return reject(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)),
        };
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return reject(StatusCode::BAD_REQUEST, "No file selected");
    };
    // Browsers may send a full client-side path
    let file_name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string();
    if !is_plain_file_name(&file_name) {
        return reject(StatusCode::BAD_REQUEST, "No file selected");
    }

    info!(file = %file_name, bytes = bytes.len(), "upload received");

    let worker_state = Arc::clone(&state);
    let staged_name = format!("{}_{}", Uuid::new_v4(), file_name);
    let job = tokio::task::spawn_blocking(move || -> SalesPgmResult<ProcessedFile> {
        let staging = worker_state.download_dir.join("uploads");
        std::fs::create_dir_all(&staging)?;
        let input: PathBuf = staging.join(&staged_name);
        std::fs::write(&input, &bytes)?;

        let mut rng = seeded_or_entropy(worker_state.seed);
        let result = worker_state.pipeline.process_file(
            &input,
            &worker_state.download_dir,
            Local::now().naive_local(),
            &mut rng,
        );
        let _ = std::fs::remove_file(&input);
        result
    });

    match job.await {
        Ok(Ok(processed)) => {
            let output_file = processed
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            (
                StatusCode::OK,
                Json(ApiResponse::ok(UploadResponse {
                    input_file: file_name,
                    download_url: format!("/download/{}", output_file),
                    output_file,
                    rows_in: processed.report.rows_in,
                    rows_out: processed.report.rows_out,
                })),
            )
        }
        Ok(Err(e)) => reject(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        Err(e) => {
            error!("processing task failed: {}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Processing failed")
        }
    }
}

/// GET /download/:filename - Serve a processed workbook as an attachment
pub async fn download(State(state): State<Arc<AppState>>, Path(filename): Path<String>) -> Response {
    if !is_plain_file_name(&filename) {
        return reject::<()>(StatusCode::BAD_REQUEST, "Invalid file name").into_response();
    }

    let path = state.download_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            Body::from(bytes),
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            reject::<()>(StatusCode::NOT_FOUND, format!("File not found: {}", filename)).into_response()
        }
        Err(e) => {
            error!(file = %filename, "download failed: {}", e);
            reject::<()>(StatusCode::INTERNAL_SERVER_ERROR, "Download failed").into_response()
        }
    }
}
