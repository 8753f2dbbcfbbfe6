//! Export command handlers
//!
//! CSV download of the recorded rows and writes to the configured storage
//! directory (the dashboard's "SD card").

use super::{AppState, StatusResponse};
use crate::export::{DownloadSink, ExportSink, FileSink};
use crate::utils::error::{AppError, AppResult};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/update_sd_path`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePathRequest {
    pub path: Option<String>,
}

/// Stream the current recording as a CSV attachment
pub async fn download_data(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let document = state.store.export();
    let download = DownloadSink::new().deliver(&document)?;

    tracing::info!(
        "Serving {} recorded rows as {}",
        document.rows.len(),
        download.filename
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, download.content_disposition()),
        ],
        download.body,
    ))
}

/// Change the directory `save_to_sd` writes into
pub async fn update_sd_path(
    State(state): State<AppState>,
    payload: Option<Json<UpdatePathRequest>>,
) -> AppResult<Json<StatusResponse>> {
    let path = payload
        .and_then(|Json(request)| request.path)
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .ok_or_else(|| AppError::MissingField("No path provided".to_string()))?;

    tracing::info!("Export directory set to {}", path);
    *state.export_dir.write() = path.clone().into();

    Ok(Json(StatusResponse {
        path: Some(path),
        ..StatusResponse::success()
    }))
}

/// Write the current recording into the export directory
pub async fn save_to_sd(State(state): State<AppState>) -> AppResult<Json<StatusResponse>> {
    let dir = state.export_dir.read().clone();
    let document = state.store.export();

    let path = tokio::task::spawn_blocking(move || FileSink::new(dir).deliver(&document))
        .await
        .map_err(|e| AppError::Internal(format!("Export task failed: {}", e)))??;

    let path = path.to_string_lossy().to_string();
    Ok(Json(StatusResponse {
        message: Some(format!("Data saved to {}", path)),
        path: Some(path),
        ..StatusResponse::success()
    }))
}
