//! Recording-related HTTP commands

use super::{AppState, StatusResponse};
use crate::recorder::{RecordingAction, RecordingStatus};
use crate::utils::error::AppResult;
use axum::extract::{Path, State};
use axum::Json;
use std::time::Instant;

/// Start or stop the recording session
pub async fn control_recording(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> AppResult<Json<StatusResponse>> {
    let response = match action.parse::<RecordingAction>()? {
        RecordingAction::Start => {
            let session_id = state.store.start_recording(Instant::now());
            StatusResponse {
                session_id: Some(session_id),
                ..StatusResponse::new("recording started")
            }
        }
        RecordingAction::Stop => {
            state.store.stop_recording(Instant::now());
            StatusResponse::new("recording stopped")
        }
    };

    Ok(Json(response))
}

/// Get the recording state, row count and elapsed time
pub async fn recording_status(State(state): State<AppState>) -> Json<RecordingStatus> {
    Json(state.store.recording_status(Instant::now()))
}
