//! Sensor-related HTTP commands
//!
//! Current values, chart history and display selection.

use super::{AppState, StatusResponse};
use crate::telemetry::{History, Snapshot};
use crate::utils::error::AppResult;
use axum::extract::{Path, State};
use axum::Json;

/// Current value, selection and display attributes of every channel
pub async fn sensor_data(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.store.snapshot())
}

/// History buffers for the charts, oldest reading first
pub async fn sensor_history(State(state): State<AppState>) -> Json<History> {
    Json(state.store.history())
}

/// Show or hide a channel on the dashboard
///
/// Any state other than `true` deselects the channel.
pub async fn update_sensor(
    State(state): State<AppState>,
    Path((name, selected)): Path<(String, String)>,
) -> AppResult<Json<StatusResponse>> {
    state.store.set_selected(&name, selected == "true")?;
    Ok(Json(StatusResponse::success()))
}
