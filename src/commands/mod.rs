//! HTTP command handlers
//!
//! This module contains the dashboard's JSON API. Every handler works on
//! the shared `AppState`; the telemetry store does its own locking.

pub mod export;
pub mod recording;
pub mod sensors;

use crate::telemetry::TelemetryStore;
use axum::routing::{get, post};
use axum::Router;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TelemetryStore>,
    /// Directory `save_to_sd` writes into
    pub export_dir: Arc<RwLock<PathBuf>>,
}

impl AppState {
    pub fn new(store: Arc<TelemetryStore>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            export_dir: Arc::new(RwLock::new(export_dir.into())),
        }
    }
}

/// `{status, ...}` body returned by the control endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: None,
            path: None,
            session_id: None,
        }
    }

    pub fn success() -> Self {
        Self::new("success")
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sensor_data", get(sensors::sensor_data))
        .route("/api/sensor_history", get(sensors::sensor_history))
        .route("/api/update_sensor/:name/:state", get(sensors::update_sensor))
        .route("/api/recording/:action", get(recording::control_recording))
        .route("/api/recording_status", get(recording::recording_status))
        .route("/api/download", get(export::download_data))
        .route("/api/update_sd_path", post(export::update_sd_path))
        .route("/api/save_to_sd", get(export::save_to_sd))
        .with_state(state)
}
