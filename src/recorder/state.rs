//! Recording state management
//!
//! Defines the recording state machine and the buffer of recorded rows.

use crate::sensors::SensorValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Default cap on rows held by one session (one hour at 10 Hz)
pub const MAX_RECORDED_ROWS: usize = 36_000;

/// Current state of the recording system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// Not recording; rows of the last session stay exportable
    Inactive,
    /// Ticks append rows
    Active,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Inactive
    }
}

/// Recording control action accepted by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingAction {
    Start,
    Stop,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unsupported recording action: {0}")]
pub struct UnsupportedAction(pub String);

impl FromStr for RecordingAction {
    type Err = UnsupportedAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(UnsupportedAction(other.to_string())),
        }
    }
}

/// One recorded sample: time since session start plus a value per channel
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRow {
    pub elapsed: Duration,
    /// Values in registry order
    pub values: Vec<SensorValue>,
}

/// Recording summary for the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub state: RecordingState,

    /// Id of the active session, or of the last one if stopped
    pub session_id: Option<Uuid>,

    /// Wall-clock start of that session
    pub started_at: Option<DateTime<Utc>>,

    /// Rows currently held for export
    pub rows: usize,

    /// Seconds since the active session started (0 when inactive)
    pub elapsed_secs: f64,

    /// Whether rows were dropped because the row cap was reached
    pub truncated: bool,
}

/// The single recording session owned by the telemetry store
///
/// `start` always begins from an empty row buffer. Rows that were not
/// exported before the next `start` are lost.
#[derive(Debug)]
pub struct RecordingSession {
    state: RecordingState,
    session_id: Option<Uuid>,
    started_at: Option<Instant>,
    started_wall: Option<DateTime<Utc>>,
    rows: Vec<RecordedRow>,
    max_rows: usize,
    truncated: bool,
}

impl RecordingSession {
    /// Create an inactive session holding at most `max_rows` rows
    pub fn new(max_rows: usize) -> Self {
        Self {
            state: RecordingState::Inactive,
            session_id: None,
            started_at: None,
            started_wall: None,
            rows: Vec::new(),
            max_rows: max_rows.max(1),
            truncated: false,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == RecordingState::Active
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Begin a new session at `now`, discarding any previous rows
    pub fn start(&mut self, now: Instant) -> Uuid {
        if !self.rows.is_empty() {
            tracing::warn!(
                previous_session = ?self.session_id,
                rows = self.rows.len(),
                "Discarding recorded rows from previous session"
            );
        }

        let session_id = Uuid::new_v4();
        self.state = RecordingState::Active;
        self.session_id = Some(session_id);
        self.started_at = Some(now);
        self.started_wall = Some(Utc::now());
        self.rows.clear();
        self.truncated = false;

        tracing::info!(%session_id, "Recording started");
        session_id
    }

    /// End the active session; rows stay available for export
    pub fn stop(&mut self, now: Instant) -> Option<Uuid> {
        if !self.is_active() {
            return None;
        }

        self.state = RecordingState::Inactive;
        tracing::info!(
            session_id = ?self.session_id,
            rows = self.rows.len(),
            duration_secs = self.elapsed_at(now).as_secs_f64(),
            "Recording stopped"
        );
        self.session_id
    }

    /// Append a row if recording. Returns whether the row was kept.
    pub fn record(&mut self, now: Instant, values: Vec<SensorValue>) -> bool {
        if !self.is_active() {
            return false;
        }

        if self.rows.len() >= self.max_rows {
            if !self.truncated {
                tracing::warn!(
                    session_id = ?self.session_id,
                    max_rows = self.max_rows,
                    "Recording row cap reached, dropping further rows"
                );
                self.truncated = true;
            }
            return false;
        }

        let elapsed = self.elapsed_at(now);
        self.rows.push(RecordedRow { elapsed, values });
        true
    }

    pub fn rows(&self) -> &[RecordedRow] {
        &self.rows
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn status(&self, now: Instant) -> RecordingStatus {
        let elapsed_secs = if self.is_active() {
            self.elapsed_at(now).as_secs_f64()
        } else {
            0.0
        };

        RecordingStatus {
            state: self.state,
            session_id: self.session_id,
            started_at: self.started_wall,
            rows: self.rows.len(),
            elapsed_secs,
            truncated: self.truncated,
        }
    }

    fn elapsed_at(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new(MAX_RECORDED_ROWS)
    }
}
