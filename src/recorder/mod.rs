//! Recording system module
//!
//! Start/stop lifecycle of the single recording session. The session is
//! owned by the telemetry store, which appends one row per tick while
//! the session is active.

pub mod state;

pub use state::{
    RecordedRow, RecordingAction, RecordingSession, RecordingState, RecordingStatus,
    UnsupportedAction, MAX_RECORDED_ROWS,
};
