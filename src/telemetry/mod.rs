//! Telemetry state module
//!
//! - TelemetryStore: current values, history and recording under one lock
//! - HistoryBuffer: bounded recent readings per channel
//! - TickScheduler: periodic driver for the store

pub mod history;
pub mod scheduler;
pub mod store;

pub use history::{HistoryBuffer, HISTORY_CAPACITY};
pub use scheduler::{SchedulerHandle, TickScheduler, DEFAULT_TICK_INTERVAL};
pub use store::{
    ChannelMap, ChannelReading, ChannelState, History, Snapshot, StoreError, StoreOptions,
    TelemetryStore,
};
