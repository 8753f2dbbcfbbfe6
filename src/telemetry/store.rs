//! Shared telemetry state
//!
//! `TelemetryStore` holds the current value, selection flag and history of
//! every registered channel, plus the recording session. All of it sits
//! behind one mutex which is held only for in-memory work: sampling runs
//! before the lock is taken and exports are rendered after it is released.

use super::history::{HistoryBuffer, HISTORY_CAPACITY};
use crate::export::ExportDocument;
use crate::recorder::{RecordingSession, RecordingStatus, MAX_RECORDED_ROWS};
use crate::sensors::{Channel, SensorRegistry, SensorSampler, SensorValue};
use parking_lot::Mutex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// Store errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}

/// Sizing of the store's buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub history_capacity: usize,
    pub max_recorded_rows: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            max_recorded_rows: MAX_RECORDED_ROWS,
        }
    }
}

/// Mutable state of one channel
#[derive(Debug, Clone)]
pub struct ChannelState {
    pub value: SensorValue,
    pub selected: bool,
    pub history: HistoryBuffer,
}

impl ChannelState {
    fn new(channel: &Channel, history_capacity: usize) -> Self {
        Self {
            value: channel.precision.zero(),
            selected: channel.default_selected,
            history: HistoryBuffer::new(history_capacity),
        }
    }
}

/// Current reading of a channel as served to the dashboard
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChannelReading {
    pub value: SensorValue,
    pub selected: bool,
    pub color: String,
    pub unit: String,
}

/// Per-channel values keyed by channel name, in registry order
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> ChannelMap<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<T> FromIterator<(String, T)> for ChannelMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T: Serialize> Serialize for ChannelMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Current readings of every channel
pub type Snapshot = ChannelMap<ChannelReading>;

/// History buffers of every channel, oldest first
pub type History = ChannelMap<Vec<SensorValue>>;

struct StoreInner {
    /// Parallel to the registry
    channels: Vec<ChannelState>,
    recording: RecordingSession,
    ticks: u64,
}

/// Process-wide telemetry state shared by the tick scheduler and the
/// request handlers
pub struct TelemetryStore {
    registry: SensorRegistry,
    sampler: Box<dyn SensorSampler>,
    inner: Mutex<StoreInner>,
}

impl TelemetryStore {
    pub fn new<S>(registry: SensorRegistry, sampler: S, options: StoreOptions) -> Self
    where
        S: SensorSampler + 'static,
    {
        let channels = registry
            .channels()
            .iter()
            .map(|channel| ChannelState::new(channel, options.history_capacity))
            .collect();

        Self {
            registry,
            sampler: Box::new(sampler),
            inner: Mutex::new(StoreInner {
                channels,
                recording: RecordingSession::new(options.max_recorded_rows),
                ticks: 0,
            }),
        }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Sample every channel and apply the readings atomically
    ///
    /// A failed or non-finite sample keeps the channel's previous value,
    /// which is still appended to history so every buffer advances once
    /// per tick.
    pub fn tick(&self, now: Instant) {
        let readings: Vec<Option<SensorValue>> = self
            .registry
            .channels()
            .iter()
            .map(|channel| match self.sampler.sample(channel, now) {
                Ok(raw) if raw.is_finite() => Some(channel.precision.quantize(raw)),
                Ok(raw) => {
                    tracing::warn!(channel = %channel.name, raw, "Discarding non-finite sample");
                    None
                }
                Err(e) => {
                    tracing::warn!(channel = %channel.name, error = %e, "Sampler failed, keeping previous value");
                    None
                }
            })
            .collect();

        let mut inner = self.inner.lock();
        for (state, reading) in inner.channels.iter_mut().zip(readings) {
            if let Some(value) = reading {
                state.value = value;
            }
            let value = state.value;
            state.history.push(value);
        }

        if inner.recording.is_active() {
            let row: Vec<SensorValue> = inner.channels.iter().map(|state| state.value).collect();
            inner.recording.record(now, row);
        }

        inner.ticks += 1;
    }

    /// Current value, selection and display attributes of every channel
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock();
        self.registry
            .channels()
            .iter()
            .zip(&inner.channels)
            .map(|(channel, state)| {
                (
                    channel.name.clone(),
                    ChannelReading {
                        value: state.value,
                        selected: state.selected,
                        color: channel.color.clone(),
                        unit: channel.unit.clone(),
                    },
                )
            })
            .collect()
    }

    /// Full history buffer of every channel
    pub fn history(&self) -> History {
        let inner = self.inner.lock();
        self.registry
            .channels()
            .iter()
            .zip(&inner.channels)
            .map(|(channel, state)| (channel.name.clone(), state.history.to_vec()))
            .collect()
    }

    /// Toggle whether the dashboard displays a channel
    pub fn set_selected(&self, name: &str, selected: bool) -> Result<(), StoreError> {
        let id = self
            .registry
            .find(name)
            .ok_or_else(|| StoreError::UnknownChannel(name.to_string()))?;

        self.inner.lock().channels[id.0].selected = selected;
        tracing::debug!(channel = %name, selected, "Channel selection changed");
        Ok(())
    }

    /// Begin a new recording session, discarding unexported rows
    pub fn start_recording(&self, now: Instant) -> Uuid {
        self.inner.lock().recording.start(now)
    }

    /// End the active recording session; rows stay exportable
    pub fn stop_recording(&self, now: Instant) -> Option<Uuid> {
        self.inner.lock().recording.stop(now)
    }

    pub fn recording_status(&self, now: Instant) -> RecordingStatus {
        self.inner.lock().recording.status(now)
    }

    /// Copy the recorded rows out for rendering
    pub fn export(&self) -> ExportDocument {
        let rows = self.inner.lock().recording.rows().to_vec();
        ExportDocument::new(self.registry.names(), rows)
    }

    /// Number of ticks applied since the store was created
    pub fn tick_count(&self) -> u64 {
        self.inner.lock().ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{Precision, SamplerError};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn rpm_speed() -> SensorRegistry {
        SensorRegistry::new(vec![
            Channel::new("RPM", "", "#FF9AA2", true, Precision::Integer),
            Channel::new("Speed", "km/h", "#FFB7B2", true, Precision::Integer),
        ])
        .unwrap()
    }

    /// Hands out queued readings in call order (registry order per tick)
    fn queued(values: &[f64]) -> impl SensorSampler {
        let queue = Mutex::new(values.iter().copied().collect::<VecDeque<f64>>());
        move |channel: &Channel, _now: Instant| -> Result<f64, SamplerError> {
            queue.lock().pop_front().ok_or_else(|| SamplerError::Fault {
                channel: channel.name.clone(),
                reason: "queue exhausted".to_string(),
            })
        }
    }

    /// Returns the tick number for every channel
    fn counting() -> (Arc<AtomicU64>, impl SensorSampler) {
        let counter = Arc::new(AtomicU64::new(0));
        let shared = Arc::clone(&counter);
        let sampler = move |_channel: &Channel, _now: Instant| -> Result<f64, SamplerError> {
            Ok(shared.load(Ordering::SeqCst) as f64)
        };
        (counter, sampler)
    }

    #[test]
    fn test_history_tracks_last_ticks() {
        let (counter, sampler) = counting();
        let store = TelemetryStore::new(rpm_speed(), sampler, StoreOptions::default());
        let t0 = Instant::now();

        for n in 1..=80u64 {
            counter.store(n, Ordering::SeqCst);
            store.tick(t0 + Duration::from_millis(n * 100));

            let history = store.history();
            for (_, values) in history.iter() {
                let expected_len = n.min(50) as usize;
                assert_eq!(values.len(), expected_len);
                let expected: Vec<SensorValue> = ((n + 1 - expected_len as u64)..=n)
                    .map(|v| SensorValue::Int(v as i64))
                    .collect();
                assert_eq!(values, &expected);
            }
        }
        assert_eq!(store.tick_count(), 80);
    }

    #[test]
    fn test_history_never_exceeds_capacity() {
        let store = TelemetryStore::new(
            SensorRegistry::racecapture(),
            crate::sensors::OscillatorSampler::racecapture(),
            StoreOptions::default(),
        );
        let t0 = Instant::now();

        for n in 0..200u64 {
            store.tick(t0 + Duration::from_millis(n * 100));
        }

        let history = store.history();
        assert_eq!(history.len(), 9);
        for (_, values) in history.iter() {
            assert_eq!(values.len(), 50);
        }
    }

    #[test]
    fn test_csv_example() {
        let store = TelemetryStore::new(
            rpm_speed(),
            queued(&[1020.0, 85.0, 1005.0, 90.0]),
            StoreOptions::default(),
        );
        let t0 = Instant::now();

        store.start_recording(t0);
        store.tick(t0);
        store.tick(t0 + Duration::from_millis(100));
        store.stop_recording(t0 + Duration::from_millis(150));

        assert_eq!(
            store.export().to_csv(),
            "Timestamp,RPM,Speed\n0.00,1020,85\n0.10,1005,90\n"
        );
    }

    #[test]
    fn test_whole_decimal_readings_keep_point() {
        let registry = SensorRegistry::new(vec![Channel::new(
            "Battery Voltage (V)",
            "V",
            "#C7CEEA",
            true,
            Precision::Decimals(1),
        )])
        .unwrap();
        let store = TelemetryStore::new(registry, queued(&[12.0, 12.34]), StoreOptions::default());
        let t0 = Instant::now();

        store.start_recording(t0);
        store.tick(t0);
        store.tick(t0 + Duration::from_millis(100));
        store.stop_recording(t0 + Duration::from_millis(150));

        assert_eq!(
            store.export().to_csv(),
            "Timestamp,Battery Voltage (V)\n0.00,12.0\n0.10,12.3\n"
        );
    }

    #[test]
    fn test_start_stop_without_ticks() {
        let store = TelemetryStore::new(rpm_speed(), queued(&[]), StoreOptions::default());
        let t0 = Instant::now();

        store.start_recording(t0);
        store.stop_recording(t0);

        let doc = store.export();
        assert!(doc.rows.is_empty());
        assert_eq!(doc.to_csv(), "Timestamp,RPM,Speed\n");
    }

    #[test]
    fn test_second_start_discards_rows() {
        let (counter, sampler) = counting();
        let store = TelemetryStore::new(rpm_speed(), sampler, StoreOptions::default());
        let t0 = Instant::now();

        store.start_recording(t0);
        counter.store(1, Ordering::SeqCst);
        store.tick(t0 + Duration::from_millis(100));
        store.tick(t0 + Duration::from_millis(200));

        store.start_recording(t0 + Duration::from_millis(300));
        counter.store(7, Ordering::SeqCst);
        store.tick(t0 + Duration::from_millis(400));

        let doc = store.export();
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0].elapsed, Duration::from_millis(100));
        assert_eq!(doc.rows[0].values, vec![SensorValue::Int(7), SensorValue::Int(7)]);
    }

    #[test]
    fn test_export_is_idempotent_after_stop() {
        let (_counter, sampler) = counting();
        let store = TelemetryStore::new(rpm_speed(), sampler, StoreOptions::default());
        let t0 = Instant::now();

        store.start_recording(t0);
        store.tick(t0);
        store.stop_recording(t0);
        store.tick(t0 + Duration::from_millis(100));

        let first = store.export();
        let second = store.export();
        assert_eq!(first, second);
        assert_eq!(first.rows.len(), 1);
    }

    #[test]
    fn test_set_selected() {
        let store = TelemetryStore::new(rpm_speed(), queued(&[]), StoreOptions::default());

        store.set_selected("RPM", false).unwrap();
        assert!(!store.snapshot().get("RPM").unwrap().selected);

        let before = store.snapshot();
        assert_eq!(
            store.set_selected("Nonexistent", true),
            Err(StoreError::UnknownChannel("Nonexistent".to_string()))
        );
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_selection_does_not_filter_data() {
        let (counter, sampler) = counting();
        let store = TelemetryStore::new(rpm_speed(), sampler, StoreOptions::default());
        let t0 = Instant::now();

        store.set_selected("Speed", false).unwrap();
        store.start_recording(t0);
        counter.store(3, Ordering::SeqCst);
        store.tick(t0);

        assert_eq!(store.snapshot().get("Speed").unwrap().value, SensorValue::Int(3));
        assert_eq!(store.history().get("Speed").unwrap().len(), 1);
        assert_eq!(store.export().rows[0].values.len(), 2);
    }

    #[test]
    fn test_failed_sample_keeps_previous_value() {
        // RPM then Speed for the first tick; the second tick runs dry
        let store = TelemetryStore::new(rpm_speed(), queued(&[1020.0, 85.0]), StoreOptions::default());
        let t0 = Instant::now();

        store.tick(t0);
        store.tick(t0 + Duration::from_millis(100));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("RPM").unwrap().value, SensorValue::Int(1020));
        assert_eq!(
            store.history().get("Speed").unwrap(),
            &vec![SensorValue::Int(85), SensorValue::Int(85)]
        );
    }

    #[test]
    fn test_non_finite_sample_is_ignored() {
        let store = TelemetryStore::new(
            rpm_speed(),
            queued(&[1020.0, 85.0, f64::NAN, f64::INFINITY]),
            StoreOptions::default(),
        );
        let t0 = Instant::now();

        store.tick(t0);
        store.tick(t0);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("RPM").unwrap().value, SensorValue::Int(1020));
        assert_eq!(snapshot.get("Speed").unwrap().value, SensorValue::Int(85));
    }

    #[test]
    fn test_snapshot_order_and_initial_state() {
        let store = TelemetryStore::new(
            SensorRegistry::racecapture(),
            queued(&[]),
            StoreOptions::default(),
        );

        let snapshot = store.snapshot();
        let keys: Vec<&str> = snapshot.keys().collect();
        assert_eq!(keys, store.registry().names().collect::<Vec<_>>());

        let accel = snapshot.get("Accel X (g)").unwrap();
        assert_eq!(accel.value, SensorValue::Float(0.0));
        assert!(!accel.selected);
        assert_eq!(accel.unit, "g");

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.starts_with(r##"{"RPM":{"value":0,"selected":true,"color":"#FF9AA2","unit":""}"##));
        assert!(json.find("\"RPM\"").unwrap() < json.find("\"Brake (%)\"").unwrap());
    }

    #[test]
    fn test_concurrent_tick_and_export_rows_are_whole() {
        let (counter, sampler) = counting();
        let store = Arc::new(TelemetryStore::new(
            SensorRegistry::racecapture(),
            sampler,
            StoreOptions::default(),
        ));
        let t0 = Instant::now();
        store.start_recording(t0);

        let writer = {
            let store = Arc::clone(&store);
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || {
                for n in 1..=2000u64 {
                    counter.store(n, Ordering::SeqCst);
                    store.tick(t0 + Duration::from_millis(n * 10));
                }
            })
        };

        let mut exports = 0;
        while !writer.is_finished() || exports == 0 {
            let doc = store.export();
            for row in &doc.rows {
                let first = row.values[0];
                assert_eq!(row.values.len(), 9);
                assert!(row.values.iter().all(|v| *v == first));
                let expected_ms = first.as_f64() as u128 * 10;
                assert_eq!(row.elapsed.as_millis(), expected_ms);
            }
            exports += 1;
        }
        writer.join().unwrap();

        let doc = store.export();
        assert_eq!(doc.rows.len(), 2000);
        assert!(doc.rows.windows(2).all(|w| w[0].elapsed < w[1].elapsed));
    }
}
