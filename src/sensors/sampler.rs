//! Sensor sampling
//!
//! Produces one raw reading per channel per tick. Samplers never touch the
//! telemetry store; the store quantizes and applies whatever they return.

use super::registry::Channel;
use rand::Rng;
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;

/// Sampling errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("No waveform configured for channel: {0}")]
    UnknownChannel(String),

    #[error("Sensor fault on {channel}: {reason}")]
    Fault { channel: String, reason: String },
}

/// Source of raw channel readings
pub trait SensorSampler: Send + Sync {
    /// Read one value for `channel` at `now`
    fn sample(&self, channel: &Channel, now: Instant) -> Result<f64, SamplerError>;
}

impl<F> SensorSampler for F
where
    F: Fn(&Channel, Instant) -> Result<f64, SamplerError> + Send + Sync,
{
    fn sample(&self, channel: &Channel, now: Instant) -> Result<f64, SamplerError> {
        self(channel, now)
    }
}

/// Bounded oscillation parameters for one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveform {
    /// Center value
    pub offset: f64,
    /// Peak deviation of the sinusoid from `offset`
    pub amplitude: f64,
    /// Angular frequency in radians per second
    pub frequency: f64,
    /// Half-width of the uniform noise added to each reading
    pub jitter: f64,
    /// Physical limits the reading is clamped to
    pub bounds: Option<(f64, f64)>,
}

impl Waveform {
    pub fn new(offset: f64, amplitude: f64, frequency: f64, jitter: f64) -> Self {
        Self {
            offset,
            amplitude,
            frequency,
            jitter,
            bounds: None,
        }
    }

    pub fn clamped(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some((min, max));
        self
    }

    /// Noise-free value `elapsed_secs` after the epoch
    pub fn base(&self, elapsed_secs: f64) -> f64 {
        self.offset + self.amplitude * (elapsed_secs * self.frequency).sin()
    }

    fn clamp(&self, value: f64) -> f64 {
        match self.bounds {
            Some((min, max)) => value.clamp(min, max),
            None => value,
        }
    }
}

/// Default simulated sensor source: a sinusoid per channel plus jitter
#[derive(Debug, Clone)]
pub struct OscillatorSampler {
    epoch: Instant,
    waveforms: HashMap<String, Waveform>,
}

impl OscillatorSampler {
    /// Create a sampler with no waveforms
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            waveforms: HashMap::new(),
        }
    }

    /// Waveforms for the RaceCapture channel set
    pub fn racecapture() -> Self {
        Self::new()
            .with_waveform("RPM", Waveform::new(1000.0, 500.0, 0.5, 50.0).clamped(0.0, f64::MAX))
            .with_waveform("Speed (km/h)", Waveform::new(80.0, 30.0, 0.3, 5.0).clamped(0.0, f64::MAX))
            .with_waveform("Accel X (g)", Waveform::new(0.0, 0.5, 2.0, 0.1))
            .with_waveform("Accel Y (g)", Waveform::new(0.0, 0.3, 1.5, 0.1))
            .with_waveform("Accel Z (g)", Waveform::new(0.8, 0.2, 0.8, 0.1))
            .with_waveform("Battery Voltage (V)", Waveform::new(12.0, 0.5, 0.2, 0.1))
            .with_waveform("Motor Temp (°C)", Waveform::new(70.0, 10.0, 0.1, 2.0))
            .with_waveform("Throttle (%)", Waveform::new(50.0, 40.0, 0.4, 5.0).clamped(0.0, 100.0))
            .with_waveform("Brake (%)", Waveform::new(20.0, 30.0, 0.7, 5.0).clamped(0.0, 100.0))
    }

    /// Set or replace the waveform for a channel
    pub fn with_waveform(mut self, channel: impl Into<String>, waveform: Waveform) -> Self {
        self.waveforms.insert(channel.into(), waveform);
        self
    }

    pub fn waveform(&self, channel: &str) -> Option<&Waveform> {
        self.waveforms.get(channel)
    }
}

impl Default for OscillatorSampler {
    fn default() -> Self {
        Self::racecapture()
    }
}

impl SensorSampler for OscillatorSampler {
    fn sample(&self, channel: &Channel, now: Instant) -> Result<f64, SamplerError> {
        let waveform = self
            .waveforms
            .get(&channel.name)
            .ok_or_else(|| SamplerError::UnknownChannel(channel.name.clone()))?;

        let elapsed = now.saturating_duration_since(self.epoch).as_secs_f64();
        let noise = if waveform.jitter > 0.0 {
            rand::thread_rng().gen_range(-waveform.jitter..=waveform.jitter)
        } else {
            0.0
        };

        Ok(waveform.clamp(waveform.base(elapsed) + noise))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::registry::{Precision, SensorRegistry};
    use std::time::Duration;

    #[test]
    fn test_racecapture_covers_registry() {
        let sampler = OscillatorSampler::racecapture();
        let registry = SensorRegistry::racecapture();

        for channel in registry.channels() {
            assert!(sampler.sample(channel, Instant::now()).is_ok(), "{}", channel.name);
        }
    }

    #[test]
    fn test_readings_stay_in_range() {
        let sampler = OscillatorSampler::racecapture();
        let registry = SensorRegistry::racecapture();
        let start = Instant::now();

        for step in 0..500u64 {
            let now = start + Duration::from_millis(step * 100);
            for channel in registry.channels() {
                let waveform = sampler.waveform(&channel.name).unwrap();
                let value = sampler.sample(channel, now).unwrap();
                let spread = waveform.amplitude.abs() + waveform.jitter;
                assert!(value >= waveform.offset - spread - 1e-9, "{} = {}", channel.name, value);
                assert!(value <= waveform.offset + spread + 1e-9, "{} = {}", channel.name, value);
            }
        }
    }

    #[test]
    fn test_percentages_are_clamped() {
        let sampler = OscillatorSampler::racecapture();
        let brake = SensorRegistry::racecapture()
            .channels()
            .iter()
            .find(|c| c.name == "Brake (%)")
            .cloned()
            .unwrap();

        let start = Instant::now();
        for step in 0..200u64 {
            let value = sampler.sample(&brake, start + Duration::from_millis(step * 50)).unwrap();
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_changes_continuously() {
        let sampler = OscillatorSampler::new()
            .with_waveform("Speed (km/h)", Waveform::new(80.0, 30.0, 0.3, 0.0));
        let channel = Channel::new("Speed (km/h)", "km/h", "#FFB7B2", true, Precision::Integer);
        let start = Instant::now();

        let a = sampler.sample(&channel, start + Duration::from_millis(1000)).unwrap();
        let b = sampler.sample(&channel, start + Duration::from_millis(1100)).unwrap();
        // 30 * 0.3 rad/s bounds the slope at 9 units per second
        assert!((a - b).abs() <= 0.9 + 1e-9);
    }

    #[test]
    fn test_unknown_channel() {
        let sampler = OscillatorSampler::new();
        let channel = Channel::new("Oil Pressure", "kPa", "#FFFFFF", false, Precision::Integer);

        assert_eq!(
            sampler.sample(&channel, Instant::now()),
            Err(SamplerError::UnknownChannel("Oil Pressure".to_string()))
        );
    }

    #[test]
    fn test_closure_sampler() {
        let sampler = |channel: &Channel, _now: Instant| -> Result<f64, SamplerError> {
            Ok(channel.name.len() as f64)
        };
        let channel = Channel::new("RPM", "", "#FF9AA2", true, Precision::Integer);

        assert_eq!(SensorSampler::sample(&sampler, &channel, Instant::now()), Ok(3.0));
    }
}
