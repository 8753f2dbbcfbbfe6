//! Channel registry
//!
//! Static definition of the telemetry channels tracked by the dashboard.
//! The set of channels and their order are fixed once the registry is built.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Registry construction errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate channel name: {0}")]
    DuplicateChannel(String),

    #[error("Registry must contain at least one channel")]
    Empty,
}

/// Position of a channel in its registry (registration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub usize);

/// How readings of a channel are quantized before they are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Whole counts, truncated toward zero
    Integer,
    /// Rounded to the given number of decimal places
    Decimals(u8),
}

impl Precision {
    /// Quantize a raw reading
    pub fn quantize(&self, raw: f64) -> SensorValue {
        match self {
            Precision::Integer => SensorValue::Int(raw.trunc() as i64),
            Precision::Decimals(places) => {
                let scale = 10f64.powi(i32::from(*places));
                SensorValue::Float((raw * scale).round() / scale)
            }
        }
    }

    /// The zero reading in this precision
    pub fn zero(&self) -> SensorValue {
        match self {
            Precision::Integer => SensorValue::Int(0),
            Precision::Decimals(_) => SensorValue::Float(0.0),
        }
    }
}

/// A single stored reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Int(i64),
    Float(f64),
}

impl SensorValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            SensorValue::Int(v) => *v as f64,
            SensorValue::Float(v) => *v,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Int(v) => write!(f, "{}", v),
            // Whole decimal readings keep their point: 12.0, not 12
            SensorValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            SensorValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for SensorValue {
    fn from(value: i64) -> Self {
        SensorValue::Int(value)
    }
}

impl From<f64> for SensorValue {
    fn from(value: f64) -> Self {
        SensorValue::Float(value)
    }
}

/// Immutable identity of a telemetry channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Unique channel name, also the CSV column header
    pub name: String,

    /// Unit label shown next to the value
    pub unit: String,

    /// Display color (CSS hex)
    pub color: String,

    /// Whether the dashboard shows this channel before the user toggles it
    pub default_selected: bool,

    /// Quantization applied to sampled readings
    pub precision: Precision,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        color: impl Into<String>,
        default_selected: bool,
        precision: Precision,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            color: color.into(),
            default_selected,
            precision,
        }
    }
}

/// Ordered, fixed set of channels
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    channels: Vec<Channel>,
}

impl SensorRegistry {
    /// Build a registry, keeping the given order
    pub fn new(channels: Vec<Channel>) -> Result<Self, RegistryError> {
        if channels.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::with_capacity(channels.len());
        for channel in &channels {
            if !seen.insert(channel.name.as_str()) {
                return Err(RegistryError::DuplicateChannel(channel.name.clone()));
            }
        }

        Ok(Self { channels })
    }

    /// The RaceCapture channel set
    pub fn racecapture() -> Self {
        use Precision::{Decimals, Integer};

        Self {
            channels: vec![
                Channel::new("RPM", "", "#FF9AA2", true, Integer),
                Channel::new("Speed (km/h)", "km/h", "#FFB7B2", true, Integer),
                Channel::new("Accel X (g)", "g", "#FFDAC1", false, Decimals(2)),
                Channel::new("Accel Y (g)", "g", "#E2F0CB", false, Decimals(2)),
                Channel::new("Accel Z (g)", "g", "#B5EAD7", false, Decimals(2)),
                Channel::new("Battery Voltage (V)", "V", "#C7CEEA", true, Decimals(1)),
                Channel::new("Motor Temp (°C)", "°C", "#F8B195", true, Integer),
                Channel::new("Throttle (%)", "%", "#A5DEE5", true, Integer),
                Channel::new("Brake (%)", "%", "#D8BFD8", true, Integer),
            ],
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(id.0)
    }

    /// Resolve a channel name to its id
    pub fn find(&self, name: &str) -> Option<ChannelId> {
        self.channels
            .iter()
            .position(|channel| channel.name == name)
            .map(ChannelId)
    }

    /// Channel names in registry order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|channel| channel.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &Channel)> {
        self.channels
            .iter()
            .enumerate()
            .map(|(index, channel)| (ChannelId(index), channel))
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::racecapture()
    }
}
