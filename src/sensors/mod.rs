//! Sensor definitions and simulated sampling
//!
//! - SensorRegistry: ordered set of telemetry channels
//! - SensorSampler: pluggable source of raw readings

pub mod registry;
pub mod sampler;

pub use registry::{Channel, ChannelId, Precision, RegistryError, SensorRegistry, SensorValue};
pub use sampler::{OscillatorSampler, SamplerError, SensorSampler, Waveform};
