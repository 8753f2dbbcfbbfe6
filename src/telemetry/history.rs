//! Bounded per-channel history

use crate::sensors::SensorValue;
use std::collections::VecDeque;

/// Default number of samples kept per channel for charting
pub const HISTORY_CAPACITY: usize = 50;

/// Fixed-capacity ring of recent readings, oldest first
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<SensorValue>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest one when full
    pub fn push(&mut self, value: SensorValue) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<SensorValue> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorValue> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<SensorValue> {
        self.samples.iter().copied().collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}
