//! Fixed-capacity sliding window of recent samples.

use crate::core::sample::SensorSample;
use std::collections::VecDeque;

/// Default window: the 30 most recent samples plus the newest one.
pub const DEFAULT_CAPACITY: usize = 31;

/// Append-only FIFO window; the oldest sample is evicted on overflow.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<SensorSample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append at the tail, evicting from the head until within capacity.
    ///
    /// Returns the number of samples evicted.
    pub fn append(&mut self, sample: SensorSample) -> usize {
        self.samples.push_back(sample);
        let mut evicted = 0;
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// All samples in arrival order.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &SensorSample> + DoubleEndedIterator + '_ {
        self.samples.iter()
    }

    /// The newest sample.
    pub fn latest(&self) -> Option<&SensorSample> {
        self.samples.back()
    }

    /// The oldest sample still in the window.
    pub fn oldest(&self) -> Option<&SensorSample> {
        self.samples.front()
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
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
