//! Per-channel means over the sample window.

use crate::core::buffer::SampleBuffer;
use crate::core::channel::{Channel, Readings};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Arithmetic mean of one channel over the buffer.
///
/// Samples without a reading for `channel` are excluded. With no readings at
/// all the mean is 0.
pub fn mean(buffer: &SampleBuffer, channel: Channel) -> f64 {
    let values: Vec<f64> = buffer.all().filter_map(|s| s.reading(channel)).collect();
    if values.is_empty() {
        return 0.0;
    }
    // Running mean; can differ from sum / count in the last bits, which round2 absorbs.
    values.mean()
}

/// Round to two decimals, as displayed on the summary page.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Means of a set of channels at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    /// Number of samples in the window when computed
    pub sample_count: usize,
    /// Mean per channel
    pub means: BTreeMap<Channel, f64>,
}

impl AggregateSnapshot {
    /// Compute means for `channels` over the current buffer contents.
    pub fn compute(buffer: &SampleBuffer, channels: &[Channel]) -> Self {
        let means = channels
            .iter()
            .map(|&channel| (channel, mean(buffer, channel)))
            .collect();
        Self {
            sample_count: buffer.len(),
            means,
        }
    }

    /// Mean for `channel`; channels that were not computed read as 0.
    pub fn get(&self, channel: Channel) -> f64 {
        self.means.get(&channel).copied().unwrap_or(0.0)
    }

    /// Mean for `channel` rounded to two decimals.
    pub fn rounded(&self, channel: Channel) -> f64 {
        round2(self.get(channel))
    }

    /// Copy with every mean rounded to two decimals.
    pub fn to_rounded(&self) -> Self {
        Self {
            sample_count: self.sample_count,
            means: self.means.iter().map(|(&c, &v)| (c, round2(v))).collect(),
        }
    }
}

impl Readings for AggregateSnapshot {
    fn reading(&self, channel: Channel) -> Option<f64> {
        self.means.get(&channel).copied()
    }
}
