//! Dashboard controller.
//!
//! Owns the sample window, accepts feed updates and answers the read-only
//! queries a renderer needs: the latest sample, the window averages, chart
//! series, and the classification for the configured layout.
//!
//! State machine: `Loading --first accepted sample--> Ready`. Ready is
//! terminal.

use crate::config::{Config, ConfigError};
use crate::core::aggregate::AggregateSnapshot;
use crate::core::buffer::SampleBuffer;
use crate::core::channel::{Channel, Finger, Readings, SensorLayout};
use crate::core::rules::{
    assess, classify_movement, movement_rules, summarize_movement, ClinicalAssessment,
    MovementClassification, MovementRule, MovementSummary, Thresholds,
};
use crate::core::sample::{normalize, SensorSample};
use crate::feed::payload::RawPayload;
use crate::feed::subscription::FeedUpdate;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Whether any data has arrived yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    Loading,
    Ready,
}

/// Result of offering one update to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A sample was appended; `evicted` old samples fell out of the window
    Accepted { evicted: usize },
    /// The update was absent or malformed and was ignored
    Skipped,
}

impl SampleOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SampleOutcome::Accepted { .. })
    }
}

/// Classification of the latest sample under the layout's rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule_set", content = "result", rename_all = "snake_case")]
pub enum Classification {
    Movement(MovementClassification),
    Clinical(Vec<ClinicalAssessment>),
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Movement(m) => write!(f, "{m}"),
            Classification::Clinical(assessments) => {
                let parts: Vec<String> = assessments
                    .iter()
                    .map(|a| format!("{}: {} ({})", a.finger.name(), a.band, a.flex))
                    .collect();
                if parts.is_empty() {
                    write!(f, "No finger readings")
                } else {
                    write!(f, "{}", parts.join(", "))
                }
            }
        }
    }
}

/// One point of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time_label: String,
    pub value: Option<f64>,
}

/// Single-writer owner of the sample window.
pub struct DashboardController {
    layout: SensorLayout,
    thresholds: Thresholds,
    movement_rules: Vec<MovementRule>,
    timezone: Tz,
    buffer: SampleBuffer,
    state: FeedState,
}

impl DashboardController {
    /// Create a controller with default thresholds and UTC time labels.
    pub fn new(layout: SensorLayout, capacity: usize) -> Self {
        let thresholds = Thresholds::default();
        Self {
            layout,
            movement_rules: movement_rules(&thresholds.movement),
            thresholds,
            timezone: Tz::UTC,
            buffer: SampleBuffer::new(capacity),
            state: FeedState::Loading,
        }
    }

    /// Create a controller from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config.layout, config.buffer_capacity)
            .with_thresholds(config.thresholds.clone())
            .with_timezone(config.timezone()?))
    }

    /// Replace the classification thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.movement_rules = movement_rules(&thresholds.movement);
        self.thresholds = thresholds;
        self
    }

    /// Render time labels in `timezone`.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Offer a raw update received now.
    pub fn on_sample(&mut self, raw: &str) -> SampleOutcome {
        self.on_update(&FeedUpdate::new(raw))
    }

    /// Offer a raw update from the feed.
    pub fn on_update(&mut self, update: &FeedUpdate) -> SampleOutcome {
        match RawPayload::parse(&update.body) {
            Some(payload) => SampleOutcome::Accepted {
                evicted: self.on_payload(&payload, update.received_at),
            },
            None => {
                tracing::debug!(bytes = update.body.len(), "skipping absent or malformed payload");
                SampleOutcome::Skipped
            }
        }
    }

    /// Normalize and append an already-parsed payload.
    ///
    /// Returns the number of samples evicted from the window.
    pub fn on_payload(&mut self, payload: &RawPayload, received_at: DateTime<Utc>) -> usize {
        let sample = normalize(payload, self.layout, received_at, self.timezone);
        let evicted = self.buffer.append(sample);
        if evicted > 0 {
            tracing::trace!(evicted, "window full, evicted oldest samples");
        }
        if self.state == FeedState::Loading {
            self.state = FeedState::Ready;
            tracing::info!(layout = %self.layout, "first sample received, dashboard ready");
        }
        evicted
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == FeedState::Ready
    }

    pub fn layout(&self) -> SensorLayout {
        self.layout
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Read-only view of the sample window.
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// The newest sample, or `None` while loading.
    pub fn latest(&self) -> Option<&SensorSample> {
        self.buffer.latest()
    }

    /// Means of every channel of the layout over the current window.
    pub fn averages(&self) -> AggregateSnapshot {
        AggregateSnapshot::compute(&self.buffer, &self.layout.channels())
    }

    /// Time series of one channel, in arrival order, gaps kept as `None`.
    pub fn series(&self, channel: Channel) -> Vec<SeriesPoint> {
        self.buffer
            .all()
            .map(|sample| SeriesPoint {
                time_label: sample.time_label.clone(),
                value: sample.reading(channel),
            })
            .collect()
    }

    /// Movement labels for the latest sample (single-flex layout).
    pub fn current_movement(&self) -> Option<MovementClassification> {
        if self.layout != SensorLayout::SingleFlex {
            return None;
        }
        let latest = self.latest()?;
        Some(classify_movement(latest, &self.movement_rules))
    }

    /// Per-axis summary of the window averages (single-flex layout).
    pub fn movement_summary(&self) -> Option<MovementSummary> {
        if self.layout != SensorLayout::SingleFlex || self.buffer.is_empty() {
            return None;
        }
        Some(summarize_movement(&self.averages(), &self.thresholds.movement))
    }

    /// Posture band and flags for one finger (five-finger layout).
    ///
    /// `None` when there is no data yet or the latest sample has no reading
    /// for this finger.
    pub fn assess_finger(&self, finger: Finger) -> Option<ClinicalAssessment> {
        if self.layout != SensorLayout::FiveFinger {
            return None;
        }
        let latest = self.latest()?;
        let flex = latest.finger(finger)?;
        let force = latest.force.unwrap_or(0.0);
        Some(assess(finger, flex, force, &self.thresholds.clinical))
    }

    /// Assessments for every finger with a reading in the latest sample.
    pub fn assessments(&self) -> Vec<ClinicalAssessment> {
        Finger::ALL
            .iter()
            .filter_map(|&finger| self.assess_finger(finger))
            .collect()
    }

    /// Classification of the latest sample under the layout's rule set.
    pub fn classify_latest(&self) -> Option<Classification> {
        self.latest()?;
        match self.layout {
            SensorLayout::SingleFlex => self.current_movement().map(Classification::Movement),
            SensorLayout::FiveFinger => Some(Classification::Clinical(self.assessments())),
        }
    }
}
