//! Core engine of the hand rehabilitation monitor.
//!
//! This module contains:
//! - Sample normalization and the fixed-capacity sample window
//! - Per-channel aggregation over the window
//! - Threshold classification rules for both glove layouts
//! - The dashboard controller tying them together
//! - Session report export

pub mod aggregate;
pub mod buffer;
pub mod channel;
pub mod controller;
pub mod report;
pub mod rules;
pub mod sample;

// Re-export commonly used types
pub use aggregate::{mean, round2, AggregateSnapshot};
pub use buffer::{SampleBuffer, DEFAULT_CAPACITY};
pub use channel::{Channel, ChartGroup, Finger, Readings, SensorLayout, FINGER_COUNT};
pub use controller::{Classification, DashboardController, FeedState, SampleOutcome, SeriesPoint};
pub use report::{ReportBuilder, SessionReport, PRODUCER_NAME, REPORT_VERSION};
pub use rules::{
    assess, classify_movement, classify_posture, clinical_flags, movement_rules, posture_bands,
    summarize_movement, ClinicalAssessment, ClinicalFlags, ClinicalThresholds, Movement,
    MovementClassification, MovementSummary, MovementThresholds, PostureBand, Thresholds,
    NEUTRAL_POSITION,
};
pub use sample::{normalize, Axes, FlexReadings, SensorSample};
