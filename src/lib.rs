//! Hand Rehab Monitor - sliding-window movement classification for a
//! wearable hand rehabilitation glove.
//!
//! The glove pushes snapshots of its flex, force and inertial sensors. This
//! library keeps a bounded window of recent samples, averages it per channel
//! and maps readings to movement labels and simple clinical flags.
//!
//! # Scope
//!
//! - **Threshold rules only**: every label is a comparison against a named
//!   threshold that can be recalibrated in the config file
//! - **Bounded memory**: the window holds the most recent samples and evicts
//!   the oldest
//! - **No fatal paths**: absent or malformed updates are skipped, empty
//!   windows average to zero
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Hand Rehab Monitor                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │    Feed     │──▶│  Normalize  │──▶│   Sample    │       │
//! │  │(subscribe)  │   │  (sample)   │   │   Buffer    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Audit     │   │   Rules     │◀──│ Aggregator  │       │
//! │  │    Log      │   │ (A and B)   │   │  (means)    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use hand_rehab_monitor::core::{DashboardController, SensorLayout};
//!
//! let mut controller = DashboardController::new(SensorLayout::SingleFlex, 31);
//! controller.on_sample(r#"{"FlexSensor": {"RawValue": 700}, "MPU6050": {"Acceleration_X": 0.9}}"#);
//!
//! let movement = controller.current_movement().unwrap();
//! assert_eq!(movement.label(), "Flexion, Ulnar Deviation");
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod feed;

// Re-export key types at crate root for convenience
pub use audit::{AuditLog, AuditStats, SharedAuditLog};
pub use config::{Config, ConfigError};
pub use core::{
    AggregateSnapshot, Channel, Classification, DashboardController, Finger, ReportBuilder,
    SampleBuffer, SensorLayout, SensorSample, SessionReport, Thresholds,
};
pub use feed::{FeedError, FeedSource, FeedUpdate, RawPayload, ReplaySource, Subscription};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Disclaimer that can be displayed to users.
pub const DISCLAIMER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              HAND REHAB MONITOR - USAGE DISCLAIMER               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This tool visualizes readings from a hand rehabilitation        ║
║  glove and labels them with fixed threshold rules.               ║
║                                                                  ║
║  ✓ WHAT IT REPORTS:                                              ║
║    • Movement labels from flex and inertial thresholds           ║
║    • Posture bands and AROM/PROM/grasp/fine-motor flags          ║
║    • Averages over the most recent samples                       ║
║                                                                  ║
║  ✗ WHAT IT IS NOT:                                               ║
║    • A medical device                                            ║
║    • A diagnosis or treatment recommendation                     ║
║    • Calibrated to any individual patient                        ║
║                                                                  ║
║  Sensor timing and synchronization are not guaranteed.           ║
║  Thresholds can be adjusted in the config file:                  ║
║    hand-rehab config                                             ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disclaimer_contents() {
        assert!(DISCLAIMER.contains("DISCLAIMER"));
        assert!(DISCLAIMER.contains("WHAT IT IS NOT"));
        assert!(DISCLAIMER.contains("medical device"));
    }
}
