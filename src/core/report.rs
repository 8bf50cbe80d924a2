//! Session report export.
//!
//! A report captures what the dashboard shows at one point in time: window
//! averages, the current classification and the averaged movement summary.
//! Reports are written as JSON at the end of a monitoring session.

use crate::core::aggregate::AggregateSnapshot;
use crate::core::channel::SensorLayout;
use crate::core::controller::DashboardController;
use crate::core::rules::ClinicalAssessment;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "hand-rehab-monitor";

/// Disclaimer attached to every report.
pub const REPORT_DISCLAIMER: &str =
    "Threshold-based visualization aid. Not a medical device; not for diagnosis.";

/// Producer metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
    /// Host the dashboard ran on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Time span covered by the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWindow {
    /// Oldest sample in the window (RFC3339)
    pub start: String,
    /// Newest sample in the window (RFC3339)
    pub end: String,
}

/// Snapshot of the dashboard for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    /// When this report was computed (RFC3339)
    pub generated_at_utc: String,
    pub producer: ReportProducer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub layout: SensorLayout,
    /// Samples currently in the window
    pub sample_count: usize,
    /// `None` while the dashboard is still loading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<ReportWindow>,
    /// Window means, rounded to two decimals
    pub averages: AggregateSnapshot,
    /// Movement labels of the latest sample (single-flex layout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_movement: Option<String>,
    /// Averaged movement summary (single-flex layout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_summary: Option<String>,
    /// Per-finger assessments of the latest sample (five-finger layout)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub assessments: Vec<ClinicalAssessment>,
    pub disclaimer: String,
}

/// Builder for session reports.
pub struct ReportBuilder {
    instance_id: Uuid,
    host: Option<String>,
    session_id: Option<String>,
}

impl ReportBuilder {
    /// Create a builder with a fresh instance ID.
    pub fn new() -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok());
        Self {
            instance_id: Uuid::new_v4(),
            host,
            session_id: None,
        }
    }

    /// Set the session ID for generated reports.
    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build a report from the controller's current state.
    pub fn build(&self, controller: &DashboardController) -> SessionReport {
        let buffer = controller.buffer();
        let window = match (buffer.oldest(), buffer.latest()) {
            (Some(first), Some(last)) => Some(ReportWindow {
                start: first.received_at.to_rfc3339(),
                end: last.received_at.to_rfc3339(),
            }),
            _ => None,
        };

        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            generated_at_utc: Utc::now().to_rfc3339(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instance_id: self.instance_id.to_string(),
                host: self.host.clone(),
            },
            session_id: self.session_id.clone(),
            layout: controller.layout(),
            sample_count: buffer.len(),
            window,
            averages: controller.averages().to_rounded(),
            latest_movement: controller.current_movement().map(|m| m.label()),
            movement_summary: controller.movement_summary().map(|s| s.label()),
            assessments: controller.assessments(),
            disclaimer: REPORT_DISCLAIMER.to_string(),
        }
    }

    /// Build and serialize a report to JSON.
    pub fn build_json(&self, controller: &DashboardController) -> String {
        let report = self.build(controller);
        serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
            tracing::warn!("could not serialize session report: {e}");
            "{}".to_string()
        })
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channel::{Channel, Finger};

    #[test]
    fn test_report_builder_instance_id() {
        let builder1 = ReportBuilder::new();
        let builder2 = ReportBuilder::new();
        assert_ne!(builder1.instance_id(), builder2.instance_id());
    }

    #[test]
    fn test_build_json_is_never_the_fallback() {
        let controller = DashboardController::new(SensorLayout::FiveFinger, 31);
        let json = ReportBuilder::new().build_json(&controller);

        assert_ne!(json, "{}");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report_version"], REPORT_VERSION);
        assert_eq!(value["sample_count"], 0);
    }

    #[test]
    fn test_empty_report() {
        let controller = DashboardController::new(SensorLayout::SingleFlex, 31);
        let report = ReportBuilder::new().build(&controller);

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.sample_count, 0);
        assert!(report.window.is_none());
        assert!(report.latest_movement.is_none());
        assert!(report.movement_summary.is_none());
        assert_eq!(report.averages.get(Channel::Flex), 0.0);
    }

    #[test]
    fn test_single_flex_report() {
        let mut controller = DashboardController::new(SensorLayout::SingleFlex, 31);
        controller.on_sample(r#"{"FlexSensor": {"RawValue": 100, "Voltage": 1.1}}"#);
        controller.on_sample(r#"{"FlexSensor": {"RawValue": 200, "Voltage": 1.3}}"#);

        let report = ReportBuilder::new()
            .with_session_id("SESS-1".to_string())
            .build(&controller);

        assert_eq!(report.sample_count, 2);
        assert!(report.window.is_some());
        assert_eq!(report.averages.get(Channel::Flex), 150.0);
        assert_eq!(report.averages.get(Channel::Voltage), 1.2);
        assert_eq!(report.latest_movement.as_deref(), Some("Extension"));
        assert_eq!(
            report.movement_summary.as_deref(),
            Some("Extension |  |  |  | ")
        );
        assert!(report.assessments.is_empty());
        assert_eq!(report.session_id.as_deref(), Some("SESS-1"));
    }

    #[test]
    fn test_five_finger_report_json() {
        let mut controller = DashboardController::new(SensorLayout::FiveFinger, 31);
        controller.on_sample(r#"{"FlexSensor": {"Flex1": {"RawValue": 120}}, "ForceSensor": {"RawValue": 3}}"#);

        let builder = ReportBuilder::new();
        let report = builder.build(&controller);
        assert_eq!(report.assessments.len(), 1);
        assert_eq!(report.assessments[0].finger, Finger::Thumb);
        assert!(report.latest_movement.is_none());

        let json = builder.build_json(&controller);
        assert!(json.contains("report_version"));
        assert!(json.contains("five_finger"));
        assert!(json.contains("assessments"));
        assert!(json.contains("disclaimer"));
        assert!(!json.contains("latest_movement"));
    }
}
