//! Threshold classification rules.
//!
//! Two independent rule sets are supported, one per glove layout:
//!
//! - **Movement labels** (single flex + IMU): an ordered table of
//!   `(channel, comparison, movement)` rules, all evaluated, every rule that
//!   holds contributes its label.
//! - **Posture bands + clinical flags** (five fingers): an ordered table of
//!   contiguous flex ranges, first match wins, plus four independent flags.
//!
//! All thresholds live in [`Thresholds`] so they can be recalibrated from the
//! config file.

use crate::core::aggregate::AggregateSnapshot;
use crate::core::channel::{Channel, Finger, Readings};
use serde::{Deserialize, Serialize};

/// Label reported when no movement rule fires.
pub const NEUTRAL_POSITION: &str = "Neutral Position";

pub const AROM_DESCRIPTION: &str = "Active Range of Motion (Patient-initiated movement)";
pub const PROM_DESCRIPTION: &str = "Passive Range of Motion (Therapist-assisted movement)";
pub const GRASP_DESCRIPTION: &str = "Grip strength (Force > 2N indicates functional grasp)";
pub const FINE_MOTOR_DESCRIPTION: &str = "Precision control (Mid-range flexion with stability)";

// ============================================================================
// Thresholds
// ============================================================================

/// Thresholds for the movement-label rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementThresholds {
    /// Flex at or above this code is flexion
    pub flexion_min: f64,
    /// Flex at or below this code is extension
    pub extension_max: f64,
    pub ulnar_deviation_above: f64,
    pub radial_deviation_below: f64,
    pub dorsiflexion_above: f64,
    pub palmar_flexion_below: f64,
    pub supination_above: f64,
    pub pronation_below: f64,
    pub external_rotation_above: f64,
    pub internal_rotation_below: f64,
}

impl Default for MovementThresholds {
    fn default() -> Self {
        Self {
            flexion_min: 650.0,
            extension_max: 300.0,
            ulnar_deviation_above: 0.8,
            radial_deviation_below: -0.5,
            dorsiflexion_above: 0.8,
            palmar_flexion_below: -0.5,
            supination_above: 0.8,
            pronation_below: -0.5,
            external_rotation_above: 0.5,
            internal_rotation_below: -0.5,
        }
    }
}

/// Thresholds for posture bands and clinical flags.
///
/// AROM compares against `neutral_max` while PROM compares against
/// `mid_range_min`, so a flex of exactly `mid_range_min` counts as AROM but
/// not PROM. This mirrors the clinical sheet the rules were taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalThresholds {
    /// Upper bound (inclusive) of the neutral band
    pub neutral_max: i32,
    /// Lower bound (inclusive) of the mid-range band
    pub mid_range_min: i32,
    /// Upper bound (inclusive) of the mid-range band
    pub mid_range_max: i32,
    /// Force in newtons that must be exceeded for an adequate grasp
    pub grasp_force_above: f64,
}

impl Default for ClinicalThresholds {
    fn default() -> Self {
        Self {
            neutral_max: 112,
            mid_range_min: 113,
            mid_range_max: 225,
            grasp_force_above: 2.0,
        }
    }
}

impl ClinicalThresholds {
    /// Check that the bands are contiguous and non-overlapping.
    pub fn validate(&self) -> Result<(), String> {
        if self.mid_range_min != self.neutral_max.saturating_add(1) {
            return Err(format!(
                "posture bands are not contiguous: neutral ends at {}, mid-range starts at {}",
                self.neutral_max, self.mid_range_min
            ));
        }
        if self.mid_range_max < self.mid_range_min {
            return Err(format!(
                "mid-range band is empty: {}..={}",
                self.mid_range_min, self.mid_range_max
            ));
        }
        Ok(())
    }
}

/// All classification thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub movement: MovementThresholds,
    pub clinical: ClinicalThresholds,
}

// ============================================================================
// Movement labels
// ============================================================================

/// A discrete hand/wrist movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Flexion,
    Extension,
    UlnarDeviation,
    RadialDeviation,
    Dorsiflexion,
    PalmarFlexion,
    Supination,
    Pronation,
    ExternalRotation,
    InternalRotation,
}

impl Movement {
    pub fn label(&self) -> &'static str {
        match self {
            Movement::Flexion => "Flexion",
            Movement::Extension => "Extension",
            Movement::UlnarDeviation => "Ulnar Deviation",
            Movement::RadialDeviation => "Radial Deviation",
            Movement::Dorsiflexion => "Dorsiflexion",
            Movement::PalmarFlexion => "Palmar Flexion",
            Movement::Supination => "Supination",
            Movement::Pronation => "Pronation",
            Movement::ExternalRotation => "External Rotation",
            Movement::InternalRotation => "Internal Rotation",
        }
    }
}

impl std::fmt::Display for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Comparison of a reading against a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    AtLeast(f64),
    AtMost(f64),
    Above(f64),
    Below(f64),
}

impl Comparison {
    pub fn holds(&self, value: f64) -> bool {
        match *self {
            Comparison::AtLeast(t) => value >= t,
            Comparison::AtMost(t) => value <= t,
            Comparison::Above(t) => value > t,
            Comparison::Below(t) => value < t,
        }
    }
}

/// One row of the movement table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementRule {
    pub channel: Channel,
    pub comparison: Comparison,
    pub movement: Movement,
}

impl MovementRule {
    /// Whether the rule fires; a channel without a reading never fires.
    pub fn fires<R: Readings + ?Sized>(&self, readings: &R) -> bool {
        readings
            .reading(self.channel)
            .map(|v| self.comparison.holds(v))
            .unwrap_or(false)
    }
}

/// The movement table, in reporting order.
pub fn movement_rules(t: &MovementThresholds) -> Vec<MovementRule> {
    use Comparison::*;
    let rule = |channel, comparison, movement| MovementRule {
        channel,
        comparison,
        movement,
    };
    vec![
        rule(Channel::Flex, AtLeast(t.flexion_min), Movement::Flexion),
        rule(Channel::Flex, AtMost(t.extension_max), Movement::Extension),
        rule(Channel::AccelX, Above(t.ulnar_deviation_above), Movement::UlnarDeviation),
        rule(Channel::AccelX, Below(t.radial_deviation_below), Movement::RadialDeviation),
        rule(Channel::AccelY, Above(t.dorsiflexion_above), Movement::Dorsiflexion),
        rule(Channel::AccelY, Below(t.palmar_flexion_below), Movement::PalmarFlexion),
        rule(Channel::AccelZ, Above(t.supination_above), Movement::Supination),
        rule(Channel::AccelZ, Below(t.pronation_below), Movement::Pronation),
        rule(Channel::GyroX, Above(t.external_rotation_above), Movement::ExternalRotation),
        rule(Channel::GyroX, Below(t.internal_rotation_below), Movement::InternalRotation),
    ]
}

/// Every movement whose rule fired, in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementClassification {
    pub movements: Vec<Movement>,
}

impl MovementClassification {
    pub fn is_neutral(&self) -> bool {
        self.movements.is_empty()
    }

    /// Labels joined with `", "`, or [`NEUTRAL_POSITION`].
    pub fn label(&self) -> String {
        if self.movements.is_empty() {
            return NEUTRAL_POSITION.to_string();
        }
        self.movements
            .iter()
            .map(Movement::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for MovementClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Evaluate every rule independently.
pub fn classify_movement<R: Readings + ?Sized>(
    readings: &R,
    rules: &[MovementRule],
) -> MovementClassification {
    MovementClassification {
        movements: rules
            .iter()
            .filter(|rule| rule.fires(readings))
            .map(|rule| rule.movement)
            .collect(),
    }
}

// ============================================================================
// Averaged movement summary
// ============================================================================

/// One slot of the averaged summary: at most one label per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisRule {
    channel: Channel,
    above: (f64, Movement),
    below: (f64, Movement),
}

impl AxisRule {
    fn evaluate<R: Readings + ?Sized>(&self, readings: &R) -> Option<Movement> {
        let value = readings.reading(self.channel)?;
        if value > self.above.0 {
            Some(self.above.1)
        } else if value < self.below.0 {
            Some(self.below.1)
        } else {
            None
        }
    }
}

/// Summary of the window averages, one label per axis.
///
/// Unlike [`classify_movement`], every comparison here is strict and the
/// two directions of an axis are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementSummary {
    /// `None` means neutral flex
    pub flexion: Option<Movement>,
    pub deviation: Option<Movement>,
    pub wrist: Option<Movement>,
    pub forearm: Option<Movement>,
    pub rotation: Option<Movement>,
}

impl MovementSummary {
    /// Five slots joined with `" | "`; neutral flex reads `Neutral`.
    pub fn label(&self) -> String {
        let flexion = self.flexion.map(|m| m.label()).unwrap_or("Neutral");
        let slots = [
            flexion,
            self.deviation.map(|m| m.label()).unwrap_or(""),
            self.wrist.map(|m| m.label()).unwrap_or(""),
            self.forearm.map(|m| m.label()).unwrap_or(""),
            self.rotation.map(|m| m.label()).unwrap_or(""),
        ];
        slots.join(" | ")
    }
}

impl std::fmt::Display for MovementSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Summarize the averages of a window.
pub fn summarize_movement(averages: &AggregateSnapshot, t: &MovementThresholds) -> MovementSummary {
    let axis = |channel, above, below| AxisRule {
        channel,
        above,
        below,
    };
    let flexion = axis(
        Channel::Flex,
        (t.flexion_min, Movement::Flexion),
        (t.extension_max, Movement::Extension),
    );
    let deviation = axis(
        Channel::AccelX,
        (t.ulnar_deviation_above, Movement::UlnarDeviation),
        (t.radial_deviation_below, Movement::RadialDeviation),
    );
    let wrist = axis(
        Channel::AccelY,
        (t.dorsiflexion_above, Movement::Dorsiflexion),
        (t.palmar_flexion_below, Movement::PalmarFlexion),
    );
    let forearm = axis(
        Channel::AccelZ,
        (t.supination_above, Movement::Supination),
        (t.pronation_below, Movement::Pronation),
    );
    let rotation = axis(
        Channel::GyroX,
        (t.external_rotation_above, Movement::ExternalRotation),
        (t.internal_rotation_below, Movement::InternalRotation),
    );

    MovementSummary {
        flexion: flexion.evaluate(averages),
        deviation: deviation.evaluate(averages),
        wrist: wrist.evaluate(averages),
        forearm: forearm.evaluate(averages),
        rotation: rotation.evaluate(averages),
    }
}

// ============================================================================
// Posture bands and clinical flags
// ============================================================================

/// Flexion posture band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureBand {
    Neutral,
    MidRange,
    Full,
}

impl PostureBand {
    pub fn label(&self) -> &'static str {
        match self {
            PostureBand::Neutral => "Neutral Posture",
            PostureBand::MidRange => "Mid-range Flexion",
            PostureBand::Full => "Full Flexion",
        }
    }
}

impl std::fmt::Display for PostureBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An inclusive flex range mapped to a band; open ends are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRange {
    pub band: PostureBand,
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl BandRange {
    pub fn contains(&self, flex: i32) -> bool {
        self.min.map_or(true, |min| flex >= min) && self.max.map_or(true, |max| flex <= max)
    }
}

/// The band table, ascending.
pub fn posture_bands(t: &ClinicalThresholds) -> [BandRange; 3] {
    [
        BandRange {
            band: PostureBand::Neutral,
            min: None,
            max: Some(t.neutral_max),
        },
        BandRange {
            band: PostureBand::MidRange,
            min: Some(t.mid_range_min),
            max: Some(t.mid_range_max),
        },
        BandRange {
            band: PostureBand::Full,
            min: Some(t.mid_range_max.saturating_add(1)),
            max: None,
        },
    ]
}

/// First matching band; the last band catches anything unmatched.
pub fn classify_posture(flex: i32, bands: &[BandRange]) -> PostureBand {
    bands
        .iter()
        .find(|range| range.contains(flex))
        .or_else(|| bands.last())
        .map(|range| range.band)
        .unwrap_or(PostureBand::Full)
}

/// Independent clinical flags for one finger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalFlags {
    /// Active range of motion achieved
    pub arom: bool,
    /// Passive range of motion achieved
    pub prom: bool,
    /// Grasp force adequate
    pub grasp_adequate: bool,
    /// Fine motor control present
    pub fine_motor: bool,
}

pub fn clinical_flags(flex: i32, force: f64, t: &ClinicalThresholds) -> ClinicalFlags {
    ClinicalFlags {
        arom: flex > t.neutral_max,
        prom: flex > t.mid_range_min,
        grasp_adequate: force > t.grasp_force_above,
        fine_motor: flex >= t.mid_range_min && flex <= t.mid_range_max,
    }
}

/// Posture band and flags for one finger at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalAssessment {
    pub finger: Finger,
    pub flex: i32,
    pub force: f64,
    pub band: PostureBand,
    pub flags: ClinicalFlags,
}

pub fn assess(finger: Finger, flex: i32, force: f64, t: &ClinicalThresholds) -> ClinicalAssessment {
    ClinicalAssessment {
        finger,
        flex,
        force,
        band: classify_posture(flex, &posture_bands(t)),
        flags: clinical_flags(flex, force, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<Channel, f64>);

    impl Readings for Fixed {
        fn reading(&self, channel: Channel) -> Option<f64> {
            self.0.get(&channel).copied()
        }
    }

    fn readings(flex: f64, ax: f64, ay: f64, az: f64, gx: f64) -> Fixed {
        Fixed(HashMap::from([
            (Channel::Flex, flex),
            (Channel::AccelX, ax),
            (Channel::AccelY, ay),
            (Channel::AccelZ, az),
            (Channel::GyroX, gx),
        ]))
    }

    fn classify(r: &Fixed) -> String {
        classify_movement(r, &movement_rules(&MovementThresholds::default())).label()
    }

    #[test]
    fn test_flexion_with_ulnar_deviation() {
        let result = classify(&readings(700.0, 0.9, 0.0, 0.0, 0.0));
        assert_eq!(result, "Flexion, Ulnar Deviation");
    }

    #[test]
    fn test_neutral_position() {
        assert_eq!(classify(&readings(400.0, 0.0, 0.0, 0.0, 0.0)), NEUTRAL_POSITION);
        assert_eq!(classify(&readings(400.0, 0.01, -0.02, 0.03, -0.01)), NEUTRAL_POSITION);
    }

    #[test]
    fn test_flex_bounds_are_inclusive() {
        assert_eq!(classify(&readings(650.0, 0.0, 0.0, 0.0, 0.0)), "Flexion");
        assert_eq!(classify(&readings(649.0, 0.0, 0.0, 0.0, 0.0)), NEUTRAL_POSITION);
        assert_eq!(classify(&readings(300.0, 0.0, 0.0, 0.0, 0.0)), "Extension");
        assert_eq!(classify(&readings(301.0, 0.0, 0.0, 0.0, 0.0)), NEUTRAL_POSITION);
    }

    #[test]
    fn test_imu_bounds_are_strict() {
        assert_eq!(classify(&readings(400.0, 0.8, 0.0, 0.0, 0.0)), NEUTRAL_POSITION);
        assert_eq!(classify(&readings(400.0, -0.5, 0.0, 0.0, 0.0)), NEUTRAL_POSITION);
        assert_eq!(classify(&readings(400.0, 0.0, 0.0, 0.0, 0.5)), NEUTRAL_POSITION);
        assert_eq!(classify(&readings(400.0, 0.0, 0.0, 0.0, 0.51)), "External Rotation");
    }

    #[test]
    fn test_all_axes_fire_in_table_order() {
        let result = classify(&readings(100.0, -0.6, 0.9, -0.6, -0.6));
        assert_eq!(
            result,
            "Extension, Radial Deviation, Dorsiflexion, Pronation, Internal Rotation"
        );
    }

    #[test]
    fn test_missing_channels_never_fire() {
        let only_accel = Fixed(HashMap::from([(Channel::AccelZ, 1.2)]));
        assert_eq!(classify(&only_accel), "Supination");
        assert_eq!(classify(&Fixed(HashMap::new())), NEUTRAL_POSITION);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = MovementThresholds {
            flexion_min: 500.0,
            ..MovementThresholds::default()
        };
        let result = classify_movement(&readings(550.0, 0.0, 0.0, 0.0, 0.0), &movement_rules(&t));
        assert_eq!(result.movements, vec![Movement::Flexion]);
    }

    #[test]
    fn test_posture_band_boundaries() {
        let bands = posture_bands(&ClinicalThresholds::default());
        assert_eq!(classify_posture(0, &bands), PostureBand::Neutral);
        assert_eq!(classify_posture(112, &bands), PostureBand::Neutral);
        assert_eq!(classify_posture(113, &bands), PostureBand::MidRange);
        assert_eq!(classify_posture(225, &bands), PostureBand::MidRange);
        assert_eq!(classify_posture(226, &bands), PostureBand::Full);
        assert_eq!(classify_posture(10_000, &bands), PostureBand::Full);
        assert_eq!(classify_posture(-5, &bands), PostureBand::Neutral);
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(PostureBand::Neutral.label(), "Neutral Posture");
        assert_eq!(PostureBand::MidRange.label(), "Mid-range Flexion");
        assert_eq!(PostureBand::Full.label(), "Full Flexion");
    }

    #[test]
    fn test_arom_and_prom_thresholds() {
        let t = ClinicalThresholds::default();
        assert!(!clinical_flags(112, 0.0, &t).arom);
        assert!(clinical_flags(113, 0.0, &t).arom);
        // PROM is strictly above the mid-range lower bound
        assert!(!clinical_flags(113, 0.0, &t).prom);
        assert!(clinical_flags(114, 0.0, &t).prom);
    }

    #[test]
    fn test_fine_motor_range() {
        let t = ClinicalThresholds::default();
        assert!(clinical_flags(113, 0.0, &t).fine_motor);
        assert!(clinical_flags(225, 0.0, &t).fine_motor);
        assert!(!clinical_flags(226, 0.0, &t).fine_motor);
        assert!(!clinical_flags(112, 0.0, &t).fine_motor);
    }

    #[test]
    fn test_grasp_is_strict() {
        let t = ClinicalThresholds::default();
        assert!(!clinical_flags(0, 2.0, &t).grasp_adequate);
        assert!(clinical_flags(0, 2.01, &t).grasp_adequate);
    }

    #[test]
    fn test_assess_combines_band_and_flags() {
        let assessment = assess(Finger::Index, 150, 3.0, &ClinicalThresholds::default());
        assert_eq!(assessment.finger, Finger::Index);
        assert_eq!(assessment.band, PostureBand::MidRange);
        assert!(assessment.flags.arom);
        assert!(assessment.flags.prom);
        assert!(assessment.flags.grasp_adequate);
        assert!(assessment.flags.fine_motor);
    }

    #[test]
    fn test_clinical_threshold_validation() {
        assert!(ClinicalThresholds::default().validate().is_ok());

        let gap = ClinicalThresholds {
            mid_range_min: 120,
            ..ClinicalThresholds::default()
        };
        assert!(gap.validate().is_err());

        let empty = ClinicalThresholds {
            mid_range_max: 100,
            ..ClinicalThresholds::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_summary_uses_strict_comparisons() {
        let t = MovementThresholds::default();
        let mut averages = AggregateSnapshot::default();
        averages.means.insert(Channel::Flex, 650.0);
        averages.means.insert(Channel::AccelX, 0.9);
        averages.means.insert(Channel::AccelY, -0.5);
        averages.means.insert(Channel::AccelZ, -0.7);
        averages.means.insert(Channel::GyroX, 0.0);

        let summary = summarize_movement(&averages, &t);
        assert_eq!(summary.flexion, None);
        assert_eq!(summary.deviation, Some(Movement::UlnarDeviation));
        assert_eq!(summary.wrist, None);
        assert_eq!(summary.forearm, Some(Movement::Pronation));
        assert_eq!(summary.rotation, None);
        assert_eq!(summary.label(), "Neutral | Ulnar Deviation |  | Pronation | ");
    }

    #[test]
    fn test_summary_flexion_and_extension() {
        let t = MovementThresholds::default();
        let mut averages = AggregateSnapshot::default();
        averages.means.insert(Channel::Flex, 651.0);
        assert_eq!(summarize_movement(&averages, &t).flexion, Some(Movement::Flexion));
        averages.means.insert(Channel::Flex, 299.5);
        assert_eq!(summarize_movement(&averages, &t).flexion, Some(Movement::Extension));
        averages.means.insert(Channel::Flex, 300.0);
        assert_eq!(summarize_movement(&averages, &t).flexion, None);
    }
}
