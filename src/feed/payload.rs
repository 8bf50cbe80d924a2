//! Raw payload types for the realtime sensor feed.
//!
//! The feed pushes one nested JSON object per update. Every group and every
//! field may be absent, and a field of the wrong type is treated as absent
//! instead of rejecting the whole update.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// One reading pair as published by the glove firmware.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChannel {
    #[serde(rename = "RawValue", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<f64>,
    #[serde(rename = "Voltage", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
}

/// The `FlexSensor` group.
///
/// Single-sensor gloves publish `RawValue`/`Voltage` directly on the group,
/// five-finger gloves publish one `FlexN` sub-group per finger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFlexGroup {
    #[serde(rename = "RawValue", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<f64>,
    #[serde(rename = "Voltage", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(rename = "Flex1", default, deserialize_with = "lenient_group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex1: Option<RawChannel>,
    #[serde(rename = "Flex2", default, deserialize_with = "lenient_group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex2: Option<RawChannel>,
    #[serde(rename = "Flex3", default, deserialize_with = "lenient_group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex3: Option<RawChannel>,
    #[serde(rename = "Flex4", default, deserialize_with = "lenient_group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex4: Option<RawChannel>,
    #[serde(rename = "Flex5", default, deserialize_with = "lenient_group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex5: Option<RawChannel>,
}

impl RawFlexGroup {
    /// Per-finger sub-groups, thumb first.
    pub fn fingers(&self) -> [Option<&RawChannel>; 5] {
        [
            self.flex1.as_ref(),
            self.flex2.as_ref(),
            self.flex3.as_ref(),
            self.flex4.as_ref(),
            self.flex5.as_ref(),
        ]
    }
}

/// The `MPU6050` group (accelerometer + gyroscope).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawImu {
    #[serde(rename = "Acceleration_X", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_x: Option<f64>,
    #[serde(rename = "Acceleration_Y", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_y: Option<f64>,
    #[serde(rename = "Acceleration_Z", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_z: Option<f64>,
    #[serde(rename = "Gyro_X", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gyro_x: Option<f64>,
    #[serde(rename = "Gyro_Y", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gyro_y: Option<f64>,
    #[serde(rename = "Gyro_Z", default, deserialize_with = "lenient_f64")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gyro_z: Option<f64>,
}

/// A complete update from the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    #[serde(rename = "FlexSensor", default, deserialize_with = "lenient_group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex_sensor: Option<RawFlexGroup>,
    #[serde(rename = "ForceSensor", default, deserialize_with = "lenient_group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_sensor: Option<RawChannel>,
    #[serde(rename = "MPU6050", default, deserialize_with = "lenient_group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpu6050: Option<RawImu>,
}

impl RawPayload {
    /// Parse one feed update from its JSON text.
    ///
    /// Returns `None` for anything that is not a usable update: invalid JSON,
    /// `null`, non-objects, and objects carrying none of the sensor groups.
    pub fn parse(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        Self::from_value(&value)
    }

    /// Interpret an already-decoded JSON value as a feed update.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let payload: RawPayload = serde_json::from_value(value.clone()).ok()?;
        if payload.is_empty() {
            return None;
        }
        Some(payload)
    }

    /// True when no sensor group is present.
    pub fn is_empty(&self) -> bool {
        self.flex_sensor.is_none() && self.force_sensor.is_none() && self.mpu6050.is_none()
    }
}

/// Accept any JSON number, treat everything else as missing.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

/// Accept a nested group if it decodes, treat anything else as missing.
fn lenient_group<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_flex_payload() {
        let payload = RawPayload::parse(
            r#"{
                "FlexSensor": {"RawValue": 712, "Voltage": 2.31},
                "MPU6050": {"Acceleration_X": 0.9, "Acceleration_Y": 0.1,
                            "Acceleration_Z": -0.2, "Gyro_X": 0.0,
                            "Gyro_Y": 0.4, "Gyro_Z": -0.1}
            }"#,
        )
        .unwrap();

        let flex = payload.flex_sensor.unwrap();
        assert_eq!(flex.raw_value, Some(712.0));
        assert_eq!(flex.voltage, Some(2.31));
        let imu = payload.mpu6050.unwrap();
        assert_eq!(imu.accel_x, Some(0.9));
        assert_eq!(imu.gyro_z, Some(-0.1));
        assert!(payload.force_sensor.is_none());
    }

    #[test]
    fn test_parse_five_finger_payload() {
        let payload = RawPayload::parse(
            r#"{
                "FlexSensor": {"Flex1": {"RawValue": 100}, "Flex3": {"RawValue": 200}},
                "ForceSensor": {"RawValue": 2.5}
            }"#,
        )
        .unwrap();

        let flex = payload.flex_sensor.unwrap();
        let fingers = flex.fingers();
        assert_eq!(fingers[0].and_then(|f| f.raw_value), Some(100.0));
        assert!(fingers[1].is_none());
        assert_eq!(fingers[2].and_then(|f| f.raw_value), Some(200.0));
        assert_eq!(payload.force_sensor.unwrap().raw_value, Some(2.5));
    }

    #[test]
    fn test_rejects_absent_or_malformed() {
        assert!(RawPayload::parse("not json").is_none());
        assert!(RawPayload::parse("null").is_none());
        assert!(RawPayload::parse("[1, 2, 3]").is_none());
        assert!(RawPayload::parse("42").is_none());
        assert!(RawPayload::parse("{}").is_none());
        assert!(RawPayload::parse(r#"{"Battery": 90}"#).is_none());
    }

    #[test]
    fn test_wrong_types_become_missing() {
        let payload = RawPayload::parse(
            r#"{
                "FlexSensor": {"RawValue": "high", "Voltage": 1.2},
                "MPU6050": "offline"
            }"#,
        )
        .unwrap();

        let flex = payload.flex_sensor.unwrap();
        assert_eq!(flex.raw_value, None);
        assert_eq!(flex.voltage, Some(1.2));
        assert!(payload.mpu6050.is_none());
    }
}
