//! Normalized sensor samples.
//!
//! [`normalize`] is the single place where a raw feed update becomes a
//! [`SensorSample`], and therefore the single place where a missing channel
//! is either kept as `None` or defaulted to zero:
//!
//! | Layout        | Flex  | Voltage | Force | IMU   |
//! |---------------|-------|---------|-------|-------|
//! | `SingleFlex`  | None  | None    | None  | None  |
//! | `FiveFinger`  | None  | n/a     | 0.0   | 0.0   |
//!
//! Zero-defaulted channels cannot be told apart from genuine zero readings
//! once normalized, so the aggregator averages them as real values.

use crate::core::channel::{Channel, Finger, Readings, SensorLayout, FINGER_COUNT};
use crate::feed::payload::{RawChannel, RawPayload};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Display format for sample time labels.
pub const TIME_LABEL_FORMAT: &str = "%H:%M:%S";

/// Three-axis reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Axes {
    fn zero_filled(self) -> Self {
        Self {
            x: Some(self.x.unwrap_or(0.0)),
            y: Some(self.y.unwrap_or(0.0)),
            z: Some(self.z.unwrap_or(0.0)),
        }
    }
}

/// Flex readings as raw integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexReadings {
    Single(Option<i32>),
    Fingers([Option<i32>; FINGER_COUNT]),
}

/// One snapshot of every channel, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// When the update was received
    pub received_at: DateTime<Utc>,
    /// Time-of-day label for charts
    pub time_label: String,
    pub flex: FlexReadings,
    /// Flex sensor voltage (single-flex glove only)
    pub voltage: Option<f64>,
    /// Force in newtons
    pub force: Option<f64>,
    pub accel: Axes,
    pub gyro: Axes,
}

impl SensorSample {
    /// The single flex reading, if this sample came from a single-flex glove.
    pub fn flex(&self) -> Option<i32> {
        match self.flex {
            FlexReadings::Single(value) => value,
            FlexReadings::Fingers(_) => None,
        }
    }

    /// A finger's flex reading, if this sample came from a five-finger glove.
    pub fn finger(&self, finger: Finger) -> Option<i32> {
        match self.flex {
            FlexReadings::Single(_) => None,
            FlexReadings::Fingers(values) => values[finger.index()],
        }
    }
}

impl Readings for SensorSample {
    fn reading(&self, channel: Channel) -> Option<f64> {
        let finger = |f: Finger| self.finger(f).map(f64::from);
        match channel {
            Channel::Flex => self.flex().map(f64::from),
            Channel::Flex1 => finger(Finger::Thumb),
            Channel::Flex2 => finger(Finger::Index),
            Channel::Flex3 => finger(Finger::Middle),
            Channel::Flex4 => finger(Finger::Ring),
            Channel::Flex5 => finger(Finger::Pinky),
            Channel::Voltage => self.voltage,
            Channel::Force => self.force,
            Channel::AccelX => self.accel.x,
            Channel::AccelY => self.accel.y,
            Channel::AccelZ => self.accel.z,
            Channel::GyroX => self.gyro.x,
            Channel::GyroY => self.gyro.y,
            Channel::GyroZ => self.gyro.z,
        }
    }
}

/// Build a sample from a raw update.
pub fn normalize(
    payload: &RawPayload,
    layout: SensorLayout,
    received_at: DateTime<Utc>,
    timezone: Tz,
) -> SensorSample {
    let flex_group = payload.flex_sensor.as_ref();
    let imu = payload.mpu6050.as_ref();

    let accel = Axes {
        x: imu.and_then(|m| m.accel_x),
        y: imu.and_then(|m| m.accel_y),
        z: imu.and_then(|m| m.accel_z),
    };
    let gyro = Axes {
        x: imu.and_then(|m| m.gyro_x),
        y: imu.and_then(|m| m.gyro_y),
        z: imu.and_then(|m| m.gyro_z),
    };
    let force = payload.force_sensor.as_ref().and_then(|f| f.raw_value);

    let time_label = received_at
        .with_timezone(&timezone)
        .format(TIME_LABEL_FORMAT)
        .to_string();

    match layout {
        SensorLayout::SingleFlex => SensorSample {
            received_at,
            time_label,
            flex: FlexReadings::Single(flex_group.and_then(|g| g.raw_value).map(to_code)),
            voltage: flex_group.and_then(|g| g.voltage),
            force,
            accel,
            gyro,
        },
        SensorLayout::FiveFinger => {
            let mut fingers = [None; FINGER_COUNT];
            if let Some(group) = flex_group {
                for (slot, channel) in fingers.iter_mut().zip(group.fingers()) {
                    *slot = channel.and_then(|c: &RawChannel| c.raw_value).map(to_code);
                }
            }
            SensorSample {
                received_at,
                time_label,
                flex: FlexReadings::Fingers(fingers),
                voltage: None,
                force: Some(force.unwrap_or(0.0)),
                accel: accel.zero_filled(),
                gyro: gyro.zero_filled(),
            }
        }
    }
}

/// Flex sensors report integer codes; round anything fractional.
fn to_code(value: f64) -> i32 {
    value.round() as i32
}
