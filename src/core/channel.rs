//! Channel, finger and layout definitions shared by the engine.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of fingers on the five-finger glove.
pub const FINGER_COUNT: usize = 5;

/// A numeric sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Single flex sensor raw code
    Flex,
    Flex1,
    Flex2,
    Flex3,
    Flex4,
    Flex5,
    /// Single flex sensor voltage
    Voltage,
    /// Force sensor, newtons
    Force,
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl Channel {
    /// The six IMU channels, acceleration first.
    pub const IMU: [Channel; 6] = [
        Channel::AccelX,
        Channel::AccelY,
        Channel::AccelZ,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
    ];

    /// Stable key used for chart series and serialized output.
    pub fn key(&self) -> &'static str {
        match self {
            Channel::Flex => "flex",
            Channel::Flex1 => "flex1",
            Channel::Flex2 => "flex2",
            Channel::Flex3 => "flex3",
            Channel::Flex4 => "flex4",
            Channel::Flex5 => "flex5",
            Channel::Voltage => "voltage",
            Channel::Force => "force",
            Channel::AccelX => "accel_x",
            Channel::AccelY => "accel_y",
            Channel::AccelZ => "accel_z",
            Channel::GyroX => "gyro_x",
            Channel::GyroY => "gyro_y",
            Channel::GyroZ => "gyro_z",
        }
    }

    /// Human readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Flex => "Flex Value",
            Channel::Flex1 => "Thumb",
            Channel::Flex2 => "Index",
            Channel::Flex3 => "Middle",
            Channel::Flex4 => "Ring",
            Channel::Flex5 => "Pinky",
            Channel::Voltage => "Voltage",
            Channel::Force => "Force (N)",
            Channel::AccelX => "Acceleration X",
            Channel::AccelY => "Acceleration Y",
            Channel::AccelZ => "Acceleration Z",
            Channel::GyroX => "Gyro X",
            Channel::GyroY => "Gyro Y",
            Channel::GyroZ => "Gyro Z",
        }
    }
}

/// A finger on the five-finger glove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All fingers, thumb first (matches `Flex1`..`Flex5`).
    pub const ALL: [Finger; FINGER_COUNT] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Position of this finger's sensor, 0-based.
    pub fn index(&self) -> usize {
        match self {
            Finger::Thumb => 0,
            Finger::Index => 1,
            Finger::Middle => 2,
            Finger::Ring => 3,
            Finger::Pinky => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Finger::Thumb => "Thumb",
            Finger::Index => "Index",
            Finger::Middle => "Middle",
            Finger::Ring => "Ring",
            Finger::Pinky => "Pinky",
        }
    }

    /// The flex channel carrying this finger's reading.
    pub fn channel(&self) -> Channel {
        match self {
            Finger::Thumb => Channel::Flex1,
            Finger::Index => Channel::Flex2,
            Finger::Middle => Channel::Flex3,
            Finger::Ring => Channel::Flex4,
            Finger::Pinky => Channel::Flex5,
        }
    }
}

impl FromStr for Finger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "thumb" => Ok(Finger::Thumb),
            "index" => Ok(Finger::Index),
            "middle" => Ok(Finger::Middle),
            "ring" => Ok(Finger::Ring),
            "pinky" => Ok(Finger::Pinky),
            other => Err(format!("unknown finger: {other}")),
        }
    }
}

/// Which glove variant the feed carries.
///
/// The layout decides how payloads are normalized and which rule set
/// classifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorLayout {
    /// One flex sensor plus IMU, classified with movement labels
    SingleFlex,
    /// Five flex sensors, force sensor and IMU, classified with posture bands
    FiveFinger,
}

/// A chart panel: a title and the channels plotted on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGroup {
    pub title: &'static str,
    pub channels: Vec<Channel>,
}

impl SensorLayout {
    /// Flex channels carried by this layout.
    pub fn flex_channels(&self) -> Vec<Channel> {
        match self {
            SensorLayout::SingleFlex => vec![Channel::Flex],
            SensorLayout::FiveFinger => Finger::ALL.iter().map(Finger::channel).collect(),
        }
    }

    /// Every numeric channel this layout reports, in display order.
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels = self.flex_channels();
        match self {
            SensorLayout::SingleFlex => channels.push(Channel::Voltage),
            SensorLayout::FiveFinger => channels.push(Channel::Force),
        }
        channels.extend_from_slice(&Channel::IMU);
        channels
    }

    /// Chart panels for the overview page.
    pub fn chart_groups(&self) -> Vec<ChartGroup> {
        match self {
            SensorLayout::SingleFlex => vec![
                ChartGroup {
                    title: "Flex Sensor Data",
                    channels: vec![Channel::Flex, Channel::Voltage],
                },
                ChartGroup {
                    title: "Acceleration Data",
                    channels: vec![Channel::AccelX, Channel::AccelY, Channel::AccelZ],
                },
                ChartGroup {
                    title: "Gyroscope Data",
                    channels: vec![Channel::GyroX, Channel::GyroY, Channel::GyroZ],
                },
            ],
            SensorLayout::FiveFinger => vec![
                ChartGroup {
                    title: "All Finger Flexion Data",
                    channels: self.flex_channels(),
                },
                ChartGroup {
                    title: "Force Sensor Data",
                    channels: vec![Channel::Force],
                },
                ChartGroup {
                    title: "MPU6050 Acceleration Data",
                    channels: vec![Channel::AccelX, Channel::AccelY, Channel::AccelZ],
                },
            ],
        }
    }
}

impl FromStr for SensorLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "single" | "single_flex" => Ok(SensorLayout::SingleFlex),
            "five" | "five_finger" => Ok(SensorLayout::FiveFinger),
            other => Err(format!("unknown sensor layout: {other}")),
        }
    }
}

impl std::fmt::Display for SensorLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorLayout::SingleFlex => write!(f, "single_flex"),
            SensorLayout::FiveFinger => write!(f, "five_finger"),
        }
    }
}

/// Anything that can report a value per channel.
///
/// `None` means the channel has no reading; rules never fire on it.
pub trait Readings {
    fn reading(&self, channel: Channel) -> Option<f64>;
}
