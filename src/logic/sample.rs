//! Sample - Canonical 6-axis reading
//!
//! Every reading, recorded or live, is normalized to the channel set
//! `ax, ay, az, wx, wy, wz` before it reaches the segmenter.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logic::stream::SourceError;

// ============================================================================
// CHANNELS
// ============================================================================

/// Number of canonical channels
pub const CHANNEL_COUNT: usize = 6;

/// Canonical channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Ax,
    Ay,
    Az,
    Wx,
    Wy,
    Wz,
}

/// Channels in feature order
pub const CHANNELS: [Channel; CHANNEL_COUNT] = [
    Channel::Ax,
    Channel::Ay,
    Channel::Az,
    Channel::Wx,
    Channel::Wy,
    Channel::Wz,
];

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Ax => "ax",
            Channel::Ay => "ay",
            Channel::Az => "az",
            Channel::Wx => "wx",
            Channel::Wy => "wy",
            Channel::Wz => "wz",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Channel::Ax => 0,
            Channel::Ay => 1,
            Channel::Az => 2,
            Channel::Wx => 3,
            Channel::Wy => 4,
            Channel::Wz => 5,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SAMPLE
// ============================================================================

/// Raw `time` cell: numeric seconds or a date-time string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(f64),
    Text(String),
}

/// One timestamped 6-axis reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: Option<Timestamp>,
    /// Values in [`CHANNELS`] order
    pub channels: [f64; CHANNEL_COUNT],
    /// Ground-truth class code (training data only)
    pub class: Option<i64>,
    pub detail: Option<String>,
}

impl Sample {
    pub fn new(channels: [f64; CHANNEL_COUNT]) -> Self {
        Self {
            time: None,
            channels,
            class: None,
            detail: None,
        }
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.time = Some(Timestamp::Seconds(seconds));
        self
    }

    pub fn with_class(mut self, class: i64) -> Self {
        self.class = Some(class);
        self
    }

    pub fn get(&self, channel: Channel) -> f64 {
        self.channels[channel.index()]
    }
}

// ============================================================================
// DEVICE FAMILIES
// ============================================================================

/// Physical channel naming convention of the sensor app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceFamily {
    /// iPhone-class naming (`lin_accX`, `gyroX`, ...)
    #[default]
    FamilyA,
    /// Android-class naming (`linX`, `gyrX`, ...)
    FamilyB,
}

const FAMILY_A_NAMES: [&str; CHANNEL_COUNT] =
    ["lin_accX", "lin_accY", "lin_accZ", "gyroX", "gyroY", "gyroZ"];

const FAMILY_B_NAMES: [&str; CHANNEL_COUNT] =
    ["linX", "linY", "linZ", "gyrX", "gyrY", "gyrZ"];

impl DeviceFamily {
    /// Resolve family from the device model reported by the sensor app
    pub fn from_device_model(model: &str) -> Self {
        if model.contains("iPhone") {
            DeviceFamily::FamilyA
        } else {
            DeviceFamily::FamilyB
        }
    }

    /// Device channel names in [`CHANNELS`] order
    pub fn channel_names(&self) -> &'static [&'static str; CHANNEL_COUNT] {
        match self {
            DeviceFamily::FamilyA => &FAMILY_A_NAMES,
            DeviceFamily::FamilyB => &FAMILY_B_NAMES,
        }
    }
}

/// One polled reading keyed by device channel name
pub type RawReading = HashMap<String, f64>;

/// Device → canonical channel mapping, resolved once per session
#[derive(Debug, Clone, Copy)]
pub struct ChannelMap {
    family: DeviceFamily,
    names: &'static [&'static str; CHANNEL_COUNT],
}

impl ChannelMap {
    pub fn new(family: DeviceFamily) -> Self {
        Self {
            family,
            names: family.channel_names(),
        }
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Device name of a canonical channel
    pub fn device_name(&self, channel: Channel) -> &'static str {
        self.names[channel.index()]
    }

    /// Map a raw reading to a canonical sample.
    ///
    /// All six channels must be present and finite; a partial reading is rejected as a whole.
    pub fn to_sample(&self, reading: &RawReading) -> Result<Sample, SourceError> {
        let mut channels = [0.0; CHANNEL_COUNT];
        for (slot, name) in channels.iter_mut().zip(self.names.iter()) {
            let value = *reading
                .get(*name)
                .ok_or_else(|| SourceError::MissingChannel(name.to_string()))?;
            if !value.is_finite() {
                return Err(SourceError::Parse(format!("{} = {}", name, value)));
            }
            *slot = value;
        }
        Ok(Sample::new(channels))
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::new(DeviceFamily::default())
    }
}
