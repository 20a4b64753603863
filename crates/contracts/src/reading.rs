//! Reading - accepted sensor value handed to sinks

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value forwarded to sinks
///
/// Either the clamped distance in centimeters or, with normalization
/// enabled, a float in `[0, 1]` where 1 is near and 0 is far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputValue {
    /// Clamped distance in cm
    Centimeters(u16),
    /// Inverted normalized distance
    Normalized(f32),
}

impl OutputValue {
    /// Value as float, regardless of representation
    pub fn as_f32(&self) -> f32 {
        match *self {
            Self::Centimeters(cm) => f32::from(cm),
            Self::Normalized(v) => v,
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, Self::Normalized(_))
    }
}

impl fmt::Display for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Centimeters(cm) => write!(f, "{cm}"),
            // Debug keeps the trailing ".0" on whole floats
            Self::Normalized(v) => write!(f, "{v:?}"),
        }
    }
}

/// One accepted reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Clamped distance in cm, always available
    pub distance: u16,
    /// Value to transmit
    pub value: OutputValue,
}

impl Reading {
    /// Reading that transmits the raw distance
    pub fn centimeters(distance: u16) -> Self {
        Self {
            distance,
            value: OutputValue::Centimeters(distance),
        }
    }
}

/// Read-only context passed with every send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkContext {
    /// Optional device identifier, unrelated to the serial device
    pub device_id: Option<i32>,
    /// Distance threshold in cm
    pub max_distance: u16,
}
