//! Change-threshold filtering and normalization

use contracts::{OutputValue, Reading};

/// Ranges narrower than this are treated as empty
const RANGE_EPSILON: f64 = 1e-4;

/// Map a value from one range to another, clamped to the output range
///
/// Inverted output ranges (`outmin > outmax`) are supported. A degenerate
/// input range returns `outmin`.
pub fn map_value(value: f64, inmin: f64, inmax: f64, outmin: f64, outmax: f64) -> f64 {
    if (inmin - inmax).abs() < RANGE_EPSILON {
        return outmin;
    }

    let outval = (value - inmin) / (inmax - inmin) * (outmax - outmin) + outmin;
    if outmax < outmin {
        clamp_value(outval, outmax, outmin)
    } else {
        clamp_value(outval, outmin, outmax)
    }
}

/// Clamp a value to `[min, max]`
pub fn clamp_value<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Jitter filter with optional normalization
///
/// Accepts a distance only when it differs from the last accepted one by at
/// least `epsilon` cm.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    epsilon: u16,
    max_distance: u16,
    normalize: bool,
    prev_distance: u16,
}

impl DistanceFilter {
    pub fn new(epsilon: u16, max_distance: u16, normalize: bool) -> Self {
        Self {
            epsilon,
            max_distance,
            normalize,
            prev_distance: 0,
        }
    }

    /// Last accepted distance in cm
    pub fn prev_distance(&self) -> u16 {
        self.prev_distance
    }

    pub fn epsilon(&self) -> u16 {
        self.epsilon
    }

    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// Forget the last accepted distance
    pub fn reset(&mut self) {
        self.prev_distance = 0;
    }

    /// Filter one clamped distance
    ///
    /// Returns `None` when the change is below `epsilon`; the state is left
    /// untouched in that case.
    pub fn apply(&mut self, distance: u16) -> Option<Reading> {
        if distance.abs_diff(self.prev_distance) < self.epsilon {
            return None;
        }
        self.prev_distance = distance;

        let value = if self.normalize {
            let mapped = map_value(
                f64::from(distance),
                0.0,
                f64::from(self.max_distance),
                1.0,
                0.0,
            );
            OutputValue::Normalized(mapped as f32)
        } else {
            OutputValue::Centimeters(distance)
        };

        Some(Reading { distance, value })
    }
}
