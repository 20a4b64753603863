//! Sensor loop metrics
//!
//! Prometheus counters/gauges recorded through the `metrics` facade, plus an
//! in-memory [`LoopSummary`] for the shutdown report.

use metrics::{counter, gauge, histogram};

/// Record one decoded frame
///
/// `valid` is false for frames failing the sync check.
pub fn record_frame_decoded(valid: bool) {
    if valid {
        counter!("tfluna_frames_total").increment(1);
    } else {
        counter!("tfluna_frames_invalid_total").increment(1);
    }
}

/// Record a reading that passed the change filter
pub fn record_reading_accepted(distance_cm: u16) {
    counter!("tfluna_readings_accepted_total").increment(1);
    gauge!("tfluna_last_distance_cm").set(f64::from(distance_cm));
    histogram!("tfluna_distance_cm").record(f64::from(distance_cm));
}

/// Record a sink send
///
/// Success means the sink accepted the reading. Edge-triggered or queued
/// sinks may accept without writing anything.
pub fn record_sink_send(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "tfluna_sink_sends_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a presence transition reported to ThingsBoard
pub fn record_presence_change(present: bool) {
    counter!("tfluna_presence_changes_total").increment(1);
    gauge!("tfluna_present").set(if present { 1.0 } else { 0.0 });
}

/// Record a job dropped because the worker pool queue was full
pub fn record_pool_dropped(pool_name: &str) {
    counter!(
        "tfluna_pool_dropped_total",
        "pool" => pool_name.to_string()
    )
    .increment(1);
}

/// Per-sink send counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkCounts {
    /// Readings the sink accepted, not necessarily written to the wire
    pub sent: u64,
    pub failed: u64,
}

/// In-memory aggregate of a sensor loop run
#[derive(Debug, Clone, Default)]
pub struct LoopSummary {
    /// Frames that passed the sync check
    pub frames: u64,

    /// Frames that failed the sync check
    pub invalid_frames: u64,

    /// Transport errors while polling
    pub read_errors: u64,

    /// Readings that passed the change filter
    pub accepted: u64,

    /// Accepted distance statistics (cm)
    pub distance_stats: RunningStats,

    /// Send counters, in sink registration order
    pub sinks: Vec<(String, SinkCounts)>,
}

impl LoopSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink so it shows up even without sends
    pub fn add_sink(&mut self, name: impl Into<String>) {
        self.sinks.push((name.into(), SinkCounts::default()));
    }

    pub fn record_frame(&mut self, valid: bool) {
        if valid {
            self.frames += 1;
        } else {
            self.invalid_frames += 1;
        }
        record_frame_decoded(valid);
    }

    pub fn record_read_error(&mut self) {
        self.read_errors += 1;
    }

    pub fn record_accepted(&mut self, distance_cm: u16) {
        self.accepted += 1;
        self.distance_stats.push(f64::from(distance_cm));
        record_reading_accepted(distance_cm);
    }

    /// Record a send for the sink at `index`
    pub fn record_send(&mut self, index: usize, success: bool) {
        if let Some((name, counts)) = self.sinks.get_mut(index) {
            if success {
                counts.sent += 1;
            } else {
                counts.failed += 1;
            }
            record_sink_send(name, success);
        }
    }

    /// Percentage of frames failing the sync check
    pub fn invalid_rate(&self) -> f64 {
        let total = self.frames + self.invalid_frames;
        if total > 0 {
            self.invalid_frames as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for LoopSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sensor Loop Summary ===")?;
        writeln!(f, "Frames: {}", self.frames)?;
        writeln!(
            f,
            "Invalid frames: {} ({:.2}%)",
            self.invalid_frames,
            self.invalid_rate()
        )?;
        writeln!(f, "Read errors: {}", self.read_errors)?;
        writeln!(f, "Accepted readings: {}", self.accepted)?;
        writeln!(
            f,
            "Distance (cm): {}",
            StatsSummary::from(&self.distance_stats)
        )?;

        if !self.sinks.is_empty() {
            writeln!(f, "Sinks:")?;
            for (name, counts) in &self.sinks {
                writeln!(f, "  {}: sent={} failed={}", name, counts.sent, counts.failed)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
