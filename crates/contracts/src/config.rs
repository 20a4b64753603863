//! AppConfig - Config Loader output
//!
//! Describes the complete bridge setup: serial sensor, filtering, primary
//! output (OSC or UDP) and the optional ThingsBoard presence notifier.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::SinkContext;

/// Default OSC address
pub const DEFAULT_OSC_ADDRESS: &str = "/tfluna";

/// Default UDP message text
pub const DEFAULT_UDP_MESSAGE: &str = "tfluna";

/// Default ThingsBoard telemetry key
pub const DEFAULT_TB_MESSAGE: &str = "isThere";

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Serial sensor and filtering
    #[serde(default)]
    #[validate(nested)]
    pub sensor: SensorConfig,

    /// Primary output destination
    #[serde(default)]
    #[validate(nested)]
    pub output: OutputConfig,

    /// ThingsBoard presence notifier (disabled when absent)
    #[serde(default)]
    #[validate(nested)]
    pub thingsboard: Option<ThingsBoardConfig>,

    /// Log every accepted value
    #[serde(default)]
    pub verbose: bool,
}

/// Serial sensor and filter settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensorConfig {
    /// Serial device path
    #[serde(default = "default_device")]
    #[validate(length(min = 1, message = "serial device path cannot be empty"))]
    pub device: String,

    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    #[validate(range(min = 1, message = "baud rate must be > 0"))]
    pub baud_rate: u32,

    /// Poll interval in seconds
    #[serde(default = "default_interval_secs")]
    #[validate(range(min = 0.0, max = 60.0, message = "interval must be within [0, 60] s"))]
    pub interval_secs: f64,

    /// Minimum distance change in cm to accept a reading
    #[serde(default = "default_epsilon")]
    pub epsilon: u16,

    /// Max distance in cm, readings beyond are clipped
    #[serde(default = "default_max_distance")]
    #[validate(range(min = 1, message = "max distance must be > 0"))]
    pub max_distance: u16,

    /// Send inverted normalized values instead of cm
    #[serde(default)]
    pub normalize: bool,

    /// Optional device identifier included in messages
    #[serde(default)]
    pub device_id: Option<i32>,
}

fn default_device() -> String {
    "/dev/ttyAMA0".to_string()
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_interval_secs() -> f64 {
    0.1
}

fn default_epsilon() -> u16 {
    2
}

fn default_max_distance() -> u16 {
    200
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud_rate: default_baud_rate(),
            interval_secs: default_interval_secs(),
            epsilon: default_epsilon(),
            max_distance: default_max_distance(),
            normalize: false,
            device_id: None,
        }
    }
}

impl SensorConfig {
    /// Poll interval as duration
    ///
    /// Out-of-range values fall back to the default interval.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_interval_secs()))
    }

    /// Context handed to sinks on every send
    pub fn sink_context(&self) -> SinkContext {
        SinkContext {
            device_id: self.device_id,
            max_distance: self.max_distance,
        }
    }
}

/// Primary output protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputProtocol {
    /// Open Sound Control over UDP
    #[default]
    Osc,
    /// Plaintext UDP datagram
    Udp,
}

/// Primary output destination
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OutputConfig {
    /// Destination hostname or IP address
    #[serde(default = "default_host")]
    #[validate(length(min = 1, message = "destination host cannot be empty"))]
    pub host: String,

    /// Destination port
    #[serde(default = "default_port")]
    #[validate(range(min = 1, message = "destination port must be > 0"))]
    pub port: u16,

    /// OSC or raw UDP
    #[serde(default)]
    pub protocol: OutputProtocol,

    /// OSC address or UDP message text (protocol default when absent)
    #[serde(default)]
    pub message: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5005
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            protocol: OutputProtocol::default(),
            message: None,
        }
    }
}

impl OutputConfig {
    /// Message text, falling back to the protocol default
    pub fn message(&self) -> &str {
        match (&self.message, self.protocol) {
            (Some(message), _) => message,
            (None, OutputProtocol::Osc) => DEFAULT_OSC_ADDRESS,
            (None, OutputProtocol::Udp) => DEFAULT_UDP_MESSAGE,
        }
    }

    /// `host:port` string
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// ThingsBoard presence notifier settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ThingsBoardConfig {
    /// Telemetry URL, including the device access token
    #[validate(url(message = "thingsboard url is not a valid URL"))]
    pub url: String,

    /// Telemetry key of the presence value
    #[serde(default = "default_tb_message")]
    #[validate(length(min = 1, message = "thingsboard message cannot be empty"))]
    pub message: String,

    /// Post from a worker pool instead of blocking the loop
    #[serde(default = "default_true")]
    pub pooled: bool,

    /// Worker count of the pool
    #[serde(default = "default_workers")]
    #[validate(range(min = 1, max = 256))]
    pub workers: usize,

    /// Pending request capacity of the pool
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 0.001))]
    pub timeout_secs: f64,
}

fn default_tb_message() -> String {
    DEFAULT_TB_MESSAGE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    16
}

fn default_queue_capacity() -> usize {
    64
}

fn default_timeout_secs() -> f64 {
    10.0
}

impl ThingsBoardConfig {
    /// Config with defaults for everything but the URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: default_tb_message(),
            pooled: true,
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Request timeout as duration
    ///
    /// Out-of-range values fall back to the default timeout.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout_secs()))
    }
}
