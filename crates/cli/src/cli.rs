//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tfluna - TF-Luna LiDAR distance bridge
#[derive(Parser, Debug)]
#[command(
    name = "tfluna",
    author,
    version,
    about = "Send TF-Luna LiDAR distance measurements over OSC (default) or UDP",
    long_about = "Send TF-Luna LiDAR proximity distance measurements over OSC (default) or UDP\n\
                  and optional \"isThere\" presence events to a ThingsBoard URL.\n\n\
                  Distance format is cm integer or normalized float (inverted, 1 near to 0 far).\n\
                  Message format: message [id] distance\n\n  \
                  OSC: \"/tfluna\" distance\n  \
                  UDP: \"tfluna\" distance",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Verbose output: log settings and every reading (-vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TFLUNA_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TFLUNA_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments of the default `run` command
    #[command(flatten)]
    pub run: RunArgs,
}

impl Cli {
    /// Arguments for the run command, explicit or implied
    pub fn run_args(&self) -> Option<&RunArgs> {
        match &self.command {
            None => Some(&self.run),
            Some(Commands::Run(args)) => Some(args),
            Some(_) => None,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read the sensor and send readings (default)
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the resolved configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
///
/// Unset flags keep the value from the configuration file, or the built-in
/// default without one.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Serial port device [default: /dev/ttyAMA0]
    #[arg(value_name = "DEV", env = "TFLUNA_DEVICE")]
    pub dev: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE", env = "TFLUNA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Serial baud rate [default: 115200]
    #[arg(long, value_name = "BAUD")]
    pub baud: Option<u32>,

    /// Destination hostname or IP address [default: 127.0.0.1]
    #[arg(short, long, value_name = "HOST", env = "TFLUNA_DESTINATION")]
    pub destination: Option<String>,

    /// Destination port to send to [default: 5005]
    #[arg(short, long, value_name = "PORT", env = "TFLUNA_PORT")]
    pub port: Option<u16>,

    /// Read interval in seconds [default: 0.1]
    #[arg(short, long, value_name = "INTERVAL")]
    pub interval: Option<f64>,

    /// Min distance change in cm to send a message [default: 2]
    #[arg(short, long, value_name = "EPSILON")]
    pub epsilon: Option<u16>,

    /// Max allowed distance in cm, rest is clipped [default: 200]
    #[arg(short, long, value_name = "MAX_DISTANCE")]
    pub max_distance: Option<u16>,

    /// Send normalized values instead of cm: 1 near to 0 far (max distance)
    #[arg(short, long)]
    pub normalize: bool,

    /// Send raw UDP message instead of OSC
    #[arg(short, long)]
    pub udp: bool,

    /// OSC message address or UDP message text [default: /tfluna or tfluna]
    #[arg(long, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Device identifier to include in messages
    #[arg(long, value_name = "DEVID", allow_negative_numbers = true)]
    pub id: Option<i32>,

    /// Send "isThere" presence events to a ThingsBoard telemetry URL
    #[arg(long, value_name = "TB_URL", env = "TFLUNA_TB_URL")]
    pub tb_url: Option<String>,

    /// ThingsBoard presence message name [default: isThere]
    #[arg(long, value_name = "TB_MESSAGE")]
    pub tb_message: Option<String>,

    /// Post ThingsBoard events from the sensor loop instead of the worker pool
    #[arg(long)]
    pub tb_inline: bool,

    /// Prometheus metrics port (disabled when unset)
    #[arg(long, value_name = "PORT", env = "TFLUNA_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Validate and print the resolved settings without opening the device
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "tfluna.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to configuration file (built-in defaults when unset)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: InfoFormat,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// `info` output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InfoFormat {
    #[default]
    Text,
    Json,
    Toml,
}
