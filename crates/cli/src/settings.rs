//! Layering of CLI flags over the configuration file.

use contracts::{AppConfig, OutputProtocol, ThingsBoardConfig};
use std::path::Path;
use tracing::debug;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};

/// Load the base configuration: the given file, or built-in defaults
pub fn load_base(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            debug!(config = %path.display(), "Loading configuration file");
            Ok(config_loader::ConfigLoader::load_from_path(path)?)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Resolve the effective configuration for a run and validate it
pub fn resolve(args: &RunArgs, verbose: bool) -> Result<AppConfig> {
    let mut config = load_base(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    if verbose {
        config.verbose = true;
    }
    config_loader::ConfigLoader::validate(&config)?;
    Ok(config)
}

/// Apply explicitly given flags on top of `config`
pub fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    let sensor = &mut config.sensor;
    if let Some(dev) = &args.dev {
        sensor.device = dev.clone();
    }
    if let Some(baud) = args.baud {
        sensor.baud_rate = baud;
    }
    if let Some(interval) = args.interval {
        sensor.interval_secs = interval;
    }
    if let Some(epsilon) = args.epsilon {
        sensor.epsilon = epsilon;
    }
    if let Some(max_distance) = args.max_distance {
        sensor.max_distance = max_distance;
    }
    if args.normalize {
        sensor.normalize = true;
    }
    if args.id.is_some() {
        sensor.device_id = args.id;
    }

    let output = &mut config.output;
    if let Some(host) = &args.destination {
        output.host = host.clone();
    }
    if let Some(port) = args.port {
        output.port = port;
    }
    if args.udp {
        output.protocol = OutputProtocol::Udp;
    }
    if let Some(message) = &args.message {
        output.message = Some(message.clone());
    }

    if let Some(url) = &args.tb_url {
        config
            .thingsboard
            .get_or_insert_with(|| ThingsBoardConfig::new(url.clone()))
            .url = url.clone();
    }
    if let Some(tb) = config.thingsboard.as_mut() {
        if let Some(message) = &args.tb_message {
            tb.message = message.clone();
        }
        if args.tb_inline {
            tb.pooled = false;
        }
    }
}
