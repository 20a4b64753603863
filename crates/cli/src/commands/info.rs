//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::AppConfig;
use tracing::info;

use crate::cli::{InfoArgs, InfoFormat};
use crate::settings;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    match &args.config {
        Some(path) => info!(config = %path.display(), "Loading configuration info"),
        None => info!("Showing built-in defaults"),
    }

    let config = settings::load_base(args.config.as_deref()).context("Failed to load configuration")?;
    println!("{}", render(&config, args.format)?);
    Ok(())
}

/// Render the configuration in the requested format
fn render(config: &AppConfig, format: InfoFormat) -> Result<String> {
    let rendered = match format {
        InfoFormat::Json => config_loader::ConfigLoader::to_json(config)
            .context("Failed to serialize configuration as JSON")?,
        InfoFormat::Toml => config_loader::ConfigLoader::to_toml(config)
            .context("Failed to serialize configuration as TOML")?,
        InfoFormat::Text => render_text(config),
    };
    Ok(rendered)
}

fn render_text(config: &AppConfig) -> String {
    let sensor = &config.sensor;
    let output = &config.output;
    let mut lines = vec![
        "=== tfluna Configuration ===".to_string(),
        String::new(),
        "Sensor:".to_string(),
        format!("  device:       {}", sensor.device),
        format!("  baud rate:    {}", sensor.baud_rate),
        format!("  interval:     {}s", sensor.interval_secs),
        format!("  epsilon:      {} cm", sensor.epsilon),
        format!("  max distance: {} cm", sensor.max_distance),
        format!("  normalize:    {}", sensor.normalize),
        format!(
            "  device id:    {}",
            sensor
                .device_id
                .map_or_else(|| "none".to_string(), |id| id.to_string())
        ),
        String::new(),
        "Output:".to_string(),
        format!("  protocol:     {:?}", output.protocol),
        format!("  target:       {}", output.target()),
        format!("  message:      {}", output.message()),
    ];

    lines.push(String::new());
    match &config.thingsboard {
        Some(tb) => {
            lines.push("ThingsBoard:".to_string());
            lines.push(format!("  url:          {}", tb.url));
            lines.push(format!("  message:      {}", tb.message));
            lines.push(format!("  pooled:       {}", tb.pooled));
            if tb.pooled {
                lines.push(format!("  workers:      {}", tb.workers));
                lines.push(format!("  queue:        {}", tb.queue_capacity));
            }
            lines.push(format!("  timeout:      {}s", tb.timeout_secs));
        }
        None => lines.push("ThingsBoard: disabled".to_string()),
    }

    lines.join("\n")
}
