//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::AppConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    device: String,
    protocol: String,
    target: String,
    thingsboard: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    device: config.sensor.device.clone(),
                    protocol: format!("{:?}", config.output.protocol),
                    target: config.output.target(),
                    thingsboard: config.thingsboard.is_some(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.sensor.epsilon == 0 {
        warnings.push("sensor.epsilon is 0 - every frame will be sent".to_string());
    }

    // The TF-Luna reports at 100 Hz by default
    if config.sensor.interval_secs < 0.01 {
        warnings.push(format!(
            "sensor.interval_secs {} is below the sensor frame period",
            config.sensor.interval_secs
        ));
    }

    if let Some(ref tb) = config.thingsboard {
        if tb.url.starts_with("http://") {
            warnings.push("thingsboard.url uses plain http - access token is sent unencrypted".to_string());
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Device: {}", summary.device);
            println!("  Output: {} {}", summary.protocol, summary.target);
            println!("  ThingsBoard: {}", if summary.thingsboard { "enabled" } else { "disabled" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ThingsBoardConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args_for(file: &NamedTempFile) -> ValidateArgs {
        ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        }
    }

    #[test]
    fn test_valid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[output]\nprotocol = \"udp\"\nport = 6000").unwrap();

        let result = validate_config(&args_for(&file));
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.protocol, "Udp");
        assert_eq!(summary.target, "127.0.0.1:6000");
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"output": {{"message": "tfluna"}}}}"#).unwrap();

        let result = validate_config(&args_for(&file));
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/tfluna.toml".into(),
            json: false,
        };
        assert!(run_validate(&args).is_err());
    }

    #[test]
    fn test_warnings() {
        let mut config = AppConfig::default();
        assert!(collect_warnings(&config).is_empty());

        config.sensor.epsilon = 0;
        config.thingsboard = Some(ThingsBoardConfig::new("http://tb.local/api/v1/T/telemetry"));
        assert_eq!(collect_warnings(&config).len(), 2);
    }
}
