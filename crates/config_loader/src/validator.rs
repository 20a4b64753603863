//! Configuration validation
//!
//! Rules:
//! - field constraints declared on the contract types (ranges, URL, lengths)
//! - OSC address starts with '/'
//! - custom message text is not empty
//! - ThingsBoard URL uses http or https
//! - durations are finite

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{AppConfig, ContractError, OutputProtocol};

/// Validate AppConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_output_message(config)?;
    validate_thingsboard_scheme(config)?;
    validate_finite_durations(config)?;
    Ok(())
}

/// Declarative field constraints
fn validate_fields(config: &AppConfig) -> Result<(), ContractError> {
    let Err(errors) = config.validate() else {
        return Ok(());
    };

    let mut flat = Vec::new();
    flatten_errors("", &errors, &mut flat);
    flat.sort();

    match flat.into_iter().next() {
        Some((field, message)) => Err(ContractError::config_validation(field, message)),
        None => Err(ContractError::config_validation("config", errors.to_string())),
    }
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", error.code));
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    flatten_errors(&format!("{path}[{idx}]"), nested, out);
                }
            }
        }
    }
}

/// Validate the OSC address / UDP message text
fn validate_output_message(config: &AppConfig) -> Result<(), ContractError> {
    let output = &config.output;

    if let Some(message) = &output.message {
        if message.trim().is_empty() {
            return Err(ContractError::config_validation(
                "output.message",
                "message cannot be empty",
            ));
        }
    }

    if output.protocol == OutputProtocol::Osc && !output.message().starts_with('/') {
        return Err(ContractError::config_validation(
            "output.message",
            format!("OSC address '{}' must start with '/'", output.message()),
        ));
    }

    Ok(())
}

/// Validate ThingsBoard URL scheme
fn validate_thingsboard_scheme(config: &AppConfig) -> Result<(), ContractError> {
    let Some(tb) = &config.thingsboard else {
        return Ok(());
    };

    let url = tb.url.to_ascii_lowercase();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "thingsboard.url",
            format!("url '{}' must use http or https", tb.url),
        ));
    }

    Ok(())
}

/// Reject NaN and infinite durations, which range checks let through
fn validate_finite_durations(config: &AppConfig) -> Result<(), ContractError> {
    if !config.sensor.interval_secs.is_finite() {
        return Err(ContractError::config_validation(
            "sensor.interval_secs",
            "interval must be a finite number",
        ));
    }

    if let Some(tb) = &config.thingsboard {
        if !tb.timeout_secs.is_finite() {
            return Err(ContractError::config_validation(
                "thingsboard.timeout_secs",
                "timeout must be a finite number",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{OutputConfig, SensorConfig, ThingsBoardConfig};

    fn minimal_config() -> AppConfig {
        AppConfig {
            sensor: SensorConfig {
                device: "/dev/ttyUSB0".into(),
                ..Default::default()
            },
            output: OutputConfig::default(),
            thingsboard: Some(ThingsBoardConfig::new(
                "http://board.example.com/api/v1/TOKEN/telemetry",
            )),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let config = minimal_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_device() {
        let mut config = minimal_config();
        config.sensor.device = String::new();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("sensor.device"), "got: {err}");
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_zero_max_distance() {
        let mut config = minimal_config();
        config.sensor.max_distance = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max distance must be > 0"), "got: {err}");
    }

    #[test]
    fn test_negative_interval() {
        let mut config = minimal_config();
        config.sensor.interval_secs = -1.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("sensor.interval_secs"), "got: {err}");
    }

    #[test]
    fn test_osc_address_without_slash() {
        let mut config = minimal_config();
        config.output.message = Some("tfluna".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("must start with '/'"), "got: {err}");
    }

    #[test]
    fn test_udp_message_without_slash_is_fine() {
        let mut config = minimal_config();
        config.output.protocol = OutputProtocol::Udp;
        config.output.message = Some("tfluna".into());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_blank_message() {
        let mut config = minimal_config();
        config.output.protocol = OutputProtocol::Udp;
        config.output.message = Some("   ".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("message cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_thingsboard_non_http_scheme() {
        let mut config = minimal_config();
        config.thingsboard = Some(ThingsBoardConfig::new("ftp://board.example.com/telemetry"));
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("http or https"), "got: {err}");
    }

    #[test]
    fn test_thingsboard_zero_workers() {
        let mut config = minimal_config();
        if let Some(tb) = config.thingsboard.as_mut() {
            tb.workers = 0;
        }
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("thingsboard.workers"), "got: {err}");
    }

    #[test]
    fn test_nan_timeout() {
        let mut config = minimal_config();
        if let Some(tb) = config.thingsboard.as_mut() {
            tb.timeout_secs = f64::NAN;
        }
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("thingsboard.timeout_secs"), "got: {err}");
    }

    #[test]
    fn test_nan_interval() {
        let mut config = minimal_config();
        config.sensor.interval_secs = f64::NAN;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("sensor.interval_secs"), "got: {err}");
    }
}
