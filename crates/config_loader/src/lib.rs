//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `AppConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), contracts::ContractError> {
//! let config = ConfigLoader::load_from_path(Path::new("tfluna.toml"))?;
//! println!("Device: {}", config.sensor.device);
//! # Ok(())
//! # }
//! ```

mod parser;
mod validator;

pub use contracts::AppConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<AppConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<AppConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already assembled configuration
    ///
    /// Used after command-line overrides have been applied.
    pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize AppConfig to TOML string
    pub fn to_toml(config: &AppConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize AppConfig to JSON string
    pub fn to_json(config: &AppConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<AppConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::OutputProtocol;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[sensor]
device = "/dev/ttyUSB0"
epsilon = 3
max_distance = 150

[output]
host = "192.168.1.20"
port = 9000
protocol = "udp"
message = "proximity"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.sensor.device, "/dev/ttyUSB0");
        assert_eq!(config.sensor.epsilon, 3);
        assert_eq!(config.output.protocol, OutputProtocol::Udp);
        assert_eq!(config.output.message(), "proximity");
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.sensor.device, config2.sensor.device);
        assert_eq!(config.output.port, config2.output.port);
    }

    #[test]
    fn test_toml_to_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.sensor.max_distance, config2.sensor.max_distance);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[output]
protocol = "osc"
message = "no-leading-slash"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.output.host, "192.168.1.20");
    }

    #[test]
    fn test_load_from_path_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_example_config_is_valid() {
        let content = include_str!("../../../config/tfluna.example.toml");
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.sensor.device, "/dev/ttyAMA0");
        assert_eq!(config.output.message(), "/tfluna");
        assert!(config.thingsboard.is_none());
    }
}
