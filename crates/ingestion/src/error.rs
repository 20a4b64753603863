//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Serial device could not be opened
    #[error("cannot open serial device {device}: {source}")]
    OpenFailed {
        /// Device path
        device: String,
        #[source]
        source: serialport::Error,
    },

    /// Serial port query failed
    #[error("serial port {device} error: {source}")]
    Port {
        /// Device path
        device: String,
        #[source]
        source: serialport::Error,
    },

    /// Read from the device failed
    #[error("read from {device} failed: {source}")]
    Read {
        /// Device path
        device: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation on a closed transport
    #[error("transport {device} is not open")]
    NotOpen {
        /// Device path
        device: String,
    },
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::OpenFailed { device, source } => {
                ContractError::serial_open(device, source.to_string())
            }
            IngestionError::Port { ref device, .. }
            | IngestionError::Read { ref device, .. }
            | IngestionError::NotOpen { ref device } => {
                ContractError::serial(device.clone(), err.to_string())
            }
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
