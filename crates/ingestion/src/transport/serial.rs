//! Serial transport implementation

use super::Transport;
use crate::error::{IngestionError, Result};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::Read;
use std::time::Duration;
use tracing::{debug, info};

/// Read timeout; frames are only read once enough bytes are buffered
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial transport for the TF-Luna UART
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyAMA0")
    /// * `baud_rate` - Baud rate (e.g., 115200)
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let mut transport = Self {
            path: path.to_string(),
            baud_rate,
            port: None,
        };
        transport.connect()?;
        info!(device = %path, baud_rate, "Opened serial port");
        Ok(transport)
    }

    /// Baud rate the port was opened with
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn connect(&mut self) -> Result<()> {
        let port = serialport::new(&self.path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| IngestionError::OpenFailed {
                device: self.path.clone(),
                source,
            })?;
        self.port = Some(port);
        Ok(())
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or_else(|| IngestionError::NotOpen {
            device: self.path.clone(),
        })
    }

    fn port_error(&self, source: serialport::Error) -> IngestionError {
        IngestionError::Port {
            device: self.path.clone(),
            source,
        }
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.path
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.port.is_none() {
            self.connect()?;
            debug!(device = %self.path, "Serial port reopened");
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the handle closes the file descriptor
        if self.port.take().is_some() {
            debug!(device = %self.path, "Serial port closed");
        }
        Ok(())
    }

    fn bytes_to_read(&mut self) -> Result<usize> {
        let count = self.port()?.bytes_to_read();
        count.map(|n| n as usize).map_err(|e| self.port_error(e))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let result = self.port()?.read_exact(buf);
        result.map_err(|source| IngestionError::Read {
            device: self.path.clone(),
            source,
        })
    }

    fn clear_input(&mut self) -> Result<()> {
        let result = self.port()?.clear(ClearBuffer::Input);
        result.map_err(|e| self.port_error(e))
    }
}
