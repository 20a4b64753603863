//! Transport layer for serial I/O abstraction

use crate::error::Result;

mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Byte source the sensor loop polls
///
/// All calls are expected to return quickly; the loop polls on a fixed
/// interval and never waits for data.
pub trait Transport: Send {
    /// Device name (used for logging)
    fn name(&self) -> &str;

    /// Whether the connection is currently open
    fn is_open(&self) -> bool;

    /// Open the connection (no-op when already open)
    fn open(&mut self) -> Result<()>;

    /// Close the connection (no-op when already closed)
    fn close(&mut self) -> Result<()>;

    /// Number of bytes buffered and ready to read
    fn bytes_to_read(&mut self) -> Result<usize>;

    /// Fill `buf` completely
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Discard all buffered input
    fn clear_input(&mut self) -> Result<()>;
}
