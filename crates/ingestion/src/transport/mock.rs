//! Mock transport for testing

use super::Transport;
use crate::error::{IngestionError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory transport
///
/// Clones share the same buffer so a test can keep a handle and inject
/// bytes while the sensor loop owns another clone.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    open: bool,
    clear_count: usize,
}

impl MockTransport {
    /// Create an open mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                read_buffer: VecDeque::new(),
                open: true,
                clear_count: 0,
            })),
        }
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        self.lock().read_buffer.extend(data);
    }

    /// Bytes still buffered
    pub fn pending(&self) -> usize {
        self.lock().read_buffer.len()
    }

    /// How often the input buffer was cleared
    pub fn clear_count(&self) -> usize {
        self.lock().clear_count
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        // A panicking test thread must not cascade into other assertions
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn not_open() -> IngestionError {
        IngestionError::NotOpen {
            device: "mock".to_string(),
        }
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn open(&mut self) -> Result<()> {
        self.lock().open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.lock().open = false;
        Ok(())
    }

    fn bytes_to_read(&mut self) -> Result<usize> {
        let inner = self.lock();
        if !inner.open {
            return Err(Self::not_open());
        }
        Ok(inner.read_buffer.len())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut inner = self.lock();
        if !inner.open {
            return Err(Self::not_open());
        }
        if inner.read_buffer.len() < buf.len() {
            return Err(IngestionError::Read {
                device: "mock".to_string(),
                source: std::io::ErrorKind::UnexpectedEof.into(),
            });
        }
        for item in buf.iter_mut() {
            *item = inner.read_buffer.pop_front().unwrap_or_default();
        }
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()> {
        let mut inner = self.lock();
        inner.read_buffer.clear();
        inner.clear_count += 1;
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
