//! # Ingestion
//!
//! TF-Luna sensor ingestion.
//!
//! Responsibilities:
//! - Serial transport (real and mock)
//! - Frame decoding with backlog resynchronization
//! - Change-threshold filtering and normalization
//! - The cooperative sensor loop fanning readings out to sinks
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{SensorLoop, SerialTransport};
//!
//! let transport = SerialTransport::open("/dev/ttyAMA0", 115_200)?;
//! let mut sensor = SensorLoop::new(transport, &config.sensor);
//! sensor.add_sink(sink);
//!
//! let stop = sensor.stop_handle();
//! // stop.stop() from a signal handler
//! sensor.start().await;
//! sensor.close()?;
//! ```

mod decoder;
mod error;
mod filter;
mod sensor_loop;
mod transport;

// Re-exports
pub use contracts::{OutputValue, Reading};
pub use decoder::{decode_frame, FrameDecoder, FRAME_LEN, SYNC_BYTE};
pub use error::{IngestionError, Result};
pub use filter::{clamp_value, map_value, DistanceFilter};
pub use sensor_loop::{SensorLoop, StopHandle};
pub use transport::{MockTransport, SerialTransport, Transport};
