//! TF-Luna serial frame decoding
//!
//! Frame layout (first 4 bytes of the 9 byte TF-Luna packet):
//!
//! ```text
//! ┌──────┬──────┬──────────┬───────────┐
//! │ 0x59 │ 0x59 │ Dist_L   │ Dist_H    │
//! └──────┴──────┴──────────┴───────────┘
//! ```
//!
//! The rest of the packet (strength, temperature, checksum) and any backlog
//! are discarded after each read so every tick reports the freshest sample.

use crate::error::Result;
use crate::transport::Transport;

/// Bytes consumed per frame
pub const FRAME_LEN: usize = 4;

/// Frame header marker
pub const SYNC_BYTE: u8 = 0x59;

/// Decode one frame into a clamped distance in cm
///
/// Returns `None` for short frames or a missing sync header; desynced
/// frames are expected noise, not errors.
pub fn decode_frame(frame: &[u8], max_distance: u16) -> Option<u16> {
    match frame {
        [SYNC_BYTE, SYNC_BYTE, low, high, ..] => {
            let raw = u16::from_le_bytes([*low, *high]);
            Some(raw.min(max_distance))
        }
        _ => None,
    }
}

/// Reads and decodes frames from a transport
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    max_distance: u16,
}

impl FrameDecoder {
    pub fn new(max_distance: u16) -> Self {
        Self { max_distance }
    }

    pub fn max_distance(&self) -> u16 {
        self.max_distance
    }

    /// Read one frame, drop the backlog, decode
    ///
    /// The caller checks that at least [`FRAME_LEN`] bytes are buffered.
    pub fn read_frame<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Option<u16>> {
        let mut frame = [0u8; FRAME_LEN];
        transport.read_exact(&mut frame)?;
        transport.clear_input()?;
        Ok(decode_frame(&frame, self.max_distance))
    }
}
