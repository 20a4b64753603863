//! Sink implementations
//!
//! Contains OscSink, UdpSink, ThingsBoardSink and LogSink, plus the
//! [`SinkKind`] union the sensor loop is instantiated with.

mod log;
mod net;
mod osc;
mod thingsboard;
mod udp;

use contracts::{ContractError, DistanceSink, Reading, SinkContext};

use crate::metrics::DeliverySnapshot;

pub use self::log::LogSink;
pub use self::osc::{build_packet, OscSink};
pub use self::thingsboard::{Dispatch, PresenceEdge, ThingsBoardSink};
pub use self::udp::{format_message, UdpSink};

/// Any sink the bridge can register
pub enum SinkKind {
    Osc(OscSink),
    Udp(UdpSink),
    ThingsBoard(ThingsBoardSink),
    Log(LogSink),
}

impl SinkKind {
    /// Background delivery metrics, for sinks that track them
    pub fn metrics(&self) -> Option<DeliverySnapshot> {
        match self {
            Self::ThingsBoard(sink) => Some(sink.metrics()),
            _ => None,
        }
    }
}

impl DistanceSink for SinkKind {
    fn name(&self) -> &str {
        match self {
            Self::Osc(sink) => sink.name(),
            Self::Udp(sink) => sink.name(),
            Self::ThingsBoard(sink) => sink.name(),
            Self::Log(sink) => sink.name(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Osc(sink) => sink.describe(),
            Self::Udp(sink) => sink.describe(),
            Self::ThingsBoard(sink) => sink.describe(),
            Self::Log(sink) => sink.describe(),
        }
    }

    async fn send(&mut self, reading: &Reading, ctx: &SinkContext) -> Result<(), ContractError> {
        match self {
            Self::Osc(sink) => sink.send(reading, ctx).await,
            Self::Udp(sink) => sink.send(reading, ctx).await,
            Self::ThingsBoard(sink) => sink.send(reading, ctx).await,
            Self::Log(sink) => sink.send(reading, ctx).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Osc(sink) => sink.close().await,
            Self::Udp(sink) => sink.close().await,
            Self::ThingsBoard(sink) => sink.close().await,
            Self::Log(sink) => sink.close().await,
        }
    }
}

impl From<OscSink> for SinkKind {
    fn from(sink: OscSink) -> Self {
        Self::Osc(sink)
    }
}

impl From<UdpSink> for SinkKind {
    fn from(sink: UdpSink) -> Self {
        Self::Udp(sink)
    }
}

impl From<ThingsBoardSink> for SinkKind {
    fn from(sink: ThingsBoardSink) -> Self {
        Self::ThingsBoard(sink)
    }
}

impl From<LogSink> for SinkKind {
    fn from(sink: LogSink) -> Self {
        Self::Log(sink)
    }
}
