//! # Dispatcher
//!
//! Output side of the bridge.
//!
//! Responsibilities:
//! - OSC, plain UDP, ThingsBoard and log sinks
//! - Building the sink registry from configuration
//! - Keeping slow HTTP posts off the sensor loop via a worker pool

pub mod error;
pub mod factory;
pub mod metrics;
pub mod pool;
pub mod sinks;

pub use contracts::DistanceSink;
pub use error::DispatcherError;
pub use factory::{create_output_sink, create_sinks};
pub use metrics::{DeliveryMetrics, DeliverySnapshot};
pub use pool::WorkerPool;
pub use sinks::{
    build_packet, format_message, Dispatch, LogSink, OscSink, PresenceEdge, SinkKind,
    ThingsBoardSink, UdpSink,
};
