//! DistanceSink trait - fan-out output interface
//!
//! Defines the abstract interface for sinks.

use crate::{ContractError, Reading, SinkContext};

/// Distance output trait
///
/// All sink implementations must implement this trait. The sensor loop
/// calls `send` sequentially, in registration order, once per accepted
/// reading.
#[trait_variant::make(DistanceSink: Send)]
pub trait LocalDistanceSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Human readable settings summary
    fn describe(&self) -> String;

    /// Send an accepted reading
    ///
    /// # Errors
    /// Returns send error (should include context). Callers log and
    /// continue; a failing sink never stops the loop.
    async fn send(&mut self, reading: &Reading, ctx: &SinkContext) -> Result<(), ContractError>;

    /// Close sink, waiting for in-flight work
    async fn close(&mut self) -> Result<(), ContractError>;
}
