//! LogSink - logs readings via tracing

use contracts::{ContractError, DistanceSink, Reading, SinkContext};
use tracing::{info, instrument};

/// Sink that logs every accepted reading
///
/// Registered in verbose mode.
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DistanceSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        "log".to_string()
    }

    #[instrument(name = "log_sink_send", skip_all, fields(sink = %self.name))]
    async fn send(&mut self, reading: &Reading, ctx: &SinkContext) -> Result<(), ContractError> {
        info!(
            distance = reading.distance,
            value = %reading.value,
            device_id = ?ctx.device_id,
            "tfluna: {}",
            reading.value
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
