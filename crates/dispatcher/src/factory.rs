//! Sink registry construction from configuration

use contracts::{AppConfig, OutputConfig, OutputProtocol, ThingsBoardConfig};
use tracing::{info, instrument};

use crate::error::DispatcherError;
use crate::sinks::{LogSink, OscSink, SinkKind, ThingsBoardSink, UdpSink};

/// Build the sinks for a configuration, in registration order
///
/// Order is: primary output (OSC or UDP), ThingsBoard when configured, then
/// the log sink in verbose mode. Any construction failure is returned.
#[instrument(name = "dispatcher_create_sinks", skip(config))]
pub async fn create_sinks(config: &AppConfig) -> Result<Vec<SinkKind>, DispatcherError> {
    let mut sinks = Vec::with_capacity(3);

    sinks.push(create_output_sink(&config.output).await?);

    if let Some(tb) = &config.thingsboard {
        sinks.push(create_thingsboard_sink(tb)?);
    }

    if config.verbose {
        sinks.push(LogSink::new("log").into());
    }

    info!(count = sinks.len(), "Sinks created");
    Ok(sinks)
}

/// Create the primary OSC or UDP sink
#[instrument(
    name = "dispatcher_create_output_sink",
    skip(config),
    fields(protocol = ?config.protocol, target = %config.target())
)]
pub async fn create_output_sink(config: &OutputConfig) -> Result<SinkKind, DispatcherError> {
    let sink: SinkKind = match config.protocol {
        OutputProtocol::Osc => OscSink::connect("osc", config)
            .await
            .map_err(|e| DispatcherError::sink_creation("osc", e.to_string()))?
            .into(),
        OutputProtocol::Udp => UdpSink::connect("udp", config)
            .await
            .map_err(|e| DispatcherError::sink_creation("udp", e.to_string()))?
            .into(),
    };
    Ok(sink)
}

fn create_thingsboard_sink(config: &ThingsBoardConfig) -> Result<SinkKind, DispatcherError> {
    let sink = ThingsBoardSink::new("thingsboard", config)
        .map_err(|e| DispatcherError::sink_creation("thingsboard", e.to_string()))?;
    Ok(sink.into())
}
