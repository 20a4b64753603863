//! OscSink - OSC messages over UDP

use std::net::SocketAddr;

use contracts::{ContractError, DistanceSink, OutputConfig, OutputValue, Reading, SinkContext};
use rosc::{OscMessage, OscPacket, OscType};
use tokio::net::UdpSocket;
use tracing::{debug, instrument};

use super::net::{bind_udp, resolve_target};
use crate::error::DispatcherError;

/// Sink that sends one OSC message per reading
///
/// Arguments are `[device_id?, value]`; centimeters go out as `i`,
/// normalized values as `f`.
pub struct OscSink {
    name: String,
    address: String,
    target: SocketAddr,
    socket: Option<UdpSocket>,
}

impl OscSink {
    /// Resolve the destination and bind a local socket
    #[instrument(name = "osc_sink_connect", skip(name, config), fields(target = %config.target()))]
    pub async fn connect(
        name: impl Into<String>,
        config: &OutputConfig,
    ) -> Result<Self, DispatcherError> {
        let name = name.into();
        let target = resolve_target(&config.host, config.port).await?;
        let socket = bind_udp(target)?;

        debug!(sink = %name, target = %target, address = config.message(), "OscSink ready");

        Ok(Self {
            name,
            address: config.message().to_string(),
            target,
            socket: Some(socket),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

/// Build the OSC packet for a reading
pub fn build_packet(address: &str, reading: &Reading, ctx: &SinkContext) -> OscPacket {
    let mut args = Vec::with_capacity(2);
    if let Some(id) = ctx.device_id {
        args.push(OscType::Int(id));
    }
    args.push(match reading.value {
        OutputValue::Centimeters(cm) => OscType::Int(i32::from(cm)),
        OutputValue::Normalized(v) => OscType::Float(v),
    });

    OscPacket::Message(OscMessage {
        addr: address.to_string(),
        args,
    })
}

impl DistanceSink for OscSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("OSC {} {}", self.target, self.address)
    }

    async fn send(&mut self, reading: &Reading, ctx: &SinkContext) -> Result<(), ContractError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_connection(&self.name, "sink closed"))?;

        let packet = build_packet(&self.address, reading, ctx);
        let bytes = rosc::encoder::encode(&packet)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        socket
            .send_to(&bytes, self.target)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(sink = %self.name, "OscSink closed");
        Ok(())
    }
}
