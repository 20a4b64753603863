//! UdpSink - plain text datagrams

use std::net::SocketAddr;

use contracts::{ContractError, DistanceSink, OutputConfig, OutputValue, Reading, SinkContext};
use tokio::net::UdpSocket;
use tracing::{debug, instrument};

use super::net::{bind_udp, resolve_target};
use crate::error::DispatcherError;

/// Sink that sends `"<message> [<device_id>] <value>"` as UTF-8
pub struct UdpSink {
    name: String,
    message: String,
    target: SocketAddr,
    socket: Option<UdpSocket>,
}

impl UdpSink {
    /// Resolve the destination and bind a local socket
    #[instrument(name = "udp_sink_connect", skip(name, config), fields(target = %config.target()))]
    pub async fn connect(
        name: impl Into<String>,
        config: &OutputConfig,
    ) -> Result<Self, DispatcherError> {
        let name = name.into();
        let target = resolve_target(&config.host, config.port).await?;
        let socket = bind_udp(target)?;

        debug!(sink = %name, target = %target, message = config.message(), "UdpSink ready");

        Ok(Self {
            name,
            message: config.message().to_string(),
            target,
            socket: Some(socket),
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

/// Text payload for one reading
pub fn format_message(message: &str, device_id: Option<i32>, value: &OutputValue) -> String {
    match device_id {
        Some(id) => format!("{message} {id} {value}"),
        None => format!("{message} {value}"),
    }
}

impl DistanceSink for UdpSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("UDP {} {}", self.target, self.message)
    }

    async fn send(&mut self, reading: &Reading, ctx: &SinkContext) -> Result<(), ContractError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_connection(&self.name, "sink closed"))?;

        let text = format_message(&self.message, ctx.device_id, &reading.value);
        socket
            .send_to(text.as_bytes(), self.target)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(sink = %self.name, "UdpSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::OutputProtocol;
    use tokio::time::{timeout, Duration};

    #[test]
    fn test_format_message() {
        assert_eq!(
            format_message("tfluna", None, &OutputValue::Centimeters(42)),
            "tfluna 42"
        );
        assert_eq!(
            format_message("tfluna", Some(2), &OutputValue::Centimeters(42)),
            "tfluna 2 42"
        );
        assert_eq!(
            format_message("tfluna", Some(0), &OutputValue::Normalized(1.0)),
            "tfluna 0 1.0"
        );
    }

    #[tokio::test]
    async fn test_send_to_local_receiver() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = OutputConfig {
            host: "127.0.0.1".to_string(),
            port: receiver.local_addr().unwrap().port(),
            protocol: OutputProtocol::Udp,
            message: Some("dist".to_string()),
        };

        let mut sink = UdpSink::connect("udp", &config).await.unwrap();
        let ctx = SinkContext { device_id: Some(2), max_distance: 200 };
        sink.send(&Reading::centimeters(42), &ctx).await.unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
            .await
            .expect("timed out waiting for datagram")
            .unwrap();
        assert_eq!(&buf[..len], b"dist 2 42");
    }
}
