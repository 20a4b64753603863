//! # Integration Tests
//!
//! End-to-end tests without hardware.
//!
//! Covers:
//! - Contract smoke tests
//! - Mock serial stream -> sensor loop -> real OSC/UDP/ThingsBoard sinks
//! - Configuration file -> sink registry wiring

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::DEFAULT_OSC_ADDRESS, "/tfluna");
    }
}

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream, UdpSocket};
    use tokio::time::{timeout, Duration};

    /// Frame bytes for a distance plus one trailing byte
    ///
    /// The loop only reads once more than one frame is buffered.
    pub fn frame(distance: u16) -> [u8; 5] {
        let [low, high] = distance.to_le_bytes();
        [0x59, 0x59, low, high, 0x00]
    }

    pub async fn udp_receiver() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    pub async fn recv(socket: &UdpSocket) -> Vec<u8> {
        let mut buf = [0u8; 1024];
        let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .expect("timed out waiting for datagram")
            .unwrap();
        buf[..len].to_vec()
    }

    /// HTTP endpoint answering 200 and recording request bodies
    pub async fn http_recorder() -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/v1/TOKEN/telemetry", listener.local_addr().unwrap());
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&bodies);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    if let Some(body) = handle(stream).await {
                        recorded.lock().unwrap().push(body);
                    }
                });
            }
        });

        (url, bodies)
    }

    async fn handle(mut stream: TcpStream) -> Option<String> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let length: usize = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        while buf.len() < header_end + length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await
            .ok()?;
        Some(String::from_utf8_lossy(&buf[header_end..]).into_owned())
    }
}

#[cfg(test)]
mod e2e_tests {
    use super::support::{frame, http_recorder, recv, udp_receiver};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        AppConfig, DistanceSink, OutputConfig, OutputProtocol, SensorConfig, ThingsBoardConfig,
    };
    use dispatcher::{create_sinks, OscSink, SinkKind, ThingsBoardSink, UdpSink};
    use ingestion::{MockTransport, SensorLoop};
    use rosc::{OscPacket, OscType};
    use tokio::time::{sleep, timeout, Duration};

    fn udp_output(port: u16) -> OutputConfig {
        OutputConfig {
            host: "127.0.0.1".to_string(),
            port,
            protocol: OutputProtocol::Udp,
            message: None,
        }
    }

    /// End-to-end: mock serial bytes -> SensorLoop -> UDP + ThingsBoard
    ///
    /// Jittery and repeated distances are filtered before any sink sees them;
    /// ThingsBoard only hears presence transitions.
    #[tokio::test]
    async fn test_e2e_udp_and_thingsboard() {
        let (receiver, port) = udp_receiver().await;
        let (url, bodies) = http_recorder().await;

        let transport = MockTransport::new();
        let mut sensor: SensorLoop<MockTransport, SinkKind> =
            SensorLoop::new(transport.clone(), &SensorConfig::default());

        sensor.add_sink(UdpSink::connect("udp", &udp_output(port)).await.unwrap().into());
        let tb = ThingsBoardConfig {
            pooled: false,
            ..ThingsBoardConfig::new(url)
        };
        sensor.add_sink(ThingsBoardSink::new("thingsboard", &tb).unwrap().into());

        for distance in [150u16, 151, 160, 250, 180] {
            transport.inject_read(&frame(distance));
            sensor.update().await;
        }

        // 151 is jitter; 250 is clipped to max_distance
        for expected in ["tfluna 150", "tfluna 160", "tfluna 200", "tfluna 180"] {
            assert_eq!(recv(&receiver).await, expected.as_bytes());
        }

        sensor.shutdown_sinks().await;
        assert_eq!(
            bodies.lock().unwrap().clone(),
            vec![r#"{"isThere":1}"#, r#"{"isThere":0}"#, r#"{"isThere":1}"#]
        );

        let summary = sensor.summary();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.accepted, 4);
        assert_eq!(summary.sinks[0].1.sent, 4);
        // Accepted by ThingsBoard four times, posted only on the three flips
        assert_eq!(summary.sinks[1].1.sent, 4);
        let posted = sensor.sinks()[1].metrics().map(|m| m.posted);
        assert_eq!(posted, Some(3));
    }

    /// Normalized OSC output carries the device id first
    #[tokio::test]
    async fn test_e2e_osc_normalized_with_id() {
        let (receiver, port) = udp_receiver().await;

        let sensor_config = SensorConfig {
            normalize: true,
            device_id: Some(7),
            ..SensorConfig::default()
        };
        let output = OutputConfig {
            protocol: OutputProtocol::Osc,
            message: Some("/proximity".to_string()),
            ..udp_output(port)
        };

        let transport = MockTransport::new();
        let mut sensor: SensorLoop<MockTransport, SinkKind> =
            SensorLoop::new(transport.clone(), &sensor_config);
        sensor.add_sink(OscSink::connect("osc", &output).await.unwrap().into());

        // 300 cm is clipped to the max distance
        for distance in [150u16, 300] {
            transport.inject_read(&frame(distance));
            sensor.update().await;
        }

        let mut received = Vec::new();
        for _ in 0..2 {
            let bytes = recv(&receiver).await;
            match rosc::decoder::decode_udp(&bytes).unwrap().1 {
                OscPacket::Message(msg) => {
                    assert_eq!(msg.addr, "/proximity");
                    received.push(msg.args);
                }
                other => panic!("unexpected packet: {:?}", other),
            }
        }

        assert_eq!(
            received,
            vec![
                vec![OscType::Int(7), OscType::Float(0.25)],
                vec![OscType::Int(7), OscType::Float(0.0)],
            ]
        );
        sensor.shutdown_sinks().await;
    }

    /// Configuration text -> sink registry -> running loop stopped externally
    #[tokio::test]
    async fn test_e2e_config_driven_run_and_stop() {
        let (receiver, port) = udp_receiver().await;
        let toml = format!(
            r#"
verbose = true

[sensor]
interval_secs = 0.005
epsilon = 5

[output]
protocol = "udp"
port = {port}
message = "dist"
"#
        );
        let config: AppConfig = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        let transport = MockTransport::new();
        let mut sensor: SensorLoop<MockTransport, SinkKind> =
            SensorLoop::new(transport.clone(), &config.sensor);
        for sink in create_sinks(&config).await.unwrap() {
            sensor.add_sink(sink);
        }
        assert_eq!(
            sensor.sinks().iter().map(|s| s.name()).collect::<Vec<_>>(),
            vec!["udp", "log"]
        );

        let stop = sensor.stop_handle();
        let running = tokio::spawn(async move {
            sensor.start().await;
            sensor
        });

        transport.inject_read(&frame(42));
        assert_eq!(recv(&receiver).await, b"dist 42");

        // Below epsilon, dropped by the filter
        transport.inject_read(&frame(44));
        sleep(Duration::from_millis(30)).await;

        transport.inject_read(&frame(60));
        assert_eq!(recv(&receiver).await, b"dist 60");

        stop.stop();
        let mut sensor = timeout(Duration::from_secs(2), running)
            .await
            .expect("loop did not stop")
            .unwrap();

        sensor.close().unwrap();
        sensor.shutdown_sinks().await;

        let summary = sensor.summary();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.accepted, 2);
    }
}
