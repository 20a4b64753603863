//! ThingsBoardSink - edge-triggered presence telemetry over HTTP

use std::sync::Arc;

use contracts::{ContractError, DistanceSink, Reading, SinkContext, ThingsBoardConfig};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::{DeliveryMetrics, DeliverySnapshot};
use crate::pool::WorkerPool;

/// Presence state that reports only transitions
///
/// Starts unknown, so the first observation is always a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceEdge {
    state: Option<bool>,
}

impl PresenceEdge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported presence, `None` before the first observation
    pub fn state(&self) -> Option<bool> {
        self.state
    }

    /// Record an observation, returning true on a transition
    pub fn observe(&mut self, present: bool) -> bool {
        if self.state == Some(present) {
            return false;
        }
        self.state = Some(present);
        true
    }
}

/// How POST requests are issued
pub enum Dispatch {
    /// Await each request in the sensor loop
    Inline,
    /// Queue requests on a worker pool
    Pooled(WorkerPool),
}

/// Sink that posts `{ <message>: 0|1 }` when presence flips
///
/// Presence is `distance < max_distance` on the clamped distance. HTTP
/// failures are logged and counted, never returned.
///
/// The edge state is updated before the POST is issued. A POST dropped on a
/// full pool queue, or one that fails, is not retried: ThingsBoard keeps the
/// previous state until the next transition.
pub struct ThingsBoardSink {
    name: String,
    url: String,
    message: String,
    client: Client,
    dispatch: Dispatch,
    edge: PresenceEdge,
    metrics: Arc<DeliveryMetrics>,
}

impl ThingsBoardSink {
    /// Build the HTTP client and, if pooled, spawn the worker pool
    pub fn new(name: impl Into<String>, config: &ThingsBoardConfig) -> Result<Self, DispatcherError> {
        let name = name.into();
        let client = Client::builder().timeout(config.timeout()).build()?;
        let metrics = Arc::new(DeliveryMetrics::new());

        let dispatch = if config.pooled {
            Dispatch::Pooled(WorkerPool::spawn(
                name.clone(),
                config.workers,
                config.queue_capacity,
                Arc::clone(&metrics),
            ))
        } else {
            Dispatch::Inline
        };

        debug!(
            sink = %name,
            pooled = config.pooled,
            workers = config.workers,
            "ThingsBoardSink ready"
        );

        Ok(Self {
            name,
            url: config.url.clone(),
            message: config.message.clone(),
            client,
            dispatch,
            edge: PresenceEdge::new(),
            metrics,
        })
    }

    /// Last reported presence
    pub fn presence(&self) -> Option<bool> {
        self.edge.state()
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self.dispatch, Dispatch::Pooled(_))
    }

    pub fn metrics(&self) -> DeliverySnapshot {
        self.metrics.snapshot()
    }

    /// JSON body for a presence value
    pub fn payload(&self, present: bool) -> Value {
        let mut body = Map::new();
        body.insert(self.message.clone(), Value::from(u8::from(present)));
        Value::Object(body)
    }
}

/// POST one payload, logging failures
async fn post(client: &Client, url: &str, payload: &Value, metrics: &DeliveryMetrics) {
    match client.post(url).json(payload).send().await {
        Ok(response) if response.status() == StatusCode::OK => {
            metrics.record_posted();
        }
        Ok(response) => {
            metrics.record_failed();
            warn!(status = %response.status(), "ThingsBoard send error");
        }
        Err(e) => {
            metrics.record_failed();
            error!(error = %e, "ThingsBoard send error");
        }
    }
}

impl DistanceSink for ThingsBoardSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("ThingsBoard {} {}", self.url, self.message)
    }

    #[instrument(name = "thingsboard_sink_send", skip_all, fields(sink = %self.name))]
    async fn send(&mut self, reading: &Reading, ctx: &SinkContext) -> Result<(), ContractError> {
        let present = reading.distance < ctx.max_distance;
        if !self.edge.observe(present) {
            return Ok(());
        }

        observability::record_presence_change(present);
        info!(message = %self.message, present, "Presence changed");

        let payload = self.payload(present);
        match &self.dispatch {
            Dispatch::Inline => {
                post(&self.client, &self.url, &payload, &self.metrics).await;
            }
            Dispatch::Pooled(pool) => {
                let client = self.client.clone();
                let url = self.url.clone();
                let metrics = Arc::clone(&self.metrics);
                pool.submit(async move {
                    post(&client, &url, &payload, &metrics).await;
                });
            }
        }
        Ok(())
    }

    #[instrument(name = "thingsboard_sink_close", skip(self), fields(sink = %self.name))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Dispatch::Pooled(pool) = &mut self.dispatch {
            pool.shutdown().await;
        }
        let snapshot = self.metrics.snapshot();
        debug!(
            posted = snapshot.posted,
            failed = snapshot.failed,
            dropped = snapshot.dropped,
            "ThingsBoardSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Minimal HTTP endpoint recording request bodies
    async fn spawn_responder(status: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/v1/token/telemetry", listener.local_addr().unwrap());
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&bodies);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    if let Some(body) = read_body(stream, status).await {
                        recorded.lock().unwrap().push(body);
                    }
                });
            }
        });

        (url, bodies)
    }

    async fn read_body(mut stream: TcpStream, status: &str) -> Option<String> {
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

        let response = format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        stream.write_all(response.as_bytes()).await.ok()?;
        Some(String::from_utf8_lossy(&buf[header_end..]).into_owned())
    }

    fn config(url: &str, pooled: bool) -> ThingsBoardConfig {
        ThingsBoardConfig {
            pooled,
            ..ThingsBoardConfig::new(url)
        }
    }

    const CTX: SinkContext = SinkContext {
        device_id: None,
        max_distance: 200,
    };

    #[test]
    fn test_presence_edge() {
        let mut edge = PresenceEdge::new();
        assert_eq!(edge.state(), None);

        let transitions: Vec<bool> = [150u16, 160, 250, 180]
            .iter()
            .map(|&d| edge.observe(d < 200))
            .collect();
        assert_eq!(transitions, vec![true, false, true, true]);
        assert_eq!(edge.state(), Some(true));
    }

    #[test]
    fn test_first_absent_observation_is_a_transition() {
        let mut edge = PresenceEdge::new();
        assert!(edge.observe(false));
        assert!(!edge.observe(false));
    }

    #[tokio::test]
    async fn test_inline_sends_only_on_transitions() {
        let (url, bodies) = spawn_responder("200 OK").await;
        let mut sink = ThingsBoardSink::new("thingsboard", &config(&url, false)).unwrap();
        assert!(!sink.is_pooled());

        for distance in [150u16, 160, 250, 180] {
            sink.send(&Reading::centimeters(distance), &CTX).await.unwrap();
        }
        sink.close().await.unwrap();

        let bodies = bodies.lock().unwrap().clone();
        assert_eq!(
            bodies,
            vec![r#"{"isThere":1}"#, r#"{"isThere":0}"#, r#"{"isThere":1}"#]
        );
        assert_eq!(sink.metrics().posted, 3);
    }

    #[tokio::test]
    async fn test_pooled_close_waits_for_posts() {
        let (url, bodies) = spawn_responder("200 OK").await;
        let mut sink = ThingsBoardSink::new("thingsboard", &config(&url, true)).unwrap();
        assert!(sink.is_pooled());

        sink.send(&Reading::centimeters(250), &CTX).await.unwrap();
        sink.send(&Reading::centimeters(100), &CTX).await.unwrap();
        sink.close().await.unwrap();

        let mut bodies = bodies.lock().unwrap().clone();
        bodies.sort();
        assert_eq!(bodies, vec![r#"{"isThere":0}"#, r#"{"isThere":1}"#]);
        assert_eq!(sink.metrics().posted, 2);
    }

    #[tokio::test]
    async fn test_non_200_is_logged_not_raised() {
        let (url, _bodies) = spawn_responder("500 Internal Server Error").await;
        let mut sink = ThingsBoardSink::new("thingsboard", &config(&url, false)).unwrap();

        let result = sink.send(&Reading::centimeters(10), &CTX).await;
        assert!(result.is_ok());
        assert_eq!(sink.metrics().failed, 1);
        assert_eq!(sink.presence(), Some(true));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_logged_not_raised() {
        // Bind then drop to get a closed port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let mut sink = ThingsBoardSink::new("thingsboard", &config(&url, false)).unwrap();
        assert!(sink.send(&Reading::centimeters(10), &CTX).await.is_ok());
        assert_eq!(sink.metrics().failed, 1);

        // The edge moved anyway; the lost POST is not retried
        assert_eq!(sink.presence(), Some(true));
        assert!(sink.send(&Reading::centimeters(20), &CTX).await.is_ok());
        assert_eq!(sink.metrics().failed, 1);
        assert_eq!(sink.metrics().posted, 0);
    }

    #[test]
    fn test_payload_uses_message_name() {
        let mut cfg = config("http://localhost/", false);
        cfg.message = "occupied".to_string();
        let sink = ThingsBoardSink::new("tb", &cfg).unwrap();
        assert_eq!(sink.payload(true).to_string(), r#"{"occupied":1}"#);
        assert_eq!(sink.payload(false).to_string(), r#"{"occupied":0}"#);
    }
}
