//! SensorLoop - poll, decode, filter, fan out

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{DistanceSink, Reading, SensorConfig, SinkContext};
use observability::LoopSummary;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::decoder::{FrameDecoder, FRAME_LEN};
use crate::error::Result;
use crate::filter::DistanceFilter;
use crate::transport::Transport;

/// Cloneable handle that requests a cooperative stop
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request the loop to stop at the top of its next iteration
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Sensor loop
///
/// Owns the transport, the filter state and the ordered sink registry.
/// Runs single-tasked: one `update()` per interval, sinks called one after
/// the other in registration order.
pub struct SensorLoop<T: Transport, S: DistanceSink> {
    transport: T,
    decoder: FrameDecoder,
    filter: DistanceFilter,
    sinks: Vec<S>,
    ctx: SinkContext,
    interval: Duration,
    running: Arc<AtomicBool>,
    summary: LoopSummary,
}

impl<T: Transport, S: DistanceSink> SensorLoop<T, S> {
    /// Create a loop around an opened transport
    pub fn new(transport: T, config: &SensorConfig) -> Self {
        info!(
            device = %transport.name(),
            max_distance = config.max_distance,
            epsilon = config.epsilon,
            "Sensor loop created"
        );

        Self {
            transport,
            decoder: FrameDecoder::new(config.max_distance),
            filter: DistanceFilter::new(config.epsilon, config.max_distance, config.normalize),
            sinks: Vec::new(),
            ctx: config.sink_context(),
            interval: config.interval(),
            running: Arc::new(AtomicBool::new(true)),
            summary: LoopSummary::new(),
        }
    }

    /// Append a sink; fan-out follows insertion order
    pub fn add_sink(&mut self, sink: S) {
        self.summary.add_sink(sink.name());
        self.sinks.push(sink);
    }

    pub fn sinks(&self) -> &[S] {
        &self.sinks
    }

    pub fn context(&self) -> &SinkContext {
        &self.ctx
    }

    pub fn filter(&self) -> &DistanceFilter {
        &self.filter
    }

    pub fn summary(&self) -> &LoopSummary {
        &self.summary
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle for stopping the loop from another task
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Open the transport (no-op when already open)
    pub fn open(&mut self) -> Result<()> {
        if !self.transport.is_open() {
            self.transport.open()?;
            info!(device = %self.transport.name(), "Sensor opened");
        }
        Ok(())
    }

    /// Close the transport (no-op when already closed)
    pub fn close(&mut self) -> Result<()> {
        if self.transport.is_open() {
            self.transport.close()?;
            info!(device = %self.transport.name(), "Sensor closed");
        }
        Ok(())
    }

    /// Run until stopped
    ///
    /// The stop flag is checked once per iteration, before `update()`; an
    /// update in progress always completes. A stop requested before `start`
    /// makes it return immediately.
    #[instrument(name = "sensor_loop_run", skip(self), fields(device = %self.transport.name()))]
    pub async fn start(&mut self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            sinks = self.sinks.len(),
            "Sensor loop started"
        );

        while self.running.load(Ordering::SeqCst) {
            self.update().await;
            tokio::time::sleep(self.interval).await;
        }

        info!(
            frames = self.summary.frames,
            accepted = self.summary.accepted,
            "Sensor loop stopped"
        );
    }

    /// Request a cooperative stop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One tick: read a frame if enough bytes are buffered, filter, fan out
    ///
    /// Returns the accepted reading, if any. Never fails; transport and
    /// sink errors are logged and counted.
    pub async fn update(&mut self) -> Option<Reading> {
        let available = match self.transport.bytes_to_read() {
            Ok(n) => n,
            Err(e) => {
                self.summary.record_read_error();
                warn!(error = %e, "Serial poll failed");
                return None;
            }
        };

        // Wait for more than one frame's worth before reading
        if available <= FRAME_LEN {
            return None;
        }

        let distance = match self.decoder.read_frame(&mut self.transport) {
            Ok(Some(distance)) => {
                self.summary.record_frame(true);
                distance
            }
            Ok(None) => {
                self.summary.record_frame(false);
                trace!("Frame without sync header skipped");
                return None;
            }
            Err(e) => {
                self.summary.record_read_error();
                warn!(error = %e, "Serial read failed");
                return None;
            }
        };

        let reading = self.filter.apply(distance)?;
        self.summary.record_accepted(reading.distance);
        debug!(distance = reading.distance, value = %reading.value, "Reading accepted");

        self.fan_out(&reading).await;
        Some(reading)
    }

    /// `Ok` from a sink counts as sent; sinks with their own delivery
    /// counters report actual writes there
    async fn fan_out(&mut self, reading: &Reading) {
        for (index, sink) in self.sinks.iter_mut().enumerate() {
            match sink.send(reading, &self.ctx).await {
                Ok(()) => self.summary.record_send(index, true),
                Err(e) => {
                    self.summary.record_send(index, false);
                    // Continue - one sink never blocks the others
                    error!(sink = %sink.name(), error = %e, "Send failed");
                }
            }
        }
    }

    /// Close every sink, waiting for in-flight sends
    pub async fn shutdown_sinks(&mut self) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.close().await {
                error!(sink = %sink.name(), error = %e, "Close failed on shutdown");
            }
        }
        debug!("Sinks shut down");
    }

    /// Settings summary
    pub fn describe(&self) -> String {
        let device_id = self
            .ctx
            .device_id
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        format!(
            "tfluna: device id {}, max distance {}, epsilon {}, interval {:.3}s, normalize {}",
            device_id,
            self.ctx.max_distance,
            self.filter.epsilon(),
            self.interval.as_secs_f64(),
            self.filter.normalize()
        )
    }
}
