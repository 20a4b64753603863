//! WorkerPool - bounded queue of background jobs drained by N tasks

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::DeliveryMetrics;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Fixed-size pool of tokio worker tasks
///
/// Jobs are queued without blocking the caller. A full queue drops the job.
pub struct WorkerPool {
    /// Pool name (logs/metrics)
    name: String,
    /// Queue shared by all workers
    tx: Sender<Job>,
    /// Shared metrics
    metrics: Arc<DeliveryMetrics>,
    /// Worker task handles
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks over a queue of `queue_capacity` jobs
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        name: impl Into<String>,
        workers: usize,
        queue_capacity: usize,
        metrics: Arc<DeliveryMetrics>,
    ) -> Self {
        let name = name.into();
        let (tx, rx) = async_channel::bounded(queue_capacity.max(1));

        let workers = (0..workers.max(1))
            .map(|id| {
                let rx = rx.clone();
                let metrics = Arc::clone(&metrics);
                let name = name.clone();
                tokio::spawn(async move { pool_worker(id, rx, metrics, name).await })
            })
            .collect();

        Self {
            name,
            tx,
            metrics,
            workers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of live worker tasks
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn metrics(&self) -> &Arc<DeliveryMetrics> {
        &self.metrics
    }

    /// Queue a job (non-blocking)
    ///
    /// Returns false if the job was dropped.
    pub fn submit<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.tx.try_send(Box::pin(job)) {
            Ok(()) => {
                self.metrics.set_queued(self.tx.len());
                true
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_dropped();
                observability::record_pool_dropped(&self.name);
                warn!(pool = %self.name, "Queue full, job dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                error!(pool = %self.name, "Worker pool already shut down");
                false
            }
        }
    }

    /// Close the queue and wait for queued jobs to finish
    ///
    /// Calling it again is a no-op.
    #[instrument(name = "worker_pool_shutdown", skip(self), fields(pool = %self.name))]
    pub async fn shutdown(&mut self) {
        self.tx.close();
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                error!(pool = %self.name, error = ?e, "Worker task panicked");
            }
        }
        debug!(pool = %self.name, "WorkerPool shutdown complete");
    }
}

/// Worker task: runs jobs until the queue is closed and drained
async fn pool_worker(id: usize, rx: Receiver<Job>, metrics: Arc<DeliveryMetrics>, name: String) {
    debug!(pool = %name, worker = id, "Pool worker started");

    while let Ok(job) = rx.recv().await {
        metrics.set_queued(rx.len());
        job.await;
    }

    debug!(pool = %name, worker = id, "Pool worker stopped");
}
