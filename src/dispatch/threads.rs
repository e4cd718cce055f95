//! # Pool de Threads
//! src/dispatch/threads.rs
//!
//! El accept loop encola cada conexión y N workers fijos la atienden. Con
//! la cola llena, `dispatch` espera (backpressure); si hay un timeout de
//! encolado configurado y se vence, la conexión se cierra sin respuesta.

use crate::dispatch::pool::WorkerPool;
use crate::dispatch::queue::PushError;
use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, StartupError};
use crate::metrics::MetricsCollector;
use crate::server::connection::Connection;
use crate::server::handler::ConnectionHandler;
use std::sync::Arc;
use std::time::Duration;

pub struct ThreadPoolDispatcher {
    pool: WorkerPool<Connection>,
    metrics: MetricsCollector,
}

impl ThreadPoolDispatcher {
    pub fn new(
        workers: usize,
        queue_capacity: usize,
        enqueue_timeout: Option<Duration>,
        handler: Arc<ConnectionHandler>,
        metrics: MetricsCollector,
    ) -> Result<Self, StartupError> {
        let job = move |connection: Connection| {
            let _ = handler.handle(connection);
        };
        let pool = WorkerPool::new(workers, queue_capacity, enqueue_timeout, job)?;

        tracing::info!(
            workers,
            queue_capacity,
            "🧵 Pool de {} workers listo",
            workers
        );

        Ok(Self { pool, metrics })
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Conexiones esperando un worker
    pub fn queued(&self) -> usize {
        self.pool.queued()
    }
}

impl Dispatcher for ThreadPoolDispatcher {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn dispatch(&self, connection: Connection) -> Result<(), DispatchError> {
        match self.pool.submit(connection) {
            Ok(()) => Ok(()),
            Err(PushError::Full(connection)) => {
                drop(connection);
                self.metrics.record_dropped();
                let waited = self.pool.enqueue_timeout().unwrap_or_default();
                Err(DispatchError::QueueFull(waited))
            }
            Err(PushError::Closed(connection)) => {
                drop(connection);
                self.metrics.record_dropped();
                Err(DispatchError::PoolClosed)
            }
        }
    }

    fn shutdown(&mut self) {
        tracing::info!(pending = self.pool.queued(), "⏳ Esperando a los workers...");
        self.pool.shutdown();
    }
}
