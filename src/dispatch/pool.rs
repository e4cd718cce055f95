//! # Pool de Workers
//! src/dispatch/pool.rs
//!
//! N threads fijos que consumen de una `BoundedQueue` compartida. Cada
//! elemento lo procesa exactamente un worker. Un panic dentro del trabajo
//! se contiene: el elemento se suelta (se cierra la conexión) y el worker
//! vuelve a esperar en la cola.
//!
//! `shutdown` cierra la cola, deja que los workers terminen lo encolado y
//! los espera.

use crate::dispatch::queue::{BoundedQueue, PushError};
use crate::error::StartupError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

/// Pool fijo de workers con cola acotada
pub struct WorkerPool<T: Send + 'static> {
    queue: Arc<BoundedQueue<T>>,
    workers: Vec<Worker>,
    enqueue_timeout: Option<Duration>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Lanza `size` workers que ejecutan `job` sobre cada elemento
    ///
    /// # Ejemplo
    /// ```
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    /// use web_server::dispatch::pool::WorkerPool;
    ///
    /// let done = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&done);
    /// let mut pool = WorkerPool::new(2, 8, None, move |n: usize| {
    ///     counter.fetch_add(n, Ordering::SeqCst);
    /// })
    /// .unwrap();
    ///
    /// for n in 1..=4 {
    ///     pool.submit(n).unwrap();
    /// }
    /// pool.shutdown();
    /// assert_eq!(done.load(Ordering::SeqCst), 10);
    /// ```
    pub fn new<F>(
        size: usize,
        capacity: usize,
        enqueue_timeout: Option<Duration>,
        job: F,
    ) -> Result<Self, StartupError>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let job = Arc::new(job);
        let mut pool = Self {
            queue: Arc::new(BoundedQueue::new(capacity)),
            workers: Vec::with_capacity(size),
            enqueue_timeout,
        };

        for id in 0..size {
            let queue = Arc::clone(&pool.queue);
            let job = Arc::clone(&job);
            let name = format!("worker-{}", id);

            // Si falla, el Drop del pool cierra la cola y espera a los ya creados
            let thread = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(id, &queue, &*job))
                .map_err(|source| StartupError::SpawnThread { name, source })?;

            pool.workers.push(Worker {
                id,
                thread: Some(thread),
            });
        }

        Ok(pool)
    }

    /// Entrega un elemento a los workers
    ///
    /// Bloquea si la cola está llena; con `enqueue_timeout` configurado se
    /// rinde después de esa espera y devuelve el elemento.
    pub fn submit(&self, item: T) -> Result<(), PushError<T>> {
        self.queue.push(item, self.enqueue_timeout)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Elementos esperando un worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn enqueue_timeout(&self) -> Option<Duration> {
        self.enqueue_timeout
    }

    /// Cierra la cola, procesa lo pendiente y espera a todos los workers
    pub fn shutdown(&mut self) {
        self.queue.close();

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    tracing::warn!(worker = worker.id, "el worker terminó con panic");
                }
            }
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<T, F>(id: usize, queue: &BoundedQueue<T>, job: &F)
where
    F: Fn(T),
{
    tracing::debug!(worker = id, "worker listo");

    while let Some(item) = queue.pop() {
        if panic::catch_unwind(AssertUnwindSafe(|| job(item))).is_err() {
            tracing::error!(worker = id, "panic procesando un elemento; se descartó");
        }
    }

    tracing::debug!(worker = id, "worker terminado");
}
