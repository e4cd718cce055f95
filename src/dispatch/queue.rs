//! # Cola Acotada
//! src/dispatch/queue.rs
//!
//! Cola FIFO thread-safe con capacidad fija. `push` bloquea mientras esté
//! llena (backpressure hacia el accept loop) y `pop` bloquea mientras esté
//! vacía. Al cerrarla, `push` falla y `pop` sigue entregando lo que quedó
//! hasta vaciarla.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Por qué no se pudo encolar; devuelve el elemento
#[derive(Debug, PartialEq, Eq)]
pub enum PushError<T> {
    /// Sigue llena después del timeout
    Full(T),
    /// La cola fue cerrada
    Closed(T),
}

impl<T> PushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) | PushError::Closed(item) => item,
        }
    }
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Cola FIFO acotada
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,

    /// Se notifica al encolar
    not_empty: Condvar,

    /// Se notifica al desencolar
    not_full: Condvar,

    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola vacía; la capacidad mínima es 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola al final
    ///
    /// Con `timeout = None` espera lo que haga falta a que haya lugar.
    pub fn push(&self, item: T, timeout: Option<Duration>) -> Result<(), PushError<T>> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.lock();

        loop {
            if state.closed {
                return Err(PushError::Closed(item));
            }

            if state.items.len() < self.capacity {
                state.items.push_back(item);
                drop(state);
                self.not_empty.notify_one();
                return Ok(());
            }

            state = match deadline {
                None => self
                    .not_full
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(PushError::Full(item));
                    }
                    self.not_full
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Desencola el primero; `None` solo cuando está cerrada y vacía
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }

            if state.closed {
                return None;
            }

            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola y despierta a todos los que esperan
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(4);
        for i in 1..=3 {
            queue.push(i, None).unwrap();
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_times_out() {
        let queue = BoundedQueue::new(2);
        queue.push("a", None).unwrap();
        queue.push("b", None).unwrap();

        let start = Instant::now();
        let result = queue.push("c", Some(Duration::from_millis(50)));

        assert_eq!(result, Err(PushError::Full("c")));
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_push_blocks_until_slot_frees() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1, None).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2, None))
        };

        thread::sleep(Duration::from_millis(50));
        // El productor sigue bloqueado: la cola tiene un solo lugar
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.pop(), Some(1));
        producer.join().unwrap().unwrap();
        assert_eq!(queue.pop(), Some(2));
    }

    #[test]
    fn test_close_drains_then_ends() {
        let queue = BoundedQueue::new(4);
        queue.push(10, None).unwrap();
        queue.push(20, None).unwrap();
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.push(30, None), Err(PushError::Closed(30)));
        assert_eq!(queue.pop(), Some(10));
        assert_eq!(queue.pop(), Some(20));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_close_wakes_blocked_consumer() {
        let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new(1));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn test_close_wakes_blocked_producer() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1, None).unwrap();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2, None))
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert_eq!(producer.join().unwrap(), Err(PushError::Closed(2)));
    }

    #[test]
    fn test_zero_capacity_becomes_one() {
        let queue = BoundedQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.push('x', Some(Duration::from_millis(1))).unwrap();
        assert_eq!(queue.push('y', Some(Duration::from_millis(1))), Err(PushError::Full('y')));
        assert_eq!(PushError::Full('y').into_inner(), 'y');
    }
}
