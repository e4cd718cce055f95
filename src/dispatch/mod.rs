//! # Estrategias de Despacho
//! src/dispatch/mod.rs
//!
//! Deciden en qué unidad de ejecución se atiende cada conexión aceptada:
//!
//! - `sequential`: en el mismo thread del accept loop
//! - `processes`: un proceso hijo (`fork`) por conexión
//! - `threads`: un pool fijo de workers con cola acotada
//!
//! Todas ejecutan el mismo `ConnectionHandler`, así que producen las mismas
//! respuestas. Los errores de `dispatch` son locales a la conexión: el
//! accept loop los registra y sigue.

pub mod pool;
pub mod process;
pub mod queue;
pub mod reaper;
pub mod sequential;
pub mod threads;

pub use process::{ChildHandle, ChildSpawner, ChildWork, ForkSpawner, ProcessDispatcher};
pub use sequential::SequentialDispatcher;
pub use threads::ThreadPoolDispatcher;

use crate::config::{Config, Mode};
use crate::error::{DispatchError, StartupError};
use crate::metrics::MetricsCollector;
use crate::server::connection::Connection;
use crate::server::handler::ConnectionHandler;
use std::os::unix::io::RawFd;
use std::sync::Arc;

/// Estrategia de ejecución por conexión
pub trait Dispatcher: Send {
    /// Nombre corto para logs (`sequential`, `processes`, `threads`)
    fn name(&self) -> &'static str;

    /// Entrega la conexión a su unidad de ejecución
    ///
    /// Cuando devuelve `Err`, la conexión ya fue cerrada sin respuesta.
    fn dispatch(&self, connection: Connection) -> Result<(), DispatchError>;

    /// Termina el trabajo en curso antes de apagar el servidor
    fn shutdown(&mut self) {}
}

/// Construye la estrategia elegida en la configuración
///
/// `listener_fd` es el socket de escucha; en modo procesos los hijos lo
/// cierran apenas nacen.
pub fn build(
    config: &Config,
    handler: Arc<ConnectionHandler>,
    listener_fd: RawFd,
    metrics: MetricsCollector,
) -> Result<Box<dyn Dispatcher>, StartupError> {
    let dispatcher: Box<dyn Dispatcher> = match config.mode {
        Mode::Sequential => Box::new(SequentialDispatcher::new(handler)),
        Mode::Processes => {
            let spawner = ForkSpawner::new(vec![listener_fd])?;
            Box::new(ProcessDispatcher::new(spawner, handler, metrics))
        }
        Mode::Threads => Box::new(ThreadPoolDispatcher::new(
            config.workers,
            config.queue_capacity,
            config.enqueue_timeout(),
            handler,
            metrics,
        )?),
    };

    tracing::debug!(mode = dispatcher.name(), "estrategia de despacho lista");
    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_for(mode: Mode) -> Box<dyn Dispatcher> {
        let config = Config {
            mode,
            workers: 2,
            ..Config::default()
        };
        let metrics = MetricsCollector::new();
        let handler = Arc::new(ConnectionHandler::from_config(&config, metrics.clone()));
        build(&config, handler, -1, metrics).unwrap()
    }

    #[test]
    fn test_build_matches_mode() {
        assert_eq!(build_for(Mode::Sequential).name(), "sequential");
        assert_eq!(build_for(Mode::Threads).name(), "threads");
    }

    #[test]
    fn test_build_and_shutdown_each_mode() {
        for mode in [Mode::Sequential, Mode::Processes, Mode::Threads] {
            let mut dispatcher = build_for(mode);
            assert_eq!(dispatcher.name(), mode.as_str());
            dispatcher.shutdown();
        }
    }
}
