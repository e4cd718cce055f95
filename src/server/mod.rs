//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Piezas del servidor, de afuera hacia adentro:
//!
//! 1. `listener`: socket de escucha y accept loop
//! 2. `connection`: socket de un cliente aceptado
//! 3. `handler`: lee el request y decide la respuesta
//! 4. `gate`: validación del path (400 / 403)
//! 5. `emitter`: respuestas de error con cuerpo HTML fijo
//!
//! `serve` arma todo a partir de la configuración y bloquea hasta el apagado.

pub mod connection;
pub mod emitter;
pub mod gate;
pub mod handler;
pub mod listener;

pub use connection::Connection;
pub use handler::ConnectionHandler;
pub use listener::{bind, Server};

use crate::config::Config;
use crate::dispatch;
use crate::error::ServerError;
use crate::lifecycle::signals;
use crate::metrics::MetricsCollector;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;

/// Arranca el servidor y atiende hasta SIGINT/SIGTERM o un error fatal
pub fn serve(config: &Config) -> Result<(), ServerError> {
    config.validate()?;

    // Antes de crear cualquier thread, para que todos hereden la máscara
    let signal_set = signals::block_shutdown_signals()?;

    let listener = listener::bind(config.socket_addr()?)?;
    let metrics = MetricsCollector::new();
    let handler = Arc::new(ConnectionHandler::from_config(config, metrics.clone()));
    let dispatcher = dispatch::build(config, handler, listener.as_raw_fd(), metrics.clone())?;

    let server = Server::new(listener, dispatcher, metrics)?;
    signals::spawn_signal_listener(signal_set, server.shutdown_handle())?;

    config.print_summary();
    server.run()
}
