//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores:
//!
//! - `StartupError`: fatales antes de empezar a servir (argumentos, socket, bind)
//! - `ServerError`: fatales mientras se sirve (accept)
//! - `DispatchError`: locales a una conexión (fork, cola llena); el servidor sigue
//! - `SendFailure`: el cliente no recibió la respuesta completa; el servidor sigue
//!
//! Los errores de parsing viven en `http::request::ParseError`.

use crate::http::StatusCode;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errores que impiden arrancar el servidor
#[derive(Debug, Error)]
pub enum StartupError {
    /// Faltan argumentos posicionales; el texto es el uso del programa
    #[error("{0}")]
    Usage(String),

    /// `--help` o `--version`; no es un error real
    #[error("{0}")]
    DisplayInfo(String),

    /// Argumento con valor inválido (puerto fuera de rango, modo desconocido...)
    #[error("{0}")]
    InvalidArgument(String),

    /// Combinación de opciones inválida
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("socket: {0}")]
    Socket(#[source] io::Error),

    #[error("setsockopt(SO_REUSEADDR): {0}")]
    ReuseAddr(#[source] io::Error),

    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("listen: {0}")]
    Listen(#[source] io::Error),

    /// No se pudo crear un worker, el reaper o el thread de señales
    #[error("failed to spawn thread '{name}': {source}")]
    SpawnThread {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("signal mask: {0}")]
    Signals(#[source] nix::Error),
}

/// Errores fatales del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("accept: {0}")]
    Accept(#[source] io::Error),
}

/// Errores al entregar una conexión a la estrategia de despacho
///
/// En todos los casos la conexión ya fue cerrada, sin respuesta.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("fork: {0}")]
    Fork(#[source] nix::Error),

    #[error("work queue still full after {0:?}")]
    QueueFull(Duration),

    #[error("worker pool is shut down")]
    PoolClosed,
}

/// Falló la escritura de una respuesta
#[derive(Debug, Error)]
#[error("failed to send {status}: {source}")]
pub struct SendFailure {
    pub status: StatusCode,
    #[source]
    pub source: io::Error,
}
