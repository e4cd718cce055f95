//! # Socket de Escucha y Accept Loop
//! src/server/listener.rs
//!
//! `bind` arma el socket de escucha paso a paso para distinguir cada falla
//! (socket, SO_REUSEADDR, bind, listen). `Server::run` acepta conexiones y
//! se las entrega a la estrategia de despacho hasta que falla `accept` o
//! llega la conexión de despertar del apagado.

use crate::dispatch::Dispatcher;
use crate::error::{ServerError, StartupError};
use crate::lifecycle::ShutdownHandle;
use crate::metrics::MetricsCollector;
use crate::server::connection::Connection;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, TcpListener};

/// Conexiones completas esperando `accept`
const LISTEN_BACKLOG: i32 = 128;

/// Crea el socket TCP, activa SO_REUSEADDR, hace bind y listen
pub fn bind(addr: SocketAddr) -> Result<TcpListener, StartupError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(StartupError::Socket)?;

    socket
        .set_reuse_address(true)
        .map_err(StartupError::ReuseAddr)?;

    socket
        .bind(&addr.into())
        .map_err(|source| StartupError::Bind { addr, source })?;

    socket.listen(LISTEN_BACKLOG).map_err(StartupError::Listen)?;

    Ok(socket.into())
}

/// Accept loop ligado a una estrategia de despacho
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    dispatcher: Box<dyn Dispatcher>,
    shutdown: ShutdownHandle,
    metrics: MetricsCollector,
}

impl Server {
    pub fn new(
        listener: TcpListener,
        dispatcher: Box<dyn Dispatcher>,
        metrics: MetricsCollector,
    ) -> Result<Self, StartupError> {
        let local_addr = listener.local_addr().map_err(StartupError::Socket)?;

        Ok(Self {
            listener,
            local_addr,
            dispatcher,
            shutdown: ShutdownHandle::new(local_addr),
            metrics,
        })
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle para pedir el apagado desde otro thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Acepta conexiones hasta que falle `accept` o se pida el apagado
    ///
    /// Al salir, por cualquiera de los dos caminos, la estrategia termina lo
    /// que tenga en curso.
    pub fn run(mut self) -> Result<(), ServerError> {
        tracing::info!(
            "🚀 Servidor escuchando en {} (modo {})",
            self.local_addr,
            self.dispatcher.name()
        );

        let result = self.accept_loop();

        tracing::info!("🛑 Deteniendo el servidor...");
        self.dispatcher.shutdown();
        tracing::info!("📊 Métricas: {}", self.metrics.to_json());

        result
    }

    fn accept_loop(&mut self) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("💥 Error en accept: {}", e);
                    return Err(ServerError::Accept(e));
                }
            };

            // La conexión que despierta al loop no se atiende
            if self.shutdown.is_requested() && self.shutdown.is_wake_connection(peer) {
                drop(stream);
                return Ok(());
            }

            tracing::info!("✅ Conexión aceptada desde {}:{}", peer.ip(), peer.port());
            self.metrics.record_accept();

            if let Err(e) = self.dispatcher.dispatch(Connection::new(stream, peer)) {
                tracing::warn!(%peer, "   ❌ Conexión descartada: {}", e);
            }
        }
    }
}
