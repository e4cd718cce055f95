//! # Apagado Ordenado
//! src/lifecycle/shutdown.rs
//!
//! El accept loop está bloqueado en `accept`, que reintenta solo ante
//! `EINTR`. Para despertarlo, `trigger` marca el pedido y abre una conexión
//! de loopback contra el propio listener desde un puerto conocido. El loop
//! reconoce esa conexión por su dirección de origen y termina; un cliente
//! real que haya quedado en la cola antes que ella se sigue atendiendo.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Pedido de apagado compartido entre el accept loop y quien lo dispara
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    triggered: Arc<AtomicBool>,
    /// Origen de la conexión de despertar; `None` si no se pudo fijar
    wake_from: Arc<Mutex<Option<SocketAddr>>>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// `listen_addr` es la dirección local del listener
    pub fn new(listen_addr: SocketAddr) -> Self {
        // 0.0.0.0 / :: no sirven como destino
        let wake_ip = match listen_addr.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            ip => ip,
        };

        Self {
            requested: Arc::new(AtomicBool::new(false)),
            triggered: Arc::new(AtomicBool::new(false)),
            wake_from: Arc::new(Mutex::new(None)),
            wake_addr: SocketAddr::new(wake_ip, listen_addr.port()),
        }
    }

    /// Pide el apagado; solo la primera llamada despierta al accept loop
    pub fn trigger(&self) {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return;
        }

        // El origen queda fijado antes de que el loop vea la marca
        let wake = self.wake_socket();
        *self.wake_from() = wake.as_ref().ok().map(|(_, from)| *from);
        self.requested.store(true, Ordering::SeqCst);

        // Si falla, el loop igual termina en el próximo accept
        let connected = wake.and_then(|(socket, _)| {
            socket.connect_timeout(&self.wake_addr.into(), WAKE_TIMEOUT)
        });
        if connected.is_err() {
            *self.wake_from() = None;
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Indica si `peer` es la conexión abierta por `trigger`
    ///
    /// Sin origen conocido, cualquier conexión aceptada tras el pedido cuenta
    /// como la de despertar.
    pub fn is_wake_connection(&self, peer: SocketAddr) -> bool {
        match *self.wake_from() {
            Some(from) => from.ip() == peer.ip() && from.port() == peer.port(),
            None => true,
        }
    }

    pub fn wake_addr(&self) -> SocketAddr {
        self.wake_addr
    }

    /// Socket ya ligado a un puerto efímero, listo para conectar
    fn wake_socket(&self) -> io::Result<(Socket, SocketAddr)> {
        let socket = Socket::new(
            Domain::for_address(self.wake_addr),
            Type::STREAM,
            Some(Protocol::TCP),
        )?;
        socket.bind(&SocketAddr::new(self.wake_addr.ip(), 0).into())?;

        let from = socket
            .local_addr()?
            .as_socket()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "wake socket is not inet"))?;
        Ok((socket, from))
    }

    fn wake_from(&self) -> MutexGuard<'_, Option<SocketAddr>> {
        self.wake_from.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
