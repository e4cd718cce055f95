//! # Conexión con un Cliente
//! src/server/connection.rs
//!
//! Envuelve el socket aceptado junto con la dirección del cliente. Quien
//! tiene la `Connection` es su único dueño; al soltarla se cierra el socket.
//!
//! Soltar la conexión solo cierra el descriptor, no hace `shutdown(2)`: en
//! modo procesos el padre suelta su copia mientras el hijo sigue usando la
//! suya sobre el mismo socket.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Socket de un cliente aceptado
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    /// Dirección y puerto del cliente
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Aplica timeouts de lectura y escritura (`None` = sin límite)
    pub fn set_deadlines(&self, read: Option<Duration>, write: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(read)?;
        self.stream.set_write_timeout(write)
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        tracing::trace!(peer = %self.peer, "conexión cerrada");
    }
}

/// Par conectado por loopback: la `Connection` del lado servidor y el
/// socket del cliente
#[cfg(test)]
pub(crate) fn loopback_pair() -> (Connection, TcpStream) {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let client = TcpStream::connect(listener.local_addr().expect("addr")).expect("connect");
    let (stream, peer) = listener.accept().expect("accept");
    (Connection::new(stream, peer), client)
}
