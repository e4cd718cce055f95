//! # Escritura de Respuestas HTTP
//! src/http/response.rs
//!
//! Primitivas para escribir una respuesta HTTP/1.0 directamente sobre el
//! socket, en este orden:
//!
//! ```text
//! start_response   →  HTTP/1.0 404 Not Found\r\n
//! send_header      →  Content-Type: text/html\r\n      (0..n veces)
//! end_headers      →  \r\n
//! send_body        →  <center>...</center>
//! ```
//!
//! Cada paso retorna `io::Result<()>`: quien llama decide qué hacer si el
//! cliente ya no está. HTTP/1.0 sin `Content-Length` delimita el body con el
//! cierre de la conexión.

use super::StatusCode;
use std::io::{self, Write};

/// Escribe la status line
///
/// # Ejemplo
/// ```
/// use web_server::http::{response, StatusCode};
///
/// let mut out = Vec::new();
/// response::start_response(&mut out, StatusCode::NotFound).unwrap();
/// assert_eq!(out, b"HTTP/1.0 404 Not Found\r\n");
/// ```
pub fn start_response<W: Write>(writer: &mut W, status: StatusCode) -> io::Result<()> {
    write!(writer, "HTTP/1.0 {}\r\n", status)
}

/// Escribe un header `Name: Value`
pub fn send_header<W: Write>(writer: &mut W, name: &str, value: &str) -> io::Result<()> {
    write!(writer, "{}: {}\r\n", name, value)
}

/// Escribe la línea vacía que separa headers del body
pub fn end_headers<W: Write>(writer: &mut W) -> io::Result<()> {
    writer.write_all(b"\r\n")
}

/// Escribe el body completo
pub fn send_body<W: Write>(writer: &mut W, body: &[u8]) -> io::Result<()> {
    writer.write_all(body)
}
