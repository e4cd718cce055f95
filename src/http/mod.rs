//! # Módulo HTTP
//! src/http/mod.rs
//!
//! La parte del protocolo que el servidor necesita, y nada más:
//!
//! - Lectura y parsing de requests HTTP/1.0
//! - Escritura de la respuesta paso a paso (status, headers, body)
//! - Los códigos de estado que se emiten
//!
//! El resto del servidor trata este módulo como una caja negra: no sabe
//! cómo se parsea un request, solo recibe un `Request` o un `ParseError`.

pub mod request;   // Lectura y parsing de requests
pub mod response;  // Escritura de respuestas sobre el socket
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Method, ParseError, Request};
pub use status::StatusCode;
