//! # Respuestas Enlatadas
//! src/server/emitter.rs
//!
//! Las tres respuestas de error que produce el servidor. Todas son HTML
//! mínimo con `Content-Type: text/html`.

use crate::http::{response, StatusCode};
use std::io::{self, Write};

/// Body HTML de cada respuesta
pub fn canned_body(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BadRequest => "<center><h1>400 Bad Request</h1><hr></center>",
        StatusCode::Forbidden => "<center><h1>403 Forbidden</h1><hr></center>",
        StatusCode::NotFound => "<center><h1>404 Not Found</h1><hr></center>",
    }
}

/// Escribe la respuesta completa en un solo envío; ante un error no se
/// vuelve a intentar
pub fn send_canned<W: Write>(writer: &mut W, status: StatusCode) -> io::Result<()> {
    let mut out = Vec::new();

    response::start_response(&mut out, status)?;
    response::send_header(&mut out, "Content-Type", "text/html")?;
    response::end_headers(&mut out)?;
    response::send_body(&mut out, canned_body(status).as_bytes())?;

    writer.write_all(&out)?;
    writer.flush()
}
