//! # Gate de Seguridad
//! src/server/gate.rs
//!
//! Decide si un request puede llegar a la búsqueda de archivos. Es un
//! chequeo textual, no una canonicalización: cualquier `..` en el target se
//! rechaza, aunque el path resultante quedara dentro del sitio.

use crate::http::{Request, StatusCode};

/// Resultado del gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// El request puede seguir
    Allow,
    /// No hubo request válido, o el path no empieza con `/`
    BadRequest,
    /// El path contiene `..`
    Forbidden,
}

impl Verdict {
    /// Código con el que se rechaza, si corresponde
    pub fn rejection(&self) -> Option<StatusCode> {
        match self {
            Verdict::Allow => None,
            Verdict::BadRequest => Some(StatusCode::BadRequest),
            Verdict::Forbidden => Some(StatusCode::Forbidden),
        }
    }
}

/// Inspecciona el resultado del parser; `None` significa que no se pudo parsear
pub fn inspect(request: Option<&Request>) -> Verdict {
    match request {
        Some(request) => check_path(request.path()),
        None => Verdict::BadRequest,
    }
}

/// Aplica las reglas sobre el target crudo
///
/// # Ejemplo
/// ```
/// use web_server::server::gate::{check_path, Verdict};
///
/// assert_eq!(check_path("/index.html"), Verdict::Allow);
/// assert_eq!(check_path("/../etc/passwd"), Verdict::Forbidden);
/// assert_eq!(check_path("index.html"), Verdict::BadRequest);
/// ```
pub fn check_path(path: &str) -> Verdict {
    if !path.starts_with('/') {
        Verdict::BadRequest
    } else if path.contains("..") {
        Verdict::Forbidden
    } else {
        Verdict::Allow
    }
}
