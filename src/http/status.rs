//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! El servidor solo responde con tres códigos, todos de error del cliente:
//!
//! - **400**: el request no se pudo parsear o el path es inválido
//! - **403**: el path contiene `..`
//! - **404**: el recurso no existe (la búsqueda de archivos no está implementada)

/// Códigos de estado que emite el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 400 Bad Request - Request malformado o path que no empieza con `/`
    BadRequest = 400,

    /// 403 Forbidden - Intento de directory traversal
    Forbidden = 403,

    /// 404 Not Found - Recurso no encontrado
    NotFound = 404,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use web_server::http::StatusCode;
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) del RFC 1945
    ///
    /// # Ejemplo
    /// ```
    /// use web_server::http::StatusCode;
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "403 Forbidden"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
