//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser mínimo de HTTP/1.0. Solo entiende lo necesario para decidir la
//! respuesta: request line, headers y los bytes de body que lleguen junto
//! con ellos (no hay framing por `Content-Length`).
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! GET /index.html HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! User-Agent: curl/7.68.0\r\n
//! \r\n
//! ```
//!
//! El target se guarda tal cual llega (query incluida): el gate de seguridad
//! tiene que ver todos los bytes que mandó el cliente.

use std::collections::HashMap;
use std::io::{self, Read};

/// Tamaño máximo de request line + headers
pub const MAX_HEADER_BYTES: usize = 8192;

/// Fin de los headers
const HEADERS_END: &[u8] = b"\r\n\r\n";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,

    /// POST - Enviar datos a un recurso
    POST,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// Retorna error si el método no es soportado
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET, HEAD, POST)
    method: Method,

    /// Target de la petición, sin decodificar (ej: "/docs/a.html?v=2")
    path: String,

    /// Headers HTTP (ej: {"Host": "localhost:8080"})
    headers: HashMap<String, String>,

    /// Versión HTTP ("HTTP/1.0" o "HTTP/1.1")
    version: String,

    /// Bytes recibidos después de la línea vacía
    body: Vec<u8>,
}

/// Errores que pueden ocurrir al leer o parsear un request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// El stream terminó antes de la línea vacía que cierra los headers
    IncompleteRequest,

    /// Formato inválido de la request line
    InvalidRequestLine,

    /// Método HTTP no soportado
    UnsupportedMethod(String),

    /// Versión HTTP incorrecta
    InvalidHttpVersion(String),

    /// Header malformado
    InvalidHeader(String),

    /// Request vacío
    EmptyRequest,

    /// Request line + headers superan `MAX_HEADER_BYTES`
    HeadersTooLarge,

    /// Falló la lectura del socket (incluye timeouts de lectura)
    Unreadable(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncompleteRequest => write!(f, "Incomplete HTTP request"),
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
            ParseError::InvalidHttpVersion(v) => write!(f, "Invalid HTTP version: {}", v),
            ParseError::InvalidHeader(h) => write!(f, "Invalid header: {}", h),
            ParseError::EmptyRequest => write!(f, "Empty request"),
            ParseError::HeadersTooLarge => {
                write!(f, "Request headers exceed {} bytes", MAX_HEADER_BYTES)
            }
            ParseError::Unreadable(e) => write!(f, "Could not read request: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

/// Lee un request completo desde el stream y lo parsea
///
/// Lee hasta encontrar la línea vacía que cierra los headers, hasta EOF o
/// hasta `MAX_HEADER_BYTES`, lo que ocurra primero.
///
/// # Ejemplo
///
/// ```
/// use std::io::Cursor;
/// use web_server::http::request::read_request;
///
/// let mut stream = Cursor::new(b"GET /index.html HTTP/1.0\r\n\r\n".to_vec());
/// let request = read_request(&mut stream).unwrap();
/// assert_eq!(request.path(), "/index.html");
/// ```
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request, ParseError> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let bytes_read = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ParseError::Unreadable(e.to_string())),
        };

        if bytes_read == 0 {
            // EOF sin la línea vacía
            if buffer.iter().all(u8::is_ascii_whitespace) {
                return Err(ParseError::EmptyRequest);
            }
            return Err(ParseError::IncompleteRequest);
        }

        buffer.extend_from_slice(&chunk[..bytes_read]);

        if find_headers_end(&buffer).is_some() {
            return Request::parse(&buffer);
        }
        if buffer.len() >= MAX_HEADER_BYTES {
            return Err(ParseError::HeadersTooLarge);
        }
    }
}

/// Posición donde empieza `\r\n\r\n`, si existe
fn find_headers_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADERS_END.len())
        .position(|window| window == HEADERS_END)
}

impl Request {
    /// Parsea un request HTTP/1.0 desde bytes
    ///
    /// El buffer debe contener la línea vacía que cierra los headers; lo que
    /// venga después se guarda como body.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use web_server::http::Request;
    ///
    /// let raw = b"GET /docs/a.html?v=2 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/docs/a.html?v=2");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::EmptyRequest);
        }

        let head_end = find_headers_end(buffer).ok_or(ParseError::IncompleteRequest)?;

        // Request line y headers deben ser UTF-8 válido
        let head = std::str::from_utf8(&buffer[..head_end])
            .map_err(|_| ParseError::InvalidRequestLine)?;

        let mut lines = head.split("\r\n");

        // 1. Request line
        let request_line = lines.next().ok_or(ParseError::IncompleteRequest)?;
        let (method, path, version) = Self::parse_request_line(request_line)?;

        // 2. Headers
        let headers = Self::parse_headers(lines)?;

        // 3. Body: lo que haya llegado después de la línea vacía
        let body = buffer[head_end + HEADERS_END.len()..].to_vec();

        Ok(Request {
            method,
            path,
            headers,
            version,
            body,
        })
    }

    /// Parsea la request line
    ///
    /// Formato: `GET /path HTTP/1.0`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD TARGET VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;
        let path = parts[1].to_string();

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, version))
    }

    /// Parsea los headers HTTP
    ///
    /// Cada header tiene formato: "Name: Value"
    fn parse_headers<'a, I>(lines: I) -> Result<HashMap<String, String>, ParseError>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut headers = HashMap::new();

        for line in lines {
            if let Some(colon_pos) = line.find(':') {
                let name = line[..colon_pos].trim().to_string();
                let value = line[colon_pos + 1..].trim().to_string();
                headers.insert(name, value);
            } else {
                return Err(ParseError::InvalidHeader(line.to_string()));
            }
        }

        Ok(headers)
    }

    // === Accesores ===

    /// Método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Target del request, sin decodificar
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header específico (sin distinguir mayúsculas en el nombre)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader que entrega los datos en pedazos de tamaño fijo
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = (self.pos + self.step).min(self.data.len()).min(self.pos + buf.len());
            let n = end - self.pos;
            buf[..n].copy_from_slice(&self.data[self.pos..end]);
            self.pos = end;
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"))
        }
    }

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), "HTTP/1.0");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_target_keeps_query() {
        let raw = b"GET /search?q=a..b HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.path(), "/search?q=a..b");
    }

    #[test]
    fn test_parse_with_headers() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: test\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.header("Host"), Some("localhost:8080"));
        assert_eq!(request.header("user-agent"), Some("test"));
        assert_eq!(request.headers().len(), 2);
    }

    #[test]
    fn test_body_after_headers() {
        let raw = b"POST /upload HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.body(), b"hello");
    }

    #[test]
    fn test_unsupported_method() {
        let result = Request::parse(b"BREW /pot HTTP/1.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::UnsupportedMethod(m)) if m == "BREW"));
    }

    #[test]
    fn test_invalid_version() {
        let result = Request::parse(b"GET / HTTP/2.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(Request::parse(b"").unwrap_err(), ParseError::EmptyRequest);
        assert_eq!(Request::parse(b"\r\n").unwrap_err(), ParseError::EmptyRequest);
    }

    #[test]
    fn test_invalid_request_line() {
        let result = Request::parse(b"GET\r\n\r\n");
        assert_eq!(result.unwrap_err(), ParseError::InvalidRequestLine);
    }

    #[test]
    fn test_invalid_header() {
        let result = Request::parse(b"GET / HTTP/1.0\r\nno-colon-here\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
    }

    #[test]
    fn test_non_utf8_head() {
        let result = Request::parse(b"GET /\xff\xfe HTTP/1.0\r\n\r\n");
        assert_eq!(result.unwrap_err(), ParseError::InvalidRequestLine);
    }

    #[test]
    fn test_read_request_from_stream() {
        let mut stream = Cursor::new(b"GET /a.html HTTP/1.0\r\nHost: x\r\n\r\n".to_vec());
        let request = read_request(&mut stream).unwrap();

        assert_eq!(request.path(), "/a.html");
        assert_eq!(request.header("Host"), Some("x"));
    }

    #[test]
    fn test_read_request_in_small_pieces() {
        let mut stream = Trickle {
            data: b"GET /slow.html HTTP/1.0\r\nHost: x\r\n\r\n".to_vec(),
            pos: 0,
            step: 3,
        };
        let request = read_request(&mut stream).unwrap();

        assert_eq!(request.path(), "/slow.html");
    }

    #[test]
    fn test_read_request_eof_before_blank_line() {
        let mut stream = Cursor::new(b"\x00\x01\x02\x03garbage".to_vec());
        assert_eq!(read_request(&mut stream).unwrap_err(), ParseError::IncompleteRequest);
    }

    #[test]
    fn test_read_request_peer_closed_immediately() {
        let mut stream = Cursor::new(Vec::new());
        assert_eq!(read_request(&mut stream).unwrap_err(), ParseError::EmptyRequest);
    }

    #[test]
    fn test_read_request_headers_too_large() {
        let mut raw = b"GET / HTTP/1.0\r\nX-Filler: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_HEADER_BYTES * 2));
        let mut stream = Cursor::new(raw);

        assert_eq!(read_request(&mut stream).unwrap_err(), ParseError::HeadersTooLarge);
    }

    #[test]
    fn test_read_request_io_error() {
        let result = read_request(&mut Broken);
        assert!(matches!(result, Err(ParseError::Unreadable(_))));
    }
}
