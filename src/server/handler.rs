//! # Handler de Conexión
//! src/server/handler.rs
//!
//! Se ejecuta una vez por conexión, sin importar la estrategia de despacho:
//!
//! ```text
//! leer request → gate → (búsqueda de archivo) → respuesta → cerrar
//! ```
//!
//! `handle` consume la `Connection`: al retornar, por cualquier camino, el
//! socket y el request parseado ya fueron liberados.

use crate::config::Config;
use crate::error::SendFailure;
use crate::http::{request, ParseError, Request, StatusCode};
use crate::metrics::MetricsCollector;
use crate::server::connection::Connection;
use crate::server::emitter;
use crate::server::gate::{self, Verdict};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Unidad de trabajo por conexión, compartida entre workers
pub struct ConnectionHandler {
    document_root: PathBuf,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    metrics: MetricsCollector,
}

impl ConnectionHandler {
    pub fn new(document_root: impl Into<PathBuf>, metrics: MetricsCollector) -> Self {
        Self {
            document_root: document_root.into(),
            read_timeout: None,
            write_timeout: None,
            metrics,
        }
    }

    pub fn from_config(config: &Config, metrics: MetricsCollector) -> Self {
        Self::new(config.website_directory.clone(), metrics)
            .with_deadlines(config.read_timeout(), config.write_timeout())
    }

    /// Timeouts que se aplican al socket antes de leer
    pub fn with_deadlines(mut self, read: Option<Duration>, write: Option<Duration>) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    /// Atiende una conexión completa y la cierra
    pub fn handle(&self, mut connection: Connection) -> Result<StatusCode, SendFailure> {
        let _active = self.metrics.handler_started();
        let peer = connection.peer();

        if let Err(e) = connection.set_deadlines(self.read_timeout, self.write_timeout) {
            tracing::warn!(%peer, "no se pudieron aplicar timeouts: {}", e);
        }

        let result = self.respond(&mut connection);

        match &result {
            Ok(status) => {
                self.metrics.record_response(*status);
                tracing::info!(%peer, "   ✅ {}", status);
            }
            Err(failure) => {
                self.metrics.record_send_failure();
                tracing::warn!(%peer, "   ❌ {}", failure);
            }
        }

        result
    }

    /// Lee el request, decide el código y escribe la respuesta
    ///
    /// Genérico sobre el stream para poder probarlo sin sockets.
    pub fn respond<S: Read + Write>(&self, stream: &mut S) -> Result<StatusCode, SendFailure> {
        let parsed = request::read_request(stream);
        let status = self.decide(&parsed);

        emitter::send_canned(stream, status)
            .map(|()| status)
            .map_err(|source| SendFailure { status, source })
    }

    fn decide(&self, parsed: &Result<Request, ParseError>) -> StatusCode {
        match parsed {
            Ok(request) => tracing::debug!("   {} {}", request.method().as_str(), request.path()),
            Err(e) => tracing::debug!("   parse error: {}", e),
        }

        match (gate::inspect(parsed.as_ref().ok()), parsed) {
            (Verdict::Allow, Ok(request)) => self.lookup(request),
            (Verdict::Forbidden, _) => StatusCode::Forbidden,
            _ => StatusCode::BadRequest,
        }
    }

    /// Búsqueda del archivo dentro del sitio
    ///
    /// Servir archivos no está implementado: todo lo que pasa el gate es 404.
    fn lookup(&self, request: &Request) -> StatusCode {
        let candidate = self.document_root.join(request.path().trim_start_matches('/'));
        tracing::debug!(path = %candidate.display(), "sin servicio de archivos");
        StatusCode::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::connection::loopback_pair;
    use crate::server::emitter::canned_body;
    use std::io::{self, Cursor};
    use std::net::Shutdown;

    /// Stream en memoria: lo que el cliente "mandó" y lo que el servidor escribió
    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        fail_writes: bool,
    }

    impl MockStream {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
                fail_writes: false,
            }
        }

        fn output(&self) -> String {
            String::from_utf8_lossy(&self.output).into_owned()
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"));
            }
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn handler() -> ConnectionHandler {
        ConnectionHandler::new("/srv/www", MetricsCollector::new())
    }

    fn status_for(raw: &[u8]) -> StatusCode {
        handler().respond(&mut MockStream::new(raw)).unwrap()
    }

    #[test]
    fn test_not_found_for_plain_path() {
        let mut stream = MockStream::new(b"GET /index.html HTTP/1.0\r\n\r\n");
        let status = handler().respond(&mut stream).unwrap();

        assert_eq!(status, StatusCode::NotFound);
        assert!(stream.output().starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(stream.output().ends_with(canned_body(StatusCode::NotFound)));
    }

    #[test]
    fn test_forbidden_for_traversal() {
        for target in ["/../x", "/a/../b", "/..", "/static/..%2f"] {
            let raw = format!("GET {} HTTP/1.0\r\n\r\n", target);
            assert_eq!(status_for(raw.as_bytes()), StatusCode::Forbidden, "target {}", target);
        }
    }

    #[test]
    fn test_bad_request_for_relative_path() {
        assert_eq!(status_for(b"GET index.html HTTP/1.0\r\n\r\n"), StatusCode::BadRequest);
        // Sin '/' inicial gana el 400 aunque haya '..'
        assert_eq!(status_for(b"GET ../etc/passwd HTTP/1.0\r\n\r\n"), StatusCode::BadRequest);
    }

    #[test]
    fn test_bad_request_for_garbage() {
        assert_eq!(status_for(b"\x00\x01\x02\x03garbage"), StatusCode::BadRequest);
        assert_eq!(status_for(b"HELLO\r\n\r\n"), StatusCode::BadRequest);
        assert_eq!(status_for(b""), StatusCode::BadRequest);
    }

    #[test]
    fn test_same_request_same_answer() {
        let raw = b"GET /a/../b HTTP/1.0\r\n\r\n";
        let mut first = MockStream::new(raw);
        let mut second = MockStream::new(raw);
        handler().respond(&mut first).unwrap();
        handler().respond(&mut second).unwrap();

        assert_eq!(first.output, second.output);
    }

    #[test]
    fn test_send_failure_is_reported() {
        let mut stream = MockStream::new(b"GET /../x HTTP/1.0\r\n\r\n");
        stream.fail_writes = true;

        let failure = handler().respond(&mut stream).unwrap_err();
        assert_eq!(failure.status, StatusCode::Forbidden);
        assert_eq!(failure.source.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_handle_over_socket_closes_connection() {
        let metrics = MetricsCollector::new();
        let handler = ConnectionHandler::new("/srv/www", metrics.clone());
        let (connection, mut client) = loopback_pair();

        client.write_all(b"GET /../x HTTP/1.0\r\n\r\n").unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let status = handler.handle(connection).unwrap();
        assert_eq!(status, StatusCode::Forbidden);

        // read_to_end solo termina si el servidor cerró el socket
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.0 403 Forbidden\r\n"));
        assert!(text.ends_with("<center><h1>403 Forbidden</h1><hr></center>"));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.responses.get(&403), Some(&1));
        assert_eq!(snapshot.active_handlers, 0);
    }

    #[test]
    fn test_handle_with_read_deadline() {
        let handler = handler().with_deadlines(Some(Duration::from_millis(50)), None);
        let (connection, mut client) = loopback_pair();

        // El cliente no manda nada: vence el timeout y se responde 400
        let status = handler.handle(connection).unwrap();
        assert_eq!(status, StatusCode::BadRequest);

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().starts_with("HTTP/1.0 400 Bad Request"));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.website_directory = PathBuf::from("/var/www");
        config.read_timeout_ms = Some(250);

        let handler = ConnectionHandler::from_config(&config, MetricsCollector::new());
        assert_eq!(handler.document_root(), Path::new("/var/www"));
        assert_eq!(handler.read_timeout, Some(Duration::from_millis(250)));
    }
}
