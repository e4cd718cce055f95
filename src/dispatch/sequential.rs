//! # Despacho Secuencial
//! src/dispatch/sequential.rs
//!
//! Atiende la conexión en el mismo thread del accept loop: hasta que no
//! termina, no se acepta la siguiente.

use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::server::connection::Connection;
use crate::server::handler::ConnectionHandler;
use std::sync::Arc;

pub struct SequentialDispatcher {
    handler: Arc<ConnectionHandler>,
}

impl SequentialDispatcher {
    pub fn new(handler: Arc<ConnectionHandler>) -> Self {
        Self { handler }
    }
}

impl Dispatcher for SequentialDispatcher {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn dispatch(&self, connection: Connection) -> Result<(), DispatchError> {
        // Los fallos de envío ya quedaron registrados por el handler
        let _ = self.handler.handle(connection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCollector;
    use crate::server::connection::loopback_pair;
    use std::io::{Read, Write};

    #[test]
    fn test_handles_before_returning() {
        let metrics = MetricsCollector::new();
        let handler = Arc::new(ConnectionHandler::new("/srv/www", metrics.clone()));
        let dispatcher = SequentialDispatcher::new(handler);

        let (connection, mut client) = loopback_pair();
        client.write_all(b"GET nope HTTP/1.0\r\n\r\n").unwrap();
        dispatcher.dispatch(connection).unwrap();

        // Ya respondió: la métrica está antes de leer el socket
        assert_eq!(metrics.snapshot().responses.get(&400), Some(&1));

        let mut buf = String::new();
        client.read_to_string(&mut buf).unwrap();
        assert!(buf.starts_with("HTTP/1.0 400 Bad Request\r\n"));
    }

    #[test]
    fn test_send_failure_is_not_a_dispatch_error() {
        let metrics = MetricsCollector::new();
        let handler = Arc::new(ConnectionHandler::new("/srv/www", metrics.clone()));
        let dispatcher = SequentialDispatcher::new(handler);

        let (connection, client) = loopback_pair();
        drop(client);

        // Con el cliente ido, cualquier resultado del envío es local a la conexión
        assert!(dispatcher.dispatch(connection).is_ok());
        assert_eq!(metrics.snapshot().active_handlers, 0);
    }
}
