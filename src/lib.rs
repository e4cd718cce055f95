//! # Web Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de archivos estáticos con tres estrategias de
//! despacho intercambiables para comparar modelos de concurrencia de
//! sistemas operativos: secuencial, un proceso por conexión y pool de
//! threads.
//!
//! ## Arquitectura
//!
//! - `config`: argumentos de línea de comandos y variables de entorno
//! - `http`: parsing del request y escritura de la respuesta HTTP/1.0
//! - `server`: socket de escucha, accept loop y handler por conexión
//! - `dispatch`: estrategias de despacho (secuencial, fork, pool de threads)
//! - `lifecycle`: señales y apagado ordenado
//! - `metrics`: contadores del servidor
//! - `logging`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use web_server::config::Config;
//!
//! let config = Config::from_args(["web_server", "8080", "./www"]).unwrap();
//! web_server::logging::init(&config.log_level);
//! web_server::server::serve(&config).unwrap();
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod server;
