//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing` con salida a stdout. `RUST_LOG` tiene prioridad
//! sobre el nivel de la configuración.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filtro por defecto para el nivel pedido (`info`, `debug`...)
fn default_directive(level: &str) -> String {
    format!("web_server={}", level.trim().to_ascii_lowercase())
}

/// Instala el subscriber global; si ya había uno, no hace nada
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
