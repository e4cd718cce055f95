//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Contadores compartidos entre el accept loop y los handlers:
//! - Conexiones aceptadas y descartadas
//! - Respuestas por código de estado
//! - Handlers activos y pico de concurrencia

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
