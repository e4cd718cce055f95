//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Contadores del servidor: conexiones aceptadas, respuestas por código,
//! envíos fallidos, conexiones descartadas y handlers activos.

use crate::http::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
#[derive(Default)]
struct MetricsData {
    /// Conexiones aceptadas por el accept loop
    accepted: u64,

    /// Respuestas entregadas por código de estado
    responses: BTreeMap<u16, u64>,

    /// Respuestas que no se pudieron escribir completas
    send_failures: u64,

    /// Conexiones cerradas sin respuesta (fork fallido, cola llena)
    dropped: u64,

    /// Handlers ejecutándose ahora mismo
    active_handlers: u64,

    /// Máximo de handlers simultáneos observado
    peak_active_handlers: u64,
}

/// Foto de las métricas en un instante
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub accepted: u64,
    pub responses: BTreeMap<u16, u64>,
    pub send_failures: u64,
    pub dropped: u64,
    pub active_handlers: u64,
    pub peak_active_handlers: u64,
}

/// Marca un handler como activo mientras vive
///
/// Se obtiene con `MetricsCollector::handler_started`.
pub struct ActiveHandler {
    metrics: MetricsCollector,
}

impl Drop for ActiveHandler {
    fn drop(&mut self) {
        let mut data = self.metrics.lock();
        data.active_handlers = data.active_handlers.saturating_sub(1);
    }
}

impl MetricsCollector {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData::default())),
            start_time: Instant::now(),
        }
    }

    // Un panic en otro thread no invalida contadores
    fn lock(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_accept(&self) {
        self.lock().accepted += 1;
    }

    pub fn record_response(&self, status: StatusCode) {
        *self.lock().responses.entry(status.as_u16()).or_insert(0) += 1;
    }

    pub fn record_send_failure(&self) {
        self.lock().send_failures += 1;
    }

    pub fn record_dropped(&self) {
        self.lock().dropped += 1;
    }

    /// Marca el inicio de un handler; el fin se registra al soltar el guard
    pub fn handler_started(&self) -> ActiveHandler {
        let mut data = self.lock();
        data.active_handlers += 1;
        data.peak_active_handlers = data.peak_active_handlers.max(data.active_handlers);

        ActiveHandler {
            metrics: self.clone(),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.lock();
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            accepted: data.accepted,
            responses: data.responses.clone(),
            send_failures: data.send_failures,
            dropped: data.dropped,
            active_handlers: data.active_handlers,
            peak_active_handlers: data.peak_active_handlers,
        }
    }

    /// Métricas actuales en formato JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
