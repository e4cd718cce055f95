//! # Un Proceso por Conexión
//! src/dispatch/process.rs
//!
//! Cada conexión se atiende en un proceso hijo creado con `fork`:
//!
//! - Hijo: cierra el socket de escucha heredado, restaura la máscara de
//!   señales, ejecuta el handler y termina
//! - Padre: registra al hijo en el reaper, suelta su copia de la conexión y
//!   vuelve al accept loop
//!
//! Crear el proceso está detrás de `ChildSpawner`, así los tests pueden
//! usar una implementación en memoria.

use crate::dispatch::reaper::Reaper;
use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, StartupError};
use crate::lifecycle::signals;
use crate::metrics::MetricsCollector;
use crate::server::connection::Connection;
use crate::server::handler::ConnectionHandler;
use nix::unistd::{self, ForkResult};
use std::os::unix::io::RawFd;
use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::sync::Arc;

/// Trabajo que corre dentro del hijo
pub type ChildWork = Box<dyn FnOnce() + Send + 'static>;

/// Identifica a un hijo lanzado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildHandle {
    id: u32,
}

impl ChildHandle {
    pub fn new(id: u32) -> Self {
        Self { id }
    }

    /// PID en `ForkSpawner`
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// Crea unidades de ejecución aisladas para las conexiones
pub trait ChildSpawner: Send {
    /// Ejecuta `work` en un hijo
    ///
    /// Al retornar, el llamador ya no tiene nada que liberar: si falla,
    /// `work` (y la conexión que captura) se soltó sin ejecutarse.
    fn spawn(&self, work: ChildWork) -> Result<ChildHandle, DispatchError>;

    /// Espera a los hijos pendientes
    fn shutdown(&mut self) {}
}

/// `ChildSpawner` basado en `fork(2)` con reaper propio
pub struct ForkSpawner {
    /// Descriptores que el hijo cierra apenas nace
    inherited_fds: Vec<RawFd>,
    reaper: Reaper,
}

impl ForkSpawner {
    pub fn new(inherited_fds: Vec<RawFd>) -> Result<Self, StartupError> {
        Ok(Self {
            inherited_fds,
            reaper: Reaper::start()?,
        })
    }

    /// Hijos lanzados que todavía no se recogieron
    pub fn outstanding(&self) -> usize {
        self.reaper.outstanding()
    }

    pub fn reaped(&self) -> u64 {
        self.reaper.reaped()
    }
}

impl ChildSpawner for ForkSpawner {
    fn spawn(&self, work: ChildWork) -> Result<ChildHandle, DispatchError> {
        // SAFETY: el hijo solo ejecuta `run_child`, que termina con `process::exit`.
        // Los demás threads del padre (reaper, señales) no toman locks de logging
        // ni de métricas, así que el hijo no hereda ninguno tomado.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => run_child(work, &self.inherited_fds),
            Ok(ForkResult::Parent { child }) => {
                self.reaper.track();
                // Cierra la copia del padre; el hijo conserva la suya
                drop(work);
                Ok(ChildHandle::new(child.as_raw() as u32))
            }
            Err(errno) => Err(DispatchError::Fork(errno)),
        }
    }

    fn shutdown(&mut self) {
        self.reaper.shutdown();
    }
}

fn run_child(work: ChildWork, inherited_fds: &[RawFd]) -> ! {
    for &fd in inherited_fds {
        let _ = unistd::close(fd);
    }
    let _ = signals::unblock_shutdown_signals();

    let code = match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(()) => 0,
        Err(_) => 1,
    };
    process::exit(code)
}

/// Estrategia de un proceso por conexión
pub struct ProcessDispatcher<S: ChildSpawner = ForkSpawner> {
    spawner: S,
    handler: Arc<ConnectionHandler>,
    metrics: MetricsCollector,
}

impl<S: ChildSpawner> ProcessDispatcher<S> {
    pub fn new(spawner: S, handler: Arc<ConnectionHandler>, metrics: MetricsCollector) -> Self {
        Self {
            spawner,
            handler,
            metrics,
        }
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }
}

impl<S: ChildSpawner> Dispatcher for ProcessDispatcher<S> {
    fn name(&self) -> &'static str {
        "processes"
    }

    fn dispatch(&self, connection: Connection) -> Result<(), DispatchError> {
        let peer = connection.peer();
        let handler = Arc::clone(&self.handler);
        let work: ChildWork = Box::new(move || {
            let _ = handler.handle(connection);
        });

        match self.spawner.spawn(work) {
            Ok(child) => {
                tracing::debug!(%peer, pid = child.id(), "conexión entregada a un hijo");
                Ok(())
            }
            Err(e) => {
                self.metrics.record_dropped();
                Err(e)
            }
        }
    }

    fn shutdown(&mut self) {
        tracing::info!("⏳ Esperando a los procesos hijos...");
        self.spawner.shutdown();
    }
}
