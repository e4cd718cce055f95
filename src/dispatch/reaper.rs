//! # Reaper de Procesos Hijos
//! src/dispatch/reaper.rs
//!
//! Thread de fondo que recoge a los hijos terminados con `wait(2)` para que
//! no queden zombies. El padre avisa cada `fork` exitoso con `track`; el
//! reaper duerme mientras no haya hijos pendientes.
//!
//! Este thread no escribe logs ni toca métricas: el thread que hace `fork`
//! podría copiar al hijo un lock tomado por él.

use crate::error::StartupError;
use nix::errno::Errno;
use nix::sys::wait::wait;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

#[derive(Default)]
struct ReaperState {
    /// Hijos lanzados que todavía no se recogieron
    outstanding: usize,

    /// Total de hijos recogidos
    reaped: u64,

    stopping: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<ReaperState>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ReaperState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Recolector de hijos en segundo plano
pub struct Reaper {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Lanza el thread `reaper`
    pub fn start() -> Result<Self, StartupError> {
        let shared = Arc::new(Shared::default());
        let name = "reaper".to_string();

        let thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(name.clone())
                .spawn(move || reap_loop(&shared))
                .map_err(|source| StartupError::SpawnThread { name, source })?
        };

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Registra un hijo recién creado
    pub fn track(&self) {
        self.shared.lock().outstanding += 1;
        self.shared.changed.notify_all();
    }

    pub fn outstanding(&self) -> usize {
        self.shared.lock().outstanding
    }

    pub fn reaped(&self) -> u64 {
        self.shared.lock().reaped
    }

    /// Espera a que terminen los hijos pendientes y detiene el thread
    pub fn shutdown(&mut self) {
        self.shared.lock().stopping = true;
        self.shared.changed.notify_all();

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reap_loop(shared: &Shared) {
    loop {
        {
            let mut state = shared.lock();
            while state.outstanding == 0 && !state.stopping {
                state = shared
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if state.outstanding == 0 {
                return;
            }
        }

        // Sin el lock: wait() bloquea hasta que termine algún hijo
        let result = wait();

        let mut state = shared.lock();
        match result {
            Ok(_) => {
                state.outstanding = state.outstanding.saturating_sub(1);
                state.reaped += 1;
            }
            Err(Errno::EINTR) => continue,
            // ECHILD: no queda ningún hijo que esperar
            Err(_) => state.outstanding = 0,
        }
        drop(state);
        shared.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_reaper_stops_immediately() {
        let mut reaper = Reaper::start().unwrap();
        assert_eq!(reaper.outstanding(), 0);
        reaper.shutdown();
        assert_eq!(reaper.reaped(), 0);
    }

    #[test]
    fn test_phantom_child_is_cleared() {
        // Sin hijos reales wait() devuelve ECHILD
        let mut reaper = Reaper::start().unwrap();
        reaper.track();
        reaper.shutdown();
        assert_eq!(reaper.outstanding(), 0);
    }
}
