//! # Señales del Sistema Operativo
//! src/lifecycle/signals.rs
//!
//! SIGINT y SIGTERM se bloquean en el thread principal antes de crear
//! cualquier otro thread, así todos heredan la máscara. Un thread dedicado
//! las recibe con `sigwait`:
//!
//! - Primera señal: apagado ordenado (`ShutdownHandle::trigger`)
//! - Segunda señal: salida inmediata
//!
//! Los hijos de `fork` restauran la máscara antes de atender la conexión.

use crate::error::StartupError;
use crate::lifecycle::ShutdownHandle;
use nix::errno::Errno;
use nix::sys::signal::{SigSet, Signal};
use std::thread::{self, JoinHandle};

/// Señales que piden apagar el servidor
pub fn shutdown_signals() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTERM);
    set
}

/// Bloquea las señales de apagado en el thread actual
pub fn block_shutdown_signals() -> Result<SigSet, StartupError> {
    let set = shutdown_signals();
    set.thread_block().map_err(StartupError::Signals)?;
    Ok(set)
}

/// Vuelve a entregar las señales de apagado al thread actual
pub fn unblock_shutdown_signals() -> nix::Result<()> {
    shutdown_signals().thread_unblock()
}

/// Lanza el thread que espera las señales bloqueadas
pub fn spawn_signal_listener(
    signals: SigSet,
    shutdown: ShutdownHandle,
) -> Result<JoinHandle<()>, StartupError> {
    let name = "signals".to_string();

    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            // Sin logs acá: en modo procesos un fork podría copiar el lock de stdout tomado
            let mut received = 0;
            loop {
                match signals.wait() {
                    Ok(signal) => {
                        received += 1;
                        if received == 1 {
                            shutdown.trigger();
                        } else {
                            eprintln!("💥 {} otra vez: saliendo sin esperar", signal.as_str());
                            std::process::exit(1);
                        }
                    }
                    Err(Errno::EINTR) => continue,
                    Err(_) => return,
                }
            }
        })
        .map_err(|source| StartupError::SpawnThread { name, source })
}
