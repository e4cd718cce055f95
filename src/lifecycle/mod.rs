//! # Ciclo de Vida
//! src/lifecycle/mod.rs
//!
//! Apagado ordenado del servidor y manejo de SIGINT/SIGTERM.

pub mod shutdown;
pub mod signals;

pub use shutdown::ShutdownHandle;
