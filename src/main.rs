//! # Web Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.0.
//!
//! ```text
//! web_server <port> <website_directory> [--mode sequential|processes|threads]
//! ```

use std::process;
use web_server::config::Config;
use web_server::error::StartupError;
use web_server::{logging, server};

fn main() {
    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(StartupError::Usage(usage)) => {
            println!("{}", usage);
            process::exit(1);
        }
        Err(StartupError::DisplayInfo(text)) => {
            print!("{}", text);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    logging::init(&config.log_level);

    tracing::info!("=================================");
    tracing::info!("  Web Server HTTP/1.0");
    tracing::info!("  Principios de Sistemas Operativos");
    tracing::info!("=================================");

    if let Err(e) = server::serve(&config) {
        eprintln!("💥 Error fatal: {}", e);
        process::exit(1);
    }
}
