//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor: puerto y directorio del sitio como argumentos
//! posicionales, el resto como opciones con variable de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./web_server 8080 ./www --mode threads --workers 8 --queue-capacity 128
//! ./web_server 8080 ./www --mode processes
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! WEB_MODE=sequential WEB_LOG_LEVEL=debug ./web_server 8080 ./www
//! ```

use crate::error::StartupError;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::ffi::OsString;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Estrategia de despacho de conexiones
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Una conexión a la vez, en el thread del accept
    Sequential,
    /// Un proceso hijo (fork) por conexión
    Processes,
    /// Pool fijo de threads alimentado por una cola acotada
    Threads,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sequential => "sequential",
            Mode::Processes => "processes",
            Mode::Threads => "threads",
        }
    }
}

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "web_server")]
#[command(about = "Servidor HTTP/1.0 con estrategias de despacho intercambiables")]
#[command(version)]
pub struct Config {
    /// Puerto TCP en el que escucha (1-65535)
    #[arg(value_parser = parse_port)]
    pub port: u16,

    /// Directorio raíz del sitio
    pub website_directory: PathBuf,

    /// Argumentos posicionales sobrantes; se ignoran
    #[arg(hide = true)]
    pub extra_args: Vec<String>,

    /// IP en la que escucha
    #[arg(long, default_value = "0.0.0.0", env = "WEB_HOST")]
    pub host: String,

    /// Estrategia de despacho
    #[arg(long, value_enum, default_value_t = Mode::Threads, env = "WEB_MODE")]
    pub mode: Mode,

    // === Pool de threads ===

    /// Número de workers (solo en modo threads)
    #[arg(long, default_value = "4", env = "WEB_WORKERS")]
    pub workers: usize,

    /// Capacidad de la cola de conexiones pendientes (solo en modo threads)
    #[arg(long = "queue-capacity", default_value = "64", env = "WEB_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Espera máxima para encolar antes de descartar la conexión.
    /// Sin valor, el accept espera lo que haga falta
    #[arg(long = "enqueue-timeout-ms", env = "WEB_ENQUEUE_TIMEOUT_MS")]
    pub enqueue_timeout_ms: Option<u64>,

    // === Timeouts por conexión ===

    /// Timeout de lectura del socket del cliente
    #[arg(long = "read-timeout-ms", env = "WEB_READ_TIMEOUT_MS")]
    pub read_timeout_ms: Option<u64>,

    /// Timeout de escritura del socket del cliente
    #[arg(long = "write-timeout-ms", env = "WEB_WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: Option<u64>,

    /// Nivel de log (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "WEB_LOG_LEVEL")]
    pub log_level: String,
}

/// Acepta 1-65535; cero, negativos y texto no numérico son inválidos
fn parse_port(value: &str) -> Result<u16, String> {
    match value.trim().parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(port as u16),
        _ => Err("invalid port".to_string()),
    }
}

/// Cuenta los argumentos posicionales, sin el nombre del programa
///
/// Las opciones largas que llevan valor (`--mode threads`) consumen el
/// siguiente argumento; después de `--` todo es posicional.
fn count_positionals(args: &[OsString]) -> usize {
    let command = Config::command();
    let takes_value = |name: &str| {
        command
            .get_arguments()
            .any(|arg| arg.get_long() == Some(name) && arg.get_action().takes_values())
    };

    let mut count = 0;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        let text = arg.to_string_lossy();
        if text == "--" {
            count += rest.by_ref().count();
            break;
        }

        if let Some(long) = text.strip_prefix("--") {
            if !long.contains('=') && takes_value(long) {
                rest.next();
            }
        } else if text == "-" || !text.starts_with('-') {
            count += 1;
        }
    }
    count
}

/// `--help` o `--version` en cualquier posición
fn asks_for_info(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .any(|arg| matches!(arg.to_str(), Some("--help" | "-h" | "--version" | "-V")))
}

/// Texto de uso cuando faltan argumentos
pub fn usage(program: &str) -> String {
    format!("Usage: {} <port> <website_directory>", program)
}

impl Config {
    /// Parsea y valida los argumentos de línea de comandos
    ///
    /// El primer elemento es el nombre del programa, como en `std::env::args_os`.
    ///
    /// # Ejemplo
    /// ```
    /// use web_server::config::{Config, Mode};
    ///
    /// let config = Config::from_args(["web_server", "8080", "./www", "--mode", "sequential"]).unwrap();
    /// assert_eq!(config.port, 8080);
    /// assert_eq!(config.mode, Mode::Sequential);
    /// ```
    pub fn from_args<I, T>(args: I) -> Result<Self, StartupError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let program = args
            .first()
            .map(|arg| arg.to_string_lossy().into_owned())
            .unwrap_or_else(|| "web_server".to_string());

        // Faltan argumentos: uso, aunque el puerto que vino sea inválido
        if !asks_for_info(&args) && count_positionals(&args) < 2 {
            return Err(StartupError::Usage(usage(&program)));
        }

        let config = Config::try_parse_from(args).map_err(|err| match err.kind() {
            ErrorKind::MissingRequiredArgument => StartupError::Usage(usage(&program)),
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                StartupError::DisplayInfo(err.to_string())
            }
            _ => StartupError::InvalidArgument(err.to_string()),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Dirección completa para bind (host:port)
    pub fn socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| StartupError::InvalidConfig(format!("invalid host: {}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn enqueue_timeout(&self) -> Option<Duration> {
        self.enqueue_timeout_ms.map(Duration::from_millis)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_ms.map(Duration::from_millis)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), StartupError> {
        if self.port == 0 {
            return Err(StartupError::InvalidConfig("port must be 1-65535".to_string()));
        }
        if self.workers == 0 {
            return Err(StartupError::InvalidConfig("workers must be >= 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(StartupError::InvalidConfig("queue capacity must be >= 1".to_string()));
        }

        // Un timeout de cero no es "sin timeout": el socket lo rechaza
        let timeouts = [
            ("enqueue timeout", self.enqueue_timeout_ms),
            ("read timeout", self.read_timeout_ms),
            ("write timeout", self.write_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == Some(0) {
                return Err(StartupError::InvalidConfig(format!("{} must be > 0", name)));
            }
        }

        self.socket_addr()?;
        Ok(())
    }

    /// Registra un resumen de la configuración efectiva
    pub fn print_summary(&self) {
        tracing::info!("⚙️  Configuración:");
        tracing::info!("   Dirección:   {}:{}", self.host, self.port);
        tracing::info!("   Sitio:       {}", self.website_directory.display());
        tracing::info!("   Modo:        {}", self.mode.as_str());
        if !self.extra_args.is_empty() {
            tracing::warn!("   Argumentos ignorados: {}", self.extra_args.join(" "));
        }

        if self.mode == Mode::Threads {
            tracing::info!("   Workers:     {}", self.workers);
            tracing::info!("   Cola:        {} conexiones", self.queue_capacity);
            match self.enqueue_timeout_ms {
                Some(ms) => tracing::info!("   Encolado:    descarta tras {} ms", ms),
                None => tracing::info!("   Encolado:    bloquea hasta que haya lugar"),
            }
        }

        let describe = |value: Option<u64>| match value {
            Some(ms) => format!("{} ms", ms),
            None => "sin límite".to_string(),
        };
        tracing::info!("   Lectura:     {}", describe(self.read_timeout_ms));
        tracing::info!("   Escritura:   {}", describe(self.write_timeout_ms));
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            website_directory: PathBuf::from("."),
            extra_args: Vec::new(),
            host: "0.0.0.0".to_string(),
            mode: Mode::Threads,
            workers: 4,
            queue_capacity: 64,
            enqueue_timeout_ms: None,
            read_timeout_ms: None,
            write_timeout_ms: None,
            log_level: "info".to_string(),
        }
    }
}
