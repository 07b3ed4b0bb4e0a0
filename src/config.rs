//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración desde argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./basic_http_server 9000 --workers 16 --queue-capacity 1024
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=9000 HTTP_HOST=127.0.0.1 RUST_LOG=basic_http_server=debug ./basic_http_server
//! ```
//!
//! Los valores por defecto reproducen el comportamiento clásico del servidor:
//! 10 workers, cola sin límite, sin timeout de lectura y parser permisivo.

use crate::http::ParseMode;
use clap::Parser;
use serde::Serialize;
use std::time::Duration;

/// Puerto usado cuando no se indica uno o el indicado no es válido
pub const DEFAULT_PORT: u16 = 8080;

/// Tamaño del pool de workers por defecto
pub const DEFAULT_WORKERS: usize = 10;

/// Configuración del servidor HTTP
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "basic_http_server")]
#[command(about = "Servidor HTTP/1.x mínimo sobre sockets TCP")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto de escucha. Se toma como texto: si no es un puerto válido se
    /// usa 8080 y se registra un warning.
    #[arg(value_name = "PORT", env = "HTTP_PORT")]
    pub port: Option<String>,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Número de workers que atienden conexiones
    #[arg(long, default_value_t = DEFAULT_WORKERS, env = "HTTP_WORKERS")]
    pub workers: usize,

    /// Máximo de conexiones esperando worker (0 = sin límite)
    #[arg(long = "queue-capacity", default_value_t = 0, env = "HTTP_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Timeout de lectura por socket en milisegundos (0 = sin timeout)
    #[arg(long = "read-timeout-ms", default_value_t = 0, env = "HTTP_READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Rechazar requests malformados en vez de tolerarlos
    #[arg(long, env = "HTTP_STRICT")]
    pub strict: bool,

    /// Filtro de logs (sintaxis de `tracing_subscriber::EnvFilter`)
    #[arg(long = "log-filter", default_value = "basic_http_server=info", env = "RUST_LOG")]
    pub log_filter: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Puerto efectivo, sin registrar nada
    pub fn port(&self) -> u16 {
        self.port
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Valida el puerto indicado; si no sirve, registra un warning y lo
    /// descarta para que se use el puerto por defecto.
    pub fn resolve_port(&mut self) -> u16 {
        if let Some(raw) = self.port.as_deref() {
            if raw.trim().parse::<u16>().is_err() {
                tracing::warn!(
                    "Invalid port number: {}. Using default port: {}",
                    raw,
                    DEFAULT_PORT
                );
                self.port = None;
            }
        }
        self.port()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use basic_http_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port())
    }

    /// Capacidad de la cola del pool; `None` = sin límite
    pub fn queue_limit(&self) -> Option<usize> {
        (self.queue_capacity > 0).then_some(self.queue_capacity)
    }

    /// Timeout de lectura por socket; `None` = bloquear sin límite
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Modo del parser de requests
    pub fn parse_mode(&self) -> ParseMode {
        if self.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.host.trim().is_empty() {
            return Err("Host must not be empty".to_string());
        }
        Ok(())
    }

    /// Resumen en JSON para el log de arranque
    pub fn summary_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: None,
            host: "0.0.0.0".to_string(),
            workers: DEFAULT_WORKERS,
            queue_capacity: 0,
            read_timeout_ms: 0,
            strict: false,
            log_filter: "basic_http_server=info".to_string(),
        }
    }
}
