//! # Errores del Servidor
//! src/error.rs
//!
//! Un único tipo de error para todo lo que puede fallar fuera del parser.
//! Los errores de una conexión nunca salen del worker que la atiende; los de
//! `bind` y de estado sí llegan a quien llamó a `Listener::start`.

use crate::http::ParseError;
use crate::server::ListenerState;
use std::io;
use thiserror::Error;

/// Errores del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    /// No se pudo abrir el socket de escucha (puerto en uso, permisos...)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Operación no válida en el estado actual del listener
    #[error("Listener is {0:?}, operation not allowed")]
    InvalidState(ListenerState),

    /// Configuración inválida
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// El request no se pudo parsear
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// El handler entró en pánico procesando el request
    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),

    /// El pool ya no acepta trabajo
    #[error("Worker pool is shut down")]
    PoolClosed,

    /// La cola del pool llegó a su capacidad máxima
    #[error("Worker queue is full (max capacity: {0})")]
    QueueFull(usize),

    /// Error de lectura/escritura en el socket
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Alias para resultados del servidor
pub type Result<T> = std::result::Result<T, ServerError>;
