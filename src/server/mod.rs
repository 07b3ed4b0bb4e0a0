//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP:
//! 1. `Listener` escucha en un puerto y acepta conexiones en su propio thread
//! 2. `WorkerPool` reparte las conexiones entre un número fijo de workers
//! 3. `ConnectionHandler` lee el request, llama al handler, escribe la
//!    respuesta y cierra el socket
//!
//! Una conexión = un request. No hay keep-alive.

pub mod connection;
pub mod listener;
pub mod pool;

// Re-exportar para facilitar el uso
pub use connection::ConnectionHandler;
pub use listener::{Listener, ListenerState};
pub use pool::WorkerPool;
