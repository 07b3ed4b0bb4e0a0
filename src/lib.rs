//! # Basic HTTP Server
//! src/lib.rs
//!
//! Servidor HTTP/1.x mínimo construido directamente sobre sockets TCP:
//! acepta conexiones, parsea request line, headers y body sin ninguna
//! librería HTTP, delega en un handler intercambiable y escribe la respuesta.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing de requests y serialización de responses
//! - `handler`: Trait del handler inyectable y handler HTML por defecto
//! - `server`: Listener, pool de workers y manejo de cada conexión
//! - `config`: Configuración por CLI / variables de entorno
//! - `error`: Tipo de error del servidor
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use basic_http_server::config::Config;
//! use basic_http_server::http::{Request, Response};
//! use basic_http_server::server::Listener;
//!
//! let mut listener = Listener::new(Config::default(), |req: &Request, res: &mut Response| {
//!     res.set_body(format!("You requested: {}", req.path()));
//! });
//! listener.start().expect("Error al iniciar servidor");
//! // ...
//! listener.stop().expect("Error al detener servidor");
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod server;

pub use error::ServerError;
