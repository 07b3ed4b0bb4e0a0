//! # Handlers
//! src/handler/mod.rs
//!
//! El handler es la lógica de aplicación que se inyecta al servidor: recibe
//! el request parseado y llena la respuesta in-place.
//!
//! ```text
//! Request → Handler → Response (mutada)
//! ```
//!
//! Cualquier closure `Fn(&Request, &mut Response)` sirve como handler:
//!
//! ```
//! use basic_http_server::handler::Handler;
//! use basic_http_server::http::{Request, Response};
//!
//! let handler = |request: &Request, response: &mut Response| {
//!     response.set_body(format!("You requested: {}", request.path()));
//! };
//!
//! let request = Request::parse(&b"GET /custom/path HTTP/1.1\r\n\r\n"[..]).unwrap();
//! let mut response = Response::new();
//! handler.handle(&request, &mut response);
//!
//! assert_eq!(response.body(), "You requested: /custom/path");
//! ```

pub mod echo;

pub use echo::EchoPageHandler;

use crate::http::{Request, Response};

/// Capacidad de atender un request
///
/// Se comparte entre todos los workers, por eso exige `Send + Sync`.
/// No retorna nada: si algo sale mal, un pánico aquí se trata como fatal
/// solo para esa conexión.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request, response: &mut Response);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, response: &mut Response) {
        self(request, response)
    }
}
