//! # Módulo HTTP
//!
//! Implementa el subconjunto de HTTP/1.x que necesita el servidor, sin usar
//! librerías de alto nivel:
//!
//! - Parsing de requests directamente desde el stream del socket
//! - Construcción y serialización de responses
//!
//! ## Lo que NO se implementa
//!
//! - Keep-alive: una conexión atiende un único request
//! - Chunked transfer encoding ni pipelining
//! - Normalización de headers: `Content-Length` y `content-length` son distintos
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! [body de Content-Length bytes]
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain\r\n
//! Content-Length: 13\r\n
//! \r\n
//! Test response
//! ```

pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción y envío de HTTP responses

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{ParseError, ParseMode, Request};
pub use response::Response;
