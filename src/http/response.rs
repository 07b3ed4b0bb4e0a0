//! # Construcción y Envío de Respuestas HTTP
//! src/http/response.rs
//!
//! `Response` es un builder mutable: nace con valores por defecto, el handler
//! lo modifica in-place y la conexión lo serializa exactamente una vez.
//!
//! ## Formato en el cable
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain\r\n
//! Server: BasicHttpServer/1.0\r\n
//! Content-Length: 13\r\n
//! \r\n
//! Test response
//! ```
//!
//! El orden de los headers es el de iteración del `HashMap` (no garantizado).
//!
//! ## Ejemplo de uso
//!
//! ```
//! use basic_http_server::http::Response;
//!
//! let mut response = Response::new();
//! response
//!     .set_content_type("text/plain")
//!     .set_body("Hello");
//!
//! let mut wire = Vec::new();
//! response.send(&mut wire).unwrap();
//! assert!(wire.ends_with(b"\r\n\r\nHello"));
//! ```

use std::collections::HashMap;
use std::io::{self, Write};

/// Versión fija de la status line, sin importar la del request
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Valor del header `Server` en todas las respuestas
pub const SERVER_NAME: &str = "BasicHttpServer/1.0";

/// Representa una respuesta HTTP en construcción
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Código numérico (200 por defecto)
    status_code: u16,

    /// Texto de la status line ("OK" por defecto)
    status_message: String,

    /// Headers; `Content-Type` y `Server` vienen sembrados
    headers: HashMap<String, String>,

    /// Body como texto (vacío por defecto)
    body: String,
}

impl Response {
    /// Crea una respuesta 200 OK con `Content-Type: text/plain` y `Server`
    pub fn new() -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        headers.insert("Server".to_string(), SERVER_NAME.to_string());

        Self {
            status_code: 200,
            status_message: "OK".to_string(),
            headers,
            body: String::new(),
        }
    }

    /// Cambia código y mensaje de la status line
    pub fn set_status(&mut self, code: u16, message: &str) -> &mut Self {
        self.status_code = code;
        self.status_message = message.to_string();
        self
    }

    /// Agrega o sobrescribe un header
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Atajo para `Content-Type`
    pub fn set_content_type(&mut self, content_type: &str) -> &mut Self {
        self.set_header("Content-Type", content_type)
    }

    /// Reemplaza el body y recalcula `Content-Length` (en bytes)
    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = body.into();
        let length = self.body.len().to_string();
        self.set_header("Content-Length", &length)
    }

    /// Serializa la respuesta en `writer` y hace flush.
    ///
    /// No cierra el stream ni recalcula `Content-Length`: eso ya quedó
    /// consistente en [`set_body`](Self::set_body).
    pub fn send<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;

        tracing::debug!(status = self.status_code, message = %self.status_message, "Response enviada");
        Ok(())
    }

    /// Convierte la respuesta a bytes listos para el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        // 1. Status line
        let status_line = format!("{} {} {}\r\n", HTTP_VERSION, self.status_code, self.status_message);
        result.extend_from_slice(status_line.as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            let header_line = format!("{}: {}\r\n", name, value);
            result.extend_from_slice(header_line.as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body tal cual
        result.extend_from_slice(self.body.as_bytes());

        result
    }

    /// Obtiene el código de estado
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Obtiene el mensaje de la status line
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Obtiene un header específico
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene una referencia a los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene el body
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
