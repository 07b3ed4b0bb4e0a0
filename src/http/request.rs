//! # Parsing de Requests HTTP/1.x
//! src/http/request.rs
//!
//! Este módulo implementa un parser HTTP/1.x desde cero que lee directamente
//! de un stream (normalmente el socket del cliente envuelto en un `BufReader`).
//!
//! ## Formato de un Request
//!
//! ```text
//! PUT /resource HTTP/1.1\r\n
//! Content-Type: text/plain\r\n
//! Content-Length: 21\r\n
//! \r\n
//! Updated resource data
//! ```
//!
//! ## Comportamiento permisivo
//!
//! Por defecto el parser es tolerante: una request line incompleta deja
//! method/path/version vacíos, las líneas de header sin `:` se ignoran y un
//! body más corto que `Content-Length` se acepta tal cual. El único error de
//! formato es un `Content-Length` no numérico. El modo [`ParseMode::Strict`]
//! convierte esos casos en errores.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, BufRead, ErrorKind};
use thiserror::Error;

/// Nombre exacto del header que habilita la lectura del body.
/// La búsqueda es sensible a mayúsculas: `content-length` no cuenta.
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Tope de memoria reservada por adelantado para el body.
const MAX_BODY_PREALLOC: usize = 64 * 1024;

/// Qué tan exigente es el parser con entradas malformadas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Campos faltantes quedan vacíos, líneas inválidas se ignoran
    #[default]
    Lenient,

    /// Cualquier línea malformada o body incompleto es un error
    Strict,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Error)]
pub enum ParseError {
    /// `Content-Length` presente pero no es un entero válido
    #[error("Invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// Request line con menos de 3 partes (solo en modo estricto)
    #[error("Invalid request line: {0:?}")]
    MalformedRequestLine(String),

    /// Header sin `:` o con nombre vacío (solo en modo estricto)
    #[error("Invalid header: {0:?}")]
    MalformedHeader(String),

    /// El stream terminó antes de completar el body (solo en modo estricto)
    #[error("Incomplete body: expected {expected} bytes, read {read}")]
    IncompleteBody { expected: usize, read: usize },

    /// Error de lectura del socket
    #[error("I/O error while reading request: {0}")]
    Io(#[from] io::Error),
}

/// Representa un request HTTP parseado. Inmutable una vez construido.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Método tal como llegó (ej: "GET", "PUT"), vacío si faltaba
    method: String,

    /// Path crudo, sin URL-decode ni separación de query string
    path: String,

    /// Versión tal como llegó (ej: "HTTP/1.1")
    version: String,

    /// Headers; nombres sensibles a mayúsculas, el último duplicado gana
    headers: HashMap<String, String>,

    /// Body, solo si hubo un `Content-Length` positivo
    body: Option<Vec<u8>>,
}

impl Request {
    /// Parsea un request en modo permisivo
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use basic_http_server::http::Request;
    ///
    /// let raw = b"GET /fibonacci?num=10 HTTP/1.1\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(&raw[..]).unwrap();
    ///
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.path(), "/fibonacci?num=10");
    /// assert_eq!(request.header("Host"), Some("localhost"));
    /// assert!(request.body().is_none());
    /// ```
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        Self::parse_with(reader, ParseMode::Lenient)
    }

    /// Parsea un request con el modo indicado
    pub fn parse_with<R: BufRead>(reader: R, mode: ParseMode) -> Result<Self, ParseError> {
        Self::parse_streaming(reader, mode, |_| Ok(()))
    }

    /// Igual que [`parse_with`](Self::parse_with) para streams que pueden
    /// quedarse abiertos sin enviar nada más.
    ///
    /// En modo permisivo, si el primer bloque del body no completa
    /// `Content-Length`, se llama una vez a `on_short_body` antes de volver a
    /// leer. El caller lo usa para que las lecturas siguientes no esperen
    /// (socket no bloqueante o timeout corto): lo que ya llegó es el body. En
    /// modo estricto no se llama y el body se espera completo.
    pub fn parse_streaming<R, F>(mut reader: R, mode: ParseMode, on_short_body: F) -> Result<Self, ParseError>
    where
        R: BufRead,
        F: FnOnce(&mut R) -> io::Result<()>,
    {
        let mut request = Request::default();

        // 1. Request line
        match read_line(&mut reader)? {
            Some(line) => request.parse_request_line(&line, mode)?,
            None if mode == ParseMode::Strict => {
                return Err(ParseError::MalformedRequestLine(String::new()));
            }
            None => {}
        }

        // 2. Headers hasta la línea vacía (o fin del stream)
        while let Some(line) = read_line(&mut reader)? {
            if line.is_empty() {
                break;
            }
            request.parse_header_line(&line, mode)?;
        }

        // 3. Body
        if let Some(raw) = request.headers.get(CONTENT_LENGTH) {
            let length = parse_content_length(raw)?;
            if length > 0 {
                let on_short_body = (mode == ParseMode::Lenient).then_some(on_short_body);
                let body = read_body(&mut reader, length, on_short_body)?;
                if mode == ParseMode::Strict && body.len() < length {
                    return Err(ParseError::IncompleteBody {
                        expected: length,
                        read: body.len(),
                    });
                }
                request.body = Some(body);
            }
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            version = %request.version,
            "Request parseado"
        );

        Ok(request)
    }

    /// Formato: `METHOD SP PATH SP VERSION`, separado por espacios simples
    fn parse_request_line(&mut self, line: &str, mode: ParseMode) -> Result<(), ParseError> {
        let mut parts: Vec<&str> = line.split(' ').collect();

        // Los separadores al final no producen partes vacías
        while parts.last().is_some_and(|part| part.is_empty()) {
            parts.pop();
        }

        if parts.len() < 3 {
            return match mode {
                ParseMode::Strict => Err(ParseError::MalformedRequestLine(line.to_string())),
                ParseMode::Lenient => Ok(()),
            };
        }

        self.method = parts[0].to_string();
        self.path = parts[1].to_string();
        self.version = parts[2].to_string();
        Ok(())
    }

    /// Formato: `Name: Value`, cortado en el primer `:`
    fn parse_header_line(&mut self, line: &str, mode: ParseMode) -> Result<(), ParseError> {
        match line.find(':') {
            Some(colon_pos) if colon_pos > 0 => {
                let name = line[..colon_pos].trim().to_string();
                let value = line[colon_pos + 1..].trim().to_string();
                self.headers.insert(name, value);
                Ok(())
            }
            _ if mode == ParseMode::Strict => Err(ParseError::MalformedHeader(line.to_string())),
            _ => Ok(()),
        }
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico (comparación exacta del nombre)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene el body del request
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Obtiene el body como texto (bytes inválidos se reemplazan por U+FFFD)
    pub fn body_str(&self) -> Option<Cow<'_, str>> {
        self.body.as_deref().map(String::from_utf8_lossy)
    }
}

/// Lee una línea terminada en `\n`, quitando el `\r` final.
/// Retorna `None` si el stream ya terminó.
fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buffer = Vec::new();
    if reader.read_until(b'\n', &mut buffer)? == 0 {
        return Ok(None);
    }

    if buffer.last() == Some(&b'\n') {
        buffer.pop();
    }
    if buffer.last() == Some(&b'\r') {
        buffer.pop();
    }

    Ok(Some(String::from_utf8_lossy(&buffer).into_owned()))
}

/// Acepta signo y el rango de un entero de 32 bits; valores <= 0 significan "sin body"
fn parse_content_length(raw: &str) -> Result<usize, ParseError> {
    let value: i32 = raw
        .parse()
        .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?;

    Ok(usize::try_from(value).unwrap_or(0))
}

/// Lee hasta `length` bytes. Si el stream termina antes (EOF, timeout o
/// `WouldBlock`), se devuelve lo que se alcanzó a leer.
///
/// `on_short_body` corre después del primer bloque que no completa el body.
fn read_body<R, F>(reader: &mut R, length: usize, mut on_short_body: Option<F>) -> Result<Vec<u8>, ParseError>
where
    R: BufRead,
    F: FnOnce(&mut R) -> io::Result<()>,
{
    let mut body = Vec::with_capacity(length.min(MAX_BODY_PREALLOC));

    while body.len() < length {
        let chunk = match reader.fill_buf() {
            Ok(chunk) => chunk,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                tracing::debug!(expected = length, read = body.len(), "No llegó más body, se acepta parcial");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        // EOF
        if chunk.is_empty() {
            break;
        }

        let n = chunk.len().min(length - body.len());
        body.extend_from_slice(&chunk[..n]);
        reader.consume(n);

        if body.len() < length {
            if let Some(hook) = on_short_body.take() {
                hook(reader)?;
            }
        }
    }

    Ok(body)
}
