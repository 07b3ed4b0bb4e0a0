//! # Manejo de una Conexión
//! src/server/connection.rs
//!
//! Ciclo completo de un socket aceptado:
//!
//! 1. Parsear el request desde el stream
//! 2. Crear una `Response` nueva con valores por defecto
//! 3. Invocar el handler inyectado
//! 4. Serializar la respuesta
//! 5. Cerrar el socket, siempre, incluso si algo falló
//!
//! Cualquier error (parseo, pánico del handler, escritura) se registra y
//! solo afecta a esa conexión. En ese caso no se garantiza que el cliente
//! reciba respuesta alguna.

use crate::error::{Result, ServerError};
use crate::handler::Handler;
use crate::http::{ParseMode, Request, Response};
use crate::server::pool::panic_message;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Span;

/// Espera máxima por más bytes cuando el body llegó incompleto
const BODY_LINGER: Duration = Duration::from_millis(50);

/// Contador para identificar conexiones en los logs
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Orquesta una conexión: request → handler → response → close
#[derive(Clone)]
pub struct ConnectionHandler {
    handler: Arc<dyn Handler>,
    parse_mode: ParseMode,
    read_timeout: Option<Duration>,
    span: Span,
}

impl ConnectionHandler {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            parse_mode: ParseMode::Lenient,
            read_timeout: None,
            span: Span::none(),
        }
    }

    /// Modo del parser de requests
    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    /// Timeout de lectura para cada socket (`None` = bloquear sin límite)
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Span padre de los spans por conexión
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Atiende un socket de principio a fin y lo cierra.
    ///
    /// Nunca propaga errores: quedan registrados en el log.
    pub fn handle(&self, stream: TcpStream) {
        let id = CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let span = tracing::info_span!(parent: &self.span, "connection", id, peer = %peer);
        let _enter = span.enter();

        let start = Instant::now();
        match self.serve_stream(&stream) {
            Ok(response) => {
                tracing::debug!(
                    status = response.status_code(),
                    latency_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Conexión atendida"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error atendiendo conexión");
            }
        }

        // El cierre ocurre al soltar `stream`; el shutdown explícito avisa
        // al cliente aunque exista otro handle del socket.
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            tracing::trace!(error = %e, "Socket ya estaba cerrado");
        }
    }

    fn serve_stream(&self, stream: &TcpStream) -> Result<Response> {
        stream.set_read_timeout(self.read_timeout)?;
        let linger = self.read_timeout.map_or(BODY_LINGER, |timeout| timeout.min(BODY_LINGER));

        // Un body más corto que Content-Length no debe dejar al worker
        // esperando a un cliente que ya terminó de enviar
        let reader = BufReader::new(stream);
        let request = Request::parse_streaming(reader, self.parse_mode, |reader| {
            reader.get_ref().set_read_timeout(Some(linger))
        })?;

        self.respond(&request, stream)
    }

    /// Ejecuta parseo, handler y envío sobre streams arbitrarios
    pub fn serve<R: BufRead, W: Write>(&self, reader: R, writer: W) -> Result<Response> {
        let request = Request::parse_with(reader, self.parse_mode)?;
        self.respond(&request, writer)
    }

    fn respond<W: Write>(&self, request: &Request, writer: W) -> Result<Response> {
        tracing::debug!(method = %request.method(), path = %request.path(), "Request recibido");

        let mut response = Response::new();
        self.invoke_handler(request, &mut response)?;

        response.send(writer)?;
        Ok(response)
    }

    fn invoke_handler(&self, request: &Request, response: &mut Response) -> Result<()> {
        let handler = &self.handler;
        panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request, response)))
            .map_err(|payload| ServerError::HandlerPanicked(panic_message(&*payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ParseError;
    use std::io::{self, Read};
    use std::net::TcpListener;
    use std::thread;

    fn text_handler() -> Arc<dyn Handler> {
        Arc::new(|_req: &Request, res: &mut Response| {
            res.set_content_type("text/plain").set_body("Test response");
        })
    }

    #[test]
    fn test_serve_in_memory() {
        let connection = ConnectionHandler::new(text_handler());
        let mut out = Vec::new();

        let response = connection
            .serve(&b"GET /test HTTP/1.1\r\n\r\n"[..], &mut out)
            .unwrap();

        assert_eq!(response.status_code(), 200);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nTest response"));
    }

    #[test]
    fn test_handler_sees_parsed_request() {
        let handler: Arc<dyn Handler> = Arc::new(|req: &Request, res: &mut Response| {
            let body = req.body_str().unwrap_or_default().into_owned();
            res.set_body(format!("{} {} [{}]", req.method(), req.path(), body));
        });
        let connection = ConnectionHandler::new(handler);
        let mut out = Vec::new();

        let response = connection
            .serve(&b"PUT /r HTTP/1.1\r\nContent-Length: 4\r\n\r\ndata"[..], &mut out)
            .unwrap();

        assert_eq!(response.body(), "PUT /r [data]");
    }

    #[test]
    fn test_parse_error_writes_nothing() {
        let connection = ConnectionHandler::new(text_handler());
        let mut out = Vec::new();

        let result = connection.serve(&b"POST / HTTP/1.1\r\nContent-Length: x\r\n\r\n"[..], &mut out);

        assert!(matches!(
            result,
            Err(ServerError::Parse(ParseError::InvalidContentLength(_)))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_strict_mode_is_applied() {
        let connection = ConnectionHandler::new(text_handler()).with_parse_mode(ParseMode::Strict);
        let mut out = Vec::new();

        let result = connection.serve(&b"GET\r\n\r\n"[..], &mut out);

        assert!(matches!(
            result,
            Err(ServerError::Parse(ParseError::MalformedRequestLine(_)))
        ));
    }

    #[test]
    fn test_handler_panic_is_contained() {
        let handler: Arc<dyn Handler> = Arc::new(|_req: &Request, _res: &mut Response| {
            panic!("handler exploded");
        });
        let connection = ConnectionHandler::new(handler);
        let mut out = Vec::new();

        let result = connection.serve(&b"GET / HTTP/1.1\r\n\r\n"[..], &mut out);

        assert!(matches!(result, Err(ServerError::HandlerPanicked(ref m)) if m == "handler exploded"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_error_is_reported() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let connection = ConnectionHandler::new(text_handler());
        let result = connection.serve(&b"GET / HTTP/1.1\r\n\r\n"[..], Closed);

        assert!(matches!(result, Err(ServerError::Io(_))));
    }

    #[test]
    fn test_handle_closes_socket_after_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let connection = ConnectionHandler::new(text_handler());

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            connection.handle(stream);
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /test HTTP/1.1\r\n\r\n").unwrap();

        // read_to_end solo retorna si el servidor cerró el socket
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.1 200 OK"));
        assert!(text.ends_with("Test response"));

        server.join().unwrap();
    }

    #[test]
    fn test_handle_closes_socket_on_parse_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let connection = ConnectionHandler::new(text_handler());

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            connection.handle(stream);
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client
            .write_all(b"POST / HTTP/1.1\r\nContent-Length: nope\r\n\r\n")
            .unwrap();

        let mut buf = Vec::new();
        // Puede terminar en EOF o en reset; en ambos casos no hay respuesta
        let _ = client.read_to_end(&mut buf);
        assert!(buf.is_empty());

        server.join().unwrap();
    }

    #[test]
    fn test_short_body_without_timeout_gets_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handler: Arc<dyn Handler> = Arc::new(|req: &Request, res: &mut Response| {
            res.set_body(req.body_str().unwrap_or_default().into_owned());
        });
        let connection = ConnectionHandler::new(handler);

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            connection.handle(stream);
        });

        // Sin timeout configurado y sin cerrar la escritura del cliente
        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        client
            .write_all(b"PUT /r HTTP/1.1\r\nContent-Length: 22\r\n\r\nUpdated resource data")
            .unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.1 200 OK"));
        assert!(text.ends_with("\r\n\r\nUpdated resource data"));

        server.join().unwrap();
    }

    #[test]
    fn test_read_timeout_accepts_partial_body() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handler: Arc<dyn Handler> = Arc::new(|req: &Request, res: &mut Response| {
            res.set_body(req.body_str().unwrap_or_default().into_owned());
        });
        let connection =
            ConnectionHandler::new(handler).with_read_timeout(Some(Duration::from_millis(200)));

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            connection.handle(stream);
        });

        // Declara 22 bytes, manda 21 y deja el socket abierto
        let mut client = TcpStream::connect(addr).unwrap();
        client
            .write_all(b"PUT /r HTTP/1.1\r\nContent-Length: 22\r\n\r\nUpdated resource data")
            .unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.ends_with("\r\n\r\nUpdated resource data"));

        server.join().unwrap();
    }
}
