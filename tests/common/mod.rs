//! Utilidades compartidas por los tests de integración

#![allow(dead_code)]

use basic_http_server::config::Config;
use basic_http_server::handler::Handler;
use basic_http_server::server::Listener;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

/// Respuesta HTTP parseada desde el cable (inverso de `Response::send`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub version: String,
    pub status_code: u16,
    pub status_message: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ParsedResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }
}

/// Parsea una respuesta completa: status line, headers, línea vacía, body
pub fn parse_response(raw: &[u8]) -> ParsedResponse {
    let text = String::from_utf8_lossy(raw);
    let (head, body) = text
        .split_once("\r\n\r\n")
        .expect("response without blank line");

    let mut lines = head.split("\r\n");
    let status_line = lines.next().expect("response without status line");
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default().to_string();
    let status_code = parts
        .next()
        .and_then(|code| code.parse().ok())
        .expect("invalid status code");
    let status_message = parts.next().unwrap_or_default().to_string();

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    ParsedResponse {
        version,
        status_code,
        status_message,
        headers,
        body: body.to_string(),
    }
}

/// Levanta un listener en 127.0.0.1 con puerto efímero
pub fn start_server<H: Handler>(workers: usize, handler: H) -> (Listener, SocketAddr) {
    let mut config = Config::default();
    config.host = "127.0.0.1".to_string();
    config.port = Some("0".to_string());
    config.workers = workers;

    let mut listener = Listener::new(config, handler);
    listener.start().expect("failed to start listener");
    let addr = listener.local_addr().expect("listener without address");
    (listener, addr)
}

/// Envía bytes crudos y lee hasta que el servidor cierre la conexión.
/// Con `close_write` el cliente avisa EOF después de enviar.
pub fn send_raw(addr: SocketAddr, raw: &[u8], close_write: bool) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    stream.write_all(raw).expect("write request");
    if close_write {
        stream.shutdown(Shutdown::Write).expect("shutdown write");
    }

    let mut buf = Vec::new();
    // Un reset tras un error del servidor cuenta como "sin respuesta"
    let _ = stream.read_to_end(&mut buf);
    buf
}

/// Atajo: envía un request y parsea la respuesta
pub fn request(addr: SocketAddr, raw: &[u8]) -> ParsedResponse {
    parse_response(&send_raw(addr, raw, true))
}
