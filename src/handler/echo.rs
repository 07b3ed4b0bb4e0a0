//! # Handler por defecto
//! src/handler/echo.rs
//!
//! Responde con una página HTML que muestra lo que llegó: método, path,
//! versión y headers. Un PUT además muestra el body recibido.

use super::Handler;
use crate::http::{Request, Response};

/// Handler que devuelve una página HTML con los detalles del request
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoPageHandler;

impl EchoPageHandler {
    pub fn new() -> Self {
        Self
    }

    fn render_put(request: &Request) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("    <title>PUT Request Processed</title>\n");
        html.push_str("</head>\n<body>\n");
        html.push_str("    <h1>PUT Request Processed</h1>\n");
        html.push_str("    <p>The server has successfully processed your PUT request.</p>\n");
        push_details(&mut html, request);

        if let Some(body) = request.body_str().filter(|b| !b.is_empty()) {
            html.push_str("    <h2>Request Body:</h2>\n");
            html.push_str(&format!("    <pre>{}</pre>\n", body));
        }

        push_headers(&mut html, request);
        html.push_str("</body>\n</html>");
        html
    }

    fn render_default(request: &Request) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("    <title>Basic HTTP Server</title>\n");
        html.push_str("</head>\n<body>\n");
        html.push_str("    <h1>Hello, World!</h1>\n");
        html.push_str("    <p>This is a response from the Basic HTTP Server.</p>\n");
        push_details(&mut html, request);
        push_headers(&mut html, request);
        html.push_str("</body>\n</html>");
        html
    }
}

impl Handler for EchoPageHandler {
    fn handle(&self, request: &Request, response: &mut Response) {
        tracing::info!(method = %request.method(), path = %request.path(), "Atendiendo request");

        let page = match request.method() {
            "PUT" => Self::render_put(request),
            _ => Self::render_default(request),
        };

        response.set_content_type("text/html").set_body(page);
    }
}

fn push_details(html: &mut String, request: &Request) {
    html.push_str("    <h2>Request Details:</h2>\n    <ul>\n");
    html.push_str(&format!("        <li>Method: {}</li>\n", request.method()));
    html.push_str(&format!("        <li>Path: {}</li>\n", request.path()));
    html.push_str(&format!("        <li>HTTP Version: {}</li>\n", request.version()));
    html.push_str("    </ul>\n");
}

fn push_headers(html: &mut String, request: &Request) {
    html.push_str("    <h2>Headers:</h2>\n    <ul>\n");
    for (name, value) in request.headers() {
        html.push_str(&format!("        <li>{}: {}</li>\n", name, value));
    }
    html.push_str("    </ul>\n");
}
