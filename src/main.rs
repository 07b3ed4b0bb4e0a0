//! # Basic HTTP Server - Entry Point
//! src/main.rs
//!
//! Lee la configuración, inicializa el logging, arranca el listener con el
//! handler HTML por defecto y espera una señal (Ctrl-C / SIGTERM) para
//! detenerlo ordenadamente.

use basic_http_server::config::Config;
use basic_http_server::handler::EchoPageHandler;
use basic_http_server::server::Listener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Crear configuración (CLI + env)
    let mut config = Config::new();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| "basic_http_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = config.resolve_port();
    tracing::info!(port, config = %config.summary_json(), "Starting HTTP server");

    let mut listener = Listener::new(config, EchoPageHandler::new());
    if let Err(e) = listener.start() {
        tracing::error!(error = %e, "Failed to start server");
        std::process::exit(1);
    }

    tracing::info!("Server started successfully. Press Ctrl+C to stop.");

    if let Err(e) = wait_for_shutdown_signal() {
        tracing::error!(error = %e, "No se pudo esperar la señal de apagado");
    }

    tracing::info!("Shutting down HTTP server");
    if let Err(e) = listener.stop() {
        tracing::error!(error = %e, "Error stopping server");
    }
}

/// Bloquea el thread principal hasta recibir SIGINT o SIGTERM
fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(shutdown_signal())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
