//! # Listener TCP
//! src/server/listener.rs
//!
//! Dueño del socket de escucha. Un thread dedicado (`http-acceptor`) acepta
//! conexiones y las entrega al pool de workers; cada worker atiende una
//! conexión completa de forma bloqueante.
//!
//! ## Estados
//!
//! ```text
//! Created --start()--> Listening --stop()--> Stopped
//! ```
//!
//! No se vuelve a `Listening` con la misma instancia.
//!
//! ## Shutdown
//!
//! `accept()` de la librería estándar no se puede interrumpir desde otro
//! thread, así que `stop()` baja la bandera `running` y se conecta a sí mismo
//! para despertar al acceptor. El acceptor descarta esa conexión, sale del
//! loop y suelta el socket de escucha (que así queda cerrado). Después se
//! cierra el pool: lo ya encolado se termina de atender.

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::handler::Handler;
use crate::server::connection::ConnectionHandler;
use crate::server::pool::{PoolHandle, WorkerPool};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::Span;

/// Tiempo máximo para la conexión que despierta al acceptor
const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Ciclo de vida del listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Construido, todavía sin socket
    Created,

    /// Socket abierto y acceptor corriendo
    Listening,

    /// Detenido; no se puede volver a arrancar
    Stopped,
}

/// Servidor HTTP: socket de escucha + acceptor + pool
pub struct Listener {
    config: Config,
    handler: Arc<dyn Handler>,
    state: ListenerState,
    running: Arc<AtomicBool>,
    local_addr: Option<SocketAddr>,
    acceptor: Option<JoinHandle<()>>,
    pool: Option<WorkerPool>,
    span: Span,
}

impl Listener {
    /// Crea un listener sin abrir ningún socket todavía
    pub fn new<H: Handler>(config: Config, handler: H) -> Self {
        Self::with_shared_handler(config, Arc::new(handler))
    }

    /// Igual que [`new`](Self::new) para un handler ya compartido
    pub fn with_shared_handler(config: Config, handler: Arc<dyn Handler>) -> Self {
        let span = tracing::info_span!("listener", addr = %config.address());
        Self {
            config,
            handler,
            state: ListenerState::Created,
            running: Arc::new(AtomicBool::new(false)),
            local_addr: None,
            acceptor: None,
            pool: None,
            span,
        }
    }

    /// Reemplaza el span bajo el cual se registran todos los eventos
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Abre el socket y arranca el acceptor. Retorna en cuanto el socket
    /// está escuchando; un error de bind se devuelve aquí.
    pub fn start(&mut self) -> Result<()> {
        if self.state != ListenerState::Created {
            return Err(ServerError::InvalidState(self.state));
        }
        self.config.validate().map_err(ServerError::InvalidConfig)?;

        let address = self.config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;
        let local_addr = listener.local_addr()?;

        let pool = WorkerPool::new(
            self.config.workers,
            self.config.queue_limit(),
            self.span.clone(),
        )?;

        let connection = ConnectionHandler::new(Arc::clone(&self.handler))
            .with_parse_mode(self.config.parse_mode())
            .with_read_timeout(self.config.read_timeout())
            .with_span(self.span.clone());

        self.running.store(true, Ordering::SeqCst);

        let acceptor = AcceptLoop {
            listener,
            pool: pool.clone_handle(),
            connection,
            running: Arc::clone(&self.running),
        };
        let span = self.span.clone();
        let handle = thread::Builder::new()
            .name("http-acceptor".to_string())
            .spawn(move || span.in_scope(|| acceptor.run()));

        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        self.local_addr = Some(local_addr);
        self.acceptor = Some(handle);
        self.pool = Some(pool);
        self.state = ListenerState::Listening;

        tracing::info!(
            parent: &self.span,
            address = %local_addr,
            workers = self.config.workers,
            "Servidor HTTP escuchando"
        );
        Ok(())
    }

    /// Deja de aceptar conexiones, cierra el socket y apaga el pool.
    ///
    /// Las conexiones en curso o ya encoladas se atienden hasta el final.
    /// Se puede llamar más de una vez.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            ListenerState::Stopped => return Ok(()),
            ListenerState::Created => {
                self.state = ListenerState::Stopped;
                return Ok(());
            }
            ListenerState::Listening => {}
        }

        self.running.store(false, Ordering::SeqCst);

        if let Some(addr) = self.local_addr {
            // Si el acceptor ya salió, la conexión falla y da igual
            let _ = TcpStream::connect_timeout(&wake_address(addr), WAKE_TIMEOUT);
        }

        if let Some(handle) = self.acceptor.take() {
            if handle.join().is_err() {
                tracing::error!(parent: &self.span, "El acceptor terminó con pánico");
            }
        }

        if let Some(mut pool) = self.pool.take() {
            pool.shutdown();
        }

        self.state = ListenerState::Stopped;
        tracing::info!(parent: &self.span, "Servidor HTTP detenido");
        Ok(())
    }

    /// Estado actual
    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Dirección real del socket (útil con puerto 0); `None` antes de `start`
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Si el acceptor sigue activo
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Estado que vive en el thread acceptor
struct AcceptLoop {
    listener: TcpListener,
    pool: PoolHandle,
    connection: ConnectionHandler,
    running: Arc<AtomicBool>,
}

impl AcceptLoop {
    fn run(self) {
        for stream in self.listener.incoming() {
            if !self.running.load(Ordering::SeqCst) {
                // Conexión de despertar (o cliente tardío): se cierra sin atender
                break;
            }

            match stream {
                Ok(stream) => self.dispatch(stream),
                Err(e) => {
                    tracing::error!(error = %e, "Error al aceptar conexión");
                }
            }
        }

        tracing::debug!("Acceptor terminado, socket de escucha cerrado");
        // `self.listener` se suelta aquí y cierra el socket
    }

    fn dispatch(&self, stream: TcpStream) {
        let connection = self.connection.clone();
        if let Err(e) = self.pool.execute(move || connection.handle(stream)) {
            // El stream viaja dentro del trabajo rechazado y se cierra con él
            tracing::warn!(error = %e, "Conexión rechazada por el pool");
        }
    }
}

/// Una dirección "unspecified" (0.0.0.0 / ::) no sirve para conectarse
fn wake_address(addr: SocketAddr) -> SocketAddr {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, addr.port())
}
