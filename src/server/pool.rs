//! # Pool de Workers
//! src/server/pool.rs
//!
//! Un número fijo de threads que toman trabajos de una cola FIFO compartida.
//!
//! ## Cola sin límite
//!
//! Con `capacity = None` (el valor por defecto) la cola no tiene tope: el
//! thread que acepta conexiones nunca se bloquea y una ráfaga de clientes se
//! encola en memoria en vez de aplicar backpressure. Es el comportamiento
//! heredado, no una recomendación para producción; `Some(n)` lo acota y hace
//! que `execute` falle con [`ServerError::QueueFull`].
//!
//! ## Shutdown
//!
//! `shutdown` cierra la cola (nuevos `execute` fallan con `PoolClosed`), deja
//! que los workers terminen lo que ya estaba encolado y espera a que salgan.

use crate::error::{Result, ServerError};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::Span;

/// Trabajo que ejecuta un worker
pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// Cola FIFO thread-safe
struct WorkQueue {
    state: Mutex<QueueState>,
    condvar: Condvar,
    capacity: Option<usize>,
}

impl WorkQueue {
    fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            condvar: Condvar::new(),
            capacity,
        }
    }

    /// Un worker que entró en pánico con el lock tomado no debe trabar al resto
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, job: Job) -> Result<()> {
        let mut state = self.lock();

        if state.closed {
            return Err(ServerError::PoolClosed);
        }
        if let Some(capacity) = self.capacity {
            if state.jobs.len() >= capacity {
                return Err(ServerError::QueueFull(capacity));
            }
        }

        state.jobs.push_back(job);

        // Notificar a un worker esperando
        self.condvar.notify_one();
        Ok(())
    }

    /// Bloquea hasta que haya un trabajo. Retorna `None` cuando la cola está
    /// cerrada y vacía.
    fn pop(&self) -> Option<Job> {
        let mut state = self.lock();

        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.closed {
                return None;
            }
            state = self.condvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Retorna true si esta llamada fue la que cerró la cola
    fn close(&self) -> bool {
        let mut state = self.lock();
        let was_open = !state.closed;
        state.closed = true;
        self.condvar.notify_all();
        was_open
    }

    fn len(&self) -> usize {
        self.lock().jobs.len()
    }
}

/// Pool de tamaño fijo
pub struct WorkerPool {
    queue: Arc<WorkQueue>,
    workers: Vec<JoinHandle<()>>,
    size: usize,
    span: Span,
}

impl WorkerPool {
    /// Crea el pool y arranca `size` workers de inmediato
    pub fn new(size: usize, capacity: Option<usize>, span: Span) -> Result<Self> {
        if size == 0 {
            return Err(ServerError::InvalidConfig("worker pool size must be >= 1".to_string()));
        }

        let queue = Arc::new(WorkQueue::new(capacity));
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let worker_queue = Arc::clone(&queue);
            let worker_span = span.clone();
            let spawned = thread::Builder::new()
                .name(format!("http-worker-{}", id))
                .spawn(move || worker_span.in_scope(|| worker_loop(id, &worker_queue)));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Los workers ya lanzados esperan en la cola: hay que cerrarla
                    queue.close();
                    join_all(workers.drain(..), &span);
                    return Err(e.into());
                }
            }
        }

        tracing::debug!(parent: &span, size, ?capacity, "Pool de workers iniciado");

        Ok(Self {
            queue,
            workers,
            size,
            span,
        })
    }

    /// Encola un trabajo. Nunca bloquea.
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(job))
    }

    /// Cierra la cola y espera a que los workers vacíen lo pendiente.
    /// Llamarlo más de una vez no tiene efecto.
    pub fn shutdown(&mut self) {
        if self.queue.close() {
            tracing::debug!(parent: &self.span, pending = self.queue.len(), "Cerrando pool de workers");
        }

        let span = self.span.clone();
        join_all(self.workers.drain(..), &span);
    }

    /// Handle para encolar desde otro thread sin ser dueño del pool
    pub fn clone_handle(&self) -> PoolHandle {
        PoolHandle {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.size
    }

    /// Trabajos esperando un worker libre
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

/// Lado "productor" del pool; deja de aceptar trabajo cuando el pool se cierra
#[derive(Clone)]
pub struct PoolHandle {
    queue: Arc<WorkQueue>,
}

impl PoolHandle {
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(job))
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_all(workers: impl Iterator<Item = JoinHandle<()>>, span: &Span) {
    for handle in workers {
        if handle.join().is_err() {
            tracing::error!(parent: span, "Un worker terminó con pánico");
        }
    }
}

fn worker_loop(id: usize, queue: &WorkQueue) {
    while let Some(job) = queue.pop() {
        // Un trabajo que entra en pánico no debe achicar el pool
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            tracing::error!(worker = id, reason = %panic_message(&*payload), "Trabajo terminó con pánico");
        }
    }
    tracing::trace!(worker = id, "Worker terminado");
}

/// Extrae el mensaje de un pánico (`&str` o `String`)
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
