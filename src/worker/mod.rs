//! Detached background workers.
//!
//! [`WorkerSupervisor::start`] copies the shared state into a
//! [`WorkerSnapshot`], hands it to a new thread together with the request and
//! returns immediately. Results come back through the
//! [`CompletionQueue`].

mod snapshot;
mod task;

pub use snapshot::WorkerSnapshot;
pub use task::WorkerContext;

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::config::SharedState;
use crate::connection::Connector;
use crate::error::WorkerError;
use crate::queue::CompletionQueue;
use crate::request::WorkRequest;
use task::WorkerTask;

/// Name given to every worker thread
pub const WORKER_THREAD_NAME: &str = "catalog-worker";

/// Work handed to a [`Spawn`] implementation
pub type WorkerJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs a worker job on its own unit of execution without joining it.
///
/// A failing spawn must drop `job` before returning.
pub trait Spawn: Send + Sync {
    fn spawn(&self, name: &str, job: WorkerJob) -> io::Result<()>;
}

/// Spawns detached OS threads
#[derive(Debug, Clone, Default)]
pub struct ThreadSpawner;

impl Spawn for ThreadSpawner {
    fn spawn(&self, name: &str, job: WorkerJob) -> io::Result<()> {
        // Dropping the handle detaches the thread
        thread::Builder::new()
            .name(name.to_string())
            .spawn(job)
            .map(drop)
    }
}

/// Counts as one active worker for as long as it lives
pub(crate) struct ActiveWorker(Arc<AtomicUsize>);

impl ActiveWorker {
    fn register(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Starts workers and keeps track of how many are running
pub struct WorkerSupervisor {
    queue: Arc<CompletionQueue>,
    connector: Arc<dyn Connector>,
    spawner: Arc<dyn Spawn>,
    active: Arc<AtomicUsize>,
}

impl WorkerSupervisor {
    pub fn new(queue: Arc<CompletionQueue>, connector: Arc<dyn Connector>) -> Self {
        Self {
            queue,
            connector,
            spawner: Arc::new(ThreadSpawner),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the thread spawner
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawn>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Start a detached worker for `request`.
    ///
    /// Returns `false` if the worker could not be spawned; nothing is pushed
    /// to the completion queue for that request.
    pub fn start(&self, state: &SharedState, request: WorkRequest) -> bool {
        match self.try_start(state, request) {
            Ok(()) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    /// Like [`start`](Self::start) but reports why spawning failed
    pub fn try_start(&self, state: &SharedState, request: WorkRequest) -> Result<(), WorkerError> {
        info!("Starting worker thread for {}", request.method);

        let context = WorkerContext::new(WorkerSnapshot::capture(state), Arc::clone(&self.connector));
        // Registered before spawning so the task can never decrement first;
        // a failed spawn drops the task and with it the registration
        let task = WorkerTask::new(
            context,
            request,
            Arc::clone(&self.queue),
            ActiveWorker::register(&self.active),
        );

        self.spawner
            .spawn(WORKER_THREAD_NAME, Box::new(move || task.run()))
            .map_err(WorkerError::Spawn)
    }

    /// Number of workers that have been started and not yet finished
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait until no worker is running, returns `false` on timeout
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.active_workers() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        true
    }

    pub fn queue(&self) -> &Arc<CompletionQueue> {
        &self.queue
    }
}
