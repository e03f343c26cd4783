use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{ActiveWorker, WorkerSnapshot};
use crate::album_cache::AlbumCacheBuilder;
use crate::connection::{Connection, Connector, DisconnectMode};
use crate::error::{ConnectionError, ConnectionResult, WorkerError};
use crate::queue::{CompletionMessage, CompletionQueue};
use crate::request::{CommandId, WorkRequest};

/// Lifecycle of a single worker run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Connecting,
    Running,
    Disconnecting,
    Done,
}

/// Snapshot plus the connections a worker opened with it
pub struct WorkerContext {
    pub snapshot: WorkerSnapshot,
    connector: Arc<dyn Connector>,
    primary: Option<Box<dyn Connection>>,
    sticker: Option<Box<dyn Connection>>,
}

impl WorkerContext {
    pub fn new(snapshot: WorkerSnapshot, connector: Arc<dyn Connector>) -> Self {
        Self {
            snapshot,
            connector,
            primary: None,
            sticker: None,
        }
    }

    /// Open the primary catalog connection
    pub fn connect(&mut self) -> ConnectionResult<()> {
        self.primary = Some(self.connector.connect(&self.snapshot.mpd)?);
        Ok(())
    }

    pub fn primary_connection(&mut self) -> Option<&mut (dyn Connection + 'static)> {
        self.primary.as_deref_mut()
    }

    /// Sticker database connection, opened on first use
    pub fn sticker_connection(&mut self) -> ConnectionResult<&mut (dyn Connection + 'static)> {
        if self.sticker.is_none() {
            self.sticker = Some(self.connector.connect(&self.snapshot.stickerdb)?);
        }
        match self.sticker.as_deref_mut() {
            Some(conn) => Ok(conn),
            None => Err(ConnectionError::Closed),
        }
    }

    /// Close the primary connection gracefully and the sticker connection
    /// without a handshake
    pub fn disconnect(&mut self) {
        if let Some(mut primary) = self.primary.take() {
            primary.disconnect(DisconnectMode::Graceful);
        }
        if let Some(mut sticker) = self.sticker.take() {
            sticker.disconnect(DisconnectMode::Instant);
        }
    }
}

/// Everything a detached worker thread owns
pub(crate) struct WorkerTask {
    id: Uuid,
    context: WorkerContext,
    request: WorkRequest,
    queue: Arc<CompletionQueue>,
    _active: ActiveWorker,
}

impl WorkerTask {
    pub(crate) fn new(
        context: WorkerContext,
        request: WorkRequest,
        queue: Arc<CompletionQueue>,
        active: ActiveWorker,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            context,
            request,
            queue,
            _active: active,
        }
    }

    /// Thread entry point; always runs through to `Done`
    pub(crate) fn run(mut self) {
        info!(
            "Starting catalog worker {} for {}",
            self.id, self.request.method
        );

        let mut state = TaskState::Connecting;
        while state != TaskState::Done {
            debug!("Worker {} state: {:?}", self.id, state);
            state = match state {
                TaskState::Connecting => match self.context.connect() {
                    Ok(()) => TaskState::Running,
                    Err(e) => {
                        error!(
                            "Worker {} can not connect to {}: {}",
                            self.id,
                            self.context.snapshot.mpd.address(),
                            e
                        );
                        TaskState::Disconnecting
                    }
                },
                TaskState::Running => {
                    self.dispatch();
                    TaskState::Disconnecting
                }
                TaskState::Disconnecting => {
                    self.context.disconnect();
                    TaskState::Done
                }
                TaskState::Done => TaskState::Done,
            };
        }

        info!("Stopping catalog worker {}", self.id);
    }

    fn dispatch(&mut self) {
        let Some(conn) = self.context.primary.as_deref_mut() else {
            return;
        };
        match self.request.cmd_id {
            CommandId::AlbumCacheCreate => {
                AlbumCacheBuilder::new().create(conn, &self.queue);
            }
            other => {
                let err = WorkerError::UnsupportedCommand(other);
                warn!("Worker {}: {}", self.id, err);
                self.queue
                    .push(CompletionMessage::error(&self.request, &err.to_string()));
            }
        }
    }
}
