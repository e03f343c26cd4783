use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing::{debug, info};

use crate::album_cache::AlbumCache;
use crate::config::SharedState;
use crate::connection::{Connector, MpdConnector};
use crate::queue::{CompletionMessage, CompletionQueue};
use crate::request::{CommandId, WorkRequest};
use crate::worker::WorkerSupervisor;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Command to build the album cache in a worker and print it
pub struct AlbumsCommand {
    state: SharedState,
    timeout: Duration,
    json: bool,
}

impl AlbumsCommand {
    pub fn new(state: SharedState, timeout: Duration, json: bool) -> Self {
        Self {
            state,
            timeout,
            json,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let cache = self.build_cache(Arc::new(MpdConnector)).await?;
        println!("{}", self.render(&cache)?);
        Ok(())
    }

    /// Run the album cache worker against `connector` and wait for its result
    pub async fn build_cache(&self, connector: Arc<dyn Connector>) -> Result<AlbumCache> {
        let supervisor = Arc::new(WorkerSupervisor::new(
            Arc::new(CompletionQueue::new()),
            connector,
        ));

        info!(
            "🔎 Building album cache from {}",
            self.state.mpd.address()
        );
        supervisor
            .try_start(
                &self.state,
                WorkRequest::internal(CommandId::AlbumCacheCreate),
            )
            .map_err(|e| anyhow!("Failed to start worker: {}", e))?;

        let waiter = Arc::clone(&supervisor);
        let timeout = self.timeout;
        let wait = tokio::task::spawn_blocking(move || wait_for_completion(&waiter, timeout));

        // Set up signal handling for graceful shutdown
        tokio::pin! {
            let shutdown_signal = signal::ctrl_c();
        }

        let mut message = tokio::select! {
            _ = &mut shutdown_signal => {
                return Err(anyhow!("Interrupted while waiting for the album cache"));
            }
            result = wait => result??,
        };

        let cache = message
            .take_album_cache()
            .ok_or_else(|| anyhow!("Album cache build failed"))?;
        info!("✅ Album cache ready with {} albums", cache.len());
        Ok(cache)
    }

    /// Format the cache as text lines or a JSON array
    pub fn render(&self, cache: &AlbumCache) -> Result<String> {
        if self.json {
            return Ok(serde_json::to_string_pretty(&cache.summaries())?);
        }
        Ok(cache
            .iter()
            .map(|(key, song)| format!("{}\t{}", key, song.uri))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Wait for the worker's message, giving up early when every worker has
/// exited without pushing one
fn wait_for_completion(supervisor: &WorkerSupervisor, timeout: Duration) -> Result<CompletionMessage> {
    let queue = supervisor.queue();
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(message) = queue.pop_timeout(POLL_INTERVAL) {
            return Ok(message);
        }
        if supervisor.active_workers() == 0 {
            return queue
                .try_pop()
                .ok_or_else(|| anyhow!("Worker stopped without a result, is the server reachable?"));
        }
        if Instant::now() >= deadline {
            return Err(anyhow!(
                "Timed out after {:?} waiting for the album cache",
                timeout
            ));
        }
        debug!("Still waiting for the album cache");
    }
}
