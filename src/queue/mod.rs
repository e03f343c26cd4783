//! Completion queue used by workers to hand results back to the consuming thread

mod message;

pub use message::{Attachment, CompletionMessage};

use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;

/// Thread-safe mailbox with priority bands.
///
/// Any number of threads may [`push`](Self::push); a single consumer pops.
/// Higher priorities are delivered first, FIFO within a priority band.
#[derive(Debug, Default)]
pub struct CompletionQueue {
    bands: Mutex<BTreeMap<i32, VecDeque<CompletionMessage>>>,
    available: Condvar,
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message and wake the consumer
    pub fn push(&self, message: CompletionMessage) {
        debug!(
            "Queueing {} for connection {}",
            message.method, message.connection_id
        );
        let mut bands = self.bands.lock();
        bands.entry(message.priority).or_default().push_back(message);
        drop(bands);
        self.available.notify_one();
    }

    /// Take the next message without waiting
    pub fn try_pop(&self) -> Option<CompletionMessage> {
        let mut bands = self.bands.lock();
        Self::take_next(&mut bands)
    }

    /// Block until a message is available
    pub fn pop(&self) -> CompletionMessage {
        let mut bands = self.bands.lock();
        loop {
            if let Some(message) = Self::take_next(&mut bands) {
                return message;
            }
            self.available.wait(&mut bands);
        }
    }

    /// Block until a message is available or `timeout` elapses
    pub fn pop_timeout(&self, timeout: Duration) -> Option<CompletionMessage> {
        let deadline = Instant::now() + timeout;
        let mut bands = self.bands.lock();
        loop {
            if let Some(message) = Self::take_next(&mut bands) {
                return Some(message);
            }
            if self.available.wait_until(&mut bands, deadline).timed_out() {
                return Self::take_next(&mut bands);
            }
        }
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.bands.lock().values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_next(
        bands: &mut BTreeMap<i32, VecDeque<CompletionMessage>>,
    ) -> Option<CompletionMessage> {
        let mut band = bands.last_entry()?;
        let message = band.get_mut().pop_front();
        if band.get().is_empty() {
            band.remove();
        }
        message
    }
}
