//! In-memory catalog used by tests and benchmarks.
//!
//! Serves a fixed list of songs through the [`Connection`] API and records
//! what workers did with it.

use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use super::{Connection, Connector, DisconnectMode};
use crate::config::ConnectionParams;
use crate::error::{ConnectionError, ConnectionResult};
use crate::song::Song;

/// What happened on connections opened by a [`MemoryConnector`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryStats {
    /// Addresses of every successful connect
    pub connects: Vec<String>,
    pub windows: Vec<(u32, u32)>,
    pub cancels: usize,
    pub disconnects: Vec<DisconnectMode>,
}

#[derive(Clone, Default)]
pub struct MemoryConnector {
    songs: Arc<Vec<Song>>,
    fail_connect: bool,
    fail_window: Option<usize>,
    stats: Arc<Mutex<MemoryStats>>,
}

impl MemoryConnector {
    pub fn new(songs: Vec<Song>) -> Self {
        Self {
            songs: Arc::new(songs),
            ..Default::default()
        }
    }

    /// Refuse every connection attempt
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Fail the `nth` (1-based) window query of each connection
    pub fn failing_window(mut self, nth: usize) -> Self {
        self.fail_window = Some(nth);
        self
    }

    pub fn stats(&self) -> MutexGuard<'_, MemoryStats> {
        self.stats.lock()
    }

    /// Open a connection without going through [`Connector::connect`]
    pub fn open(&self) -> MemoryConnection {
        MemoryConnection {
            songs: Arc::clone(&self.songs),
            page: VecDeque::new(),
            fail_window: self.fail_window,
            window_count: 0,
            stats: Arc::clone(&self.stats),
        }
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, params: &ConnectionParams) -> ConnectionResult<Box<dyn Connection>> {
        if self.fail_connect {
            return Err(ConnectionError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("{} refused the connection", params.address()),
            )));
        }
        self.stats.lock().connects.push(params.address());
        Ok(Box::new(self.open()))
    }
}

pub struct MemoryConnection {
    songs: Arc<Vec<Song>>,
    page: VecDeque<Song>,
    fail_window: Option<usize>,
    window_count: usize,
    stats: Arc<Mutex<MemoryStats>>,
}

impl Connection for MemoryConnection {
    fn search_window(&mut self, start: u32, end: u32) -> ConnectionResult<()> {
        self.window_count += 1;
        self.stats.lock().windows.push((start, end));
        if self.fail_window == Some(self.window_count) {
            return Err(ConnectionError::Protocol {
                code: 5,
                command: "search".to_string(),
                message: "window query failed".to_string(),
            });
        }

        let end = (end as usize).min(self.songs.len());
        let start = (start as usize).min(end);
        self.page = self.songs[start..end].iter().cloned().collect();
        Ok(())
    }

    fn recv_song(&mut self) -> ConnectionResult<Option<Song>> {
        Ok(self.page.pop_front())
    }

    fn finish(&mut self) -> ConnectionResult<()> {
        self.page.clear();
        Ok(())
    }

    fn cancel(&mut self) {
        self.page.clear();
        self.stats.lock().cancels += 1;
    }

    fn disconnect(&mut self, mode: DisconnectMode) {
        self.page.clear();
        self.stats.lock().disconnects.push(mode);
    }
}
