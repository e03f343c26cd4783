//! Boundary to the remote catalog server.
//!
//! Workers only talk to the catalog through [`Connection`]; [`Connector`]
//! opens connections from a set of [`ConnectionParams`]. The [`mpd`]
//! submodule implements both for the MPD line protocol, [`memory`] serves
//! a fixed song list.

pub mod memory;
pub mod mpd;

use crate::config::ConnectionParams;
use crate::error::ConnectionResult;
use crate::song::Song;

pub use memory::{MemoryConnection, MemoryConnector, MemoryStats};
pub use mpd::{MpdConnection, MpdConnector};

/// How a connection is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectMode {
    /// Say goodbye to the server before closing the socket
    Graceful,
    /// Drop the socket without waiting for the server
    Instant,
}

/// An open, blocking connection to the catalog
pub trait Connection: Send {
    /// Start a "list all entries" query limited to `[start, end)`.
    ///
    /// Covers both building and committing the query; an error leaves the
    /// query in flight and callers are expected to [`cancel`](Self::cancel).
    fn search_window(&mut self, start: u32, end: u32) -> ConnectionResult<()>;

    /// Next entry of the current query, `None` once the server signals the end
    fn recv_song(&mut self) -> ConnectionResult<Option<Song>>;

    /// Consume what is left of the current response
    fn finish(&mut self) -> ConnectionResult<()>;

    /// Abandon the query in flight
    fn cancel(&mut self);

    fn disconnect(&mut self, mode: DisconnectMode);
}

/// Opens connections; shared between all workers
pub trait Connector: Send + Sync {
    fn connect(&self, params: &ConnectionParams) -> ConnectionResult<Box<dyn Connection>>;
}
