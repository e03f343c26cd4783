//! Background workers for a music-server client.
//!
//! A [`worker::WorkerSupervisor`] starts detached worker threads that each
//! run one request against the catalog server with a private
//! [`worker::WorkerSnapshot`] of the shared state. Results, including owned
//! data such as a freshly built [`album_cache::AlbumCache`], come back
//! through the [`queue::CompletionQueue`].
//!
//! Allocation failure is not recoverable: the global allocator aborts the
//! process, and release builds are compiled with `panic = "abort"`.

pub mod album_cache;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod queue;
pub mod request;
pub mod song;
pub mod worker;

pub use album_cache::{AlbumCache, AlbumCacheBuilder, AlbumKey};
pub use config::{ConnectionParams, SharedState};
pub use error::{ConnectionError, WorkerError};
pub use queue::{Attachment, CompletionMessage, CompletionQueue};
pub use request::{CommandId, WorkRequest};
pub use worker::{WorkerSnapshot, WorkerSupervisor};
