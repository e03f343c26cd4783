//! Error types shared by the worker and connection layers

use thiserror::Error;

use crate::request::CommandId;

/// Errors raised while talking to the catalog server
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error {code} in {command:?}: {message}")]
    Protocol {
        code: u32,
        command: String,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Connection closed")]
    Closed,
}

/// Errors raised by the worker envelope
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Can not spawn worker thread: {0}")]
    Spawn(std::io::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Unsupported worker command: {0}")]
    UnsupportedCommand(CommandId),
}

/// Result type alias for connection operations
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;
