use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection id used for messages that are not bound to a client connection
pub const NO_CONNECTION: i64 = -1;

/// Commands a worker can run or report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandId {
    /// Build the album cache
    AlbumCacheCreate,
    /// Notification carrying a freshly built album cache
    AlbumCacheCreated,
    SmartplsUpdateAll,
    SmartplsUpdate,
    StickerCacheCreate,
}

impl CommandId {
    /// JSON-RPC method name for the command
    pub fn method_name(&self) -> &'static str {
        match self {
            CommandId::AlbumCacheCreate => "MPD_API_ALBUMCACHE_CREATE",
            CommandId::AlbumCacheCreated => "MPD_API_ALBUMCACHE_CREATED",
            CommandId::SmartplsUpdateAll => "MPD_API_SMARTPLS_UPDATE_ALL",
            CommandId::SmartplsUpdate => "MPD_API_SMARTPLS_UPDATE",
            CommandId::StickerCacheCreate => "MPD_API_STICKERCACHE_CREATE",
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// A unit of work handed to a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRequest {
    pub connection_id: i64,
    pub request_id: i64,
    pub cmd_id: CommandId,
    pub method: String,
    /// Raw JSON parameters of the request
    pub data: String,
}

impl WorkRequest {
    pub fn new(connection_id: i64, request_id: i64, cmd_id: CommandId) -> Self {
        Self {
            connection_id,
            request_id,
            cmd_id,
            method: cmd_id.method_name().to_string(),
            data: String::new(),
        }
    }

    /// Request that is not tied to any client connection
    pub fn internal(cmd_id: CommandId) -> Self {
        Self::new(NO_CONNECTION, 0, cmd_id)
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }
}
