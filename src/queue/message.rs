use serde::Serialize;

use crate::album_cache::AlbumCache;
use crate::request::{CommandId, WorkRequest, NO_CONNECTION};

/// Owned data moved from a worker to the consumer along with a message
#[derive(Debug)]
pub enum Attachment {
    AlbumCache(AlbumCache),
}

/// Result of a worker run, delivered through the
/// [`CompletionQueue`](super::CompletionQueue)
#[derive(Debug)]
pub struct CompletionMessage {
    pub connection_id: i64,
    pub request_id: i64,
    pub priority: i32,
    pub cmd_id: CommandId,
    pub method: String,
    /// JSON-RPC formatted body
    pub payload: String,
    pub attachment: Option<Attachment>,
}

#[derive(Serialize)]
struct Notification<'a> {
    jsonrpc: &'static str,
    id: i64,
    method: &'a str,
    params: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    jsonrpc: &'static str,
    id: i64,
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    method: &'a str,
    message: &'a str,
}

impl CompletionMessage {
    /// Parameterless JSON-RPC notification not bound to any connection
    pub fn notification(cmd_id: CommandId) -> Self {
        let method = cmd_id.method_name();
        let body = Notification {
            jsonrpc: "2.0",
            id: 0,
            method,
            params: serde_json::Map::new(),
        };
        Self {
            connection_id: NO_CONNECTION,
            request_id: 0,
            priority: 0,
            cmd_id,
            method: method.to_string(),
            payload: to_json(&body),
            attachment: None,
        }
    }

    /// JSON-RPC error answering `request`
    pub fn error(request: &WorkRequest, message: &str) -> Self {
        let body = ErrorResponse {
            jsonrpc: "2.0",
            id: request.request_id,
            error: ErrorBody {
                method: &request.method,
                message,
            },
        };
        Self {
            connection_id: request.connection_id,
            request_id: request.request_id,
            priority: 0,
            cmd_id: request.cmd_id,
            method: request.method.clone(),
            payload: to_json(&body),
            attachment: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_album_cache(mut self, cache: AlbumCache) -> Self {
        self.attachment = Some(Attachment::AlbumCache(cache));
        self
    }

    /// Move the attached album cache out of the message
    pub fn take_album_cache(&mut self) -> Option<AlbumCache> {
        match self.attachment.take() {
            Some(Attachment::AlbumCache(cache)) => Some(cache),
            None => None,
        }
    }
}

fn to_json<T: Serialize>(body: &T) -> String {
    // Plain structs of strings and integers always serialize
    serde_json::to_string(body).unwrap_or_default()
}
