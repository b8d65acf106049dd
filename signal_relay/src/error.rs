//! Error types for the signaling relay

use thiserror::Error;

/// Errors that can occur while running the relay
#[derive(Error, Debug)]
pub enum SignalingError {
    /// The connection's outbound queue is gone (socket closed)
    #[error("Connection closed")]
    ChannelClosed,

    /// The connection's outbound queue is full (client not reading)
    #[error("Outbound queue full")]
    QueueFull,

    /// Binding or serving failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from client requests
#[derive(Error, Debug)]
pub enum ClientRequestError {
    /// Frame was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
