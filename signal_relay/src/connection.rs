//! Outbound handle for a single client connection

use crate::error::SignalingError;
use crate::protocol::ServerMessage;
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Default number of messages queued for a connection before new ones are dropped
pub const DEFAULT_OUTBOX_CAPACITY: usize = 100;

/// Connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A cloneable sender for one client.
///
/// Sending never blocks: messages go into a bounded queue drained by the
/// connection's writer, which owns the socket. Two handles are equal when
/// they address the same connection.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    outbox: mpsc::Sender<ServerMessage>,
}

impl Connection {
    /// Create a handle with the default queue size, together with the
    /// receiving end of its queue
    pub fn channel() -> (Self, mpsc::Receiver<ServerMessage>) {
        Self::with_capacity(DEFAULT_OUTBOX_CAPACITY)
    }

    /// Create a handle whose queue holds at most `capacity` messages
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (outbox, rx) = mpsc::channel(capacity.max(1));
        let connection = Self {
            id: ConnectionId::new(),
            outbox,
        };
        (connection, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a message for delivery.
    ///
    /// Fails with [`SignalingError::QueueFull`] while the writer is behind and
    /// with [`SignalingError::ChannelClosed`] once it is gone. Either way the
    /// message is dropped.
    pub fn send(&self, message: ServerMessage) -> Result<(), SignalingError> {
        self.outbox.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => SignalingError::QueueFull,
            TrySendError::Closed(_) => SignalingError::ChannelClosed,
        })
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}
