//! Command-line and environment configuration

use crate::connection::DEFAULT_OUTBOX_CAPACITY;
use clap::Parser;

/// Default cap on a single inbound WebSocket message
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// WebSocket signaling relay for two-party WebRTC negotiation
#[derive(Parser, Debug, Clone)]
#[command(name = "signal-relay", version, about)]
pub struct Config {
    /// Host to bind to
    #[arg(long, env = "SIGNAL_RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "SIGNAL_RELAY_PORT", default_value_t = 9090)]
    pub port: u16,

    /// Largest accepted inbound WebSocket message, in bytes
    #[arg(long, env = "SIGNAL_RELAY_MAX_MESSAGE_BYTES", default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    pub max_message_bytes: usize,

    /// Messages queued per connection before further sends to it are dropped
    #[arg(long, env = "SIGNAL_RELAY_OUTBOX_CAPACITY", default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    pub outbox_capacity: usize,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "SIGNAL_RELAY_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            log_level: "info".to_string(),
        }
    }
}
