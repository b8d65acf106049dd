//! WebSocket signaling relay for two-party WebRTC connections
//!
//! Clients that want to open a direct peer connection register a name with
//! the relay and then route their session descriptions and connectivity
//! candidates through it. The relay keeps no media and no history: only the
//! mapping from a claimed name to the live connection holding it.
//!
//! # Protocol
//!
//! Clients connect to **GET /ws** and exchange JSON text frames tagged by
//! `type`.
//!
//! ## Requests (client → relay)
//!
//! - `{"type": "login", "name": "alice"}` - Claim a name
//! - `{"type": "offer", "name": "bob", "offer": ...}` - Send an offer to `bob`
//! - `{"type": "answer", "name": "alice", "answer": ...}` - Send an answer to `alice`
//! - `{"type": "candidate", "name": "bob", "candidate": ...}` - Send an ICE candidate
//! - `{"type": "leave", "name": "bob"}` - Tell `bob` the negotiation is over
//!
//! ## Replies and forwards (relay → client)
//!
//! - `{"type": "login", "success": true}` - Result of your login
//! - `{"type": "offer", "offer": ..., "name": "alice"}` - Offer from `alice`
//! - `{"type": "answer", "answer": ...}` - Answer to your offer
//! - `{"type": "candidate", "candidate": ...}` - Candidate from your peer
//! - `{"type": "leave"}` - Your peer left or disconnected
//! - `{"type": "error", "message": "Command not found: dance"}` - Unrecognized request
//!
//! Messages addressed to a name nobody holds are dropped silently.
//!
//! # Example
//!
//! ```bash
//! # Start the relay
//! signal-relay --port 9090
//!
//! # Connect and log in
//! websocat ws://127.0.0.1:9090/ws
//! {"type":"login","name":"alice"}
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod router;

pub use config::Config;
pub use connection::{Connection, ConnectionId};
pub use error::SignalingError;
pub use handler::{AppState, app, serve};
pub use protocol::{ClientMessage, ServerMessage};
pub use registry::Registry;
pub use router::{Session, SignalingRouter};
