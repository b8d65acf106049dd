//! Per-connection signaling state machine
//!
//! The transport calls [`SignalingRouter::connect`] once per accepted socket,
//! [`SignalingRouter::handle_message`] for every inbound frame in arrival
//! order, and [`SignalingRouter::disconnect`] once when the socket closes.
//! Sends to peers are queued and never block; a peer that is absent or
//! already gone is skipped.

use crate::connection::{Connection, ConnectionId};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::Registry;
use tracing::{debug, info, warn};

/// State the router keeps for one connection.
///
/// Owned by the connection's task and only mutated through the router.
#[derive(Debug)]
pub struct Session {
    connection: Connection,
    identity: Option<String>,
    /// Link made before login. Moves into the registry on a successful login.
    pending_peer: Option<String>,
}

impl Session {
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// Identity claimed by this connection, once login has succeeded
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }
}

/// Dispatches client requests against a shared [`Registry`]
#[derive(Debug, Default, Clone)]
pub struct SignalingRouter {
    registry: Registry,
}

impl SignalingRouter {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Start tracking a freshly accepted connection
    pub fn connect(&self, connection: Connection) -> Session {
        info!(connection = %connection.id(), "User connected");
        Session {
            connection,
            identity: None,
            pending_peer: None,
        }
    }

    /// Identity the session is currently linked to
    pub fn peer_of(&self, session: &Session) -> Option<String> {
        match &session.identity {
            Some(identity) => self.registry.peer_of(identity),
            None => session.pending_peer.clone(),
        }
    }

    /// Decode and dispatch one inbound frame
    pub fn handle_message(&self, session: &mut Session, raw: &[u8]) {
        let message = ClientMessage::parse(raw).unwrap_or_else(|err| {
            warn!(connection = %session.id(), %err, "Invalid JSON");
            ClientMessage::empty()
        });
        self.dispatch(session, message);
    }

    /// Dispatch an already decoded request
    pub fn dispatch(&self, session: &mut Session, message: ClientMessage) {
        match message {
            ClientMessage::Login { name } => self.login(session, name),
            ClientMessage::Offer { name, offer } => {
                let Some((target, conn)) = self.target(session, "offer", name) else {
                    return;
                };
                self.link(session, &target);
                let forward = ServerMessage::Offer {
                    offer,
                    name: session.identity.clone(),
                };
                self.deliver(&conn, &target, forward);
            }
            ClientMessage::Answer { name, answer } => {
                let Some((target, conn)) = self.target(session, "answer", name) else {
                    return;
                };
                self.link(session, &target);
                self.deliver(&conn, &target, ServerMessage::Answer { answer });
            }
            ClientMessage::Candidate { name, candidate } => {
                let Some((target, conn)) = self.target(session, "candidate", name) else {
                    return;
                };
                self.deliver(&conn, &target, ServerMessage::Candidate { candidate });
            }
            ClientMessage::Leave { name } => {
                let Some(target) = name else {
                    debug!(connection = %session.id(), "Dropping leave without a target");
                    return;
                };
                info!(connection = %session.id(), name = %target, "Disconnecting from");
                match self.registry.unlink(&target) {
                    Some(conn) => self.deliver(&conn, &target, ServerMessage::Leave),
                    None => debug!(name = %target, "Dropping leave for unknown user"),
                }
            }
            ClientMessage::Unknown { kind } => {
                debug!(connection = %session.id(), kind = ?kind, "Command not found");
                self.reply(session, ServerMessage::command_not_found(kind.as_deref()));
            }
        }
    }

    /// Release everything the session holds and tell its linked peer.
    ///
    /// Consumes the session, so it runs at most once per connection.
    pub fn disconnect(&self, session: Session) {
        let Some(identity) = session.identity else {
            info!(connection = %session.connection.id(), "Anonymous user disconnected");
            return;
        };
        info!(connection = %session.connection.id(), name = %identity, "User disconnected");

        let Some(registration) = self.registry.release(&identity) else {
            return;
        };
        if let Some(peer) = registration.peer {
            info!(name = %identity, peer = %peer, "Disconnecting from");
            if let Some(conn) = self.registry.unlink(&peer) {
                self.deliver(&conn, &peer, ServerMessage::Leave);
            }
        }
    }

    fn login(&self, session: &mut Session, name: Option<String>) {
        if let Some(current) = &session.identity {
            warn!(
                connection = %session.id(),
                current = %current,
                requested = ?name,
                "Rejecting second login on identified connection"
            );
            self.reply(session, ServerMessage::Login { success: false });
            return;
        }
        let Some(name) = name else {
            debug!(connection = %session.id(), "Rejecting login without a name");
            self.reply(session, ServerMessage::Login { success: false });
            return;
        };

        let claimed = self.registry.claim_linked(
            &name,
            session.connection.clone(),
            session.pending_peer.clone(),
        );
        if claimed {
            info!(connection = %session.id(), name = %name, "User logged");
            session.identity = Some(name);
            session.pending_peer = None;
        } else {
            info!(connection = %session.id(), name = %name, "Name already taken");
        }
        self.reply(session, ServerMessage::Login { success: claimed });
    }

    /// Resolve the addressed peer, or log and drop
    fn target(
        &self,
        session: &Session,
        kind: &str,
        name: Option<String>,
    ) -> Option<(String, Connection)> {
        let Some(name) = name else {
            debug!(connection = %session.id(), kind, "Dropping message without a target");
            return None;
        };
        match self.registry.lookup(&name) {
            Some(conn) => {
                info!(connection = %session.id(), kind, name = %name, "Sending to");
                Some((name, conn))
            }
            None => {
                debug!(connection = %session.id(), kind, name = %name, "Dropping message for unknown user");
                None
            }
        }
    }

    fn link(&self, session: &mut Session, peer: &str) {
        match &session.identity {
            Some(identity) => self.registry.link(identity, peer),
            None => session.pending_peer = Some(peer.to_string()),
        }
    }

    fn reply(&self, session: &Session, message: ServerMessage) {
        if let Err(err) = session.connection.send(message) {
            debug!(connection = %session.id(), %err, "Reply dropped");
        }
    }

    fn deliver(&self, conn: &Connection, name: &str, message: ServerMessage) {
        if let Err(err) = conn.send(message) {
            debug!(connection = %conn.id(), name = %name, %err, "Forward dropped");
        }
    }
}
