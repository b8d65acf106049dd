//! Identity registry shared by every connection
//!
//! Maps a claimed identity to the connection holding it, together with the
//! identity that connection is currently linked to. All reads and writes go
//! through one lock, so claiming a name is a single check-and-set and a
//! peer's link can be cleared from another connection's handler safely.

use crate::connection::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry record for one identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub connection: Connection,
    /// Identity of the linked peer, if any
    pub peer: Option<String>,
}

#[derive(Debug, Default)]
struct InnerRegistry {
    identities: HashMap<String, Registration>,
}

/// Cloneable handle to a registry. Clones share the same map.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    inner: Arc<Mutex<InnerRegistry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InnerRegistry> {
        // Every critical section is a single map operation, so a panic can't
        // leave the map half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `connection` as the holder of `identity`.
    ///
    /// Returns false, leaving the registry untouched, if the identity is
    /// already held.
    pub fn claim(&self, identity: &str, connection: Connection) -> bool {
        self.claim_linked(identity, connection, None)
    }

    /// Like [`claim`](Self::claim), with the new record already linked to `peer`
    pub fn claim_linked(
        &self,
        identity: &str,
        connection: Connection,
        peer: Option<String>,
    ) -> bool {
        let mut inner = self.lock();
        if inner.identities.contains_key(identity) {
            return false;
        }
        inner
            .identities
            .insert(identity.to_string(), Registration { connection, peer });
        true
    }

    /// Current holder of `identity`
    pub fn lookup(&self, identity: &str) -> Option<Connection> {
        self.lock()
            .identities
            .get(identity)
            .map(|registration| registration.connection.clone())
    }

    /// Remove `identity`, returning its record. Absent identities are ignored.
    pub fn release(&self, identity: &str) -> Option<Registration> {
        self.lock().identities.remove(identity)
    }

    /// Set the linked peer of `identity`. No-op if the identity is not held.
    pub fn link(&self, identity: &str, peer: &str) {
        if let Some(registration) = self.lock().identities.get_mut(identity) {
            registration.peer = Some(peer.to_string());
        }
    }

    /// Clear the linked peer of `identity` and return its holder
    pub fn unlink(&self, identity: &str) -> Option<Connection> {
        let mut inner = self.lock();
        let registration = inner.identities.get_mut(identity)?;
        registration.peer = None;
        Some(registration.connection.clone())
    }

    /// Linked peer of `identity`
    pub fn peer_of(&self, identity: &str) -> Option<String> {
        self.lock()
            .identities
            .get(identity)
            .and_then(|registration| registration.peer.clone())
    }

    /// Number of identities currently held
    pub fn len(&self) -> usize {
        self.lock().identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
