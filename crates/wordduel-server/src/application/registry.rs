//! Connection registry: the directory of online, authenticated connections.
//!
//! Identities start at 1, increase strictly, and are never reused within a
//! process lifetime — even after the connection that held one disconnects.
//! A `BTreeMap` keeps iteration in identity order, which equals registration
//! order because identities are monotonic.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::debug;
use wordduel_core::{encode_message, Message, PlayerId};

/// The writable endpoint for one connection.
///
/// Wraps the sender side of the per-connection outbound channel; a writer
/// task owned by the network layer drains the channel to the socket.  Sending
/// to a connection whose writer has gone away is logged and dropped, never
/// fatal — the disconnect path will clean the entry up.
#[derive(Debug, Clone)]
pub struct OutboundHandle {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl OutboundHandle {
    pub fn new(tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// Encodes `msg` and queues it for delivery.
    pub fn send(&self, msg: &Message) {
        if self.tx.send(encode_message(msg)).is_err() {
            debug!("dropping outbound frame: connection writer is gone");
        }
    }
}

/// Online-connection directory, keyed by assigned identity.
#[derive(Debug)]
pub struct ConnectionRegistry {
    next_id: PlayerId,
    online: BTreeMap<PlayerId, OutboundHandle>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            online: BTreeMap::new(),
        }
    }

    /// Allocates the next identity and stores the handle under it.
    pub fn register(&mut self, handle: OutboundHandle) -> PlayerId {
        let id = self.next_id;
        self.next_id += 1;
        self.online.insert(id, handle);
        id
    }

    /// All online identities except `excluding`, in registration order.
    pub fn list_excluding(&self, excluding: PlayerId) -> Vec<PlayerId> {
        self.online
            .keys()
            .copied()
            .filter(|&id| id != excluding)
            .collect()
    }

    pub fn lookup(&self, id: PlayerId) -> Option<&OutboundHandle> {
        self.online.get(&id)
    }

    /// Deletes the entry; idempotent.
    pub fn remove(&mut self, id: PlayerId) {
        self.online.remove(&id);
    }

    /// Iterates over every online connection, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &OutboundHandle)> {
        self.online.iter().map(|(&id, handle)| (id, handle))
    }

    pub fn len(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }
}
