//! Shared connection registry.
//!
//! Tracks every live connection and which user, if any, it has
//! authenticated as. A user may hold several connections at once
//! (multiple devices); delivery fans out to all of them. Senders are
//! collected before any await so no map guard is held across an
//! await point.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use sotto_protocol::UserId;

pub type ConnId = u64;

/// Outbound channel capacity per connection. A slow reader gets this
/// much buffering before sends start failing.
pub const OUTBOUND_CHANNEL_SIZE: usize = 64;

struct ConnHandle {
    tx: mpsc::Sender<Vec<u8>>,
    user_id: Option<UserId>,
}

#[derive(Default)]
pub struct RelayState {
    connections: DashMap<ConnId, ConnHandle>,
    by_user: DashMap<UserId, HashSet<ConnId>>,
    next_conn_id: AtomicU64,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its id.
    pub fn register_connection(&self, tx: mpsc::Sender<Vec<u8>>) -> ConnId {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        self.connections
            .insert(conn_id, ConnHandle { tx, user_id: None });
        conn_id
    }

    /// Bind a connection to an authenticated user.
    pub fn bind_user(&self, conn_id: ConnId, user_id: &UserId) {
        if let Some(mut handle) = self.connections.get_mut(&conn_id) {
            handle.user_id = Some(user_id.clone());
        }
        self.by_user
            .entry(user_id.clone())
            .or_default()
            .insert(conn_id);
    }

    /// The user a connection is bound to, if it has authenticated.
    pub fn user_for_conn(&self, conn_id: ConnId) -> Option<UserId> {
        self.connections
            .get(&conn_id)
            .and_then(|h| h.user_id.clone())
    }

    /// Drop a connection, unbinding it from its user if bound.
    pub fn remove_connection(&self, conn_id: ConnId) {
        let user_id = self
            .connections
            .remove(&conn_id)
            .and_then(|(_, handle)| handle.user_id);
        if let Some(user_id) = user_id {
            let mut empty = false;
            if let Some(mut conns) = self.by_user.get_mut(&user_id) {
                conns.remove(&conn_id);
                empty = conns.is_empty();
            }
            if empty {
                self.by_user.remove(&user_id);
            }
        }
    }

    /// Whether the user has at least one live connection.
    pub fn user_online(&self, user_id: &UserId) -> bool {
        self.by_user
            .get(user_id)
            .map(|c| !c.is_empty())
            .unwrap_or(false)
    }

    /// Send a frame to one connection. Returns false if the
    /// connection is gone or its outbound queue is full.
    pub async fn send_to_conn(&self, conn_id: ConnId, frame: Vec<u8>) -> bool {
        let tx = match self.connections.get(&conn_id) {
            Some(handle) => handle.tx.clone(),
            None => return false,
        };
        if tx.send(frame).await.is_err() {
            debug!(conn_id, "outbound channel closed");
            return false;
        }
        true
    }

    /// Fan a frame out to every connection the user holds. Returns
    /// how many connections accepted it.
    pub async fn send_to_user(&self, user_id: &UserId, frame: &[u8]) -> usize {
        let targets: Vec<(ConnId, mpsc::Sender<Vec<u8>>)> = match self.by_user.get(user_id) {
            Some(conns) => conns
                .iter()
                .filter_map(|id| self.connections.get(id).map(|h| (*id, h.tx.clone())))
                .collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for (conn_id, tx) in targets {
            if tx.send(frame.to_vec()).await.is_ok() {
                delivered += 1;
            } else {
                warn!(conn_id, user = %user_id, "failed to queue frame for connection");
            }
        }
        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
