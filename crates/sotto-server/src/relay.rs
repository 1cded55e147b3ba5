//! Event dispatch and the per-connection protocol loop.
//!
//! The relay never touches key material. Public keys, ciphertexts,
//! nonces, and SDP blobs pass through as opaque strings and JSON
//! values. The one field the relay does rewrite is the sender
//! identity on forwarded call events: `fromUserId` is always the
//! authenticated user of the sending connection, never a value the
//! client supplied.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_rustls::server::TlsStream;
use tracing::{debug, info, warn};

use sotto_protocol::{
    decode_client_event, encode_server_event, try_decode_frame, ClientEvent, ServerEvent, UserId,
};

use crate::auth::SessionService;
use crate::state::{ConnId, RelayState, OUTBOUND_CHANNEL_SIZE};
use crate::store::MemoryStore;

/// How many buffered events one read may dispatch before yielding,
/// so a single chatty connection cannot starve the others.
const MAX_EVENTS_PER_READ: usize = 20;

const PUBLIC_KEY_BYTES: usize = 32;

pub struct Relay {
    state: RelayState,
    sessions: SessionService,
    store: MemoryStore,
    max_connections: u32,
}

impl Relay {
    pub fn new(max_connections: u32) -> Self {
        Self {
            state: RelayState::new(),
            sessions: SessionService::new(),
            store: MemoryStore::new(),
            max_connections,
        }
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Drive one TLS connection until it closes or misbehaves.
    pub async fn handle_connection(
        self: Arc<Self>,
        stream: TlsStream<TcpStream>,
        peer: SocketAddr,
    ) -> Result<()> {
        let (mut read_half, mut write_half) = tokio::io::split(stream);

        if self.state.connection_count() >= self.max_connections as usize {
            warn!(%peer, "rejecting connection, server full");
            let frame = encode_server_event(&ServerEvent::Error {
                message: "server full".into(),
            })?;
            write_half.write_all(&frame).await?;
            write_half.shutdown().await.ok();
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_CHANNEL_SIZE);
        let conn_id = self.state.register_connection(tx);
        info!(%peer, conn_id, "connection established");

        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if write_half.write_all(&frame).await.is_err() {
                    break;
                }
            }
            write_half.shutdown().await.ok();
        });

        let mut buf = BytesMut::with_capacity(8 * 1024);
        'conn: loop {
            let n = match read_half.read_buf(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    debug!(conn_id, %err, "read error");
                    break;
                }
            };
            debug!(conn_id, bytes = n, "read");

            let mut dispatched = 0;
            loop {
                let payload = match try_decode_frame(&mut buf) {
                    Ok(Some(payload)) => payload,
                    Ok(None) => break,
                    Err(err) => {
                        warn!(conn_id, %err, "framing error, closing connection");
                        break 'conn;
                    }
                };
                match decode_client_event(&payload) {
                    Ok(event) => self.dispatch(conn_id, event).await,
                    Err(err) => {
                        warn!(conn_id, %err, "malformed event");
                        self.send_event(
                            conn_id,
                            &ServerEvent::Error {
                                message: "malformed event".into(),
                            },
                        )
                        .await;
                    }
                }
                dispatched += 1;
                if dispatched >= MAX_EVENTS_PER_READ {
                    tokio::task::yield_now().await;
                    dispatched = 0;
                }
            }
        }

        self.state.remove_connection(conn_id);
        writer.await.ok();
        info!(%peer, conn_id, "connection closed");
        Ok(())
    }

    /// Apply one client event against the relay state.
    pub async fn dispatch(&self, conn_id: ConnId, event: ClientEvent) {
        match event {
            ClientEvent::Register {
                phone,
                display_name,
                public_key,
            } => self.register(conn_id, phone, display_name, public_key).await,
            ClientEvent::Login { phone } => self.login(conn_id, phone).await,
            ClientEvent::Auth { token } => self.auth(conn_id, token).await,
            ClientEvent::ListUsers => {
                let Some(_) = self.require_user(conn_id, "directory:users") else {
                    return;
                };
                let users = self.store.list_users();
                self.send_event(conn_id, &ServerEvent::Users { users }).await;
            }
            ClientEvent::GetKey { user_id } => {
                let Some(_) = self.require_user(conn_id, "directory:key") else {
                    return;
                };
                match self.store.public_key(&user_id) {
                    Some(public_key) => {
                        self.send_event(
                            conn_id,
                            &ServerEvent::UserKey {
                                user_id,
                                public_key,
                            },
                        )
                        .await;
                    }
                    None => {
                        self.send_event(
                            conn_id,
                            &ServerEvent::Error {
                                message: "unknown user".into(),
                            },
                        )
                        .await;
                    }
                }
            }
            ClientEvent::SendMessage {
                recipient_id,
                ciphertext,
                nonce,
            } => {
                self.send_message(conn_id, recipient_id, ciphertext, nonce)
                    .await
            }
            ClientEvent::GetHistory { peer_id } => {
                let Some(user_id) = self.require_user(conn_id, "message:history") else {
                    return;
                };
                let messages = self.store.list_messages(&user_id, &peer_id);
                self.send_event(conn_id, &ServerEvent::MessageHistory { messages })
                    .await;
            }
            ClientEvent::CallOffer { to_user_id, sdp } => {
                let Some(from_user_id) = self.require_user(conn_id, "call:offer") else {
                    return;
                };
                self.forward_call(
                    &to_user_id,
                    "call:offer",
                    ServerEvent::CallOffer { from_user_id, sdp },
                )
                .await;
            }
            ClientEvent::CallAnswer { to_user_id, sdp } => {
                let Some(from_user_id) = self.require_user(conn_id, "call:answer") else {
                    return;
                };
                self.forward_call(
                    &to_user_id,
                    "call:answer",
                    ServerEvent::CallAnswer { from_user_id, sdp },
                )
                .await;
            }
            ClientEvent::CallIce {
                to_user_id,
                candidate,
            } => {
                let Some(from_user_id) = self.require_user(conn_id, "call:ice") else {
                    return;
                };
                self.forward_call(
                    &to_user_id,
                    "call:ice",
                    ServerEvent::CallIce {
                        from_user_id,
                        candidate,
                    },
                )
                .await;
            }
        }
    }

    async fn register(
        &self,
        conn_id: ConnId,
        phone: String,
        display_name: String,
        public_key: String,
    ) {
        // Registering a known phone is a login; the stored key and
        // display name win over whatever the client sent.
        if let Some(user) = self.store.user_by_phone(&phone) {
            info!(user = %user.id, "register on existing phone, treating as login");
            let token = self.sessions.issue(&user.id);
            self.state.bind_user(conn_id, &user.id);
            self.send_event(conn_id, &ServerEvent::Registered { user, token })
                .await;
            return;
        }

        match BASE64.decode(&public_key) {
            Ok(bytes) if bytes.len() == PUBLIC_KEY_BYTES => {}
            _ => {
                warn!(conn_id, "registration with malformed public key");
                self.send_event(
                    conn_id,
                    &ServerEvent::Error {
                        message: "invalid public key".into(),
                    },
                )
                .await;
                return;
            }
        }

        let user = self.store.create_user(&phone, &display_name, &public_key);
        info!(user = %user.id, "registered new user");
        let token = self.sessions.issue(&user.id);
        self.state.bind_user(conn_id, &user.id);
        self.send_event(conn_id, &ServerEvent::Registered { user, token })
            .await;
    }

    async fn login(&self, conn_id: ConnId, phone: String) {
        match self.store.user_by_phone(&phone) {
            Some(user) => {
                info!(user = %user.id, "login");
                let token = self.sessions.issue(&user.id);
                self.state.bind_user(conn_id, &user.id);
                self.send_event(conn_id, &ServerEvent::Registered { user, token })
                    .await;
            }
            None => {
                self.send_event(
                    conn_id,
                    &ServerEvent::Error {
                        message: "unknown phone number".into(),
                    },
                )
                .await;
            }
        }
    }

    async fn auth(&self, conn_id: ConnId, token: String) {
        let user_id = match self.sessions.authenticate(&token) {
            Ok(user_id) => user_id,
            Err(err) => {
                warn!(conn_id, %err, "auth failed");
                self.send_event(
                    conn_id,
                    &ServerEvent::Error {
                        message: "invalid token".into(),
                    },
                )
                .await;
                return;
            }
        };
        match self.store.user_by_id(&user_id) {
            Some(user) => {
                info!(conn_id, user = %user.id, "connection authenticated");
                self.state.bind_user(conn_id, &user.id);
                self.send_event(conn_id, &ServerEvent::Authed { user }).await;
            }
            None => {
                // Token outlived its user record; should not happen
                // with the in-memory store but fail closed anyway.
                self.send_event(
                    conn_id,
                    &ServerEvent::Error {
                        message: "invalid token".into(),
                    },
                )
                .await;
            }
        }
    }

    async fn send_message(
        &self,
        conn_id: ConnId,
        recipient_id: UserId,
        ciphertext: String,
        nonce: String,
    ) {
        let Some(sender_id) = self.require_user(conn_id, "message:send") else {
            return;
        };
        if self.store.user_by_id(&recipient_id).is_none() {
            self.send_event(
                conn_id,
                &ServerEvent::Error {
                    message: "unknown recipient".into(),
                },
            )
            .await;
            return;
        }

        let message = self
            .store
            .put_message(&sender_id, &recipient_id, &ciphertext, &nonce);
        debug!(message = %message.id, from = %sender_id, to = %recipient_id, "envelope stored");

        self.push_to_user(
            &recipient_id,
            &ServerEvent::MessageNew {
                message: message.clone(),
            },
        )
        .await;
        self.send_event(conn_id, &ServerEvent::MessageSent { message })
            .await;
    }

    async fn forward_call(&self, to_user_id: &UserId, kind: &str, event: ServerEvent) {
        let delivered = self.push_to_user(to_user_id, &event).await;
        if delivered == 0 {
            debug!(to = %to_user_id, kind, "dropping signaling for offline user");
        }
    }

    /// The authenticated user behind a connection, or `None` with a
    /// debug log. Unauthenticated events are dropped, not answered;
    /// the connection stays open so the client can still auth.
    fn require_user(&self, conn_id: ConnId, kind: &str) -> Option<UserId> {
        let user = self.state.user_for_conn(conn_id);
        if user.is_none() {
            debug!(conn_id, kind, "dropping event from unauthenticated connection");
        }
        user
    }

    async fn send_event(&self, conn_id: ConnId, event: &ServerEvent) {
        match encode_server_event(event) {
            Ok(frame) => {
                self.state.send_to_conn(conn_id, frame).await;
            }
            Err(err) => warn!(conn_id, %err, "failed to encode event"),
        }
    }

    async fn push_to_user(&self, user_id: &UserId, event: &ServerEvent) -> usize {
        match encode_server_event(event) {
            Ok(frame) => self.state.send_to_user(user_id, &frame).await,
            Err(err) => {
                warn!(user = %user_id, %err, "failed to encode event");
                0
            }
        }
    }
}
