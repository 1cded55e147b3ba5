//! In-memory persistence for users and message envelopes.
//!
//! The store holds ciphertext envelopes exactly as clients produced
//! them. It never inspects or transforms the payload fields, only the
//! routing metadata around them.

use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use sotto_protocol::{StoredMessage, UserId, UserProfile};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Process-lifetime storage. Vectors keep insertion order, which
/// doubles as the tiebreak when timestamps collide.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<UserProfile>>,
    messages: RwLock<Vec<StoredMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new user record and return its profile.
    pub fn create_user(&self, phone: &str, display_name: &str, public_key: &str) -> UserProfile {
        let profile = UserProfile {
            id: Uuid::new_v4().to_string(),
            phone: phone.to_string(),
            display_name: display_name.to_string(),
            public_key: public_key.to_string(),
            created_at: now_ms(),
        };
        self.users.write().unwrap().push(profile.clone());
        profile
    }

    pub fn user_by_phone(&self, phone: &str) -> Option<UserProfile> {
        self.users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.phone == phone)
            .cloned()
    }

    pub fn user_by_id(&self, id: &UserId) -> Option<UserProfile> {
        self.users
            .read()
            .unwrap()
            .iter()
            .find(|u| &u.id == id)
            .cloned()
    }

    /// All users, newest registration first.
    pub fn list_users(&self) -> Vec<UserProfile> {
        let users = self.users.read().unwrap();
        let mut out: Vec<UserProfile> = users.clone();
        out.reverse();
        out
    }

    pub fn public_key(&self, id: &UserId) -> Option<String> {
        self.user_by_id(id).map(|u| u.public_key)
    }

    /// Store one ciphertext envelope and return the full record.
    pub fn put_message(
        &self,
        sender_id: &UserId,
        recipient_id: &UserId,
        ciphertext: &str,
        nonce: &str,
    ) -> StoredMessage {
        let message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.clone(),
            recipient_id: recipient_id.clone(),
            ciphertext: ciphertext.to_string(),
            nonce: nonce.to_string(),
            created_at: now_ms(),
        };
        self.messages.write().unwrap().push(message.clone());
        message
    }

    /// Conversation history between two users, both directions,
    /// oldest first.
    pub fn list_messages(&self, a: &UserId, b: &UserId) -> Vec<StoredMessage> {
        let messages = self.messages.read().unwrap();
        let mut out: Vec<StoredMessage> = messages
            .iter()
            .filter(|m| {
                (&m.sender_id == a && &m.recipient_id == b)
                    || (&m.sender_id == b && &m.recipient_id == a)
            })
            .cloned()
            .collect();
        out.sort_by_key(|m| m.created_at);
        out
    }
}
