use serde::{Deserialize, Serialize};

/// Unique user identifier (UUID v4), assigned by the server at registration.
pub type UserId = String;

/// Unique message identifier (UUID v4), assigned by the server at store time.
pub type MessageId = String;

/// A registered user as published by the directory.
///
/// The public key is the base64-encoded 32-byte X25519 identity key;
/// the server stores and serves it but never uses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub phone: String,
    pub display_name: String,
    pub public_key: String,
    /// Unix timestamp in milliseconds.
    pub created_at: u64,
}

/// A stored ciphertext message record.
///
/// The server persists exactly this shape: it can route and order
/// messages but cannot read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    /// Base64-encoded AEAD ciphertext with appended tag.
    pub ciphertext: String,
    /// Base64-encoded 24-byte nonce.
    pub nonce: String,
    /// Unix timestamp in milliseconds.
    pub created_at: u64,
}
