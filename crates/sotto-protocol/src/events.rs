use serde::{Deserialize, Serialize};

use crate::types::*;

/// Events sent from client to server over the TLS control channel.
///
/// Serialized as JSON with a `type` tag and camelCase fields; the tag
/// strings are the wire contract and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Create an account. Registering an already-known phone number is
    /// treated as a login for that account.
    #[serde(rename = "register")]
    Register {
        phone: String,
        display_name: String,
        /// Base64-encoded 32-byte X25519 public key.
        public_key: String,
    },

    /// Log in to an existing account by phone number.
    #[serde(rename = "login")]
    Login { phone: String },

    /// Bind this connection to a user via a bearer token.
    /// Must precede any directory, message, or call event.
    #[serde(rename = "auth")]
    Auth { token: String },

    /// Request the user directory.
    #[serde(rename = "directory:users")]
    ListUsers,

    /// Request one user's published public key.
    #[serde(rename = "directory:key")]
    GetKey { user_id: UserId },

    /// Send a sealed message envelope to a recipient.
    #[serde(rename = "message:send")]
    SendMessage {
        recipient_id: UserId,
        ciphertext: String,
        nonce: String,
    },

    /// Request the stored conversation history with one peer.
    #[serde(rename = "message:history")]
    GetHistory { peer_id: UserId },

    /// Start a call: forward an SDP offer to the callee.
    #[serde(rename = "call:offer")]
    CallOffer {
        to_user_id: UserId,
        sdp: serde_json::Value,
    },

    /// Answer a call: forward an SDP answer back to the caller.
    #[serde(rename = "call:answer")]
    CallAnswer {
        to_user_id: UserId,
        sdp: serde_json::Value,
    },

    /// Forward one ICE candidate to the peer.
    #[serde(rename = "call:ice")]
    CallIce {
        to_user_id: UserId,
        candidate: serde_json::Value,
    },
}

/// Events sent from server to client over the TLS control channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Registration or login succeeded.
    #[serde(rename = "registered")]
    Registered { user: UserProfile, token: String },

    /// The connection is now bound to this user.
    #[serde(rename = "authed")]
    Authed { user: UserProfile },

    /// An operation failed. Terminal for that operation only.
    #[serde(rename = "error")]
    Error { message: String },

    /// The user directory, most recently registered first.
    #[serde(rename = "directory:users")]
    Users { users: Vec<UserProfile> },

    /// One user's published public key.
    #[serde(rename = "directory:key")]
    UserKey { user_id: UserId, public_key: String },

    /// Acknowledgement to the sender: the envelope was stored.
    #[serde(rename = "message:sent")]
    MessageSent { message: StoredMessage },

    /// Push to the recipient: a new envelope arrived.
    #[serde(rename = "message:new")]
    MessageNew { message: StoredMessage },

    /// Conversation history, ascending by creation time.
    #[serde(rename = "message:history")]
    MessageHistory { messages: Vec<StoredMessage> },

    /// Incoming call offer. `fromUserId` is the authenticated sender,
    /// never a client-supplied value.
    #[serde(rename = "call:offer")]
    CallOffer {
        from_user_id: UserId,
        sdp: serde_json::Value,
    },

    /// Incoming call answer.
    #[serde(rename = "call:answer")]
    CallAnswer {
        from_user_id: UserId,
        sdp: serde_json::Value,
    },

    /// Incoming ICE candidate.
    #[serde(rename = "call:ice")]
    CallIce {
        from_user_id: UserId,
        candidate: serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_event_tags() {
        let event = ClientEvent::CallOffer {
            to_user_id: "u-2".into(),
            sdp: json!({"type": "offer", "sdp": "v=0"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "call:offer");
        assert_eq!(value["toUserId"], "u-2");
        assert_eq!(value["sdp"]["sdp"], "v=0");
    }

    #[test]
    fn server_event_tags() {
        let event = ServerEvent::CallIce {
            from_user_id: "u-1".into(),
            candidate: json!({"candidate": "candidate:0 1 UDP"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "call:ice");
        assert_eq!(value["fromUserId"], "u-1");
    }

    #[test]
    fn unit_variant_serializes_with_tag_only() {
        let value = serde_json::to_value(ClientEvent::ListUsers).unwrap();
        assert_eq!(value, json!({"type": "directory:users"}));
    }

    #[test]
    fn register_event_wire_shape() {
        let raw = json!({
            "type": "register",
            "phone": "+15550001",
            "displayName": "Alice",
            "publicKey": "QUJD"
        });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        match event {
            ClientEvent::Register {
                phone,
                display_name,
                public_key,
            } => {
                assert_eq!(phone, "+15550001");
                assert_eq!(display_name, "Alice");
                assert_eq!(public_key, "QUJD");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn message_send_roundtrip() {
        let event = ClientEvent::SendMessage {
            recipient_id: "u-2".into(),
            ciphertext: "Y3Q=".into(),
            nonce: "bm8=".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"message:send\""));
        assert!(json.contains("\"recipientId\""));
        let decoded: ClientEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(decoded, ClientEvent::SendMessage { .. }));
    }

    #[test]
    fn unknown_tag_rejected() {
        let raw = json!({"type": "call:video", "toUserId": "u-2"});
        assert!(serde_json::from_value::<ClientEvent>(raw).is_err());
    }

    #[test]
    fn sdp_payload_is_opaque() {
        // Arbitrary structure passes through untouched
        let sdp = json!({"nested": {"fields": [1, 2, 3]}, "extra": null});
        let event = ClientEvent::CallAnswer {
            to_user_id: "u-9".into(),
            sdp: sdp.clone(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["sdp"], sdp);
    }
}
