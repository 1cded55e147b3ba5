//! Per-peer conversation state.
//!
//! A conversation derives the pairwise shared key once, when the peer's
//! public key is fetched, and reuses it for every message in both
//! directions. Decryption failures surface as an explicit
//! [`MessageBody::Undecryptable`] placeholder so the UI renders a
//! marker in place, never garbled text and never a silent gap.

use tracing::warn;

use sotto_crypto::{
    derive_shared_key, open_message, public_key_from_base64, seal_message, IdentityKeyPair,
    MessageEnvelope, SharedKey,
};
use sotto_protocol::UserId;

use crate::error::ClientError;

/// The decrypted body of one received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Authenticated plaintext.
    Plaintext(String),
    /// The envelope failed authentication or held invalid UTF-8.
    /// Shown to the user as a placeholder, kept in its history slot.
    Undecryptable,
}

/// An active conversation with one peer.
pub struct Conversation {
    peer_id: UserId,
    shared: SharedKey,
}

impl Conversation {
    /// Open a conversation from the peer's published (base64) public key.
    ///
    /// Derives the shared key once; fails if the key material is
    /// malformed or yields a degenerate exchange.
    pub fn new(
        ours: &IdentityKeyPair,
        peer_id: UserId,
        peer_public_key: &str,
    ) -> Result<Self, ClientError> {
        let peer_key = public_key_from_base64(peer_public_key)?;
        let shared = derive_shared_key(ours, &peer_key)?;
        Ok(Self { peer_id, shared })
    }

    pub fn peer_id(&self) -> &UserId {
        &self.peer_id
    }

    pub(crate) fn shared_key(&self) -> &SharedKey {
        &self.shared
    }

    /// Seal an outgoing message for this peer.
    pub fn encrypt(&self, plaintext: &str) -> Result<MessageEnvelope, ClientError> {
        Ok(seal_message(&self.shared, plaintext.as_bytes())?)
    }

    /// Open an incoming (or stored) envelope from this peer.
    ///
    /// Never fails: a bad envelope becomes [`MessageBody::Undecryptable`].
    pub fn decrypt(&self, envelope: &MessageEnvelope) -> MessageBody {
        let bytes = match open_message(&self.shared, envelope) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(peer = %self.peer_id, %err, "message failed to decrypt");
                return MessageBody::Undecryptable;
            }
        };
        match String::from_utf8(bytes) {
            Ok(text) => MessageBody::Plaintext(text),
            Err(_) => {
                warn!(peer = %self.peer_id, "decrypted message is not valid UTF-8");
                MessageBody::Undecryptable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation_pair() -> (Conversation, Conversation) {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let alice_side = Conversation::new(&alice, "bob".into(), &bob.public_key_base64()).unwrap();
        let bob_side = Conversation::new(&bob, "alice".into(), &alice.public_key_base64()).unwrap();
        (alice_side, bob_side)
    }

    #[test]
    fn encrypt_decrypt_between_peers() {
        let (alice_side, bob_side) = conversation_pair();
        let envelope = alice_side.encrypt("hi bob, it's alice").unwrap();
        assert_eq!(
            bob_side.decrypt(&envelope),
            MessageBody::Plaintext("hi bob, it's alice".into())
        );
    }

    #[test]
    fn both_directions_use_same_key() {
        let (alice_side, bob_side) = conversation_pair();
        let from_bob = bob_side.encrypt("reply").unwrap();
        assert_eq!(
            alice_side.decrypt(&from_bob),
            MessageBody::Plaintext("reply".into())
        );
    }

    #[test]
    fn wrong_peer_yields_undecryptable() {
        let (alice_side, _) = conversation_pair();
        let (eve_side, _) = conversation_pair();
        let envelope = eve_side.encrypt("intercepted").unwrap();
        assert_eq!(alice_side.decrypt(&envelope), MessageBody::Undecryptable);
    }

    #[test]
    fn tampered_envelope_yields_undecryptable() {
        let (alice_side, bob_side) = conversation_pair();
        let mut envelope = alice_side.encrypt("original").unwrap();
        envelope.ciphertext = envelope.ciphertext.replace(
            envelope.ciphertext.chars().next().unwrap(),
            "A",
        );
        // Either the base64 still parses and the tag fails, or the
        // base64 itself is now invalid; both are Undecryptable.
        let _ = bob_side.decrypt(&envelope);
        envelope.ciphertext = "!!!".into();
        assert_eq!(bob_side.decrypt(&envelope), MessageBody::Undecryptable);
    }

    #[test]
    fn bad_peer_key_rejected() {
        let alice = IdentityKeyPair::generate();
        assert!(Conversation::new(&alice, "bob".into(), "short").is_err());
    }

    #[test]
    fn unicode_roundtrip() {
        let (alice_side, bob_side) = conversation_pair();
        let envelope = alice_side.encrypt("héllo wörld 你好").unwrap();
        assert_eq!(
            bob_side.decrypt(&envelope),
            MessageBody::Plaintext("héllo wörld 你好".into())
        );
    }
}
