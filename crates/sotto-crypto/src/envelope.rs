//! Authenticated message envelopes.
//!
//! Text messages travel as XChaCha20-Poly1305 ciphertext under the
//! pairwise shared key, with a fresh random 24-byte nonce per
//! message. The envelope carries ciphertext and nonce base64-encoded,
//! which is the exact shape relayed and stored by the server.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::agreement::SharedKey;
use crate::error::CryptoError;

/// Nonce size for the envelope cipher.
pub const ENVELOPE_NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size.
pub const ENVELOPE_TAG_SIZE: usize = 16;

/// A sealed message as it travels over the wire and sits at rest.
///
/// The relay stores and forwards envelopes without ever holding the
/// key needed to open them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Base64-encoded ciphertext with appended 16-byte tag.
    pub ciphertext: String,
    /// Base64-encoded 24-byte nonce.
    pub nonce: String,
}

/// Seal a plaintext message under the pairwise shared key.
///
/// Draws a fresh random 24-byte nonce per call. Nonce reuse across
/// the life of a static shared key is what the extended nonce size
/// is there to make negligible.
pub fn seal_message(key: &SharedKey, plaintext: &[u8]) -> Result<MessageEnvelope, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; ENVELOPE_NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(MessageEnvelope {
        ciphertext: BASE64.encode(&ciphertext),
        nonce: BASE64.encode(nonce_bytes),
    })
}

/// Open a sealed envelope with the pairwise shared key.
///
/// Returns [`CryptoError::AuthenticationFailed`] if the key is wrong
/// or the ciphertext was modified in transit or at rest.
pub fn open_message(key: &SharedKey, envelope: &MessageEnvelope) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = BASE64.decode(&envelope.ciphertext)?;
    let nonce_bytes = BASE64.decode(&envelope.nonce)?;
    let nonce_bytes: [u8; ENVELOPE_NONCE_SIZE] = nonce_bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyMaterial)?;

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(XNonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::derive_shared_key;
    use crate::identity::IdentityKeyPair;

    fn shared_pair() -> (SharedKey, SharedKey) {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        (
            derive_shared_key(&alice, bob.public_key()).unwrap(),
            derive_shared_key(&bob, alice.public_key()).unwrap(),
        )
    }

    #[test]
    fn seal_open_roundtrip() {
        let (alice_key, bob_key) = shared_pair();
        let envelope = seal_message(&alice_key, b"hello bob").unwrap();
        let plaintext = open_message(&bob_key, &envelope).unwrap();
        assert_eq!(plaintext, b"hello bob");
    }

    #[test]
    fn fresh_nonce_per_message() {
        let (key, _) = shared_pair();
        let a = seal_message(&key, b"same text").unwrap();
        let b = seal_message(&key, b"same text").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_fails() {
        let (alice_key, _) = shared_pair();
        let (other_key, _) = shared_pair();
        let envelope = seal_message(&alice_key, b"secret").unwrap();
        assert!(matches!(
            open_message(&other_key, &envelope),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let (key, peer_key) = shared_pair();
        let mut envelope = seal_message(&key, b"secret").unwrap();
        let mut raw = BASE64.decode(&envelope.ciphertext).unwrap();
        raw[0] ^= 0xFF;
        envelope.ciphertext = BASE64.encode(&raw);
        assert!(open_message(&peer_key, &envelope).is_err());
    }

    #[test]
    fn malformed_fields_rejected() {
        let (key, _) = shared_pair();
        let bad_base64 = MessageEnvelope {
            ciphertext: "@@@not-base64@@@".into(),
            nonce: BASE64.encode([0u8; ENVELOPE_NONCE_SIZE]),
        };
        assert!(matches!(
            open_message(&key, &bad_base64),
            Err(CryptoError::Encoding(_))
        ));

        let short_nonce = MessageEnvelope {
            ciphertext: BASE64.encode([0u8; 32]),
            nonce: BASE64.encode([0u8; 12]),
        };
        assert!(matches!(
            open_message(&key, &short_nonce),
            Err(CryptoError::InvalidKeyMaterial)
        ));
    }

    #[test]
    fn envelope_wire_shape() {
        let (key, _) = shared_pair();
        let envelope = seal_message(&key, b"hi").unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("ciphertext").unwrap().is_string());
        assert!(json.get("nonce").unwrap().is_string());
        let nonce = BASE64
            .decode(json["nonce"].as_str().unwrap())
            .unwrap();
        assert_eq!(nonce.len(), ENVELOPE_NONCE_SIZE);
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let (key, peer_key) = shared_pair();
        let envelope = seal_message(&key, b"").unwrap();
        assert_eq!(open_message(&peer_key, &envelope).unwrap(), b"");
    }
}
