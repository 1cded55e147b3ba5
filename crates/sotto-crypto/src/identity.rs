//! Identity key generation and serialization.
//!
//! Each Sotto client has a long-term X25519 identity key pair
//! generated on first launch and persisted across sessions. The
//! public half is published to the directory; the private half
//! never leaves the device.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::CryptoError;

/// A long-term X25519 identity key pair.
#[derive(Clone)]
pub struct IdentityKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl IdentityKeyPair {
    /// Generate a fresh identity key pair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The public half, as published to peers.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The public half in wire (base64) form.
    pub fn public_key_base64(&self) -> String {
        public_key_to_base64(&self.public)
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }
}

/// A serializable form of [`IdentityKeyPair`] for persistence.
///
/// Both halves are base64-encoded 32-byte values. Callers are
/// responsible for storing this somewhere appropriate for secrets.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredIdentity {
    /// Base64-encoded 32-byte public key.
    pub public_key: String,
    /// Base64-encoded 32-byte private key.
    pub private_key: String,
}

impl StoredIdentity {
    /// Create from a live key pair.
    pub fn from_key_pair(pair: &IdentityKeyPair) -> Self {
        Self {
            public_key: BASE64.encode(pair.public.as_bytes()),
            private_key: BASE64.encode(pair.secret.to_bytes()),
        }
    }

    /// Reconstruct the live key pair from the stored bytes.
    ///
    /// The public key is re-derived from the private key rather than
    /// trusted from storage, so a corrupted public field cannot
    /// desynchronize the pair.
    pub fn to_key_pair(&self) -> Result<IdentityKeyPair, CryptoError> {
        let private = decode_key_bytes(&self.private_key)?;
        let secret = StaticSecret::from(private);
        let public = PublicKey::from(&secret);
        Ok(IdentityKeyPair { secret, public })
    }
}

/// Encode a public key to its wire (base64) form.
pub fn public_key_to_base64(key: &PublicKey) -> String {
    BASE64.encode(key.as_bytes())
}

/// Decode a peer's public key from its wire (base64) form.
pub fn public_key_from_base64(encoded: &str) -> Result<PublicKey, CryptoError> {
    let bytes = decode_key_bytes(encoded)?;
    Ok(PublicKey::from(bytes))
}

fn decode_key_bytes(encoded: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = BASE64.decode(encoded)?;
    bytes.try_into().map_err(|_| CryptoError::InvalidKeyMaterial)
}
