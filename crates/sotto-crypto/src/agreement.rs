//! Pairwise shared-key derivation.
//!
//! Both peers run X25519 ECDH between their own private key and the
//! other side's public key, then stretch the raw exchange output
//! through HKDF-SHA256 into a 32-byte AEAD-ready key. The derivation
//! is symmetric: either side computes the same key with zero round
//! trips beyond publishing public keys.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::PublicKey;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::identity::IdentityKeyPair;

/// HKDF info label for the pairwise message key.
const SHARED_KEY_INFO: &[u8] = b"sotto shared key v1";

/// A 32-byte symmetric key shared between exactly two identities.
///
/// Used directly by the message envelope cipher and as input key
/// material for per-call key derivation. Zeroized on drop.
#[derive(Clone)]
pub struct SharedKey(Zeroizing<[u8; 32]>);

impl SharedKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }
}

/// Derive the shared key between our identity and a peer's public key.
///
/// Fails with [`CryptoError::InvalidKeyMaterial`] if the exchange is
/// non-contributory (the peer supplied a low-order point), so a
/// malicious public key can never yield a predictable key.
pub fn derive_shared_key(
    ours: &IdentityKeyPair,
    peer: &PublicKey,
) -> Result<SharedKey, CryptoError> {
    let dh = ours.secret().diffie_hellman(peer);
    if !dh.was_contributory() {
        return Err(CryptoError::InvalidKeyMaterial);
    }

    let hk = Hkdf::<Sha256>::new(None, dh.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(SHARED_KEY_INFO, okm.as_mut())
        .map_err(|_| CryptoError::KeyDerivation)?;

    Ok(SharedKey(okm))
}
