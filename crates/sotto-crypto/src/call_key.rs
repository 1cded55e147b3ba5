//! Per-call media key derivation.
//!
//! Each call derives its AES-256-GCM frame key from the pairwise
//! shared key through a labeled one-way HKDF step. Both endpoints
//! compute the same key with no extra round trips, and a leaked
//! call key reveals nothing about the message-layer shared key.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::agreement::SharedKey;
use crate::error::CryptoError;

/// HKDF info label for the per-call frame key.
const CALL_KEY_INFO: &[u8] = b"sotto call key v1";

/// A 32-byte AES-256-GCM key scoped to a single call.
///
/// Dropped (and zeroized) when the call ends; the next call with the
/// same peer derives an identical key, which is acceptable because
/// frame IVs are random per frame.
#[derive(Clone)]
pub struct CallKey(Zeroizing<[u8; 32]>);

impl CallKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Derive the call key from the pairwise shared key.
pub fn derive_call_key(shared: &SharedKey) -> Result<CallKey, CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(CALL_KEY_INFO, okm.as_mut())
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(CallKey(okm))
}
