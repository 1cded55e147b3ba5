//! Symmetric AES-256-GCM encryption for call media frames.
//!
//! Each encoded media frame is sealed under the per-call key with a
//! fresh random 12-byte IV. The wire layout is
//! `IV(12) || ciphertext || tag(16)`, so every encrypted frame is
//! exactly 28 bytes larger than its payload.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use crate::call_key::CallKey;
use crate::error::CryptoError;

/// AES-GCM IV size prepended to each encrypted frame.
pub const FRAME_IV_SIZE: usize = 12;

/// AES-256-GCM authentication tag size.
pub const GCM_TAG_SIZE: usize = 16;

/// Total encryption overhead per frame.
pub const FRAME_OVERHEAD: usize = FRAME_IV_SIZE + GCM_TAG_SIZE;

fn to_aead_key(key: &CallKey) -> Result<LessSafeKey, CryptoError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key.as_bytes())
        .map_err(|_| CryptoError::InvalidKeyMaterial)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt one media frame payload with the per-call key.
///
/// Returns `IV || ciphertext || tag`. The IV is drawn fresh from the
/// system RNG per frame, so frames carry no sequence-derived state
/// and tolerate reordering and loss.
pub fn encrypt_frame(key: &CallKey, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let aead_key = to_aead_key(key)?;

    let rng = SystemRandom::new();
    let mut iv = [0u8; FRAME_IV_SIZE];
    rng.fill(&mut iv).map_err(|_| CryptoError::Rng)?;

    let mut in_out = payload.to_vec();
    aead_key
        .seal_in_place_append_tag(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut frame = Vec::with_capacity(FRAME_IV_SIZE + in_out.len());
    frame.extend_from_slice(&iv);
    frame.extend_from_slice(&in_out);
    Ok(frame)
}

/// Decrypt one media frame of the form `IV || ciphertext || tag`.
///
/// Frames too short to carry an IV and tag are rejected before any
/// cipher work. Returns [`CryptoError::AuthenticationFailed`] on a
/// wrong key or tampered data.
pub fn decrypt_frame(key: &CallKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < FRAME_OVERHEAD {
        return Err(CryptoError::FrameTooShort);
    }

    let aead_key = to_aead_key(key)?;

    let mut iv = [0u8; FRAME_IV_SIZE];
    iv.copy_from_slice(&data[..FRAME_IV_SIZE]);

    let mut in_out = data[FRAME_IV_SIZE..].to_vec();
    let plaintext = aead_key
        .open_in_place(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    Ok(plaintext.to_vec())
}
