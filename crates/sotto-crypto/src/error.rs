//! Error taxonomy for the crypto crate.

use thiserror::Error;

/// Errors produced by key handling and encryption primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key bytes were malformed, the wrong length, or produced a
    /// degenerate (all-zero) exchange output.
    #[error("invalid key material")]
    InvalidKeyMaterial,

    /// Base64 decoding of a wire-encoded field failed.
    #[error("invalid base64 encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// HKDF expansion failed.
    #[error("key derivation failed")]
    KeyDerivation,

    /// AEAD sealing failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// AEAD opening failed: wrong key, wrong nonce, or tampered data.
    #[error("decryption failed: authentication tag mismatch")]
    AuthenticationFailed,

    /// A media frame was too short to carry an IV and tag.
    #[error("media frame too short")]
    FrameTooShort,

    /// The system random number generator failed.
    #[error("random number generator failure")]
    Rng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            CryptoError::InvalidKeyMaterial.to_string(),
            "invalid key material"
        );
        assert_eq!(
            CryptoError::AuthenticationFailed.to_string(),
            "decryption failed: authentication tag mismatch"
        );
        assert_eq!(CryptoError::FrameTooShort.to_string(), "media frame too short");
    }
}
