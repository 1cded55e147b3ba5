//! Sotto cryptographic layer: pairwise key agreement and media encryption.
//!
//! This crate provides:
//! - Identity key management (long-term X25519 key pairs)
//! - Pairwise shared-key derivation via X25519 ECDH + HKDF
//! - Authenticated message envelopes (XChaCha20-Poly1305, 24-byte nonces)
//! - Per-call AES-256-GCM key derivation
//! - Symmetric AES-256-GCM encryption for media frames

pub mod agreement;
pub mod call_key;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod identity;

// Re-export key types for convenience
pub use agreement::{derive_shared_key, SharedKey};
pub use call_key::{derive_call_key, CallKey};
pub use envelope::{open_message, seal_message, MessageEnvelope, ENVELOPE_NONCE_SIZE};
pub use error::CryptoError;
pub use frame::{decrypt_frame, encrypt_frame, FRAME_IV_SIZE, FRAME_OVERHEAD, GCM_TAG_SIZE};
pub use identity::{public_key_from_base64, public_key_to_base64, IdentityKeyPair, StoredIdentity};
