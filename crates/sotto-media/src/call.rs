//! Per-call encryption state.

use sotto_crypto::CallKey;

/// Capability string surfaced when frame interception is not
/// available on the running platform.
pub const FRAME_ENCRYPTION_UNAVAILABLE: &str = "frame_encryption_unavailable";

/// Explicit encryption state of one call's media path.
///
/// The pipeline consults this state for every call; there is no
/// implicit "probably encrypted" mode. A call that cannot encrypt
/// says so through `Unencrypted { capability }`.
#[derive(Clone)]
pub enum CallEncryption {
    /// Frames pass through in the clear. `capability` names the
    /// missing capability so the caller can show it to the user.
    Unencrypted { capability: &'static str },

    /// Frames are sealed with the per-call key.
    Encrypting(CallKey),

    /// Encryption was requested but could not be established.
    /// No media is forwarded in this state.
    Failed { reason: String },
}

impl CallEncryption {
    /// State for a platform without frame interception support.
    pub fn unavailable() -> Self {
        Self::Unencrypted {
            capability: FRAME_ENCRYPTION_UNAVAILABLE,
        }
    }

    /// Whether frames on this call are actually sealed.
    pub fn is_encrypting(&self) -> bool {
        matches!(self, Self::Encrypting(_))
    }
}

impl std::fmt::Debug for CallEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unencrypted { capability } => {
                f.debug_struct("Unencrypted").field("capability", capability).finish()
            }
            Self::Encrypting(_) => f.write_str("Encrypting(..)"),
            Self::Failed { reason } => f.debug_struct("Failed").field("reason", reason).finish(),
        }
    }
}
