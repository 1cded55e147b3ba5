//! Per-call setup state.
//!
//! Signaling kinds carry no cross-kind ordering guarantee, so ICE
//! candidates can arrive before the answer. The setup buffers early
//! candidates and hands them back once the answer lands. Ending the
//! call drops the call key; the zeroize-on-drop container wipes it.

use sotto_crypto::derive_call_key;
use sotto_media::CallEncryption;

use crate::conversation::Conversation;
use crate::error::ClientError;

/// State machine for one outgoing or incoming call with a peer.
pub struct CallSetup {
    encryption: CallEncryption,
    answered: bool,
    pending_candidates: Vec<serde_json::Value>,
}

impl CallSetup {
    /// Start call setup against an open conversation.
    ///
    /// Derives the per-call key from the conversation's shared key.
    /// When the platform cannot intercept media frames, pass
    /// `frame_encryption_supported = false`: the call proceeds with
    /// [`CallEncryption::Unencrypted`] and the capability string
    /// surfaced, never silently assumed encrypted.
    pub fn new(
        conversation: &Conversation,
        frame_encryption_supported: bool,
    ) -> Result<Self, ClientError> {
        let encryption = if frame_encryption_supported {
            let key = derive_call_key(conversation.shared_key())?;
            CallEncryption::Encrypting(key)
        } else {
            CallEncryption::unavailable()
        };
        Ok(Self {
            encryption,
            answered: false,
            pending_candidates: Vec::new(),
        })
    }

    /// The media-path encryption state for this call.
    pub fn encryption(&self) -> &CallEncryption {
        &self.encryption
    }

    /// Record the remote answer. Returns all candidates that arrived
    /// before it, in arrival order, ready to be applied.
    pub fn accept_answer(&mut self) -> Vec<serde_json::Value> {
        self.answered = true;
        std::mem::take(&mut self.pending_candidates)
    }

    /// Handle a remote ICE candidate.
    ///
    /// Returns `Some(candidate)` if it can be applied immediately, or
    /// `None` if it arrived before the answer and was buffered.
    pub fn add_remote_candidate(
        &mut self,
        candidate: serde_json::Value,
    ) -> Option<serde_json::Value> {
        if self.answered {
            Some(candidate)
        } else {
            self.pending_candidates.push(candidate);
            None
        }
    }

    /// End the call, dropping the call key.
    pub fn hang_up(&mut self) {
        self.encryption = CallEncryption::Failed {
            reason: "call ended".into(),
        };
        self.answered = false;
        self.pending_candidates.clear();
    }
}
