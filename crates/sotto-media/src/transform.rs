//! Streaming encrypt/decrypt transforms for call media.
//!
//! Each transform is a pipeline stage: it reads one frame from its
//! input channel, processes it, and writes the result downstream
//! before reading the next. Channels are bounded, so a slow consumer
//! applies backpressure instead of growing a queue.
//!
//! A frame that fails to decrypt is dropped and counted; it is never
//! forwarded as if it were valid audio, and it never tears down the
//! stream. When the input channel closes the stage finishes and drops
//! its output sender, which closes the stage downstream of it.

use tokio::sync::mpsc;
use tracing::warn;

use sotto_crypto::{decrypt_frame, encrypt_frame};

use crate::call::CallEncryption;

/// One encoded media frame with its passthrough metadata.
///
/// The transforms only touch `payload`; `sequence` and `timestamp`
/// are carried through unmodified for the depacketizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFrame {
    pub sequence: u32,
    pub timestamp: u32,
    pub payload: Vec<u8>,
}

/// Counters reported by a transform stage when its stream ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransformStats {
    /// Frames forwarded downstream.
    pub forwarded: u64,
    /// Frames dropped (failed decryption or a `Failed` call state).
    pub dropped: u64,
}

/// Outbound stage: seal each frame payload with the per-call key.
///
/// In the `Unencrypted` state frames pass through in the clear. In
/// the `Failed` state nothing is forwarded.
pub async fn encrypt_stream(
    encryption: CallEncryption,
    mut input: mpsc::Receiver<MediaFrame>,
    output: mpsc::Sender<MediaFrame>,
) -> TransformStats {
    let mut stats = TransformStats::default();

    while let Some(frame) = input.recv().await {
        let sealed = match &encryption {
            CallEncryption::Unencrypted { .. } => Some(frame),
            CallEncryption::Encrypting(key) => match encrypt_frame(key, &frame.payload) {
                Ok(payload) => Some(MediaFrame { payload, ..frame }),
                Err(err) => {
                    warn!(sequence = frame.sequence, %err, "dropping unencryptable frame");
                    stats.dropped += 1;
                    None
                }
            },
            CallEncryption::Failed { .. } => {
                stats.dropped += 1;
                None
            }
        };

        if let Some(out) = sealed {
            if output.send(out).await.is_err() {
                // Downstream closed; stop reading.
                break;
            }
            stats.forwarded += 1;
        }
    }

    stats
}

/// Inbound stage: open each sealed frame with the per-call key.
///
/// A frame that fails authentication (or is too short to be a sealed
/// frame) is dropped with a warning; the stream continues with the
/// next frame.
pub async fn decrypt_stream(
    encryption: CallEncryption,
    mut input: mpsc::Receiver<MediaFrame>,
    output: mpsc::Sender<MediaFrame>,
) -> TransformStats {
    let mut stats = TransformStats::default();

    while let Some(frame) = input.recv().await {
        let opened = match &encryption {
            CallEncryption::Unencrypted { .. } => Some(frame),
            CallEncryption::Encrypting(key) => match decrypt_frame(key, &frame.payload) {
                Ok(payload) => Some(MediaFrame { payload, ..frame }),
                Err(err) => {
                    warn!(sequence = frame.sequence, %err, "dropping undecryptable frame");
                    stats.dropped += 1;
                    None
                }
            },
            CallEncryption::Failed { .. } => {
                stats.dropped += 1;
                None
            }
        };

        if let Some(out) = opened {
            if output.send(out).await.is_err() {
                break;
            }
            stats.forwarded += 1;
        }
    }

    stats
}
