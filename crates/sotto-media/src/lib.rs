//! Sotto media pipeline: per-call encryption state and streaming
//! frame transforms.
//!
//! Encoded media frames flow through one-directional pipeline stages
//! connected by bounded channels. The transforms seal and open frame
//! payloads with the per-call key while passing timing metadata
//! through untouched.

pub mod call;
pub mod transform;

pub use call::{CallEncryption, FRAME_ENCRYPTION_UNAVAILABLE};
pub use transform::{decrypt_stream, encrypt_stream, MediaFrame, TransformStats};
