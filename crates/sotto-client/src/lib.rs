//! Sotto client core: identity storage, per-peer conversations, and
//! call setup state.
//!
//! This crate holds the client-side halves of the end-to-end layer:
//! the long-term identity lives here, shared keys are derived here,
//! and plaintext only ever exists here.

pub mod call;
pub mod conversation;
pub mod error;
pub mod identity;

pub use call::CallSetup;
pub use conversation::{Conversation, MessageBody};
pub use error::ClientError;
pub use identity::{load_identity, load_or_generate_identity, save_identity};
