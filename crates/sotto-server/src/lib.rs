//! Sotto signaling relay server.
//!
//! The server authenticates connections, stores ciphertext message
//! envelopes, serves the user directory, and forwards call signaling
//! between users. It never holds key material and never sees
//! plaintext; everything it stores or routes is opaque to it.

pub mod auth;
pub mod config;
pub mod relay;
pub mod state;
pub mod store;
