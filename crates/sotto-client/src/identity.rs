//! Identity key pair persistence.
//!
//! The key pair is stored as a JSON file with base64-encoded halves.
//! A missing or corrupt file loads as `None` and a fresh pair is
//! generated in its place, so a damaged store degrades to a new
//! identity rather than a crash.

use std::fs;
use std::path::Path;

use tracing::warn;

use sotto_crypto::{IdentityKeyPair, StoredIdentity};

use crate::error::ClientError;

/// Load the identity key pair from `path`.
///
/// Returns `None` if the file does not exist, is not valid JSON, or
/// holds malformed key material.
pub fn load_identity(path: &Path) -> Option<IdentityKeyPair> {
    let data = fs::read_to_string(path).ok()?;
    let stored: StoredIdentity = match serde_json::from_str(&data) {
        Ok(stored) => stored,
        Err(err) => {
            warn!(path = %path.display(), %err, "identity file is not valid JSON, ignoring");
            return None;
        }
    };
    match stored.to_key_pair() {
        Ok(pair) => Some(pair),
        Err(err) => {
            warn!(path = %path.display(), %err, "identity file holds bad key material, ignoring");
            None
        }
    }
}

/// Persist the identity key pair to `path` as JSON.
pub fn save_identity(path: &Path, pair: &IdentityKeyPair) -> Result<(), ClientError> {
    let stored = StoredIdentity::from_key_pair(pair);
    let json = serde_json::to_string_pretty(&stored)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load the identity from `path`, generating and persisting a fresh
/// pair if none can be loaded.
pub fn load_or_generate_identity(path: &Path) -> Result<IdentityKeyPair, ClientError> {
    if let Some(pair) = load_identity(path) {
        return Ok(pair);
    }
    let pair = IdentityKeyPair::generate();
    save_identity(path, &pair)?;
    Ok(pair)
}
