use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("event too large: {0} bytes (max 65536)")]
    MessageTooLarge(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
