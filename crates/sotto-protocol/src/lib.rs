//! Sotto wire protocol: signaling events and the TCP frame codec.
//!
//! Events travel as length-prefixed JSON frames over the TLS control
//! channel. The JSON shapes (tag names and camelCase fields) are the
//! stable wire contract shared with every client.

pub mod codec;
pub mod error;
pub mod events;
pub mod types;

pub use codec::{
    decode_client_event, decode_server_event, encode_client_event, encode_server_event,
    try_decode_frame, MAX_EVENT_SIZE,
};
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{MessageId, StoredMessage, UserId, UserProfile};
