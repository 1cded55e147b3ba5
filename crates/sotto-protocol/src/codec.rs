use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;
use crate::events::{ClientEvent, ServerEvent};

/// Maximum TCP event size: 64 KiB.
pub const MAX_EVENT_SIZE: u32 = 65_536;

/// Encode a `ClientEvent` into a length-prefixed byte buffer for TCP transmission.
pub fn encode_client_event(event: &ClientEvent) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(event)?;
    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a `ClientEvent` from a JSON payload (without length prefix).
pub fn decode_client_event(payload: &[u8]) -> Result<ClientEvent, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Encode a `ServerEvent` into a length-prefixed byte buffer for TCP transmission.
pub fn encode_server_event(event: &ServerEvent) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(event)?;
    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a `ServerEvent` from a JSON payload (without length prefix).
pub fn decode_server_event(payload: &[u8]) -> Result<ServerEvent, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Attempt to extract one complete length-prefixed frame from a byte buffer.
///
/// Returns `Ok(Some(payload))` if a complete event is available,
/// `Ok(None)` if more data is needed, or `Err` if the event is too large.
///
/// Advances the buffer past the consumed frame.
pub fn try_decode_frame(buf: &mut BytesMut) -> Result<Option<Vec<u8>>, ProtocolError> {
    if buf.len() < 4 {
        return Ok(None);
    }

    let length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

    if length > MAX_EVENT_SIZE as usize {
        return Err(ProtocolError::MessageTooLarge(length));
    }

    if buf.len() < 4 + length {
        return Ok(None);
    }

    buf.advance(4);
    let payload = buf.split_to(length).to_vec();
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roundtrip_client_event() {
        let event = ClientEvent::Auth {
            token: "opaque-token".into(),
        };
        let encoded = encode_client_event(&event).unwrap();
        // Skip the 4-byte length prefix
        let decoded = decode_client_event(&encoded[4..]).unwrap();
        match decoded {
            ClientEvent::Auth { token } => assert_eq!(token, "opaque-token"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn roundtrip_server_event() {
        let event = ServerEvent::CallOffer {
            from_user_id: "u-1".into(),
            sdp: json!({"type": "offer"}),
        };
        let encoded = encode_server_event(&event).unwrap();
        let decoded = decode_server_event(&encoded[4..]).unwrap();
        match decoded {
            ServerEvent::CallOffer { from_user_id, sdp } => {
                assert_eq!(from_user_id, "u-1");
                assert_eq!(sdp["type"], "offer");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn frame_decoding() {
        let event = ClientEvent::Login {
            phone: "+15550001".into(),
        };
        let encoded = encode_client_event(&event).unwrap();

        let mut buf = BytesMut::new();

        // Partial data, should return None
        buf.extend_from_slice(&encoded[..3]);
        assert!(try_decode_frame(&mut buf).unwrap().is_none());

        // Complete data
        buf.extend_from_slice(&encoded[3..]);
        let payload = try_decode_frame(&mut buf).unwrap().unwrap();
        let decoded = decode_client_event(&payload).unwrap();
        assert!(matches!(decoded, ClientEvent::Login { .. }));

        // Buffer should be empty now
        assert!(buf.is_empty());
    }

    #[test]
    fn frame_message_too_large() {
        let mut buf = BytesMut::new();
        let bad_len = (MAX_EVENT_SIZE + 1).to_be_bytes();
        buf.extend_from_slice(&bad_len);
        buf.extend_from_slice(&[0u8; 100]);
        let result = try_decode_frame(&mut buf);
        assert!(matches!(result, Err(ProtocolError::MessageTooLarge(_))));
    }

    #[test]
    fn frame_partial_length() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0, 0]); // only 2 bytes, need 4
        assert!(try_decode_frame(&mut buf).unwrap().is_none());
    }

    #[test]
    fn frame_multiple_events() {
        let event1 = ClientEvent::ListUsers;
        let event2 = ClientEvent::GetKey {
            user_id: "u-7".into(),
        };
        let enc1 = encode_client_event(&event1).unwrap();
        let enc2 = encode_client_event(&event2).unwrap();

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&enc1);
        buf.extend_from_slice(&enc2);

        let payload1 = try_decode_frame(&mut buf).unwrap().unwrap();
        let payload2 = try_decode_frame(&mut buf).unwrap().unwrap();
        assert!(matches!(
            decode_client_event(&payload1).unwrap(),
            ClientEvent::ListUsers
        ));
        match decode_client_event(&payload2).unwrap() {
            ClientEvent::GetKey { user_id } => assert_eq!(user_id, "u-7"),
            _ => panic!("wrong variant"),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn malformed_payload_rejected() {
        assert!(decode_client_event(b"{\"type\":").is_err());
        assert!(decode_server_event(b"not json at all").is_err());
    }
}
