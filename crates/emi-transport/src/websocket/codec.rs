//! Frame decoding.
//!
//! Text frames carry the event envelope as JSON. Binary frames carry the same
//! JSON compressed with zlib and are inflated in full before decoding.

use std::io::Read;

use flate2::read::ZlibDecoder;
use tokio_tungstenite::tungstenite::Message;

use emi_core::{FrameError, FrameResult, RawEvent};

/// Decodes one data frame into a [`RawEvent`].
///
/// Control frames are rejected with [`FrameError::Unsupported`]; the receive
/// loop handles them before calling this.
pub fn decode_frame(message: &Message) -> FrameResult<RawEvent> {
    match message {
        Message::Text(text) => RawEvent::from_slice(text.as_bytes()),
        Message::Binary(data) => RawEvent::from_slice(&decompress(data)?),
        Message::Ping(_) => Err(FrameError::Unsupported("ping")),
        Message::Pong(_) => Err(FrameError::Unsupported("pong")),
        Message::Close(_) => Err(FrameError::Unsupported("close")),
        Message::Frame(_) => Err(FrameError::Unsupported("raw frame")),
    }
}

/// Inflates a zlib stream.
pub fn decompress(data: &[u8]) -> FrameResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FrameError::Decompress(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;

    const PAYLOAD: &str = r#"{"type":"message_receive","self_id":1,"time":1000,"data":{"text":"hi"}}"#;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_text_and_binary_decode_identically() {
        let from_text = decode_frame(&Message::text(PAYLOAD)).unwrap();
        let from_binary = decode_frame(&Message::binary(zlib(PAYLOAD.as_bytes()))).unwrap();

        assert_eq!(from_text, from_binary);
        assert_eq!(from_text.event_type, "message_receive");
        assert_eq!(from_text.data_json(), r#"{"text":"hi"}"#);
    }

    #[test]
    fn test_uncompressed_binary_is_rejected() {
        let err = decode_frame(&Message::binary(PAYLOAD.as_bytes().to_vec())).unwrap_err();
        assert!(matches!(err, FrameError::Decompress(_)));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = decode_frame(&Message::text("{not json")).unwrap_err();
        assert!(matches!(err, FrameError::Decode(_)));
    }

    #[test]
    fn test_control_frames_are_unsupported() {
        let err = decode_frame(&Message::Ping(Vec::new().into())).unwrap_err();
        assert!(matches!(err, FrameError::Unsupported("ping")));
    }
}
