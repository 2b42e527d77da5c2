use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{BackendError, Result};

/// Frame header: magic (2) + length (4) + kind (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "SB" (0x53 0x42).
pub const MAGIC: [u8; 2] = [0x53, 0x42];

/// Default maximum payload size: 256 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 256 * 1024 * 1024;

/// One frame on the backend link.
#[derive(Debug, Clone)]
pub struct BackendFrame {
    pub kind: u16,
    /// JSON-encoded message body.
    pub payload: Bytes,
}

impl BackendFrame {
    pub fn new(kind: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Serialize `message` as the frame payload.
    pub fn json<T: Serialize>(kind: u16, message: &T) -> Result<Self> {
        Ok(Self::new(kind, serde_json::to_vec(message)?))
    }

    /// Deserialize the frame payload.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Error frame carrying `message`.
    pub fn error(message: &str) -> Self {
        let body = serde_json::json!({ "error": message });
        Self::new(crate::kind::ERROR, body.to_string())
    }

    /// Message text of an error frame.
    pub fn error_message(&self) -> String {
        serde_json::from_slice::<serde_json::Value>(&self.payload)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| String::from_utf8_lossy(&self.payload).into_owned())
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// ```text
/// ┌──────────────┬───────────┬──────────┬─────────────────┐
/// │ Magic (2B)   │ Length    │ Kind     │ Payload (JSON)  │
/// │ 0x53 0x42    │ (4B LE)   │ (2B LE)  │ (Length bytes)  │
/// └──────────────┴───────────┴──────────┴─────────────────┘
/// ```
pub fn encode_frame(kind: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(BackendError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_u16_le(kind);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<BackendFrame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }
    if src[0..2] != MAGIC {
        return Err(BackendError::InvalidMagic);
    }

    let payload_len = (&src[2..6]).get_u32_le() as usize;
    let kind = (&src[6..8]).get_u16_le();

    if payload_len > max_payload {
        return Err(BackendError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();
    Ok(Some(BackendFrame { kind, payload }))
}

/// `tokio_util` codec for the backend link.
#[derive(Debug, Clone)]
pub struct BackendCodec {
    max_payload_size: usize,
}

impl BackendCodec {
    pub fn new(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }
}

impl Default for BackendCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD)
    }
}

impl Decoder for BackendCodec {
    type Item = BackendFrame;
    type Error = BackendError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BackendFrame>> {
        decode_frame(src, self.max_payload_size)
    }
}

impl Encoder<BackendFrame> for BackendCodec {
    type Error = BackendError;

    fn encode(&mut self, frame: BackendFrame, dst: &mut BytesMut) -> Result<()> {
        if frame.payload.len() > self.max_payload_size {
            return Err(BackendError::PayloadTooLarge {
                size: frame.payload.len(),
                max: self.max_payload_size,
            });
        }
        encode_frame(frame.kind, &frame.payload, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{ERROR, INVOKE_FINAL, PULL_PAGE};

    #[test]
    fn encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        encode_frame(PULL_PAGE, b"{\"pages\":[]}", &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + 12);

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.kind, PULL_PAGE);
        assert_eq!(frame.payload.as_ref(), b"{\"pages\":[]}");
        assert!(buf.is_empty());
    }

    #[test]
    fn incomplete_frames_wait_for_more() {
        let mut buf = BytesMut::from(&[0x53, 0x42, 0x00][..]);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .is_none());

        let mut buf = BytesMut::new();
        encode_frame(1, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .is_none());
    }

    #[test]
    fn invalid_magic() {
        let mut buf = BytesMut::from(&[0x49, 0x50, 0, 0, 0, 0, 0, 0][..]);
        assert!(matches!(
            decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD),
            Err(BackendError::InvalidMagic)
        ));
    }

    #[test]
    fn oversized_payload_rejected_both_ways() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(1024);
        buf.put_u16_le(1);

        let mut codec = BackendCodec::new(16);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(BackendError::PayloadTooLarge { size: 1024, max: 16 })
        ));

        let mut dst = BytesMut::new();
        let err = codec
            .encode(BackendFrame::new(1, vec![0u8; 17]), &mut dst)
            .unwrap_err();
        assert!(matches!(err, BackendError::PayloadTooLarge { .. }));
        assert!(dst.is_empty());
    }

    #[test]
    fn codec_handles_back_to_back_frames() {
        let mut codec = BackendCodec::default();
        let mut buf = BytesMut::new();
        codec
            .encode(BackendFrame::new(INVOKE_FINAL, "{}"), &mut buf)
            .unwrap();
        codec.encode(BackendFrame::error("boom"), &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.kind, INVOKE_FINAL);
        assert_eq!(second.kind, ERROR);
        assert_eq!(second.error_message(), "boom");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn json_helpers() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Ping {
            n: u32,
        }
        let frame = BackendFrame::json(PULL_PAGE, &Ping { n: 7 }).unwrap();
        assert_eq!(frame.parse::<Ping>().unwrap(), Ping { n: 7 });
        assert_eq!(frame.wire_size(), HEADER_SIZE + frame.payload.len());
        assert!(frame.parse::<Vec<u8>>().is_err());
    }
}
