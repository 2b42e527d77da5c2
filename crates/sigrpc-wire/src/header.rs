//! Common request/response header.
//!
//! ```text
//! ┌────────────┬────────────┬────────────┬────────────────┐
//! │ msg_type   │ status     │ pid        │ payload_size   │
//! │ (4B LE)    │ (4B LE)    │ (4B LE)    │ (8B LE)        │
//! └────────────┴────────────┴────────────┴────────────────┘
//! ```
//!
//! Only the client's process id travels on the wire. The textual client id
//! `<instance>-<hex pid>` is rebuilt locally from the codec's instance identity.

use std::fmt;

use bytes::{Buf, BufMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{ensure_remaining, Result, WireError};

/// Encoded header size.
pub const HEADER_SIZE: usize = 20;

/// Message kinds carried in `msg_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    LoadLibrary,
    InvokeFunction,
    PullPage,
}

impl MessageKind {
    pub const LOAD_LIBRARY: u32 = 0;
    pub const INVOKE_FUNCTION: u32 = 1;
    pub const PULL_PAGE: u32 = 2;

    /// Kind for a raw tag, or `None` if the tag is not recognized.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            Self::LOAD_LIBRARY => Some(Self::LoadLibrary),
            Self::INVOKE_FUNCTION => Some(Self::InvokeFunction),
            Self::PULL_PAGE => Some(Self::PullPage),
            _ => None,
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            Self::LoadLibrary => Self::LOAD_LIBRARY,
            Self::InvokeFunction => Self::INVOKE_FUNCTION,
            Self::PullPage => Self::PULL_PAGE,
        }
    }

    /// Whether the kind may be issued while an invocation is streaming.
    pub fn allowed_while_streaming(self) -> bool {
        matches!(self, Self::InvokeFunction)
    }
}

impl From<MessageKind> for u32 {
    fn from(kind: MessageKind) -> Self {
        kind.tag()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LoadLibrary => "LOAD_LIBRARY",
            Self::InvokeFunction => "INVOKE_FUNCTION",
            Self::PullPage => "PULL_PAGE",
        })
    }
}

/// Header shared by every request and response.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RpcHeader {
    pub msg_type: u32,
    pub status: u32,
    /// `<instance>-<hex pid>`.
    pub client_id: String,
    pub payload_size: u64,
}

impl RpcHeader {
    /// The recognized message kind, if any.
    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_tag(self.msg_type)
    }

    /// Process id parsed from the `-<hex>` suffix of the client id.
    pub fn pid(&self) -> Result<u32> {
        parse_pid(&self.client_id)
    }
}

fn parse_pid(client_id: &str) -> Result<u32> {
    let invalid = || WireError::InvalidClientId(client_id.to_string());
    let (_, suffix) = client_id.rsplit_once('-').ok_or_else(invalid)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u32::from_str_radix(suffix, 16).map_err(|_| invalid())
}

/// Header codec bound to one daemon instance identity.
///
/// The identity is fixed at construction and never transmitted. A single
/// codec is shared read-only by all sessions.
#[derive(Debug, Clone)]
pub struct HeaderCodec {
    identity: String,
}

impl HeaderCodec {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    /// The instance identity prefixed to every decoded client id.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Client id for a process under this instance.
    pub fn client_id(&self, pid: u32) -> String {
        format!("{}-{:x}", self.identity, pid)
    }

    /// Append the 20-byte header to `dst`.
    ///
    /// Fails with [`WireError::InvalidClientId`] without writing anything if
    /// the client id has no `-<hex pid>` suffix.
    pub fn encode(&self, header: &RpcHeader, dst: &mut impl BufMut) -> Result<()> {
        let pid = header.pid()?;
        dst.put_u32_le(header.msg_type);
        dst.put_u32_le(header.status);
        dst.put_u32_le(pid);
        dst.put_u64_le(header.payload_size);
        Ok(())
    }

    /// Decode a header from an in-memory buffer.
    pub fn decode(&self, src: &mut impl Buf) -> Result<RpcHeader> {
        ensure_remaining(src, "rpc header", HEADER_SIZE)?;
        let msg_type = src.get_u32_le();
        let status = src.get_u32_le();
        let pid = src.get_u32_le();
        let payload_size = src.get_u64_le();
        Ok(RpcHeader {
            msg_type,
            status,
            client_id: self.client_id(pid),
            payload_size,
        })
    }

    /// Read one header from a connection.
    ///
    /// Returns `Ok(None)` if the peer closed the stream before sending any
    /// byte of a new header. A close part-way through is an error.
    pub async fn read<R: AsyncRead + Unpin>(&self, reader: &mut R) -> Result<Option<RpcHeader>> {
        let mut buf = [0u8; HEADER_SIZE];
        let mut filled = 0usize;
        while filled < HEADER_SIZE {
            let n = reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(WireError::truncated("rpc header", HEADER_SIZE, filled));
            }
            filled += n;
        }
        self.decode(&mut &buf[..]).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use tokio::io::AsyncWriteExt;

    use super::*;

    fn header(client_id: &str) -> RpcHeader {
        RpcHeader {
            msg_type: MessageKind::PULL_PAGE,
            status: 7,
            client_id: client_id.to_string(),
            payload_size: 0x1_0000_0002,
        }
    }

    #[test]
    fn encode_layout() {
        let codec = HeaderCodec::new("node");
        let mut buf = BytesMut::new();
        codec.encode(&header("node-1a2b"), &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[0..4], &2u32.to_le_bytes());
        assert_eq!(&buf[4..8], &7u32.to_le_bytes());
        assert_eq!(&buf[8..12], &0x1a2bu32.to_le_bytes());
        assert_eq!(&buf[12..20], &0x1_0000_0002u64.to_le_bytes());
    }

    #[test]
    fn client_id_roundtrip() {
        let instance = "3f2a9c1e-77d0-4b5e-9e0a-5c1d2b3a4f60";
        let codec = HeaderCodec::new(instance);
        let original = header(&format!("{instance}-1a2b"));

        let mut buf = BytesMut::new();
        codec.encode(&original, &mut buf).unwrap();
        let decoded = codec.decode(&mut buf.freeze()).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.client_id, format!("{instance}-1a2b"));
    }

    #[test]
    fn decode_uses_local_identity() {
        let mut buf = BytesMut::new();
        HeaderCodec::new("sender")
            .encode(&header("anything-ff"), &mut buf)
            .unwrap();

        let decoded = HeaderCodec::new("receiver").decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.client_id, "receiver-ff");
    }

    #[test]
    fn invalid_client_id_writes_nothing() {
        let codec = HeaderCodec::new("node");
        for bad in ["nodash", "node-", "node-xyz", "node-+1", "node-123456789"] {
            let mut buf = BytesMut::new();
            let err = codec.encode(&header(bad), &mut buf).unwrap_err();
            assert!(matches!(err, WireError::InvalidClientId(_)), "{bad}");
            assert!(buf.is_empty(), "{bad} produced bytes");
        }
    }

    #[test]
    fn message_kind_tags() {
        for kind in [
            MessageKind::LoadLibrary,
            MessageKind::InvokeFunction,
            MessageKind::PullPage,
        ] {
            assert_eq!(MessageKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(MessageKind::from_tag(99), None);
        assert!(MessageKind::InvokeFunction.allowed_while_streaming());
        assert!(!MessageKind::LoadLibrary.allowed_while_streaming());
        assert!(!MessageKind::PullPage.allowed_while_streaming());
    }

    #[tokio::test]
    async fn read_handles_short_reads() {
        let codec = HeaderCodec::new("node");
        let mut wire = BytesMut::new();
        codec.encode(&header("node-42"), &mut wire).unwrap();

        let (mut client, mut server) = tokio::io::duplex(4);
        let writer = tokio::spawn(async move {
            for chunk in wire.chunks(3) {
                client.write_all(chunk).await.unwrap();
            }
            client
        });

        let decoded = codec.read(&mut server).await.unwrap().unwrap();
        assert_eq!(decoded, header("node-42"));
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn read_clean_close_is_none() {
        let codec = HeaderCodec::new("node");
        let mut empty: &[u8] = &[];
        assert!(codec.read(&mut empty).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_close_mid_header_is_error() {
        let codec = HeaderCodec::new("node");
        let mut partial: &[u8] = &[1, 0, 0, 0, 0, 0];
        let err = codec.read(&mut partial).await.unwrap_err();
        assert!(matches!(
            err,
            WireError::Truncated {
                what: "rpc header",
                available: 6,
                ..
            }
        ));
    }
}
