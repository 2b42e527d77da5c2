use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::body::MessageBodyCodec;
use crate::error::Result;
use crate::header::{HeaderCodec, MessageKind, RpcHeader};
use crate::page::{MemoryPage, PageCodec};

/// Pull-page message: a bare sequence of pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullPageMessage {
    pub header: RpcHeader,
    pub pages: Vec<MemoryPage>,
}

#[derive(Debug, Clone)]
pub struct PullPageCodec {
    header: Arc<HeaderCodec>,
    page: PageCodec,
}

impl PullPageCodec {
    pub fn new(header: Arc<HeaderCodec>, page: PageCodec) -> Self {
        Self { header, page }
    }
}

impl MessageBodyCodec for PullPageCodec {
    type Message = PullPageMessage;
    const KIND: MessageKind = MessageKind::PullPage;

    fn encode(&self, msg: &mut PullPageMessage, dst: &mut BytesMut) -> Result<()> {
        let size: usize = msg.pages.iter().map(MemoryPage::wire_size).sum();
        let mut payload = BytesMut::with_capacity(size);
        for page in &msg.pages {
            self.page.encode(page, &mut payload);
        }

        msg.header.payload_size = payload.len() as u64;
        self.header.encode(&msg.header, dst)?;
        dst.extend_from_slice(&payload);
        Ok(())
    }

    fn decode(&self, header: RpcHeader, payload: Bytes) -> Result<PullPageMessage> {
        if header.payload_size == 0 {
            return Ok(PullPageMessage {
                header,
                pages: Vec::new(),
            });
        }
        let mut src = payload;
        let pages = self.page.decode_all(&mut src)?;
        Ok(PullPageMessage { header, pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;
    use crate::header::HEADER_SIZE;
    use crate::test_support::{sample_header, sample_page};

    fn codec() -> PullPageCodec {
        PullPageCodec::new(Arc::new(HeaderCodec::new("node-a")), PageCodec)
    }

    fn split(mut wire: Bytes) -> (RpcHeader, Bytes) {
        let header = HeaderCodec::new("node-a").decode(&mut wire).unwrap();
        (header, wire)
    }

    #[test]
    fn roundtrip() {
        let mut msg = PullPageMessage {
            header: sample_header(MessageKind::PullPage),
            pages: vec![
                sample_page(0x1000, &[1; 64]),
                sample_page(0x2000, b""),
                sample_page(0x3000, &[2; 4096]),
            ],
        };
        let wire = codec().encode_to_bytes(&mut msg).unwrap();
        assert_eq!(msg.header.payload_size as usize, wire.len() - HEADER_SIZE);

        let (header, payload) = split(wire);
        assert_eq!(codec().decode(header, payload).unwrap(), msg);
    }

    #[test]
    fn empty_request_is_header_only() {
        let mut msg = PullPageMessage {
            header: sample_header(MessageKind::PullPage),
            pages: Vec::new(),
        };
        let wire = codec().encode_to_bytes(&mut msg).unwrap();
        assert_eq!(wire.len(), HEADER_SIZE);
        assert_eq!(msg.header.payload_size, 0);

        let (header, payload) = split(wire);
        assert!(codec().decode(header, payload).unwrap().pages.is_empty());
    }

    #[test]
    fn mid_page_truncation_fails() {
        let mut header = sample_header(MessageKind::PullPage);
        header.payload_size = 10;
        let err = codec()
            .decode(header, Bytes::from(vec![0u8; 10]))
            .unwrap_err();
        assert!(matches!(err, WireError::Truncated { .. }));
    }
}
