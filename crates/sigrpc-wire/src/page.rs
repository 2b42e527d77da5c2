//! Memory page codec.
//!
//! ```text
//! ┌───────────┬──────────────────┬─────────────────┬──────────────┬─────────┐
//! │ address   │ runtime_revision │ client_revision │ content_size │ content │
//! │ (8B LE)   │ (8B LE)          │ (8B LE)         │ (4B LE)      │ (n B)   │
//! └───────────┴──────────────────┴─────────────────┴──────────────┴─────────┘
//! ```

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_remaining, Result, WireError};

/// Size of the fixed page descriptor that precedes the content.
pub const PAGE_HEADER_SIZE: usize = 28;

/// A versioned, addressed block of memory.
///
/// An empty `content` describes the page without carrying its bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPage {
    pub address: u64,
    pub runtime_revision: u64,
    pub client_revision: u64,
    pub content: Vec<u8>,
}

impl MemoryPage {
    /// Encoded size of this page.
    pub fn wire_size(&self) -> usize {
        PAGE_HEADER_SIZE + self.content.len()
    }
}

/// Stateless codec for [`MemoryPage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PageCodec;

impl PageCodec {
    /// Append the page descriptor and its content to `dst`.
    pub fn encode(&self, page: &MemoryPage, dst: &mut impl BufMut) {
        dst.put_u64_le(page.address);
        dst.put_u64_le(page.runtime_revision);
        dst.put_u64_le(page.client_revision);
        dst.put_u32_le(page.content.len() as u32);
        dst.put_slice(&page.content);
    }

    /// Decode the next page from `src`.
    ///
    /// Returns `Ok(None)` when `src` is empty, i.e. the previous page ended
    /// exactly at the end of input. Any other shortfall is an error.
    pub fn decode(&self, src: &mut impl Buf) -> Result<Option<MemoryPage>> {
        if !src.has_remaining() {
            return Ok(None);
        }
        ensure_remaining(src, "page header", PAGE_HEADER_SIZE)?;

        let address = src.get_u64_le();
        let runtime_revision = src.get_u64_le();
        let client_revision = src.get_u64_le();
        let content_size = src.get_u32_le() as usize;

        if src.remaining() < content_size {
            return Err(WireError::truncated(
                "page content",
                content_size,
                src.remaining(),
            ));
        }
        let mut content = vec![0u8; content_size];
        src.copy_to_slice(&mut content);

        Ok(Some(MemoryPage {
            address,
            runtime_revision,
            client_revision,
            content,
        }))
    }

    /// Decode pages until the input is exhausted at a page boundary.
    pub fn decode_all(&self, src: &mut impl Buf) -> Result<Vec<MemoryPage>> {
        let mut pages = Vec::new();
        while let Some(page) = self.decode(src)? {
            pages.push(page);
        }
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::*;
    use crate::test_support::sample_page;

    #[test]
    fn encode_writes_header_then_content() {
        let page = sample_page(0x1000, b"abc");
        let mut buf = BytesMut::new();
        PageCodec.encode(&page, &mut buf);

        assert_eq!(buf.len(), PAGE_HEADER_SIZE + 3);
        assert_eq!(&buf[..8], &0x1000u64.to_le_bytes());
        assert_eq!(&buf[24..28], &3u32.to_le_bytes());
        assert_eq!(&buf[28..], b"abc");
    }

    #[test]
    fn empty_content_is_header_only() {
        let page = sample_page(0x2000, b"");
        let mut buf = BytesMut::new();
        PageCodec.encode(&page, &mut buf);
        assert_eq!(buf.len(), PAGE_HEADER_SIZE);

        let decoded = PageCodec.decode(&mut buf.freeze()).unwrap().unwrap();
        assert_eq!(decoded, page);
        assert!(decoded.content.is_empty());
    }

    #[test]
    fn roundtrip_with_content() {
        let page = sample_page(0x7fff_0000, &[0xcc; 4096]);
        let mut buf = BytesMut::new();
        PageCodec.encode(&page, &mut buf);

        let mut src = buf.freeze();
        assert_eq!(PageCodec.decode(&mut src).unwrap(), Some(page));
        assert!(src.is_empty());
    }

    #[test]
    fn empty_input_is_clean_end() {
        let mut src = Bytes::new();
        assert_eq!(PageCodec.decode(&mut src).unwrap(), None);
        assert!(PageCodec.decode_all(&mut src).unwrap().is_empty());
    }

    #[test]
    fn partial_header_is_an_error() {
        let mut buf = BytesMut::new();
        PageCodec.encode(&sample_page(1, b"x"), &mut buf);
        buf.truncate(10);

        let err = PageCodec.decode(&mut buf.freeze()).unwrap_err();
        assert!(matches!(
            err,
            WireError::Truncated {
                what: "page header",
                needed: PAGE_HEADER_SIZE,
                available: 10,
            }
        ));
    }

    #[test]
    fn short_content_is_an_error() {
        let mut buf = BytesMut::new();
        PageCodec.encode(&sample_page(1, b"0123456789"), &mut buf);
        buf.truncate(PAGE_HEADER_SIZE + 4);

        let err = PageCodec.decode(&mut buf.freeze()).unwrap_err();
        assert!(matches!(
            err,
            WireError::Truncated {
                what: "page content",
                needed: 10,
                available: 4,
            }
        ));
    }

    #[test]
    fn decode_all_stops_at_boundary() {
        let pages = vec![
            sample_page(0x1000, b"one"),
            sample_page(0x2000, b""),
            sample_page(0x3000, b"three"),
        ];
        let mut buf = BytesMut::new();
        for page in &pages {
            PageCodec.encode(page, &mut buf);
        }

        assert_eq!(PageCodec.decode_all(&mut buf.freeze()).unwrap(), pages);
    }

    #[test]
    fn decode_all_rejects_trailing_garbage() {
        let mut buf = BytesMut::new();
        PageCodec.encode(&sample_page(0x1000, b"one"), &mut buf);
        buf.extend_from_slice(&[0u8; 5]);

        assert!(PageCodec.decode_all(&mut buf.freeze()).is_err());
    }
}
