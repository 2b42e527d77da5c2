//! Load-library message.
//!
//! Payload: `library_name\0` followed by zero or more `{address: u64 LE, name\0}`
//! pairs. There is no entry count; the table runs to the end of the payload.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::body::MessageBodyCodec;
use crate::error::{ensure_remaining, Result, WireError};
use crate::header::{HeaderCodec, MessageKind, RpcHeader};

/// One symbol table entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addr2Sym {
    pub address: u64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadLibraryMessage {
    pub header: RpcHeader,
    pub library_name: String,
    pub addr2sym: Vec<Addr2Sym>,
}

impl LoadLibraryMessage {
    fn payload_size(&self) -> usize {
        let symbols: usize = self
            .addr2sym
            .iter()
            .map(|entry| 8 + entry.name.len() + 1)
            .sum();
        self.library_name.len() + 1 + symbols
    }
}

#[derive(Debug, Clone)]
pub struct LoadLibraryCodec {
    header: Arc<HeaderCodec>,
}

impl LoadLibraryCodec {
    pub fn new(header: Arc<HeaderCodec>) -> Self {
        Self { header }
    }
}

impl MessageBodyCodec for LoadLibraryCodec {
    type Message = LoadLibraryMessage;
    const KIND: MessageKind = MessageKind::LoadLibrary;

    fn encode(&self, msg: &mut LoadLibraryMessage, dst: &mut BytesMut) -> Result<()> {
        check_cstr(&msg.library_name)?;
        for entry in &msg.addr2sym {
            check_cstr(&entry.name)?;
        }

        let payload_size = msg.payload_size();
        msg.header.payload_size = payload_size as u64;
        self.header.encode(&msg.header, dst)?;

        dst.reserve(payload_size);
        put_cstr(dst, &msg.library_name);
        for entry in &msg.addr2sym {
            dst.put_u64_le(entry.address);
            put_cstr(dst, &entry.name);
        }
        Ok(())
    }

    fn decode(&self, header: RpcHeader, payload: Bytes) -> Result<LoadLibraryMessage> {
        let size = usize::try_from(header.payload_size).unwrap_or(usize::MAX);
        if size == 0 {
            return Ok(LoadLibraryMessage {
                header,
                ..LoadLibraryMessage::default()
            });
        }
        if payload.len() < size {
            return Err(WireError::truncated(
                "load library payload",
                size,
                payload.len(),
            ));
        }

        let mut body = payload.slice(..size);
        let library_name = take_cstr(&mut body)?;
        let mut addr2sym = Vec::new();
        while body.has_remaining() {
            ensure_remaining(&body, "symbol address", 8)?;
            let address = body.get_u64_le();
            let name = take_cstr(&mut body)?;
            addr2sym.push(Addr2Sym { address, name });
        }

        Ok(LoadLibraryMessage {
            header,
            library_name,
            addr2sym,
        })
    }
}

fn check_cstr(s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(WireError::InteriorNul(s.to_string()));
    }
    Ok(())
}

fn put_cstr(dst: &mut BytesMut, s: &str) {
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
}

fn take_cstr(src: &mut Bytes) -> Result<String> {
    let end = src
        .iter()
        .position(|&b| b == 0)
        .ok_or(WireError::NonTerminatedString)?;
    let s = String::from_utf8(src.split_to(end).to_vec())?;
    src.advance(1);
    Ok(s)
}
