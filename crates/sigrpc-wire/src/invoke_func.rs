//! Invoke-function message.
//!
//! Payload: `invoke_func_id: u64 LE`, one user context, then pages until the
//! payload is exhausted at a page boundary.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::body::MessageBodyCodec;
use crate::error::{ensure_remaining, Result};
use crate::header::{HeaderCodec, MessageKind, RpcHeader};
use crate::page::{MemoryPage, PageCodec};
use crate::ucontext::{UserContext, UserContextCodec, USER_CONTEXT_SIZE};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeFunctionMessage {
    pub header: RpcHeader,
    pub invoke_func_id: u64,
    pub ctx: UserContext,
    pub pages: Vec<MemoryPage>,
}

#[derive(Debug, Clone)]
pub struct InvokeFunctionCodec {
    header: Arc<HeaderCodec>,
    context: UserContextCodec,
    page: PageCodec,
}

impl InvokeFunctionCodec {
    pub fn new(header: Arc<HeaderCodec>, context: UserContextCodec, page: PageCodec) -> Self {
        Self {
            header,
            context,
            page,
        }
    }
}

impl MessageBodyCodec for InvokeFunctionCodec {
    type Message = InvokeFunctionMessage;
    const KIND: MessageKind = MessageKind::InvokeFunction;

    fn encode(&self, msg: &mut InvokeFunctionMessage, dst: &mut BytesMut) -> Result<()> {
        let pages: usize = msg.pages.iter().map(MemoryPage::wire_size).sum();
        let mut payload = BytesMut::with_capacity(8 + USER_CONTEXT_SIZE + pages);
        payload.put_u64_le(msg.invoke_func_id);
        self.context.encode(&msg.ctx, &mut payload);
        for page in &msg.pages {
            self.page.encode(page, &mut payload);
        }

        msg.header.payload_size = payload.len() as u64;
        self.header.encode(&msg.header, dst)?;
        dst.extend_from_slice(&payload);
        Ok(())
    }

    fn decode(&self, header: RpcHeader, payload: Bytes) -> Result<InvokeFunctionMessage> {
        let mut src = payload;
        ensure_remaining(&src, "invoke function id", 8)?;
        let invoke_func_id = src.get_u64_le();
        let ctx = self.context.decode(&mut src)?;
        let pages = self.page.decode_all(&mut src)?;

        Ok(InvokeFunctionMessage {
            header,
            invoke_func_id,
            ctx,
            pages,
        })
    }
}
