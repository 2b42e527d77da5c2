use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::cpu::{ProcessorState, ProcessorStateCodec, PROCESSOR_STATE_SIZE};
use crate::error::{ensure_remaining, Result};

/// Encoded size of a [`UserContext`].
pub const USER_CONTEXT_SIZE: usize = PROCESSOR_STATE_SIZE + 8;

/// Register snapshot plus the base of the associated call stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub cpu: ProcessorState,
    pub stack_bottom: u64,
}

/// Codec for [`UserContext`], built on the processor state codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserContextCodec {
    cpu: ProcessorStateCodec,
}

impl UserContextCodec {
    pub fn new(cpu: ProcessorStateCodec) -> Self {
        Self { cpu }
    }

    pub fn encode(&self, ctx: &UserContext, dst: &mut impl BufMut) {
        self.cpu.encode(&ctx.cpu, dst);
        dst.put_u64_le(ctx.stack_bottom);
    }

    pub fn decode(&self, src: &mut impl Buf) -> Result<UserContext> {
        let cpu = self.cpu.decode(src)?;
        ensure_remaining(src, "stack bottom", 8)?;
        let stack_bottom = src.get_u64_le();
        Ok(UserContext { cpu, stack_bottom })
    }
}
