//! Fixed-layout binary codecs for the sigrpc local wire protocol.
//!
//! Every exchange is a 20-byte [`RpcHeader`] followed by exactly
//! `payload_size` bytes whose layout depends on `msg_type`:
//!
//! - [`LoadLibraryMessage`] — library name and symbol table
//! - [`InvokeFunctionMessage`] — function id, [`UserContext`], pages
//! - [`PullPageMessage`] — pages
//!
//! All integers are little-endian. There is no magic, version or checksum;
//! message boundaries come only from `payload_size`.

pub mod body;
pub mod codec;
pub mod cpu;
pub mod error;
pub mod header;
pub mod invoke_func;
pub mod load_lib;
pub mod page;
pub mod pull_page;
pub mod ucontext;

#[cfg(test)]
mod test_support;

pub use body::MessageBodyCodec;
pub use codec::MessageCodec;
pub use cpu::{
    FpRegs, Greg, ProcessorState, ProcessorStateCodec, StReg, XmmReg, GREG_COUNT,
    PROCESSOR_STATE_SIZE,
};
pub use error::{Result, WireError};
pub use header::{HeaderCodec, MessageKind, RpcHeader, HEADER_SIZE};
pub use invoke_func::{InvokeFunctionCodec, InvokeFunctionMessage};
pub use load_lib::{Addr2Sym, LoadLibraryCodec, LoadLibraryMessage};
pub use page::{MemoryPage, PageCodec, PAGE_HEADER_SIZE};
pub use pull_page::{PullPageCodec, PullPageMessage};
pub use ucontext::{UserContext, UserContextCodec, USER_CONTEXT_SIZE};
