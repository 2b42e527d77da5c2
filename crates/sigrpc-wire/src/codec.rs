use std::sync::Arc;

use crate::cpu::ProcessorStateCodec;
use crate::header::HeaderCodec;
use crate::invoke_func::InvokeFunctionCodec;
use crate::load_lib::LoadLibraryCodec;
use crate::page::PageCodec;
use crate::pull_page::PullPageCodec;
use crate::ucontext::UserContextCodec;

/// The full codec set for one daemon instance.
///
/// Every component is immutable after construction, so one `MessageCodec`
/// (typically behind an `Arc`) serves all concurrent sessions.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    pub header: Arc<HeaderCodec>,
    pub load_library: LoadLibraryCodec,
    pub invoke_function: InvokeFunctionCodec,
    pub pull_page: PullPageCodec,
}

impl MessageCodec {
    /// Build the codec set around the instance identity used for client ids.
    pub fn new(identity: impl Into<String>) -> Self {
        let header = Arc::new(HeaderCodec::new(identity));
        let page = PageCodec;
        let context = UserContextCodec::new(ProcessorStateCodec);

        Self {
            load_library: LoadLibraryCodec::new(Arc::clone(&header)),
            invoke_function: InvokeFunctionCodec::new(Arc::clone(&header), context, page),
            pull_page: PullPageCodec::new(Arc::clone(&header), page),
            header,
        }
    }

    pub fn identity(&self) -> &str {
        self.header.identity()
    }
}
