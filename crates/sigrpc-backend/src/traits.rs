use std::future::Future;

use sigrpc_wire::{InvokeFunctionMessage, LoadLibraryMessage, PullPageMessage};

use crate::error::Result;

/// Answer to one invoke round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeReply {
    /// The backend expects another round on the same stream.
    Continue(InvokeFunctionMessage),
    /// The invocation is complete.
    Final(InvokeFunctionMessage),
}

impl InvokeReply {
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    pub fn into_message(self) -> InvokeFunctionMessage {
        match self {
            Self::Continue(msg) | Self::Final(msg) => msg,
        }
    }
}

/// Remote compute backend.
///
/// One handle is shared by every session; each call is an independent
/// logical request against it.
pub trait Backend: Send + Sync + 'static {
    type Invoke: InvokeStream;

    fn load_library(
        &self,
        req: LoadLibraryMessage,
    ) -> impl Future<Output = Result<LoadLibraryMessage>> + Send;

    fn pull_page(
        &self,
        req: PullPageMessage,
    ) -> impl Future<Output = Result<PullPageMessage>> + Send;

    /// Open a bidirectional invoke stream, owned by one session.
    fn open_invoke(&self) -> impl Future<Output = Result<Self::Invoke>> + Send;
}

/// One function invocation, possibly spanning several rounds.
pub trait InvokeStream: Send + 'static {
    /// Send one request and wait for the matching reply.
    fn round(
        &mut self,
        req: InvokeFunctionMessage,
    ) -> impl Future<Output = Result<InvokeReply>> + Send;
}
