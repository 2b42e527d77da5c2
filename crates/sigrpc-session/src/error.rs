use std::time::Duration;

use sigrpc_wire::MessageKind;

/// Errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Malformed header or payload, or a response that could not be encoded.
    #[error("wire error: {0}")]
    Wire(#[from] sigrpc_wire::WireError),

    /// Reading from or writing to the client connection failed.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] sigrpc_backend::BackendError),

    /// A non-streaming request arrived while an invocation was in progress.
    #[error("{0} is not allowed while an invocation is streaming")]
    StreamingMisuse(MessageKind),

    /// The header carried an unknown `msg_type`.
    #[error("unsupported message type {0}")]
    UnsupportedMessage(u32),

    /// The declared payload exceeds the configured limit.
    #[error("declared payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// The session outlived its deadline.
    #[error("session timed out after {0:?}")]
    Timeout(Duration),

    /// The client closed the connection part-way through a message.
    #[error("connection closed mid-message")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, SessionError>;
