/// Errors raised by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Could not reach the backend.
    #[error("transport error: {0}")]
    Transport(#[from] sigrpc_transport::TransportError),

    /// The backend link framing is invalid.
    #[error("invalid backend frame magic (expected 0x5342 \"SB\")")]
    InvalidMagic,

    /// A frame exceeded the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred on the backend link.
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with an error frame.
    #[error("backend error: {0}")]
    Remote(String),

    /// The backend answered with a frame of the wrong kind.
    #[error("unexpected {got} frame in reply to {sent}")]
    UnexpectedFrame { sent: &'static str, got: &'static str },

    /// The backend closed the link before replying.
    #[error("backend disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, BackendError>;
