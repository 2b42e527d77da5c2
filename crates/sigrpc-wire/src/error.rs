/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Input ended while a fixed-size field was expected.
    #[error("truncated {what}: needed {needed} bytes, {available} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// A string field has no null terminator inside the payload.
    #[error("non null terminated string")]
    NonTerminatedString,

    /// A string field is not valid UTF-8.
    #[error("string field is not valid utf-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A string to encode contains a null byte before its end.
    #[error("string field contains an interior null byte: {0:?}")]
    InteriorNul(String),

    /// The client id does not end in `-<hex pid>`.
    #[error("invalid client id {0:?} (expected <instance>-<hex pid>)")]
    InvalidClientId(String),

    /// An I/O error occurred while reading from the connection.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireError {
    pub(crate) fn truncated(what: &'static str, needed: usize, available: usize) -> Self {
        Self::Truncated {
            what,
            needed,
            available,
        }
    }
}

pub type Result<T> = std::result::Result<T, WireError>;

/// Fail with [`WireError::Truncated`] unless `src` holds at least `needed` bytes.
pub(crate) fn ensure_remaining(
    src: &impl bytes::Buf,
    what: &'static str,
    needed: usize,
) -> Result<()> {
    if src.remaining() < needed {
        return Err(WireError::truncated(what, needed, src.remaining()));
    }
    Ok(())
}
