use std::time::Duration;

/// Default session deadline.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(1000);

/// Default upper bound on a declared `payload_size`: 256 MiB.
pub const DEFAULT_MAX_PAYLOAD: u64 = 256 * 1024 * 1024;

/// Per-session limits, shared by every connection a server accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Total lifetime of one connection, fixed at accept time.
    pub timeout: Duration,
    /// Declared payloads above this size end the session before any
    /// allocation.
    pub max_payload: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SESSION_TIMEOUT,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}
