//! Backend link frame kinds.
//!
//! Requests use the three call kinds. Unary responses reuse the request kind;
//! invoke rounds are answered with `INVOKE_CONTINUE` or `INVOKE_FINAL`.

/// Load a library into the remote execution context.
pub const LOAD_LIBRARY: u16 = 1;

/// One round of a function invocation.
pub const INVOKE_FUNCTION: u16 = 2;

/// Fetch the current content of pages.
pub const PULL_PAGE: u16 = 3;

/// Invoke response; the backend expects another round.
pub const INVOKE_CONTINUE: u16 = 4;

/// Invoke response; the invocation is complete.
pub const INVOKE_FINAL: u16 = 5;

/// Error notification, payload `{"error": "..."}`.
pub const ERROR: u16 = 15;

/// Returns a human-readable name for a frame kind.
pub fn kind_name(kind: u16) -> &'static str {
    match kind {
        LOAD_LIBRARY => "LOAD_LIBRARY",
        INVOKE_FUNCTION => "INVOKE_FUNCTION",
        PULL_PAGE => "PULL_PAGE",
        INVOKE_CONTINUE => "INVOKE_CONTINUE",
        INVOKE_FINAL => "INVOKE_FINAL",
        ERROR => "ERROR",
        _ => "UNKNOWN",
    }
}
