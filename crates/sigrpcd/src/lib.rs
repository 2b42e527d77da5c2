//! Local socket proxy daemon for the sigrpc wire protocol.
//!
//! Clients speak a fixed-layout binary protocol (load-library,
//! invoke-function with streaming continuation, pull-page) over a Unix or
//! TCP socket; the daemon forwards each request to a remote backend.
//!
//! # Crate Structure
//!
//! - [`wire`] — Header, register-file, page and message codecs
//! - [`transport`] — Unix socket and TCP listeners and streams
//! - [`backend`] — Backend interface, remote client and stub server
//! - [`session`] — Per-connection session engine and accept loop

/// Re-export wire types.
pub mod wire {
    pub use sigrpc_wire::*;
}

/// Re-export transport types.
pub mod transport {
    pub use sigrpc_transport::*;
}

/// Re-export backend types.
pub mod backend {
    pub use sigrpc_backend::*;
}

/// Re-export session types.
pub mod session {
    pub use sigrpc_session::*;
}
