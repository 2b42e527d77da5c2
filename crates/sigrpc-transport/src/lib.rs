//! Local stream transport for the sigrpc daemon.
//!
//! Provides a unified async stream over:
//! - Unix domain sockets (stale-socket cleanup, permission mode, cleanup on drop)
//! - TCP
//!
//! Everything above this crate reads and writes an [`IpcStream`].

pub mod endpoint;
pub mod error;
pub mod listener;
pub mod stream;

#[cfg(unix)]
pub mod uds;

pub use endpoint::{Endpoint, Network};
pub use error::{Result, TransportError};
pub use listener::Listener;
pub use stream::{connect, IpcStream};

#[cfg(unix)]
pub use uds::UnixSocketListener;
