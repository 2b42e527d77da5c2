//! Session engine and accept loop for the sigrpc daemon.
//!
//! A [`Server`] accepts client connections and runs one [`Session`] task per
//! connection. A session reads one request at a time, forwards it to the
//! [`Backend`](sigrpc_backend::Backend) and writes the reply, staying open
//! across the rounds of a streaming invocation.

pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use config::{SessionConfig, DEFAULT_MAX_PAYLOAD, DEFAULT_SESSION_TIMEOUT};
pub use error::{Result, SessionError};
pub use server::Server;
pub use session::Session;
