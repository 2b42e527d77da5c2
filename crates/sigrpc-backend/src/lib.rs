//! Backend interface for the sigrpc daemon.
//!
//! - [`Backend`] / [`InvokeStream`] — what a session calls
//! - [`RemoteBackend`] — a backend process reached over a framed JSON link
//! - [`StubServer`] — a local stand-in backend for development and tests
//!
//! Link frames carry a 2-byte magic ("SB"), a 4-byte little-endian payload
//! length and a 2-byte little-endian kind, followed by a JSON body.

pub mod client;
pub mod codec;
pub mod error;
pub mod kind;
pub mod stub;
pub mod traits;

pub use client::{RemoteBackend, RemoteConfig, RemoteInvoke};
pub use codec::{BackendCodec, BackendFrame, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{BackendError, Result};
pub use stub::{StubConfig, StubServer};
pub use traits::{Backend, InvokeReply, InvokeStream};
