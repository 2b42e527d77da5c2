//! Session engine: one client connection, one request/response cycle at a
//! time.
//!
//! Each cycle reads a header and exactly `payload_size` body bytes, hands the
//! decoded request to the backend and writes the encoded reply. The session
//! ends after the first non-streaming reply, on any error, or when the
//! connection deadline passes. While an invocation is streaming only further
//! invoke rounds are accepted, and they all travel over the invoke stream
//! opened by the first round.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use sigrpc_backend::{Backend, InvokeStream};
use sigrpc_wire::{MessageBodyCodec, MessageCodec, MessageKind, RpcHeader};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{self, Instant};
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

pub struct Session<S, B: Backend> {
    stream: S,
    codec: Arc<MessageCodec>,
    backend: Arc<B>,
    config: SessionConfig,
    deadline: Instant,
    invoke: Option<B::Invoke>,
}

impl<S, B> Session<S, B>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    B: Backend,
{
    /// Start a session on an accepted connection. The deadline runs from here.
    pub fn new(stream: S, codec: Arc<MessageCodec>, backend: Arc<B>, config: &SessionConfig) -> Self {
        Self {
            stream,
            codec,
            backend,
            config: config.clone(),
            deadline: Instant::now() + config.timeout,
            invoke: None,
        }
    }

    /// Whether an invocation is waiting for its next round.
    pub fn is_streaming(&self) -> bool {
        self.invoke.is_some()
    }

    /// Drive the connection to completion.
    ///
    /// Returns the number of completed cycles. A client that closes the
    /// connection between messages ends the session without error.
    pub async fn run(mut self) -> Result<usize> {
        let limit = self.config.timeout;
        match time::timeout_at(self.deadline, self.cycles()).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout(limit)),
        }
    }

    async fn cycles(&mut self) -> Result<usize> {
        let mut completed = 0;
        loop {
            let Some(header) = self.codec.header.read(&mut self.stream).await? else {
                if self.is_streaming() {
                    debug!(rounds = completed, "client closed during invocation");
                }
                return Ok(completed);
            };
            let payload = self.read_payload(&header).await?;
            let reply = self.dispatch(header, payload).await?;

            self.stream.write_all(&reply).await?;
            self.stream.flush().await?;
            completed += 1;

            if !self.is_streaming() {
                return Ok(completed);
            }
        }
    }

    async fn read_payload(&mut self, header: &RpcHeader) -> Result<Bytes> {
        let size = header.payload_size;
        if size > self.config.max_payload {
            return Err(SessionError::PayloadTooLarge {
                size,
                max: self.config.max_payload,
            });
        }
        let len = usize::try_from(size).map_err(|_| SessionError::PayloadTooLarge {
            size,
            max: self.config.max_payload,
        })?;

        let mut buf = BytesMut::zeroed(len);
        self.stream.read_exact(&mut buf).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                SessionError::ConnectionClosed
            } else {
                SessionError::Io(err)
            }
        })?;
        Ok(buf.freeze())
    }

    async fn dispatch(&mut self, header: RpcHeader, payload: Bytes) -> Result<Bytes> {
        let kind = header
            .kind()
            .ok_or(SessionError::UnsupportedMessage(header.msg_type))?;
        if self.is_streaming() && !kind.allowed_while_streaming() {
            return Err(SessionError::StreamingMisuse(kind));
        }
        debug!(
            %kind,
            client_id = %header.client_id,
            size = header.payload_size,
            streaming = self.is_streaming(),
            "dispatch"
        );

        let mut out = BytesMut::new();
        match kind {
            MessageKind::LoadLibrary => {
                let codec = &self.codec.load_library;
                let req = codec.decode(header, payload)?;
                let mut resp = self.backend.load_library(req).await?;
                codec.encode(&mut resp, &mut out)?;
            }
            MessageKind::PullPage => {
                let codec = &self.codec.pull_page;
                let req = codec.decode(header, payload)?;
                let mut resp = self.backend.pull_page(req).await?;
                codec.encode(&mut resp, &mut out)?;
            }
            MessageKind::InvokeFunction => {
                let codec = &self.codec.invoke_function;
                let req = codec.decode(header, payload)?;
                let mut stream = match self.invoke.take() {
                    Some(stream) => stream,
                    None => self.backend.open_invoke().await?,
                };
                let reply = stream.round(req).await?;
                if reply.is_streaming() {
                    self.invoke = Some(stream);
                }
                let mut resp = reply.into_message();
                codec.encode(&mut resp, &mut out)?;
            }
        }
        Ok(out.freeze())
    }
}
