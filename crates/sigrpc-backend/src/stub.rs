//! Stub backend server.
//!
//! Answers every call locally so the daemon can be exercised without a real
//! compute backend: load-library and pull-page echo the request with status 0,
//! and invoke rounds are answered `INVOKE_CONTINUE` until `invoke_rounds`
//! rounds have been seen on a link, then `INVOKE_FINAL`.

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use sigrpc_transport::{Endpoint, IpcStream, Listener};
use sigrpc_wire::{InvokeFunctionMessage, LoadLibraryMessage, PullPageMessage};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::{BackendCodec, BackendFrame, DEFAULT_MAX_PAYLOAD};
use crate::error::Result;
use crate::kind::{
    kind_name, INVOKE_CONTINUE, INVOKE_FINAL, INVOKE_FUNCTION, LOAD_LIBRARY, PULL_PAGE,
};

#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Rounds per invocation; the last one is answered `INVOKE_FINAL`.
    pub invoke_rounds: u32,
    pub max_payload_size: usize,
    /// Permission mode for a Unix socket listen path.
    pub socket_mode: u32,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            invoke_rounds: 1,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            socket_mode: 0o600,
        }
    }
}

pub struct StubServer {
    listener: Listener,
    config: StubConfig,
}

impl StubServer {
    pub async fn bind(endpoint: &Endpoint, config: StubConfig) -> Result<Self> {
        let listener = Listener::bind(endpoint, config.socket_mode).await?;
        Ok(Self { listener, config })
    }

    pub fn local_endpoint(&self) -> Result<Endpoint> {
        Ok(self.listener.local_endpoint()?)
    }

    /// Accept links until `shutdown` resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        info!(rounds = self.config.invoke_rounds, "stub backend ready");
        loop {
            let stream = tokio::select! {
                _ = &mut shutdown => return Ok(()),
                accepted = self.listener.accept() => accepted?,
            };
            let config = self.config.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_link(stream, &config).await {
                    warn!(error = %err, "stub link failed");
                }
            });
        }
    }
}

async fn handle_link(stream: IpcStream, config: &StubConfig) -> Result<()> {
    let mut link = Framed::new(stream, BackendCodec::new(config.max_payload_size));
    let mut rounds = 0u32;

    while let Some(frame) = link.next().await {
        let frame = frame?;
        debug!(kind = kind_name(frame.kind), size = frame.payload.len(), "stub request");
        let reply = match frame.kind {
            LOAD_LIBRARY => {
                let mut msg: LoadLibraryMessage = frame.parse()?;
                msg.header.status = 0;
                BackendFrame::json(LOAD_LIBRARY, &msg)?
            }
            PULL_PAGE => {
                let mut msg: PullPageMessage = frame.parse()?;
                msg.header.status = 0;
                BackendFrame::json(PULL_PAGE, &msg)?
            }
            INVOKE_FUNCTION => {
                let mut msg: InvokeFunctionMessage = frame.parse()?;
                msg.header.status = 0;
                rounds += 1;
                let kind = if rounds < config.invoke_rounds {
                    INVOKE_CONTINUE
                } else {
                    INVOKE_FINAL
                };
                BackendFrame::json(kind, &msg)?
            }
            other => BackendFrame::error(&format!("unsupported frame kind {other}")),
        };
        link.send(reply).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RemoteBackend;
    use crate::traits::{Backend, InvokeStream};

    async fn start(rounds: u32) -> (Endpoint, tokio::sync::oneshot::Sender<()>) {
        let server = StubServer::bind(
            &Endpoint::tcp("127.0.0.1:0"),
            StubConfig {
                invoke_rounds: rounds,
                ..StubConfig::default()
            },
        )
        .await
        .unwrap();
        let endpoint = server.local_endpoint().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(server.serve(async {
            let _ = rx.await;
        }));
        (endpoint, tx)
    }

    #[tokio::test]
    async fn echoes_unary_calls() {
        let (endpoint, _stop) = start(1).await;
        let backend = RemoteBackend::new(endpoint);

        let mut req = LoadLibraryMessage::default();
        req.header.status = 9;
        req.library_name = "libc.so.6".to_string();
        let resp = backend.load_library(req.clone()).await.unwrap();
        assert_eq!(resp.library_name, "libc.so.6");
        assert_eq!(resp.header.status, 0);

        let resp = backend.pull_page(PullPageMessage::default()).await.unwrap();
        assert!(resp.pages.is_empty());
    }

    #[tokio::test]
    async fn invoke_runs_configured_rounds() {
        let (endpoint, _stop) = start(3).await;
        let backend = RemoteBackend::new(endpoint);
        let mut stream = backend.open_invoke().await.unwrap();

        let msg = InvokeFunctionMessage::default();
        assert!(stream.round(msg.clone()).await.unwrap().is_streaming());
        assert!(stream.round(msg.clone()).await.unwrap().is_streaming());
        assert!(!stream.round(msg.clone()).await.unwrap().is_streaming());
    }

    #[tokio::test]
    async fn unknown_kind_gets_error_frame() {
        let (endpoint, _stop) = start(1).await;
        let stream = sigrpc_transport::connect(&endpoint).await.unwrap();
        let mut link = Framed::new(stream, BackendCodec::default());

        link.send(BackendFrame::new(77, "{}")).await.unwrap();
        let reply = link.next().await.unwrap().unwrap();
        assert_eq!(reply.kind, crate::kind::ERROR);
        assert!(reply.error_message().contains("77"));
    }

    #[tokio::test]
    async fn malformed_json_drops_link() {
        let (endpoint, _stop) = start(1).await;
        let stream = sigrpc_transport::connect(&endpoint).await.unwrap();
        let mut link = Framed::new(stream, BackendCodec::default());

        link.send(BackendFrame::new(PULL_PAGE, "not json")).await.unwrap();
        assert!(link.next().await.is_none_or(|r| r.is_err()));
    }
}
