use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sigrpc_transport::{connect, Endpoint, IpcStream};
use sigrpc_wire::{InvokeFunctionMessage, LoadLibraryMessage, PullPageMessage};
use tokio_util::codec::Framed;
use tracing::debug;

use crate::codec::{BackendCodec, BackendFrame, DEFAULT_MAX_PAYLOAD};
use crate::error::{BackendError, Result};
use crate::kind::{
    kind_name, ERROR, INVOKE_CONTINUE, INVOKE_FINAL, INVOKE_FUNCTION, LOAD_LIBRARY, PULL_PAGE,
};
use crate::traits::{Backend, InvokeReply, InvokeStream};

type Link = Framed<IpcStream, BackendCodec>;

/// Configuration for [`RemoteBackend`].
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Maximum frame payload accepted from or sent to the backend.
    pub max_payload_size: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Backend reached over the framed JSON link.
///
/// Unary calls use a fresh link each; an invoke stream keeps one link for
/// all of its rounds.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    endpoint: Endpoint,
    config: RemoteConfig,
}

impl RemoteBackend {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_config(endpoint, RemoteConfig::default())
    }

    pub fn with_config(endpoint: Endpoint, config: RemoteConfig) -> Self {
        Self { endpoint, config }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn link(&self) -> Result<Link> {
        let stream = connect(&self.endpoint).await?;
        Ok(Framed::new(
            stream,
            BackendCodec::new(self.config.max_payload_size),
        ))
    }

    async fn unary<Req, Resp>(&self, kind: u16, req: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let mut link = self.link().await?;
        let reply = exchange(&mut link, BackendFrame::json(kind, req)?).await?;
        check_reply(kind, &reply, &[kind])?;
        reply.parse()
    }
}

impl Backend for RemoteBackend {
    type Invoke = RemoteInvoke;

    async fn load_library(&self, req: LoadLibraryMessage) -> Result<LoadLibraryMessage> {
        self.unary(LOAD_LIBRARY, &req).await
    }

    async fn pull_page(&self, req: PullPageMessage) -> Result<PullPageMessage> {
        self.unary(PULL_PAGE, &req).await
    }

    async fn open_invoke(&self) -> Result<RemoteInvoke> {
        Ok(RemoteInvoke {
            link: self.link().await?,
        })
    }
}

/// An invoke stream over one backend link.
pub struct RemoteInvoke {
    link: Link,
}

impl InvokeStream for RemoteInvoke {
    async fn round(&mut self, req: InvokeFunctionMessage) -> Result<InvokeReply> {
        let reply = exchange(&mut self.link, BackendFrame::json(INVOKE_FUNCTION, &req)?).await?;
        check_reply(INVOKE_FUNCTION, &reply, &[INVOKE_CONTINUE, INVOKE_FINAL])?;
        let msg = reply.parse()?;
        Ok(if reply.kind == INVOKE_CONTINUE {
            InvokeReply::Continue(msg)
        } else {
            InvokeReply::Final(msg)
        })
    }
}

async fn exchange(link: &mut Link, frame: BackendFrame) -> Result<BackendFrame> {
    let sent = frame.kind;
    link.send(frame).await?;
    let reply = link.next().await.ok_or(BackendError::Disconnected)??;
    debug!(
        sent = kind_name(sent),
        reply = kind_name(reply.kind),
        size = reply.payload.len(),
        "backend reply"
    );
    Ok(reply)
}

fn check_reply(sent: u16, reply: &BackendFrame, accepted: &[u16]) -> Result<()> {
    if reply.kind == ERROR {
        return Err(BackendError::Remote(reply.error_message()));
    }
    if !accepted.contains(&reply.kind) {
        return Err(BackendError::UnexpectedFrame {
            sent: kind_name(sent),
            got: kind_name(reply.kind),
        });
    }
    Ok(())
}
