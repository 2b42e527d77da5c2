use std::future::Future;
use std::sync::Arc;

use sigrpc_backend::Backend;
use sigrpc_transport::{Endpoint, Listener};
use sigrpc_wire::MessageCodec;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::SessionConfig;
use crate::session::Session;

/// Accept loop: one spawned [`Session`] per client connection.
///
/// The codec and backend handle are shared read-only by every session.
pub struct Server<B: Backend> {
    listener: Listener,
    codec: Arc<MessageCodec>,
    backend: Arc<B>,
    config: SessionConfig,
}

impl<B: Backend> Server<B> {
    pub fn new(listener: Listener, codec: MessageCodec, backend: B, config: SessionConfig) -> Self {
        Self {
            listener,
            codec: Arc::new(codec),
            backend: Arc::new(backend),
            config,
        }
    }

    pub fn local_endpoint(&self) -> sigrpc_transport::Result<Endpoint> {
        self.listener.local_endpoint()
    }

    /// Serve until `shutdown` resolves.
    ///
    /// Sessions already running keep their own deadline. Dropping the
    /// listener on return removes a Unix socket file.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        match self.listener.local_endpoint() {
            Ok(endpoint) => info!(%endpoint, identity = self.codec.identity(), "listening"),
            Err(err) => warn!(error = %err, "listening on unknown endpoint"),
        }

        let mut next_id = 0u64;
        loop {
            let stream = tokio::select! {
                _ = &mut shutdown => {
                    info!("shutting down");
                    return;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(stream) => stream,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                },
            };

            next_id += 1;
            let span = info_span!(
                "session",
                id = next_id,
                network = %stream.network(),
                peer_pid = stream.peer_pid(),
            );
            let session = Session::new(
                stream,
                Arc::clone(&self.codec),
                Arc::clone(&self.backend),
                &self.config,
            );
            tokio::spawn(
                async move {
                    debug!("accepted");
                    match session.run().await {
                        Ok(cycles) => debug!(cycles, "closed"),
                        Err(err) => warn!(error = %err, "session failed"),
                    }
                }
                .instrument(span),
            );
        }
    }
}
