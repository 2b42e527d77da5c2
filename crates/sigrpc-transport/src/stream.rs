use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::endpoint::{Endpoint, Network};
use crate::error::{Result, TransportError};

/// A connected stream, readable and writable regardless of transport.
pub struct IpcStream {
    inner: IpcStreamInner,
}

enum IpcStreamInner {
    #[cfg(unix)]
    Unix(tokio::net::UnixStream),
    Tcp(TcpStream),
}

impl IpcStream {
    #[cfg(unix)]
    pub(crate) fn from_unix(stream: tokio::net::UnixStream) -> Self {
        Self {
            inner: IpcStreamInner::Unix(stream),
        }
    }

    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "failed to set TCP_NODELAY");
        }
        Self {
            inner: IpcStreamInner::Tcp(stream),
        }
    }

    /// Process id of the connected peer, when the transport exposes it.
    pub fn peer_pid(&self) -> Option<u32> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream
                .peer_cred()
                .ok()
                .and_then(|cred| cred.pid())
                .map(|pid| pid as u32),
            IpcStreamInner::Tcp(_) => None,
        }
    }

    /// Network family of this stream.
    pub fn network(&self) -> Network {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(_) => Network::Unix,
            IpcStreamInner::Tcp(_) => Network::Tcp,
        }
    }
}

/// Connect to a listening endpoint.
pub async fn connect(endpoint: &Endpoint) -> Result<IpcStream> {
    let connect_err = |source| TransportError::Connect {
        address: endpoint.to_string(),
        source,
    };
    let stream = match endpoint.network {
        #[cfg(unix)]
        Network::Unix => tokio::net::UnixStream::connect(&endpoint.address)
            .await
            .map(IpcStream::from_unix)
            .map_err(connect_err)?,
        #[cfg(not(unix))]
        Network::Unix => return Err(TransportError::Unsupported(Network::Unix)),
        Network::Tcp => TcpStream::connect(&endpoint.address)
            .await
            .map(IpcStream::from_tcp)
            .map_err(connect_err)?,
    };
    debug!(%endpoint, "connected");
    Ok(stream)
}

impl AsyncRead for IpcStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
            IpcStreamInner::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for IpcStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
            IpcStreamInner::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => Pin::new(stream).poll_flush(cx),
            IpcStreamInner::Tcp(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
            IpcStreamInner::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcStream")
            .field("type", &self.network().to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn tcp_connect_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = IpcStream::from_tcp(stream);
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            stream.write_all(&buf).await.unwrap();
        });

        let mut client = connect(&Endpoint::tcp(addr.to_string())).await.unwrap();
        assert_eq!(client.network(), Network::Tcp);
        assert_eq!(client.peer_pid(), None);
        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        server.await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn connect_refused_reports_endpoint() {
        let err = connect(&Endpoint::unix("/nonexistent/sigrpc-test.sock"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { ref address, .. } if address.contains("nonexistent")));
    }
}
