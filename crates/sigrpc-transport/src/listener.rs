use tokio::net::TcpListener;
use tracing::info;

use crate::endpoint::{Endpoint, Network};
use crate::error::{Result, TransportError};
use crate::stream::IpcStream;
#[cfg(unix)]
use crate::uds::UnixSocketListener;

/// A bound listener for either transport.
#[derive(Debug)]
pub enum Listener {
    #[cfg(unix)]
    Unix(UnixSocketListener),
    Tcp(TcpListener),
}

impl Listener {
    /// Bind `endpoint`. `socket_mode` applies to Unix socket files only.
    pub async fn bind(endpoint: &Endpoint, socket_mode: u32) -> Result<Self> {
        match endpoint.network {
            #[cfg(unix)]
            Network::Unix => {
                UnixSocketListener::bind_with_mode(&endpoint.address, socket_mode).map(Self::Unix)
            }
            #[cfg(not(unix))]
            Network::Unix => {
                let _ = socket_mode;
                Err(TransportError::Unsupported(Network::Unix))
            }
            Network::Tcp => {
                let listener = TcpListener::bind(&endpoint.address).await.map_err(|source| {
                    TransportError::Bind {
                        address: endpoint.address.clone(),
                        source,
                    }
                })?;
                info!(address = %endpoint.address, "listening on tcp");
                Ok(Self::Tcp(listener))
            }
        }
    }

    /// Accept the next connection.
    pub async fn accept(&self) -> Result<IpcStream> {
        match self {
            #[cfg(unix)]
            Self::Unix(listener) => listener.accept().await,
            Self::Tcp(listener) => {
                let (stream, _addr) = listener.accept().await.map_err(TransportError::Accept)?;
                Ok(IpcStream::from_tcp(stream))
            }
        }
    }

    /// The endpoint actually bound (resolves `tcp:…:0` to the assigned port).
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match self {
            #[cfg(unix)]
            Self::Unix(listener) => Ok(Endpoint::unix(listener.path())),
            Self::Tcp(listener) => Ok(Endpoint::tcp(listener.local_addr()?.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::stream::connect;

    #[tokio::test]
    async fn tcp_ephemeral_port_resolves() {
        let listener = Listener::bind(&Endpoint::tcp("127.0.0.1:0"), 0o600)
            .await
            .unwrap();
        let endpoint = listener.local_endpoint().unwrap();
        assert_eq!(endpoint.network, Network::Tcp);
        assert!(!endpoint.address.ends_with(":0"));

        let client = tokio::spawn(async move {
            let mut stream = connect(&endpoint).await.unwrap();
            stream.write_all(b"x").await.unwrap();
        });
        let mut accepted = listener.accept().await.unwrap();
        let mut buf = [0u8; 1];
        accepted.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"x");
        client.await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unix_endpoint_roundtrips() {
        let dir = std::env::temp_dir().join(format!("sigrpc-listener-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let endpoint = Endpoint::unix(dir.join("l.sock"));

        let listener = Listener::bind(&endpoint, 0o600).await.unwrap();
        assert_eq!(listener.local_endpoint().unwrap(), endpoint);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
