use std::fmt;
use std::str::FromStr;

use crate::error::TransportError;

/// Transport family of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Unix,
    Tcp,
}

impl FromStr for Network {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unix" => Ok(Self::Unix),
            "tcp" => Ok(Self::Tcp),
            _ => Err(TransportError::InvalidEndpoint(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unix => "unix",
            Self::Tcp => "tcp",
        })
    }
}

/// A listen or connect address: a socket path for `unix`, `host:port` for `tcp`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub network: Network,
    pub address: String,
}

impl Endpoint {
    pub fn new(network: Network, address: impl Into<String>) -> Self {
        Self {
            network,
            address: address.into(),
        }
    }

    pub fn unix(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(Network::Unix, path.as_ref().to_string_lossy())
    }

    pub fn tcp(address: impl Into<String>) -> Self {
        Self::new(Network::Tcp, address)
    }
}

/// Parses `unix:<path>` or `tcp:<host:port>`.
impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (network, address) = s
            .split_once(':')
            .ok_or_else(|| TransportError::InvalidEndpoint(s.to_string()))?;
        if address.is_empty() {
            return Err(TransportError::InvalidEndpoint(s.to_string()));
        }
        let network = network
            .parse()
            .map_err(|_| TransportError::InvalidEndpoint(s.to_string()))?;
        Ok(Self::new(network, address))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network, self.address)
    }
}
