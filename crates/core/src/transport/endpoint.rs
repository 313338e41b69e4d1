use std::net::SocketAddr;
use tokio::net::TcpListener;

/// TCP listener accepting inbound channels
pub struct Listener {
    inner: TcpListener,

    /// Local address
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind a new listener
    pub async fn bind(config: ListenerConfig) -> Result<Self, ListenerError> {
        let inner = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|e| ListenerError::BindFailed(format!("{}: {}", config.bind_addr, e)))?;

        let local_addr = inner.local_addr()?;

        Ok(Self { inner, local_addr })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<super::Channel, ListenerError> {
        let (stream, peer) = self
            .inner
            .accept()
            .await
            .map_err(|e| ListenerError::AcceptFailed(e.to_string()))?;

        Ok(super::Channel::from_stream(stream, peer))
    }

    /// Get local address
    /// If bound to 0.0.0.0, returns 127.0.0.1 instead for local connections
    pub fn local_addr(&self) -> SocketAddr {
        let mut addr = self.local_addr;
        if addr.ip().is_unspecified() {
            addr.set_ip(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));
        }
        addr
    }
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
        }
    }
}

impl ListenerConfig {
    /// Create configuration with specific bind address
    pub fn with_bind_addr(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }

    /// Resolve `host:port` into a bind address
    pub async fn resolve(host: &str, port: u16) -> Result<Self, ListenerError> {
        let bind_addr = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| ListenerError::BindFailed(format!("{host}:{port}: {e}")))?
            .next()
            .ok_or_else(|| ListenerError::BindFailed(format!("{host}:{port}: no address")))?;

        Ok(Self { bind_addr })
    }
}

/// Listener errors
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Failed to bind: {0}")]
    BindFailed(String),

    #[error("Failed to accept connection: {0}")]
    AcceptFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_creation() {
        let listener = Listener::bind(ListenerConfig::default()).await.unwrap();
        let addr = listener.local_addr();

        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let config = ListenerConfig::resolve("127.0.0.1", 0).await.unwrap();
        assert!(config.bind_addr.ip().is_loopback());
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let first = Listener::bind(ListenerConfig::with_bind_addr("127.0.0.1:0".parse().unwrap()))
            .await
            .unwrap();
        let taken = ListenerConfig::with_bind_addr(first.local_addr());

        let err = Listener::bind(taken).await.err().unwrap();
        assert!(matches!(err, ListenerError::BindFailed(_)));
    }
}
