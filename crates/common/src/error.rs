use thiserror::Error;

use crate::DomainError;

/// Call and transport failures shared by the registry, nodes and clients
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("No registration for endpoint {0}")]
    NotFound(String),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Transport unavailable ({address}): {reason}")]
    TransportUnavailable { address: String, reason: String },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Remote failure: {0}")]
    Remote(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for mesh operations
pub type Result<T> = std::result::Result<T, MeshError>;

impl MeshError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn unknown_endpoint(name: impl Into<String>) -> Self {
        Self::UnknownEndpoint(name.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn unavailable(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::TransportUnavailable {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True when the peer could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::TransportUnavailable { .. } | Self::Timeout(_) | Self::Io(_)
        )
    }
}
