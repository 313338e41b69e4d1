use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub mod config;
pub mod error;
pub mod types;

pub use config::{ClientConfig, ConfigError, NodeConfig, RegistryConfig};
pub use error::MeshError;
pub use types::{Registration, Timestamp};

/// Separator between the service part and the method part of an endpoint name.
pub const METHOD_SEPARATOR: char = '/';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("endpoint name is empty")]
    EmptyEndpointName,
    #[error("malformed endpoint name {0:?}: expected <service>/<method>")]
    MalformedEndpointName(String),
    #[error("connection host is empty")]
    EmptyHost,
    #[error("connection port must be non-zero")]
    ZeroPort,
    #[error("malformed connection {0:?}: expected host:port")]
    MalformedConnection(String),
}

/// Fully-qualified name of one remote-callable operation, `<package>.<Service>/<Method>`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointName(String);

impl EndpointName {
    pub fn parse(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::EmptyEndpointName);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(DomainError::MalformedEndpointName(name));
        }

        let mut parts = name.split(METHOD_SEPARATOR);
        let service = parts.next().unwrap_or_default();
        let method = parts.next().unwrap_or_default();
        if service.is_empty() || method.is_empty() || parts.next().is_some() {
            return Err(DomainError::MalformedEndpointName(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<package>.<Service>` half of the name.
    pub fn service(&self) -> &str {
        self.split().0
    }

    /// The `<Method>` half of the name.
    pub fn method(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        // Validated in `parse`, the separator is always present exactly once.
        self.0
            .split_once(METHOD_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Debug for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EndpointName({})", self.0)
    }
}

impl fmt::Display for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EndpointName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EndpointName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EndpointName> for String {
    fn from(value: EndpointName) -> Self {
        value.0
    }
}

/// A reachable node address. Equality is by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub host: String,
    pub port: u16,
}

impl Connection {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Checks the connection is well formed. Reachability is never checked.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.host.trim().is_empty() {
            return Err(DomainError::EmptyHost);
        }
        if self.port == 0 {
            return Err(DomainError::ZeroPort);
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Connection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| DomainError::MalformedConnection(s.to_string()))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| DomainError::MalformedConnection(s.to_string()))?;

        let connection = Self::new(host, port);
        connection.validate()?;
        Ok(connection)
    }
}
