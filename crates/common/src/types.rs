use crate::{Connection, DomainError, EndpointName};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Timestamp in Unix epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn elapsed(&self) -> Duration {
        let now = Self::now();
        Duration::from_millis(now.0.saturating_sub(self.0))
    }
}

/// One endpoint bound to the node that offers it.
///
/// Registrations are never mutated; a later registration of the same name
/// supersedes the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub endpoint_name: EndpointName,
    pub connection: Connection,
}

impl Registration {
    pub fn new(endpoint_name: EndpointName, connection: Connection) -> Result<Self, DomainError> {
        connection.validate()?;
        Ok(Self {
            endpoint_name,
            connection,
        })
    }
}
