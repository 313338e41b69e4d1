/// Endpoint directory held by the registry
///
/// Maps endpoint names to the node that serves them. Entries live for the
/// lifetime of the registry process: there is no expiry, and a node that
/// disappears stays listed until another node overwrites its entries.
use rpcmesh_common::{Connection, DomainError, EndpointName, MeshError, Registration};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Directory {
    bindings: HashMap<EndpointName, Connection>,

    /// Names in first-registration order; re-registering keeps the position
    order: Vec<EndpointName>,
}

/// What a registration did to the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Inserted,
    Replaced { previous: Connection },
    Unchanged,
}

/// Registry errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No registration for endpoint {0}")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] DomainError),
}

impl From<RegistryError> for MeshError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(name) => MeshError::NotFound(name),
            RegistryError::Invalid(e) => MeshError::MalformedInput(e.to_string()),
        }
    }
}

/// Shared, cloneable handle to the directory
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Directory>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `connection`. The last registration for a name wins.
    pub async fn register(
        &self,
        name: EndpointName,
        connection: Connection,
    ) -> Result<RegisterOutcome, RegistryError> {
        connection.validate()?;

        let mut directory = self.inner.write().await;
        let outcome = match directory.bindings.get(&name) {
            Some(existing) if *existing == connection => RegisterOutcome::Unchanged,
            Some(existing) => RegisterOutcome::Replaced {
                previous: existing.clone(),
            },
            None => RegisterOutcome::Inserted,
        };

        match &outcome {
            RegisterOutcome::Inserted => {
                directory.order.push(name.clone());
                directory.bindings.insert(name.clone(), connection.clone());
                info!("Registered {} at {}", name, connection);
            }
            RegisterOutcome::Replaced { previous } => {
                directory.bindings.insert(name.clone(), connection.clone());
                info!("Re-registered {} at {} (was {})", name, connection, previous);
            }
            RegisterOutcome::Unchanged => {
                debug!("{} already registered at {}", name, connection);
            }
        }

        Ok(outcome)
    }

    /// Every registered name, each exactly once
    pub async fn list_all(&self) -> Vec<EndpointName> {
        self.inner.read().await.order.clone()
    }

    /// Look up the node serving `name`
    ///
    /// A name that cannot be parsed can never have been registered, so it is
    /// reported as not found. Only an empty name is rejected as malformed.
    pub async fn resolve(&self, name: &str) -> Result<Connection, RegistryError> {
        if name.is_empty() {
            return Err(DomainError::EmptyEndpointName.into());
        }

        let Ok(key) = EndpointName::parse(name) else {
            return Err(RegistryError::NotFound(name.to_string()));
        };

        self.inner
            .read()
            .await
            .bindings
            .get(&key)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Snapshot of every binding, in registration order
    pub async fn entries(&self) -> Vec<Registration> {
        let directory = self.inner.read().await;
        directory
            .order
            .iter()
            .filter_map(|name| {
                directory.bindings.get(name).map(|connection| Registration {
                    endpoint_name: name.clone(),
                    connection: connection.clone(),
                })
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.bindings.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> EndpointName {
        EndpointName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_register_list_resolve() {
        let registry = Registry::new();
        let outcome = registry
            .register(name("svcA/methodX"), Connection::new("host1", 9001))
            .await
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::Inserted);

        assert_eq!(registry.list_all().await, vec![name("svcA/methodX")]);
        assert_eq!(
            registry.resolve("svcA/methodX").await.unwrap(),
            Connection::new("host1", 9001)
        );
        assert_eq!(
            registry.resolve("svcA/methodY").await,
            Err(RegistryError::NotFound("svcA/methodY".to_string()))
        );
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let registry = Registry::new();
        registry
            .register(name("svc/m"), Connection::new("a", 1))
            .await
            .unwrap();
        let outcome = registry
            .register(name("svc/m"), Connection::new("b", 2))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RegisterOutcome::Replaced {
                previous: Connection::new("a", 1)
            }
        );
        assert_eq!(registry.resolve("svc/m").await.unwrap(), Connection::new("b", 2));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_identical_registration_is_idempotent() {
        let registry = Registry::new();
        for _ in 0..2 {
            registry
                .register(name("svc/m"), Connection::new("a", 1))
                .await
                .unwrap();
        }
        registry
            .register(name("svc/n"), Connection::new("a", 1))
            .await
            .unwrap();
        let outcome = registry
            .register(name("svc/m"), Connection::new("a", 1))
            .await
            .unwrap();

        assert_eq!(outcome, RegisterOutcome::Unchanged);
        assert_eq!(registry.list_all().await, vec![name("svc/m"), name("svc/n")]);
    }

    #[tokio::test]
    async fn test_invalid_connection_rejected() {
        let registry = Registry::new();
        let err = registry
            .register(name("svc/m"), Connection::new("host", 0))
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::Invalid(DomainError::ZeroPort));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_resolve_malformed_names() {
        let registry = Registry::new();
        assert_eq!(
            registry.resolve("").await,
            Err(RegistryError::Invalid(DomainError::EmptyEndpointName))
        );
        assert_eq!(
            registry.resolve("no-method").await,
            Err(RegistryError::NotFound("no-method".to_string()))
        );

        let err: MeshError = RegistryError::NotFound("x/y".to_string()).into();
        assert!(matches!(err, MeshError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_registration() {
        let registry = Registry::new();
        let mut handles = Vec::new();

        for i in 0..32u16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let endpoint = name(&format!("svc{}/m", i % 8));
                registry
                    .register(endpoint, Connection::new("node", 9000 + i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let names = registry.list_all().await;
        assert_eq!(names.len(), 8);
        assert_eq!(registry.entries().await.len(), 8);
        for endpoint in names {
            let connection = registry.resolve(endpoint.as_str()).await.unwrap();
            assert_eq!(connection.host, "node");
        }
    }
}
