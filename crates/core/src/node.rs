/// Node Runtime
///
/// A node binds one listening address, attaches its services, optionally
/// advertises every endpoint to the registry, and serves calls until told
/// to stop.

use crate::client::{CallOptions, RegistryClient};
use crate::network::{MessageDispatcher, Server};
use crate::services::{default_services, Service};
use crate::transport::{Listener, ListenerConfig};
use anyhow::Result;
use rpcmesh_common::{Connection, EndpointName, NodeConfig, Timestamp};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

/// Outcome of the best-effort registry advertisement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RegistrationState {
    Disabled,
    Pending,
    Registered { endpoints: usize },
    Partial { registered: usize, failed: usize },
    Failed { reason: String },
}

/// Live view of a node, shared with the status API
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub advertised: Connection,
    pub endpoints: Vec<EndpointName>,
    pub registration: RegistrationState,
    pub started_at: Timestamp,
}

/// Main node runtime
pub struct Node {
    config: NodeConfig,

    server: Server,

    /// Address handed to the registry
    advertised: Connection,

    status: Arc<RwLock<NodeStatus>>,
}

impl Node {
    /// Bind and attach the default services
    pub async fn bind(config: NodeConfig) -> Result<Self> {
        Self::bind_with(config, default_services()).await
    }

    /// Bind and attach `services` plus the catalog
    pub async fn bind_with(config: NodeConfig, services: Vec<Arc<dyn Service>>) -> Result<Self> {
        let listener_config = ListenerConfig::resolve(&config.listen_addr, config.listen_port).await?;
        let listener = Listener::bind(listener_config).await?;
        let port = listener.local_addr().port();

        let mut dispatcher = MessageDispatcher::new();
        for service in services {
            dispatcher.attach(service)?;
        }
        dispatcher.attach_catalog()?;
        let endpoints = dispatcher.endpoint_names();

        let advertised = Connection::new(config.advertise_host.clone(), port);
        advertised.validate()?;

        let registration = if config.register_with_registry {
            RegistrationState::Pending
        } else {
            RegistrationState::Disabled
        };

        let status = Arc::new(RwLock::new(NodeStatus {
            name: config.name.clone(),
            advertised: advertised.clone(),
            endpoints,
            registration,
            started_at: Timestamp::now(),
        }));

        let server = Server::new(
            listener,
            Arc::new(dispatcher),
            config.max_concurrent_calls,
            config.shutdown_grace(),
        );

        Ok(Self {
            config,
            server,
            advertised,
            status,
        })
    }

    pub fn advertised(&self) -> &Connection {
        &self.advertised
    }

    /// Endpoint names derived from the attached services
    pub fn endpoint_names(&self) -> Vec<EndpointName> {
        self.server.dispatcher().endpoint_names()
    }

    pub fn status(&self) -> Arc<RwLock<NodeStatus>> {
        Arc::clone(&self.status)
    }

    /// Advertise endpoints if enabled, then serve until `shutdown` flips.
    ///
    /// Registration runs in the background; the node serves whether or not
    /// the registry is reachable.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Node {} listening on {} ({} endpoints)",
            self.config.name,
            self.server.local_addr(),
            self.endpoint_names().len()
        );
        for name in self.endpoint_names() {
            info!("  {}", name);
        }

        if self.config.register_with_registry {
            let registry = RegistryClient::with_options(
                self.config.registry_connection(),
                CallOptions::default(),
            );
            tokio::spawn(register_all(
                registry,
                self.endpoint_names(),
                self.advertised.clone(),
                Arc::clone(&self.status),
            ));
        }

        self.server.run(shutdown).await?;
        info!("Node {} stopped", self.config.name);
        Ok(())
    }
}

/// Send one `Register` per endpoint. Failures are logged and counted, never fatal.
async fn register_all(
    registry: RegistryClient,
    endpoints: Vec<EndpointName>,
    advertised: Connection,
    status: Arc<RwLock<NodeStatus>>,
) {
    info!(
        "Registering {} endpoints with registry at {}",
        endpoints.len(),
        registry.registry()
    );

    let mut registered = 0;
    let mut last_error = None;
    for name in &endpoints {
        match registry.register(name, &advertised).await {
            Ok(()) => registered += 1,
            Err(e) => {
                warn!("Failed to register {}: {}", name, e);
                last_error = Some(e.to_string());
            }
        }
    }

    let failed = endpoints.len() - registered;
    let state = match (registered, last_error) {
        (_, None) => RegistrationState::Registered {
            endpoints: registered,
        },
        (0, Some(reason)) => RegistrationState::Failed { reason },
        (_, Some(_)) => RegistrationState::Partial { registered, failed },
    };

    if failed == 0 {
        info!("Registered {} endpoints as {}", registered, advertised);
    } else {
        warn!(
            "Registry advertisement incomplete: {}/{} endpoints registered",
            registered,
            endpoints.len()
        );
    }
    status.write().await.registration = state;
}
