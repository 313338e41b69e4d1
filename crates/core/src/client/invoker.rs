use super::registry_client::unexpected;
use super::{call, CallOptions, RegistryClient};
use crate::protocol::{EndpointKind, Request, Response};
use rpcmesh_common::{Connection, EndpointName, MeshError};
use tracing::debug;

/// How an endpoint name turns into a node address
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Every endpoint lives on one known node
    Static(Connection),

    /// Ask the registry on every call
    Dynamic(RegistryClient),
}

/// Invokes endpoints by name
#[derive(Debug, Clone)]
pub struct Invoker {
    resolution: Resolution,
    options: CallOptions,
}

impl Invoker {
    pub fn new(resolution: Resolution, options: CallOptions) -> Self {
        Self {
            resolution,
            options,
        }
    }

    pub fn static_node(node: Connection, options: CallOptions) -> Self {
        Self::new(Resolution::Static(node), options)
    }

    pub fn dynamic(registry: Connection, options: CallOptions) -> Self {
        Self::new(
            Resolution::Dynamic(RegistryClient::with_options(registry, options)),
            options,
        )
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.resolution, Resolution::Dynamic(_))
    }

    /// Endpoints reachable through this invoker
    ///
    /// Dynamic mode lists the registry; static mode asks the node's catalog.
    pub async fn list_endpoints(&self) -> Result<Vec<EndpointName>, MeshError> {
        match &self.resolution {
            Resolution::Dynamic(registry) => registry.list_all().await,
            Resolution::Static(node) => {
                match call(node, Request::ListLocal, &self.options).await? {
                    Response::EndpointList(list) => Ok(list.names),
                    other => Err(unexpected("list", &other)),
                }
            }
        }
    }

    /// Where `name` would be called right now
    pub async fn resolve(&self, name: &str) -> Result<Connection, MeshError> {
        match &self.resolution {
            Resolution::Static(node) => Ok(node.clone()),
            Resolution::Dynamic(registry) => registry.resolve(name).await,
        }
    }

    /// Call the endpoint named `name` with `request`
    ///
    /// The name is mapped to a known endpoint kind first; names outside the
    /// catalogue fail with `UnknownEndpoint` before any network traffic.
    pub async fn invoke(&self, name: &str, request: Request) -> Result<Response, MeshError> {
        let kind = EndpointKind::from_name(name).ok_or_else(|| MeshError::unknown_endpoint(name))?;
        if request.endpoint() != kind {
            return Err(MeshError::malformed(format!(
                "{} request sent to {}",
                request.endpoint(),
                kind
            )));
        }

        let target = self.resolve(name).await?;
        debug!("Invoking {} on {}", kind, target);
        call(&target, request, &self.options).await
    }

    /// Call the endpoint a request belongs to
    pub async fn call(&self, request: Request) -> Result<Response, MeshError> {
        let name = request.endpoint().full_name();
        self.invoke(name, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EchoRequest;
    use std::time::Duration;

    fn unreachable() -> Connection {
        Connection::new("127.0.0.1", 1)
    }

    fn options() -> CallOptions {
        CallOptions {
            connect_timeout: Duration::from_secs(1),
            call_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_unknown_endpoint_fails_before_network() {
        let invoker = Invoker::static_node(unreachable(), options());
        let err = invoker
            .invoke("services.Echo/shout", Request::Brew)
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::UnknownEndpoint(name) if name == "services.Echo/shout"));
    }

    #[tokio::test]
    async fn test_mismatched_request_is_malformed() {
        let invoker = Invoker::static_node(unreachable(), options());
        let err = invoker
            .invoke(
                "services.CoffeePot/brew",
                Request::Parrot(EchoRequest {
                    message: "hi".to_string(),
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::MalformedInput(_)));
    }

    #[tokio::test]
    async fn test_static_resolution_is_fixed() {
        let invoker = Invoker::static_node(Connection::new("node", 8000), options());
        assert!(!invoker.is_dynamic());
        assert_eq!(
            invoker.resolve("services.Echo/parrot").await.unwrap(),
            Connection::new("node", 8000)
        );
    }
}
