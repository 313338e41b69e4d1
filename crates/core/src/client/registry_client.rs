use super::{call, CallOptions};
use crate::protocol::{RegisterRequest, Request, ResolveRequest, Response};
use rpcmesh_common::{Connection, EndpointName, MeshError};

/// Typed access to a remote registry
#[derive(Debug, Clone)]
pub struct RegistryClient {
    registry: Connection,
    options: CallOptions,
}

impl RegistryClient {
    pub fn new(registry: Connection) -> Self {
        Self::with_options(registry, CallOptions::default())
    }

    pub fn with_options(registry: Connection, options: CallOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &Connection {
        &self.registry
    }

    pub async fn register(
        &self,
        name: &EndpointName,
        connection: &Connection,
    ) -> Result<(), MeshError> {
        let request = Request::Register(RegisterRequest {
            endpoint_name: name.to_string(),
            connection: connection.clone(),
        });
        match call(&self.registry, request, &self.options).await? {
            Response::RegisterAck => Ok(()),
            other => Err(unexpected("register", &other)),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<EndpointName>, MeshError> {
        match call(&self.registry, Request::ListAll, &self.options).await? {
            Response::EndpointList(list) => Ok(list.names),
            other => Err(unexpected("getServices", &other)),
        }
    }

    pub async fn resolve(&self, name: &str) -> Result<Connection, MeshError> {
        let request = Request::Resolve(ResolveRequest {
            name: name.to_string(),
        });
        match call(&self.registry, request, &self.options).await? {
            Response::Resolved(resolved) => Ok(resolved.connection),
            other => Err(unexpected("findServer", &other)),
        }
    }
}

pub(crate) fn unexpected(method: &str, response: &Response) -> MeshError {
    MeshError::protocol(format!(
        "unexpected {} reply to {}",
        response.response_type(),
        method
    ))
}
