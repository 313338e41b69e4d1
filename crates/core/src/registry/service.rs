use super::Registry;
use crate::protocol::{
    EndpointKind, EndpointListResponse, ErrorCode, RegisterRequest, Request, ResolveResponse,
    Response,
};
use crate::services::{misrouted, BoxFuture, Service};
use rpcmesh_common::{EndpointName, MeshError};

/// Serves the registry endpoints over a [`Registry`]
#[derive(Debug, Clone, Default)]
pub struct RegistryService {
    registry: Registry,
}

impl RegistryService {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    async fn register(&self, request: RegisterRequest) -> Result<Response, MeshError> {
        let name = EndpointName::parse(request.endpoint_name)
            .map_err(|e| MeshError::malformed(e.to_string()))?;
        self.registry.register(name, request.connection).await?;
        Ok(Response::RegisterAck)
    }
}

fn failure(err: MeshError) -> Response {
    let code = match &err {
        MeshError::NotFound(_) => ErrorCode::NotFound,
        MeshError::MalformedInput(_) | MeshError::Domain(_) => ErrorCode::MalformedInput,
        _ => ErrorCode::Internal,
    };
    let message = match err {
        MeshError::NotFound(name) => name,
        other => other.to_string(),
    };
    Response::failure(code, message)
}

impl Service for RegistryService {
    fn name(&self) -> &'static str {
        "services.Registry"
    }

    fn endpoints(&self) -> &'static [EndpointKind] {
        &[
            EndpointKind::RegistryRegister,
            EndpointKind::RegistryListAll,
            EndpointKind::RegistryResolve,
        ]
    }

    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            let result = match request {
                Request::Register(req) => self.register(req).await,
                Request::ListAll => Ok(Response::EndpointList(EndpointListResponse {
                    names: self.registry.list_all().await,
                })),
                Request::Resolve(req) => self
                    .registry
                    .resolve(&req.name)
                    .await
                    .map(|connection| Response::Resolved(ResolveResponse { connection }))
                    .map_err(MeshError::from),
                other => return misrouted(self.name(), &other),
            };
            result.unwrap_or_else(failure)
        })
    }
}
