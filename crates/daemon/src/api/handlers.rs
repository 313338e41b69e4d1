/// API request handlers

use super::responses::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rpcmesh_common::{EndpointName, MeshError, Registration};
use rpcmesh_core::{NodeStatus, RegisterOutcome, Registry, RegistryError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Shared state for the registry API
#[derive(Clone)]
pub struct RegistryState {
    pub registry: Registry,
}

/// Shared state for the node API
#[derive(Clone)]
pub struct NodeState {
    pub status: Arc<RwLock<NodeStatus>>,
}

/// Handler for GET /api/endpoints
pub async fn list_endpoints(
    State(state): State<RegistryState>,
) -> Result<Json<EndpointListResponse>, AppError> {
    debug!("API: GET /api/endpoints");

    let endpoints: Vec<String> = state
        .registry
        .list_all()
        .await
        .into_iter()
        .map(String::from)
        .collect();
    let total = endpoints.len();

    Ok(Json(EndpointListResponse { endpoints, total }))
}

/// Handler for GET /api/registrations
pub async fn list_registrations(
    State(state): State<RegistryState>,
) -> Result<Json<Vec<Registration>>, AppError> {
    debug!("API: GET /api/registrations");
    Ok(Json(state.registry.entries().await))
}

/// Handler for GET /api/endpoints/*name
pub async fn resolve_endpoint(
    State(state): State<RegistryState>,
    Path(name): Path<String>,
) -> Result<Json<ResolvedEndpointResponse>, AppError> {
    debug!("API: GET /api/endpoints/{}", name);

    let connection = state.registry.resolve(&name).await?;

    Ok(Json(ResolvedEndpointResponse {
        name,
        host: connection.host,
        port: connection.port,
    }))
}

/// Handler for POST /api/endpoints
pub async fn register_endpoint(
    State(state): State<RegistryState>,
    Json(request): Json<EndpointRegistrationRequest>,
) -> Result<Json<EndpointRegistrationResponse>, AppError> {
    debug!("API: POST /api/endpoints ({})", request.endpoint_name);

    let name = EndpointName::parse(request.endpoint_name).map_err(RegistryError::from)?;
    let outcome = state
        .registry
        .register(name.clone(), request.connection)
        .await?;

    let (outcome, previous) = match outcome {
        RegisterOutcome::Inserted => ("inserted", None),
        RegisterOutcome::Replaced { previous } => ("replaced", Some(previous)),
        RegisterOutcome::Unchanged => ("unchanged", None),
    };

    Ok(Json(EndpointRegistrationResponse {
        endpoint_name: name.to_string(),
        outcome: outcome.to_string(),
        previous,
    }))
}

/// Handler for GET /api/node/status
pub async fn get_node_status(
    State(state): State<NodeState>,
) -> Result<Json<NodeStatusResponse>, AppError> {
    debug!("API: GET /api/node/status");

    let status = state.status.read().await;

    Ok(Json(NodeStatusResponse {
        name: status.name.clone(),
        advertised: status.advertised.clone(),
        endpoints: status.endpoints.iter().map(ToString::to_string).collect(),
        registration: NodeStatusResponse::registration_value(&status.registration),
        uptime_seconds: status.started_at.elapsed().as_secs(),
    }))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    debug!("API: GET /health");
    (StatusCode::OK, "OK")
}

/// Application error type
#[derive(Debug)]
pub struct AppError {
    message: String,
    status_code: StatusCode,
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::NOT_FOUND,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            error!("API Error: {}", self.message);
        } else {
            debug!("API Error: {}", self.message);
        }

        let body = Json(ErrorResponse::new(self.message, self.status_code.as_u16()));

        (self.status_code, body).into_response()
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(name) => {
                AppError::not_found(format!("No registration for endpoint {name}"))
            }
            RegistryError::Invalid(e) => AppError::bad_request(e.to_string()),
        }
    }
}

impl From<MeshError> for AppError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::NotFound(name) => AppError::not_found(name),
            MeshError::MalformedInput(msg) => AppError::bad_request(msg),
            other => AppError::internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}
