/// API Server implementation

use super::handlers::*;
use anyhow::Result;
use axum::{
    routing::get,
    Router,
};
use rpcmesh_core::{NodeStatus, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tower_http::cors::CorsLayer;
use tracing::info;

/// Router exposing the registry directory
pub fn registry_router(registry: Registry) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Directory endpoints
        .route("/api/endpoints", get(list_endpoints).post(register_endpoint))
        .route("/api/endpoints/*name", get(resolve_endpoint))
        .route("/api/registrations", get(list_registrations))
        .layer(CorsLayer::permissive())
        .with_state(RegistryState { registry })
}

/// Router exposing a node's status
pub fn node_router(status: Arc<RwLock<NodeStatus>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/node/status", get(get_node_status))
        .layer(CorsLayer::permissive())
        .with_state(NodeState { status })
}

/// HTTP status server running next to a node or the registry
pub struct ApiServer {
    listen_addr: SocketAddr,
    router: Router,
}

impl ApiServer {
    pub fn new(listen_addr: SocketAddr, router: Router) -> Self {
        Self {
            listen_addr,
            router,
        }
    }

    /// Serve until `shutdown` flips to true
    pub async fn start(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("API server starting on {}", self.listen_addr);

        let listener = tokio::net::TcpListener::bind(self.listen_addr).await?;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await
            .map_err(|e| anyhow::anyhow!("API server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::responses::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use rpcmesh_common::{Connection, EndpointName, Registration, Timestamp};
    use rpcmesh_core::RegistrationState;
    use tower::util::ServiceExt; // for `oneshot`

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_registration(name: &str, host: &str, port: u16) -> Request<Body> {
        let body = EndpointRegistrationRequest {
            endpoint_name: name.to_string(),
            connection: Connection::new(host, port),
        };
        Request::builder()
            .method("POST")
            .uri("/api/endpoints")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = registry_router(Registry::new());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_list_resolve() {
        let registry = Registry::new();

        let response = registry_router(registry.clone())
            .oneshot(post_registration("svcA/methodX", "host1", 9001))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let registered: EndpointRegistrationResponse = body_json(response).await;
        assert_eq!(registered.outcome, "inserted");

        let request = Request::builder()
            .uri("/api/endpoints")
            .body(Body::empty())
            .unwrap();
        let response = registry_router(registry.clone()).oneshot(request).await.unwrap();
        let list: EndpointListResponse = body_json(response).await;
        assert_eq!(list.endpoints, vec!["svcA/methodX"]);
        assert_eq!(list.total, 1);

        let request = Request::builder()
            .uri("/api/endpoints/svcA/methodX")
            .body(Body::empty())
            .unwrap();
        let response = registry_router(registry.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resolved: ResolvedEndpointResponse = body_json(response).await;
        assert_eq!(resolved.host, "host1");
        assert_eq!(resolved.port, 9001);

        let request = Request::builder()
            .uri("/api/registrations")
            .body(Body::empty())
            .unwrap();
        let response = registry_router(registry.clone()).oneshot(request).await.unwrap();
        let registrations: Vec<Registration> = body_json(response).await;
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].connection, Connection::new("host1", 9001));

        let request = Request::builder()
            .uri("/api/endpoints/svcA/methodY")
            .body(Body::empty())
            .unwrap();
        let response = registry_router(registry).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_rejects_malformed() {
        let registry = Registry::new();
        let response = registry_router(registry.clone())
            .oneshot(post_registration("no-method", "host1", 9001))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = registry_router(registry.clone())
            .oneshot(post_registration("svc/m", "host1", 0))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_node_status() {
        let status = Arc::new(RwLock::new(NodeStatus {
            name: "alpha".to_string(),
            advertised: Connection::new("localhost", 8000),
            endpoints: vec![EndpointName::parse("services.Echo/parrot").unwrap()],
            registration: RegistrationState::Registered { endpoints: 1 },
            started_at: Timestamp::now(),
        }));

        let request = Request::builder()
            .uri("/api/node/status")
            .body(Body::empty())
            .unwrap();
        let response = node_router(status).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: NodeStatusResponse = body_json(response).await;
        assert_eq!(body.name, "alpha");
        assert_eq!(body.endpoints, vec!["services.Echo/parrot"]);
        assert_eq!(body.registration["state"], "registered");
    }
}
