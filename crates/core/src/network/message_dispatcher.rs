/// Message dispatcher for routing requests to the service that owns each endpoint
///
/// Endpoints are attached once at startup; after that the table is read-only
/// and shared by every connection task.
use crate::protocol::messages::{ErrorCode, Message, MessagePayload, Request, Response};
use crate::protocol::EndpointKind;
use crate::services::{CatalogService, Service};
use rpcmesh_common::{EndpointName, MeshError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Message dispatcher
#[derive(Default)]
pub struct MessageDispatcher {
    /// Owning service per endpoint
    routes: HashMap<EndpointKind, Arc<dyn Service>>,

    /// Endpoints in attach order
    order: Vec<EndpointKind>,

    /// Attached services, for shutdown hooks
    services: Vec<Arc<dyn Service>>,
}

impl MessageDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a service under every endpoint it declares
    pub fn attach(&mut self, service: Arc<dyn Service>) -> Result<(), MeshError> {
        for kind in service.endpoints() {
            if let Some(owner) = self.routes.get(kind) {
                return Err(MeshError::internal(format!(
                    "{} is already served by {}",
                    kind,
                    owner.name()
                )));
            }
        }

        for kind in service.endpoints() {
            self.routes.insert(*kind, Arc::clone(&service));
            self.order.push(*kind);
        }
        debug!(
            "Attached {} ({} endpoints)",
            service.name(),
            service.endpoints().len()
        );
        self.services.push(service);
        Ok(())
    }

    /// Attach the catalog service, which lists every attached endpoint including
    /// its own. Call after all other services are attached.
    pub fn attach_catalog(&mut self) -> Result<(), MeshError> {
        let catalog = Arc::new(CatalogService::new());
        self.attach(catalog.clone())?;
        catalog.publish(self.endpoint_names());
        Ok(())
    }

    /// Attached endpoint names, in attach order
    pub fn endpoint_names(&self) -> Vec<EndpointName> {
        self.order.iter().map(|kind| kind.endpoint_name()).collect()
    }

    /// Route one request to its service
    pub async fn dispatch(&self, request: Request) -> Response {
        let kind = request.endpoint();
        match self.routes.get(&kind) {
            Some(service) => {
                debug!("Dispatching {} to {}", kind, service.name());
                service.handle(request).await
            }
            None => {
                debug!("No service attached for {}", kind);
                Response::failure(ErrorCode::UnknownEndpoint, kind.full_name())
            }
        }
    }

    /// Dispatch an incoming message and return the reply, if any
    pub async fn dispatch_message(&self, message: Message) -> Option<Message> {
        match message.payload {
            MessagePayload::Request(request) => {
                let response = self.dispatch(request).await;
                Some(Message::reply(message.message_id, response))
            }
            MessagePayload::Response(response) => {
                warn!(
                    "Ignoring unsolicited {} message {}",
                    response.response_type(),
                    message.message_id
                );
                None
            }
        }
    }

    /// Run every service's shutdown hook
    pub async fn shutdown(&self) {
        for service in &self.services {
            service.shutdown().await;
        }
    }
}
