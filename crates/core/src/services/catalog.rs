use super::{misrouted, BoxFuture, Service};
use crate::protocol::{EndpointKind, EndpointListResponse, Request, Response};
use rpcmesh_common::EndpointName;
use std::sync::OnceLock;

/// Lists the endpoints hosted by this node
///
/// The list is published once, after every service is attached, and never
/// changes afterwards.
#[derive(Debug, Default)]
pub struct CatalogService {
    names: OnceLock<Vec<EndpointName>>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the node's endpoint list. Later calls are ignored.
    pub fn publish(&self, names: Vec<EndpointName>) {
        let _ = self.names.set(names);
    }

    pub fn names(&self) -> Vec<EndpointName> {
        self.names.get().cloned().unwrap_or_default()
    }
}

impl Service for CatalogService {
    fn name(&self) -> &'static str {
        "services.Catalog"
    }

    fn endpoints(&self) -> &'static [EndpointKind] {
        &[EndpointKind::CatalogList]
    }

    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            match request {
                Request::ListLocal => {
                    Response::EndpointList(EndpointListResponse { names: self.names() })
                }
                other => misrouted(self.name(), &other),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_once() {
        let catalog = CatalogService::new();
        assert!(catalog.names().is_empty());

        catalog.publish(vec![EndpointKind::EchoParrot.endpoint_name()]);
        catalog.publish(Vec::new());

        let Response::EndpointList(list) = catalog.handle(Request::ListLocal).await else {
            panic!("expected endpoint list");
        };
        assert_eq!(list.names, vec![EndpointKind::EchoParrot.endpoint_name()]);
    }
}
