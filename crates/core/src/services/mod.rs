/// Built-in services hosted by nodes
///
/// A service owns its state and answers calls for the endpoints it lists.
/// The dispatcher routes each request to the service that attached the
/// endpoint, so a service only ever sees requests it declared.

pub mod catalog;
pub mod coffee_pot;
pub mod echo;
pub mod joke;
pub mod sort;
pub mod vigenere;

pub use catalog::CatalogService;
pub use coffee_pot::{BrewError, BrewPhase, CoffeePot, CoffeePotService};
pub use echo::EchoService;
pub use joke::JokeService;
pub use sort::SortService;
pub use vigenere::VigenereService;

use crate::protocol::{EndpointKind, ErrorCode, Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait Service: Send + Sync {
    fn name(&self) -> &'static str;

    /// Endpoints this service answers
    fn endpoints(&self) -> &'static [EndpointKind];

    fn handle(&self, request: Request) -> BoxFuture<'_, Response>;

    /// Release timers and other background work before the process exits
    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Reply for a request routed to a service that does not serve it
pub(crate) fn misrouted(service: &str, request: &Request) -> Response {
    Response::failure(
        ErrorCode::UnknownEndpoint,
        format!("{} does not serve {}", service, request.endpoint()),
    )
}

/// The services a node hosts by default. The catalog is attached separately
/// since it lists the others.
pub fn default_services() -> Vec<Arc<dyn Service>> {
    vec![
        Arc::new(EchoService::new()),
        Arc::new(JokeService::new()),
        Arc::new(CoffeePotService::new()),
        Arc::new(SortService::new()),
        Arc::new(VigenereService::new()),
    ]
}
