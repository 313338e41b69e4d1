pub mod client;
pub mod network;
pub mod node;
pub mod protocol;
pub mod registry;
pub mod services;
pub mod transport;

pub use node::{Node, NodeStatus, RegistrationState};
pub use protocol::*;

// Re-export client types
pub use client::{call, CallOptions, Invoker, RegistryClient, Resolution};

// Re-export registry types
pub use registry::{RegisterOutcome, Registry, RegistryError, RegistryService};

// Re-export service types
pub use services::{
    BoxFuture, BrewError, BrewPhase, CatalogService, CoffeePot, CoffeePotService, EchoService,
    JokeService, Service, SortService, VigenereService,
};

pub use network::{MessageDispatcher, Server};
pub use transport::{Channel, Listener, ListenerConfig};
