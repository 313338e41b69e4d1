/// Central endpoint registry
///
/// Nodes register the endpoints they host; clients list and resolve them.
/// The registry is never on the path of the actual call.

pub mod directory;
pub mod service;

pub use directory::{RegisterOutcome, Registry, RegistryError};
pub use service::RegistryService;
