pub mod endpoints;
pub mod messages;

pub use endpoints::EndpointKind;
pub use messages::*;
