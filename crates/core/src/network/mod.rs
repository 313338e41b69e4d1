/// Request routing and the connection-serving loop
///
/// `MessageCodec` frames messages on the wire, `MessageDispatcher` routes
/// requests to services, and `Server` ties both to a listener.

pub mod message_dispatcher;
pub mod message_handler;
pub mod server;

pub use message_dispatcher::MessageDispatcher;
pub use message_handler::MessageCodec;
pub use server::Server;
