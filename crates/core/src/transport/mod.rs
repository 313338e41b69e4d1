/// Transport layer over plain TCP
///
/// A `Listener` accepts inbound channels; a `Channel` carries framed
/// request/response messages in both directions.

mod connection;
mod endpoint;

pub use connection::Channel;
pub use endpoint::{Listener, ListenerConfig, ListenerError};
