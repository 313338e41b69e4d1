/// Calling nodes and the registry
///
/// Every call opens a fresh channel, performs exactly one exchange and drops
/// the channel. Nothing is cached between calls.

pub mod invoker;
pub mod registry_client;

pub use invoker::{Invoker, Resolution};
pub use registry_client::RegistryClient;

use crate::protocol::{Request, Response};
use crate::transport::Channel;
use rpcmesh_common::config::protocol::{CALL_TIMEOUT_SECS, CONNECT_TIMEOUT_SECS};
use rpcmesh_common::{ClientConfig, Connection, MeshError};
use std::time::Duration;
use tracing::debug;

/// Timeouts applied to every call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    pub connect_timeout: Duration,
    pub call_timeout: Duration,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            call_timeout: Duration::from_secs(CALL_TIMEOUT_SECS),
        }
    }
}

impl From<&ClientConfig> for CallOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            call_timeout: config.call_timeout(),
        }
    }
}

/// Perform one request against `target` on a fresh connection.
///
/// A `Failure` reply is returned as the matching [`MeshError`].
pub async fn call(
    target: &Connection,
    request: Request,
    options: &CallOptions,
) -> Result<Response, MeshError> {
    let endpoint = request.endpoint();
    let mut channel = Channel::connect(target, options.connect_timeout).await?;
    let response = channel.request(request, options.call_timeout).await?;
    debug!("{} on {} -> {}", endpoint, target, response.response_type());
    response.into_result()
}
