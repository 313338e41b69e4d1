/// API Response types

use rpcmesh_common::Connection;
use rpcmesh_core::RegistrationState;
use serde::{Deserialize, Serialize};

/// Endpoint list response
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointListResponse {
    /// Registered endpoint names, in registration order
    pub endpoints: Vec<String>,
    /// Total number of endpoints
    pub total: usize,
}

/// Single resolved endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolvedEndpointResponse {
    pub name: String,
    pub host: String,
    pub port: u16,
}

/// Endpoint registration request
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointRegistrationRequest {
    pub endpoint_name: String,
    pub connection: Connection,
}

/// Endpoint registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointRegistrationResponse {
    pub endpoint_name: String,
    /// One of `inserted`, `replaced`, `unchanged`
    pub outcome: String,
    /// Connection that was overwritten, if any
    pub previous: Option<Connection>,
}

/// Node status response
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeStatusResponse {
    pub name: String,
    pub advertised: Connection,
    pub endpoints: Vec<String>,
    pub registration: serde_json::Value,
    /// Seconds since the node started
    pub uptime_seconds: u64,
}

impl NodeStatusResponse {
    pub(crate) fn registration_value(state: &RegistrationState) -> serde_json::Value {
        serde_json::to_value(state).unwrap_or(serde_json::Value::Null)
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}
