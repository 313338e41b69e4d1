/// REST API module for rpcmesh processes
///
/// Optional HTTP surface next to the RPC listener:
/// - Registry directory listing, lookup and registration
/// - Node status (advertised address, endpoints, registration outcome)

pub mod handlers;
pub mod responses;
pub mod server;

pub use server::{node_router, registry_router, ApiServer};
pub use responses::*;
