/// rpcmesh daemon library
///
/// This crate provides the processes built on rpcmesh-core: the registry
/// and node daemons with their optional HTTP API, and the console client.

pub mod api;
pub mod client;

pub use api::ApiServer;
pub use client::{AutoRunner, ClientSession};
