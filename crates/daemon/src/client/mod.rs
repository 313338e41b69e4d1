/// Console client for rpcmesh nodes
///
/// - Static menu against one known node
/// - Dynamic flow that discovers endpoints through the registry
/// - Automated scenario runner printing a PASS/FAIL table

pub mod auto;
pub mod input;
pub mod render;
pub mod session;

pub use auto::{render_table, AutoRunner, CaseResult};
pub use render::{render, render_error};
pub use session::{Action, ClientSession};
