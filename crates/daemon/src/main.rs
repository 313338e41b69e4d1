/// rpcmesh daemon
///
/// Runs one of the two server roles:
/// - `registry`: the endpoint directory nodes advertise into
/// - `node`: a service host that optionally registers with the registry

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn, Level};

use rpcmesh_common::{NodeConfig, RegistryConfig};
use rpcmesh_core::{
    Listener, ListenerConfig, MessageDispatcher, Node, RegistryService, Server,
};
use rpcmesh_daemon::api::{node_router, registry_router};
use rpcmesh_daemon::ApiServer;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("help" | "--help" | "-h") | None => {
            print_help();
            Ok(())
        }
        Some("version" | "--version" | "-v") => {
            println!("rpcmesh v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some("registry") => {
            let path = config_path(&args, "rpcmesh-registry.toml");
            let config: RegistryConfig = load_or_default(
                &path,
                RegistryConfig::from_file,
                RegistryConfig::to_file,
            )?;
            init_logging(config.verbose);
            run_registry(config).await
        }
        Some("node") => {
            let path = config_path(&args, "rpcmesh-node.toml");
            let config: NodeConfig =
                load_or_default(&path, NodeConfig::from_file, NodeConfig::to_file)?;
            init_logging(config.verbose);
            run_node(config).await
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run with 'help' to see available commands");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
    info!("Starting rpcmesh v{}", env!("CARGO_PKG_VERSION"));
}

fn config_path(args: &[String], default: &str) -> PathBuf {
    args.get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Load `path`, or write out the defaults there for next time
fn load_or_default<T, E>(
    path: &Path,
    load: fn(&Path) -> std::result::Result<T, E>,
    save: fn(&T, &Path) -> std::result::Result<(), E>,
) -> Result<T>
where
    T: Default,
    E: std::error::Error + Send + Sync + 'static,
{
    if path.exists() {
        eprintln!("Loading configuration from {:?}", path);
        return load(path).with_context(|| format!("loading {}", path.display()));
    }

    let config = T::default();
    match save(&config, path) {
        Ok(()) => eprintln!("Saved default configuration to {:?}", path),
        Err(e) => eprintln!("Failed to save default config: {}", e),
    }
    Ok(config)
}

/// Flip the shutdown flag on Ctrl+C
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Shutdown signal received");
        let _ = tx.send(true);
    });
    rx
}

fn spawn_api(api_port: Option<u16>, router: axum::Router, shutdown: &watch::Receiver<bool>) {
    let Some(port) = api_port else {
        return;
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let api_server = ApiServer::new(addr, router);
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = api_server.start(shutdown).await {
            warn!("API server error: {}", e);
        }
    });
}

/// Run the endpoint registry
async fn run_registry(config: RegistryConfig) -> Result<()> {
    info!("Running registry");

    let service = RegistryService::default();
    let registry = service.registry().clone();

    let mut dispatcher = MessageDispatcher::new();
    dispatcher.attach(Arc::new(service))?;

    let listener_config = ListenerConfig::resolve(&config.listen_addr, config.listen_port).await?;
    let listener = Listener::bind(listener_config).await?;
    let server = Server::new(
        listener,
        Arc::new(dispatcher),
        config.max_concurrent_calls,
        config.shutdown_grace(),
    );

    let shutdown = shutdown_on_ctrl_c();
    spawn_api(config.api_port, registry_router(registry), &shutdown);

    info!("Registry is running. Press Ctrl+C to stop.");
    server.run(shutdown).await?;

    info!("Registry stopped");
    Ok(())
}

/// Run a service node
async fn run_node(config: NodeConfig) -> Result<()> {
    info!("Running node {}", config.name);

    let api_port = config.api_port;
    let node = Node::bind(config).await?;

    let shutdown = shutdown_on_ctrl_c();
    spawn_api(api_port, node_router(node.status()), &shutdown);

    info!("Node is running. Press Ctrl+C to stop.");
    node.run(shutdown).await?;

    info!("Node stopped");
    Ok(())
}

/// Print help message
fn print_help() {
    println!("rpcmesh - service registry and RPC nodes");
    println!();
    println!("USAGE:");
    println!("    rpcmesh <COMMAND> [CONFIG]");
    println!();
    println!("COMMANDS:");
    println!("    registry    Run the endpoint registry (config: rpcmesh-registry.toml)");
    println!("    node        Run a service node (config: rpcmesh-node.toml)");
    println!("    help        Show this help message");
    println!("    version     Show version information");
    println!();
    println!("A missing config file is created with defaults on first start.");
    println!();
    println!("EXAMPLES:");
    println!("    # Registry on the default port 9003");
    println!("    rpcmesh registry");
    println!();
    println!("    # Node that registers its endpoints");
    println!("    rpcmesh node alpha.toml");
    println!();
    println!("    # Client against the node, discovering through the registry");
    println!("    rpcmesh-client localhost 8000 localhost 9003 Hello true");
}
