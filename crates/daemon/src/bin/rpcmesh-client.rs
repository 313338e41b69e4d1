/// rpcmesh console client
///
/// Talks to one node directly, or discovers endpoints through the registry.

use anyhow::{bail, Context, Result};
use rpcmesh_common::{ClientConfig, Connection};
use rpcmesh_core::{CallOptions, Invoker};
use rpcmesh_daemon::client::{render_table, AutoRunner, ClientSession};
use tokio::io::BufReader;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = parse_args(&args)?;

    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let options = CallOptions::from(&config);
    let invoker = if config.use_registry {
        Invoker::dynamic(config.registry.clone(), options)
    } else {
        Invoker::static_node(config.node.clone(), options)
    };

    if config.auto {
        info!("Running automated scenario against {}", config.node);
        let results = AutoRunner::new(invoker).run().await;
        print!("{}", render_table(&results));
        return Ok(());
    }

    let input = BufReader::new(tokio::io::stdin());
    let mut session = ClientSession::new(invoker, config.message, input, tokio::io::stdout());
    session.run().await?;
    Ok(())
}

fn parse_args(args: &[String]) -> Result<ClientConfig> {
    let mut config = ClientConfig {
        auto: std::env::var("RPCMESH_AUTO").is_ok_and(|v| v == "1" || v == "true"),
        ..ClientConfig::default()
    };

    let positional: Vec<&String> = args
        .iter()
        .filter(|arg| {
            if arg.as_str() == "--auto" {
                config.auto = true;
                false
            } else {
                true
            }
        })
        .collect();

    match positional.as_slice() {
        [] => {}
        [host, port, reg_host, reg_port, message, reg_on] => {
            config.node = connection(host, port)?;
            config.registry = connection(reg_host, reg_port)?;
            config.message = message.to_string();
            config.use_registry = reg_on
                .parse::<bool>()
                .with_context(|| format!("regOn must be true or false, got {reg_on}"))?;
        }
        _ => {
            print_usage();
            bail!("expected 6 arguments, got {}", positional.len());
        }
    }

    Ok(config)
}

fn connection(host: &str, port: &str) -> Result<Connection> {
    let port = port
        .parse::<u16>()
        .with_context(|| format!("invalid port {port}"))?;
    let connection = Connection::new(host, port);
    connection.validate()?;
    Ok(connection)
}

fn print_usage() {
    eprintln!("USAGE:");
    eprintln!("    rpcmesh-client [--auto] <host> <port> <regHost> <regPort> <message> <regOn>");
    eprintln!();
    eprintln!("    regOn=true resolves every endpoint through the registry.");
    eprintln!("    --auto (or RPCMESH_AUTO=1) runs the automated scenario.");
}
