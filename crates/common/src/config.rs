use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::Connection;

/// Network protocol constants
pub mod protocol {
    /// Default port a node listens on
    pub const DEFAULT_NODE_PORT: u16 = 8000;

    /// Default port the registry listens on
    pub const DEFAULT_REGISTRY_PORT: u16 = 9003;

    /// Maximum frame size (10 MB)
    pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

    /// Time allowed to establish a TCP connection
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Time allowed for one request/response exchange
    pub const CALL_TIMEOUT_SECS: u64 = 10;

    /// Grace period for in-flight calls on shutdown
    pub const SHUTDOWN_GRACE_SECS: u64 = 30;

    /// Bound on concurrently served connections per listener
    pub const MAX_CONCURRENT_CALLS: usize = 64;
}

/// Coffee pot constants
pub mod brew {
    /// Cups produced by one brew cycle
    pub const POT_CAPACITY: u32 = 5;

    /// Length of one brew cycle
    pub const BREW_SECS: u64 = 30;
}

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Human-readable node name, used in logs only
    pub name: String,

    /// Listen address
    pub listen_addr: String,

    /// Listen port (0 picks an ephemeral port)
    pub listen_port: u16,

    /// Host advertised to the registry
    pub advertise_host: String,

    /// Whether to register endpoints with the registry on startup
    pub register_with_registry: bool,

    /// Registry host
    pub registry_host: String,

    /// Registry port
    pub registry_port: u16,

    /// Bound on concurrently served connections
    pub max_concurrent_calls: usize,

    /// Grace period for in-flight calls on shutdown
    pub shutdown_grace_secs: u64,

    /// Optional HTTP status API port
    pub api_port: Option<u16>,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "node".to_string(),
            listen_addr: "0.0.0.0".to_string(),
            listen_port: protocol::DEFAULT_NODE_PORT,
            advertise_host: "localhost".to_string(),
            register_with_registry: false,
            registry_host: "localhost".to_string(),
            registry_port: protocol::DEFAULT_REGISTRY_PORT,
            max_concurrent_calls: protocol::MAX_CONCURRENT_CALLS,
            shutdown_grace_secs: protocol::SHUTDOWN_GRACE_SECS,
            api_port: None,
            verbose: false,
        }
    }
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_listen(mut self, addr: impl Into<String>, port: u16) -> Self {
        self.listen_addr = addr.into();
        self.listen_port = port;
        self
    }

    pub fn with_advertise_host(mut self, host: impl Into<String>) -> Self {
        self.advertise_host = host.into();
        self
    }

    pub fn with_registry(mut self, host: impl Into<String>, port: u16) -> Self {
        self.register_with_registry = true;
        self.registry_host = host.into();
        self.registry_port = port;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_secs = grace.as_secs();
        self
    }

    pub fn registry_connection(&self) -> Connection {
        Connection::new(self.registry_host.clone(), self.registry_port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        save_toml(self, path)
    }
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Listen address
    pub listen_addr: String,

    /// Listen port
    pub listen_port: u16,

    /// Bound on concurrently served connections
    pub max_concurrent_calls: usize,

    /// Grace period for in-flight calls on shutdown
    pub shutdown_grace_secs: u64,

    /// Optional HTTP status API port
    pub api_port: Option<u16>,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: protocol::DEFAULT_REGISTRY_PORT,
            max_concurrent_calls: protocol::MAX_CONCURRENT_CALLS,
            shutdown_grace_secs: protocol::SHUTDOWN_GRACE_SECS,
            api_port: None,
            verbose: false,
        }
    }
}

impl RegistryConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }

    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        save_toml(self, path)
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Node used in static mode
    pub node: Connection,

    /// Registry used in dynamic mode
    pub registry: Connection,

    /// Message sent to the echo endpoint
    pub message: String,

    /// Resolve endpoints through the registry instead of the static node
    pub use_registry: bool,

    /// Run the automated scenario instead of the interactive menu
    pub auto: bool,

    pub connect_timeout_secs: u64,

    pub call_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node: Connection::new("localhost", protocol::DEFAULT_NODE_PORT),
            registry: Connection::new("localhost", protocol::DEFAULT_REGISTRY_PORT),
            message: "Hello".to_string(),
            use_registry: false,
            auto: false,
            connect_timeout_secs: protocol::CONNECT_TIMEOUT_SECS,
            call_timeout_secs: protocol::CALL_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn save_toml<T: Serialize>(value: &T, path: &Path) -> Result<(), ConfigError> {
    let contents =
        toml::to_string_pretty(value).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, contents).map_err(|e| ConfigError::WriteError(e.to_string()))?;

    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to serialize config: {0}")]
    SerializeError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.listen_port, protocol::DEFAULT_NODE_PORT);
        assert!(!config.register_with_registry);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_builder() {
        let config = NodeConfig::new()
            .with_name("alpha")
            .with_listen("127.0.0.1", 9099)
            .with_registry("reg.local", 9003);

        assert_eq!(config.listen_port, 9099);
        assert!(config.register_with_registry);
        assert_eq!(config.registry_connection(), Connection::new("reg.local", 9003));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NodeConfig = toml::from_str("name = \"beta\"\nlisten_port = 9100\n").unwrap();
        assert_eq!(config.name, "beta");
        assert_eq!(config.listen_port, 9100);
        assert_eq!(config.registry_port, protocol::DEFAULT_REGISTRY_PORT);
    }

    #[test]
    fn test_config_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("rpcmesh-node-{}.toml", std::process::id()));
        let config = NodeConfig::new().with_name("gamma").with_listen("0.0.0.0", 9200);
        config.to_file(&path).unwrap();

        let loaded = NodeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.name, "gamma");
        assert_eq!(loaded.listen_port, 9200);
        std::fs::remove_file(&path).ok();
    }
}
