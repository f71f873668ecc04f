use std::net::SocketAddr;
use std::path::PathBuf;

use shooter_shared::config::DEFAULT_PORT;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Directory with the browser client. Served over plain HTTP when it exists.
    pub static_dir: Option<PathBuf>,
    /// Route for the WebSocket upgrade. `/` also accepts upgrades.
    pub ws_path: String,
    /// Capacity of the channel feeding the relay task.
    pub command_buffer: usize,
    /// Frames queued per connection before a non-reading peer is disconnected.
    pub outbound_buffer: usize,
    /// Whether a player's own `update` is sent back to them.
    pub echo_updates_to_sender: bool,
    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            static_dir: Some(PathBuf::from("public")),
            ws_path: "/ws".to_string(),
            command_buffer: 1024,
            outbound_buffer: 256,
            echo_updates_to_sender: true,
            max_message_bytes: 4096,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `SHOOTER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `SHOOTER_*` key.
    /// Values that fail to parse keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("SHOOTER_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(dir) = lookup("SHOOTER_STATIC_DIR") {
            // An empty value turns static hosting off.
            config.static_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Some(path) = lookup("SHOOTER_WS_PATH") {
            config.ws_path = path;
        }
        if let Some(n) = lookup("SHOOTER_COMMAND_BUFFER").and_then(|v| v.parse().ok()) {
            config.command_buffer = n;
        }
        if let Some(n) = lookup("SHOOTER_OUTBOUND_BUFFER").and_then(|v| v.parse().ok()) {
            config.outbound_buffer = n;
        }
        if let Some(echo) = lookup("SHOOTER_ECHO_UPDATES").and_then(|v| v.parse().ok()) {
            config.echo_updates_to_sender = echo;
        }
        if let Some(n) = lookup("SHOOTER_MAX_MESSAGE_BYTES").and_then(|v| v.parse().ok()) {
            config.max_message_bytes = n;
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(format!(
                "listen_addr `{}` is not a socket address",
                self.listen_addr
            ));
        }
        if !self.ws_path.starts_with('/') {
            return Err("ws_path must start with '/'".to_string());
        }
        if self.command_buffer == 0 {
            return Err("command_buffer must be > 0".to_string());
        }
        if self.outbound_buffer == 0 {
            return Err("outbound_buffer must be > 0".to_string());
        }
        if self.max_message_bytes == 0 {
            return Err("max_message_bytes must be > 0".to_string());
        }
        Ok(())
    }
}
