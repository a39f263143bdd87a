//! Configuration types for panelbus.
//!
//! `PanelbusConfig` represents the top-level `config.toml`: bus delivery
//! policy and the server's listen address and bundle directory.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.panelbus/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelbusConfig {
    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// What a transport does with frames sent while it is disconnected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectedPolicy {
    /// Buffer frames and flush them in order on reconnect.
    #[default]
    Queue,
    /// Discard frames.
    Drop,
}

/// Delivery policy for one bus context and its transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Upper bound on waiting for an acknowledgment. `None` waits until the
    /// ack arrives or the transport reports a failure.
    #[serde(default)]
    pub ack_timeout_ms: Option<u64>,

    #[serde(default)]
    pub disconnected_policy: DisconnectedPolicy,

    /// Maximum frames buffered while disconnected under the `queue` policy.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    1024
}

impl BusConfig {
    pub fn ack_timeout(&self) -> Option<Duration> {
        self.ack_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: None,
            disconnected_policy: DisconnectedPolicy::default(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Listen address and bundle location for `pbus serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding `<bundle>/bundle.toml` manifests, relative to the
    /// data directory unless absolute.
    #[serde(default = "default_bundles_dir")]
    pub bundles_dir: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9090
}

fn default_bundles_dir() -> String {
    "bundles".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bundles_dir: default_bundles_dir(),
        }
    }
}
