//! Application state shared by the CLI and the HTTP server.
//!
//! AppState owns the server-side bus context: one `ServerHub` that every
//! WebSocket peer attaches to, and the `MessageBus` whose event loop consumes
//! the hub's inbound queue.

use std::path::PathBuf;
use std::sync::Arc;

use panelbus_core::bundle::BundleRegistry;
use panelbus_core::bus::MessageBus;
use panelbus_core::transport::ServerHub;
use panelbus_infra::bundle_store::BundleStore;
use panelbus_infra::config::load_config;
use panelbus_infra::filesystem::{resolve_bundles_dir, resolve_data_dir};
use panelbus_types::config::PanelbusConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<MessageBus>,
    pub hub: Arc<ServerHub>,
    pub bundles: Arc<BundleRegistry>,
    pub config: Arc<PanelbusConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data dir, load config and bundle manifests, start the server bus.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        let bundles_dir = resolve_bundles_dir(&data_dir, &config.server);
        let bundles = BundleStore::new(bundles_dir).load_registry()?;

        Ok(Self::from_parts(data_dir, config, bundles))
    }

    /// Wire the server context from already-loaded parts.
    ///
    /// Spawns the bus event loop, so this must run inside a tokio runtime.
    pub fn from_parts(data_dir: PathBuf, config: PanelbusConfig, bundles: BundleRegistry) -> Self {
        let bundles = Arc::new(bundles);
        let (hub, inbound) = ServerHub::new();
        let bus = MessageBus::with_metadata(hub.clone(), config.bus.clone(), bundles.clone());
        bus.spawn(inbound);

        Self {
            bus,
            hub,
            bundles,
            config: Arc::new(config),
            data_dir,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bus", &self.bus)
            .field("peers", &self.hub.peer_count())
            .field("bundles", &self.bundles.len())
            .field("data_dir", &self.data_dir)
            .finish()
    }
}
