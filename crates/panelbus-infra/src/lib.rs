//! Infrastructure layer for panelbus.
//!
//! Filesystem adapters behind the bus: the `config.toml` loader, the bundle
//! manifest store that feeds `panelbus-core`'s `BundleMetadata`, and data
//! directory resolution.

pub mod bundle_store;
pub mod config;
pub mod filesystem;
