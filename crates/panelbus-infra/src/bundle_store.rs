//! Filesystem-based bundle manifests.
//!
//! Each bundle occupies a directory under the bundles dir containing a
//! `bundle.toml` manifest with its name, version and optional git provenance.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use panelbus_core::bundle::BundleRegistry;
use panelbus_types::bundle::BundleDescriptor;

const MANIFEST_FILE: &str = "bundle.toml";

/// Bundle manifest store.
///
/// Layout:
/// ```text
/// {bundles_dir}/{bundle-name}/
///   bundle.toml
/// ```
#[derive(Debug, Clone)]
pub struct BundleStore {
    bundles_dir: PathBuf,
}

impl BundleStore {
    pub fn new(bundles_dir: PathBuf) -> Self {
        Self { bundles_dir }
    }

    pub fn bundles_dir(&self) -> &Path {
        &self.bundles_dir
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.bundles_dir.join(name).join(MANIFEST_FILE)
    }

    /// Load one bundle's manifest.
    ///
    /// The manifest's `name` must match its directory name.
    pub fn get_bundle(&self, name: &str) -> anyhow::Result<BundleDescriptor> {
        let path = self.manifest_path(name);
        if !path.exists() {
            bail!("Bundle '{}' not found at {}", name, path.display());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let descriptor: BundleDescriptor = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if descriptor.name.as_str() != name {
            bail!(
                "Manifest {} declares bundle '{}', expected '{}'",
                path.display(),
                descriptor.name,
                name
            );
        }
        Ok(descriptor)
    }

    /// All bundles with a readable manifest, sorted by name.
    ///
    /// A missing bundles directory yields an empty list. Corrupted manifests
    /// are skipped with a warning.
    pub fn list_bundles(&self) -> anyhow::Result<Vec<BundleDescriptor>> {
        if !self.bundles_dir.exists() {
            tracing::debug!("No bundles directory at {}", self.bundles_dir.display());
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.bundles_dir).with_context(|| {
            format!("Failed to read bundles directory: {}", self.bundles_dir.display())
        })?;

        let mut bundles = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() || !path.join(MANIFEST_FILE).exists() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match self.get_bundle(name) {
                Ok(bundle) => bundles.push(bundle),
                Err(e) => {
                    tracing::warn!(bundle = %name, error = %e, "Skipping corrupted bundle");
                }
            }
        }

        bundles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(bundles)
    }

    /// Load every bundle into the registry the bus reads metadata from.
    pub fn load_registry(&self) -> anyhow::Result<BundleRegistry> {
        let bundles = self.list_bundles()?;
        tracing::info!(count = bundles.len(), dir = %self.bundles_dir.display(), "Loaded bundles");
        Ok(BundleRegistry::new(bundles)?)
    }
}
