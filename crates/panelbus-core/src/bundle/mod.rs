//! Read-only bundle metadata.
//!
//! Descriptors are computed when bundles load and never change afterwards;
//! the bus facade exposes them as `bundle_version` and `bundle_git`.

use std::collections::BTreeMap;

use panelbus_types::bundle::BundleDescriptor;
use panelbus_types::name::BundleName;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("bundle '{0}' is already registered")]
    Duplicate(BundleName),
}

/// Lookup of static bundle descriptors.
pub trait BundleMetadata: Send + Sync {
    fn descriptor(&self, bundle: &BundleName) -> Option<BundleDescriptor>;

    /// All descriptors, ordered by bundle name.
    fn descriptors(&self) -> Vec<BundleDescriptor>;
}

/// In-memory descriptor set, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct BundleRegistry {
    bundles: BTreeMap<BundleName, BundleDescriptor>,
}

impl BundleRegistry {
    pub fn new(descriptors: impl IntoIterator<Item = BundleDescriptor>) -> Result<Self, BundleError> {
        let mut bundles = BTreeMap::new();
        for descriptor in descriptors {
            let name = descriptor.name.clone();
            if bundles.insert(name.clone(), descriptor).is_some() {
                return Err(BundleError::Duplicate(name));
            }
        }
        Ok(Self { bundles })
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl BundleMetadata for BundleRegistry {
    fn descriptor(&self, bundle: &BundleName) -> Option<BundleDescriptor> {
        self.bundles.get(bundle).cloned()
    }

    fn descriptors(&self) -> Vec<BundleDescriptor> {
        self.bundles.values().cloned().collect()
    }
}
