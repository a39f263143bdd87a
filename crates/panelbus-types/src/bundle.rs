//! Static bundle metadata.
//!
//! A `BundleDescriptor` is computed once when a bundle is loaded (version from
//! its manifest, git provenance from the checkout) and never changes at runtime.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::name::BundleName;

/// Version-control provenance of a bundle.
///
/// Serialized with `shortHash` in camelCase, the shape dashboard panels
/// read from `bundleGit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleGit {
    pub branch: String,
    pub date: DateTime<Utc>,
    pub hash: String,
    pub message: String,
    #[serde(rename = "shortHash", alias = "short_hash")]
    pub short_hash: String,
}

/// Read-only descriptor for a loaded bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDescriptor {
    pub name: BundleName,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<BundleGit>,
}
