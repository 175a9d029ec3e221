//! Migration resolution.
//!
//! Given a root package and a target version, walks the update metadata that
//! every affected package publishes and computes:
//!
//! - the highest version each package must be bumped to (the manifest update)
//! - the ordered list of migration generators to run
//!
//! # Structure
//!
//! - `ledger` - highest version resolved per package; the cycle guard
//! - `collector` - ordered, append-only list of migrations
//! - `migrator` - the recursive traversal driving both

mod collector;
mod ledger;
mod migrator;

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use collector::MigrationCollector;
pub use ledger::VersionLedger;
pub use migrator::Migrator;

/// Migration metadata a package publishes for one of its versions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MigrationMetadata {
    /// The concrete version the source resolved the request to.
    pub version: String,
    pub package_json_updates: IndexMap<String, UpdateDescriptor>,
    pub migration_generators: IndexMap<String, GeneratorDescriptor>,
}

/// A set of package bumps that belongs to one version of the owning package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Only relevant while the owning package is installed below this version.
    pub version: String,
    #[serde(default)]
    pub packages: IndexMap<String, PackageRequirement>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRequirement {
    /// Minimum version the package must be bumped to.
    pub version: String,
    /// Only bump when this other package is installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_package_installed: Option<String>,
}

/// A named code transform shipped by a package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratorDescriptor {
    /// Only relevant while the owning package is installed below this version.
    pub version: String,
    #[serde(alias = "implementation")]
    pub factory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A migration generator that must run, in the order it was discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    pub package: String,
    pub version: String,
    pub name: String,
    pub factory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Outcome of resolving a package update.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// Package name -> version to write into the manifest.
    pub package_json: IndexMap<String, String>,
    pub migrations: Vec<Migration>,
}

/// Source of published migration metadata (registry, cache, bundled data).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the metadata of `package` at `version`.
    ///
    /// The source may resolve tags or ranges; the returned metadata carries the
    /// concrete version. Returns `None` when the package or version is unknown.
    async fn fetch(&self, package: &str, version: &str) -> Result<Option<MigrationMetadata>>;
}
