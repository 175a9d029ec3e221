//! Recursive expansion of package updates.

use anyhow::{Context, Result, bail};
use async_recursion::async_recursion;
use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::package::{InstalledVersions, VersionOrder};

use super::{MetadataSource, Migration, MigrationCollector, ResolutionResult, VersionLedger};

/// State owned by one top-level resolution.
#[derive(Default)]
struct Resolution {
    ledger: VersionLedger,
    collector: MigrationCollector,
}

/// Computes manifest bumps and migrations for a package update.
///
/// Fetches are issued one at a time in traversal order; every ledger decision
/// sees the outcome of all earlier fetches.
pub struct Migrator<'a> {
    versions: &'a dyn InstalledVersions,
    source: &'a dyn MetadataSource,
    targets: IndexMap<String, String>,
}

impl<'a> Migrator<'a> {
    pub fn new(versions: &'a dyn InstalledVersions, source: &'a dyn MetadataSource) -> Self {
        Self {
            versions,
            source,
            targets: IndexMap::new(),
        }
    }

    /// Pin packages to a version regardless of what is requested for them.
    pub fn with_target_overrides(mut self, targets: IndexMap<String, String>) -> Self {
        self.targets = targets;
        self
    }

    /// Resolve the update of `package` to `version`.
    ///
    /// Fails when `package` itself is not installed or its metadata cannot be
    /// fetched. Nested packages whose metadata cannot be fetched are left out
    /// of the result.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_package_update(
        &self,
        package: &str,
        version: &str,
    ) -> Result<ResolutionResult> {
        let mut resolution = Resolution::default();
        self.resolve(&mut resolution, package, version, true).await?;

        info!(
            "Resolved {} package(s) and {} migration(s) for {}@{}",
            resolution.ledger.len(),
            resolution.collector.len(),
            package,
            version
        );

        Ok(ResolutionResult {
            package_json: resolution.ledger.into_versions(),
            migrations: resolution.collector.into_migrations(),
        })
    }

    #[async_recursion]
    async fn resolve(
        &self,
        resolution: &mut Resolution,
        package: &str,
        requested: &str,
        is_root: bool,
    ) -> Result<()> {
        let requested = self
            .targets
            .get(package)
            .map(String::as_str)
            .unwrap_or(requested);
        let installed = self.versions.installed_version(package);

        if is_root && installed.is_none() {
            bail!("Cannot find package \"{}\" installed.", package);
        }

        if !resolution.ledger.should_process(package, requested) {
            debug!(
                "{}@{} already covered by {:?}",
                package,
                requested,
                resolution.ledger.get(package)
            );
            return Ok(());
        }

        let metadata = match self.source.fetch(package, requested).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!("No migration metadata for {}@{}", package, requested);
                return Ok(());
            }
            Err(e) if is_root => {
                return Err(e).with_context(|| {
                    format!("Failed to fetch migration metadata for {}@{}", package, requested)
                });
            }
            Err(e) => {
                warn!(
                    "Failed to fetch migration metadata for {}@{}: {:#}",
                    package, requested, e
                );
                return Ok(());
            }
        };

        debug!("{}@{} resolved to {}", package, requested, metadata.version);
        resolution.ledger.record(package, &metadata.version);

        let installed = installed.as_deref();

        for (name, generator) in &metadata.migration_generators {
            if !VersionOrder::is_pending(installed, &generator.version) {
                debug!("{}:{} already applied", package, name);
                continue;
            }
            resolution.collector.push(Migration {
                package: package.to_string(),
                version: generator.version.clone(),
                name: name.clone(),
                factory: generator.factory.clone(),
                description: generator.description.clone(),
            });
        }

        for (update_name, update) in &metadata.package_json_updates {
            if !VersionOrder::is_pending(installed, &update.version) {
                debug!("{}:{} already applied", package, update_name);
                continue;
            }

            for (nested, requirement) in &update.packages {
                if let Some(gate) = &requirement.if_package_installed
                    && self.versions.installed_version(gate).is_none()
                {
                    debug!("Skipping {}: {} is not installed", nested, gate);
                    continue;
                }

                self.resolve(resolution, nested, &requirement.version, false).await?;
            }
        }

        Ok(())
    }
}
