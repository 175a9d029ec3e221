//! Migrate use case - resolves a package update and records the outcome in the
//! workspace.
//!
//! This use case coordinates:
//! - Looking up installed versions (with `--from` overrides)
//! - Resolving manifest bumps and migrations
//! - Updating package.json
//! - Writing migrations.json for the migration runner

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::migrate::{MetadataSource, Migration, Migrator, ResolutionResult};
use crate::package::{DependencyChange, PackageJsonManifest, VersionOverrides, WorkspaceVersions};
use crate::runtime::Runtime;

/// File the migration runner reads its work list from.
pub const MIGRATIONS_FILE: &str = "migrations.json";

/// Options for a migrate run.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Package the update starts from
    pub package: String,
    /// Version (or dist-tag) to update it to
    pub version: String,
    /// Treat these packages as installed at the given versions
    pub from: IndexMap<String, String>,
    /// Pin these packages to the given versions
    pub to: IndexMap<String, String>,
}

/// What a migrate run changed.
#[derive(Debug)]
pub struct MigrateReport {
    pub resolution: ResolutionResult,
    /// Manifest entries that were rewritten
    pub changes: Vec<DependencyChange>,
    /// Path of the written migrations file, if any migrations were found
    pub migrations_file: Option<PathBuf>,
}

#[derive(Serialize)]
struct MigrationsFile<'a> {
    migrations: &'a [Migration],
}

/// Migrate use case - resolves and records a workspace update.
pub struct MigrateUseCase<'a, R: Runtime> {
    runtime: &'a R,
    source: &'a dyn MetadataSource,
    root: PathBuf,
}

impl<'a, R: Runtime> MigrateUseCase<'a, R> {
    pub fn new(runtime: &'a R, source: &'a dyn MetadataSource, root: PathBuf) -> Self {
        Self {
            runtime,
            source,
            root,
        }
    }

    /// Resolve the update without touching the workspace.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, options: &MigrateOptions) -> Result<ResolutionResult> {
        let installed = WorkspaceVersions::new(self.runtime, self.root.clone());
        let versions = VersionOverrides::new(&installed, options.from.clone());

        Migrator::new(&versions, self.source)
            .with_target_overrides(options.to.clone())
            .resolve_package_update(&options.package, &options.version)
            .await
    }

    /// Resolve the update, then rewrite package.json and write migrations.json.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, options: &MigrateOptions) -> Result<MigrateReport> {
        let mut manifest = PackageJsonManifest::load(self.runtime, &self.root)?;
        let resolution = self.resolve(options).await?;

        let changes = manifest.apply(&resolution.package_json);
        if !changes.is_empty() {
            manifest.save()?;
            info!("Updated {} entries in {:?}", changes.len(), manifest.path());
        }

        let migrations_file = if resolution.migrations.is_empty() {
            None
        } else {
            Some(self.write_migrations(&resolution.migrations)?)
        };

        Ok(MigrateReport {
            resolution,
            changes,
            migrations_file,
        })
    }

    fn write_migrations(&self, migrations: &[Migration]) -> Result<PathBuf> {
        let path = self.root.join(MIGRATIONS_FILE);
        let mut content = serde_json::to_string_pretty(&MigrationsFile { migrations })?;
        content.push('\n');
        self.runtime
            .write(&path, content.as_bytes())
            .with_context(|| format!("Failed to write migrations to {:?}", path))?;
        info!("Wrote {} migration(s) to {:?}", migrations.len(), path);
        Ok(path)
    }
}
