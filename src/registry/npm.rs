//! npm-compatible registry implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};

use crate::http::HttpClient;
use crate::migrate::{MetadataSource, MigrationMetadata};

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";
pub const DEFAULT_FILES_URL: &str = "https://unpkg.com";

/// Registry response types (internal).
mod api {
    use indexmap::IndexMap;
    use serde::Deserialize;

    use crate::migrate::{GeneratorDescriptor, UpdateDescriptor};

    /// The document a registry serves for one version of a package.
    #[derive(Deserialize, Debug)]
    pub struct VersionDocument {
        pub version: String,
        #[serde(rename = "nx-migrations")]
        pub nx_migrations: Option<MigrationsEntry>,
        #[serde(rename = "ng-update")]
        pub ng_update: Option<MigrationsEntry>,
    }

    /// Either `"./migrations.json"` or `{ "migrations": "./migrations.json" }`.
    #[derive(Deserialize, Debug)]
    #[serde(untagged)]
    pub enum MigrationsEntry {
        Path(String),
        Config { migrations: Option<String> },
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct MigrationsFile {
        #[serde(default, alias = "schematics", alias = "migrationGenerators")]
        pub generators: IndexMap<String, GeneratorDescriptor>,
        #[serde(default)]
        pub package_json_updates: IndexMap<String, UpdateDescriptor>,
    }

    impl VersionDocument {
        pub fn migrations_path(&self) -> Option<&str> {
            [&self.nx_migrations, &self.ng_update]
                .into_iter()
                .flatten()
                .find_map(|entry| match entry {
                    MigrationsEntry::Path(path) => Some(path.as_str()),
                    MigrationsEntry::Config { migrations } => migrations.as_deref(),
                })
        }
    }
}

/// Fetches migration metadata from an npm-compatible registry.
///
/// The version document comes from `{registry}/{name}/{version}`; the
/// migrations file it points at is read from `{files}/{name}@{version}/{path}`.
pub struct NpmRegistry {
    http_client: HttpClient,
    registry_url: String,
    files_url: String,
}

impl NpmRegistry {
    pub fn new(http_client: HttpClient, registry_url: &str, files_url: &str) -> Self {
        Self {
            http_client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
            files_url: files_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    pub fn files_url(&self) -> &str {
        &self.files_url
    }

    /// Returns: `<registry>/<name>/<version>`, with the scope separator escaped.
    pub fn version_url(&self, package: &str, version: &str) -> String {
        format!(
            "{}/{}/{}",
            self.registry_url,
            package.replacen('/', "%2f", 1),
            version
        )
    }

    /// Returns: `<files>/<name>@<version>/<path>`
    pub fn file_url(&self, package: &str, version: &str, path: &str) -> String {
        let path = path.trim_start_matches("./").trim_start_matches('/');
        format!("{}/{}@{}/{}", self.files_url, package, version, path)
    }
}

#[async_trait]
impl MetadataSource for NpmRegistry {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, package: &str, version: &str) -> Result<Option<MigrationMetadata>> {
        let url = self.version_url(package, version);
        debug!("Fetching version document from {}...", url);

        let Some(document) = self
            .http_client
            .get_json_optional::<api::VersionDocument>(&url)
            .await
            .with_context(|| format!("Failed to fetch {}@{}", package, version))?
        else {
            return Ok(None);
        };

        let mut metadata = MigrationMetadata {
            version: document.version.clone(),
            ..Default::default()
        };

        let Some(path) = document.migrations_path() else {
            debug!("{}@{} publishes no migrations", package, document.version);
            return Ok(Some(metadata));
        };

        let url = self.file_url(package, &document.version, path);
        debug!("Fetching migrations from {}...", url);

        match self
            .http_client
            .get_json_optional::<api::MigrationsFile>(&url)
            .await
            .with_context(|| format!("Failed to fetch migrations of {}", package))?
        {
            Some(file) => {
                metadata.package_json_updates = file.package_json_updates;
                metadata.migration_generators = file.generators;
            }
            None => warn!(
                "{}@{} declares migrations at {} but the file was not found",
                package, document.version, path
            ),
        }

        Ok(Some(metadata))
    }
}
