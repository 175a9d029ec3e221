//! Lookup of the versions currently installed in a workspace.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Answers "which version of this package is installed right now?".
#[cfg_attr(test, mockall::automock)]
pub trait InstalledVersions: Send + Sync {
    /// Returns the installed version, or `None` if the package is not installed.
    fn installed_version(&self, package: &str) -> Option<String>;
}

#[derive(Deserialize)]
struct InstalledPackageJson {
    version: Option<String>,
}

/// Reads installed versions from `<root>/node_modules/<package>/package.json`.
pub struct WorkspaceVersions<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
}

impl<'a, R: Runtime> WorkspaceVersions<'a, R> {
    pub fn new(runtime: &'a R, root: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            root: root.into(),
        }
    }

    /// Get the package.json path of an installed package.
    ///
    /// Returns: `<root>/node_modules/<package>/package.json`
    pub fn package_json_path(&self, package: &str) -> PathBuf {
        let mut path = self.root.join("node_modules");
        // Scoped names ("@scope/name") span two directories.
        for segment in package.split('/') {
            path.push(segment);
        }
        path.join("package.json")
    }

    fn read_version(&self, path: &Path) -> Option<String> {
        let content = match self.runtime.read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_str::<InstalledPackageJson>(&content) {
            Ok(json) => json.version,
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                None
            }
        }
    }
}

impl<R: Runtime> InstalledVersions for WorkspaceVersions<'_, R> {
    fn installed_version(&self, package: &str) -> Option<String> {
        let path = self.package_json_path(package);
        if !self.runtime.exists(&path) {
            debug!("{} is not installed", package);
            return None;
        }
        self.read_version(&path)
    }
}

/// Overrides the installed version of selected packages.
///
/// Lets a migration be computed as if the workspace were still on an older
/// version of a package than the one actually present.
pub struct VersionOverrides<'a> {
    inner: &'a dyn InstalledVersions,
    overrides: IndexMap<String, String>,
}

impl<'a> VersionOverrides<'a> {
    pub fn new(inner: &'a dyn InstalledVersions, overrides: IndexMap<String, String>) -> Self {
        Self { inner, overrides }
    }
}

impl InstalledVersions for VersionOverrides<'_> {
    fn installed_version(&self, package: &str) -> Option<String> {
        match self.overrides.get(package) {
            Some(version) => Some(version.clone()),
            None => self.inner.installed_version(package),
        }
    }
}
