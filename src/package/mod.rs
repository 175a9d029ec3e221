//! Workspace package state.
//!
//! This module covers what is installed in a workspace, what its manifest
//! declares, and how package versions are ordered.

mod installed;
mod manifest;
mod version;

pub use installed::{InstalledVersions, VersionOverrides, WorkspaceVersions};
pub use manifest::{DependencyChange, PackageJsonManifest};
pub use version::VersionOrder;

#[cfg(test)]
pub use installed::MockInstalledVersions;
