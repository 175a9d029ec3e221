//! Parsing of migrate targets and `--from` / `--to` package lists.

use anyhow::{Result, anyhow, bail};
use indexmap::IndexMap;
use std::str::FromStr;

use crate::package::VersionOrder;

/// Package migrated when the target names only a version.
pub const DEFAULT_PACKAGE: &str = "@nrwl/workspace";

/// Version used when the target names only a package.
pub const DEFAULT_VERSION: &str = "latest";

/// What to migrate to.
/// Format: "name", "name@version", "@scope/name@version", or a bare version
#[derive(Debug, PartialEq, Clone)]
pub struct TargetSpec {
    pub package: String,
    pub version: String,
}

impl std::fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.package, self.version)
    }
}

impl FromStr for TargetSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            bail!("Invalid target: expected 'package@version', 'package' or 'version'.");
        }

        if let Some((package, version)) = split_package_version(s) {
            if version.is_empty() {
                bail!("Invalid target '{}': version after @ cannot be empty.", s);
            }
            return Ok(TargetSpec {
                package: package.to_string(),
                version: VersionOrder::normalize(version),
            });
        }

        if is_version_or_tag(s) {
            Ok(TargetSpec {
                package: DEFAULT_PACKAGE.to_string(),
                version: VersionOrder::normalize(s),
            })
        } else {
            Ok(TargetSpec {
                package: s.to_string(),
                version: DEFAULT_VERSION.to_string(),
            })
        }
    }
}

/// Parse a comma-separated `name@version` list as given to `--from` / `--to`.
pub fn parse_package_versions(list: &str) -> Result<IndexMap<String, String>> {
    let mut versions = IndexMap::new();
    for pair in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (package, version) = split_package_version(pair)
            .filter(|(_, version)| !version.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "Incorrect '{}' format. Use 'package@version', e.g. '@nrwl/workspace@9.0.0'.",
                    pair
                )
            })?;
        versions.insert(package.to_string(), VersionOrder::normalize(version));
    }
    Ok(versions)
}

/// Split at the last `@` that is not the scope marker.
fn split_package_version(s: &str) -> Option<(&str, &str)> {
    let at_pos = s.rfind('@').filter(|&pos| pos > 0)?;
    let (package, version) = s.split_at(at_pos);
    Some((package, &version[1..]))
}

fn is_version_or_tag(s: &str) -> bool {
    matches!(s, "latest" | "next") || VersionOrder::parse_plain(s).is_some()
}
