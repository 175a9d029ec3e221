//! Highest version resolved per package during one traversal.

use indexmap::IndexMap;

use crate::package::VersionOrder;

/// Tracks the highest version resolved so far for every visited package.
///
/// Doubles as the cycle guard: a request that does not exceed what is already
/// recorded is never processed again.
#[derive(Debug, Default)]
pub struct VersionLedger {
    versions: IndexMap<String, String>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// False iff a version `>= requested` is already recorded for `package`.
    pub fn should_process(&self, package: &str, requested: &str) -> bool {
        match self.versions.get(package) {
            Some(recorded) => !VersionOrder::gte(recorded, requested),
            None => true,
        }
    }

    /// Record a resolved version. Keeps the existing entry unless the new one
    /// is strictly greater. Returns whether the ledger changed.
    pub fn record(&mut self, package: &str, resolved: &str) -> bool {
        if let Some(recorded) = self.versions.get_mut(package) {
            if !VersionOrder::gt(resolved, recorded.as_str()) {
                return false;
            }
            *recorded = resolved.to_string();
            return true;
        }

        self.versions.insert(package.to_string(), resolved.to_string());
        true
    }

    pub fn get(&self, package: &str) -> Option<&str> {
        self.versions.get(package).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Package -> version, in the order packages were first recorded.
    pub fn into_versions(self) -> IndexMap<String, String> {
        self.versions
    }
}
