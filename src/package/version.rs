//! Semantic-version ordering for package versions.
//!
//! Manifest versions are compared the way a package manager would: leading
//! `v`, `=`, `^` and `~` are ignored, missing minor/patch components count as
//! zero, and build metadata does not affect ordering.

use semver::Version;
use std::cmp::Ordering;

/// Version ordering - pure functions over version strings.
pub struct VersionOrder;

impl VersionOrder {
    /// Parse a version string leniently.
    ///
    /// Returns `None` for dist-tags (`latest`, `next`) and anything else that
    /// is not a version.
    pub fn parse(version: &str) -> Option<Version> {
        let trimmed = version
            .trim()
            .trim_start_matches(['=', '^', '~'])
            .trim_start_matches('v');

        Self::parse_plain(trimmed)
    }

    /// Parse `N`, `N.N` or `N.N.N` with an optional pre-release or build
    /// suffix. Prefixes and ranges are rejected.
    pub fn parse_plain(version: &str) -> Option<Version> {
        if !version.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let split_at = version.find(['-', '+']).unwrap_or(version.len());
        let (core, suffix) = version.split_at(split_at);
        let padded = match core.split('.').count() {
            1 => format!("{}.0.0{}", core, suffix),
            2 => format!("{}.0{}", core, suffix),
            _ => version.to_string(),
        };

        Version::parse(&padded).ok()
    }

    /// Normalize a user-supplied version (`9` -> `9.0.0`, `9.1` -> `9.1.0`).
    ///
    /// Values that are not plain versions (dist-tags, ranges) are returned
    /// unchanged.
    pub fn normalize(version: &str) -> String {
        match Self::parse_plain(version.trim()) {
            Some(v) => v.to_string(),
            None => version.to_string(),
        }
    }

    /// Compare two version strings by semantic-version precedence.
    ///
    /// Unparseable versions sort below every parseable one; two unparseable
    /// versions fall back to string comparison.
    pub fn compare(a: &str, b: &str) -> Ordering {
        match (Self::parse(a), Self::parse(b)) {
            (Some(va), Some(vb)) => va.cmp_precedence(&vb),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => a.cmp(b),
        }
    }

    pub fn gt(a: &str, b: &str) -> bool {
        Self::compare(a, b) == Ordering::Greater
    }

    pub fn gte(a: &str, b: &str) -> bool {
        Self::compare(a, b) != Ordering::Less
    }

    /// Whether an update or generator published for `threshold` has not been
    /// applied yet to a package installed at `installed`.
    ///
    /// A package that is not installed is below every threshold.
    pub fn is_pending(installed: Option<&str>, threshold: &str) -> bool {
        match installed {
            Some(installed) => Self::gt(threshold, installed),
            None => true,
        }
    }
}
