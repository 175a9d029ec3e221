//! Reading and rewriting the workspace `package.json`.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Dependency sections, in the order they are searched for a package.
const DEPENDENCY_SECTIONS: [&str; 2] = ["devDependencies", "dependencies"];

/// A dependency whose declared version was changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyChange {
    pub package: String,
    pub section: &'static str,
    pub from: String,
    pub to: String,
}

/// The workspace dependency manifest, with key order preserved.
pub struct PackageJsonManifest<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    json: Value,
}

impl<'a, R: Runtime> PackageJsonManifest<'a, R> {
    /// Load `<root>/package.json`.
    pub fn load(runtime: &'a R, root: &Path) -> Result<Self> {
        let path = root.join("package.json");
        let content = runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read manifest {:?}", path))?;
        let json: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {:?}", path))?;
        if !json.is_object() {
            anyhow::bail!("Manifest {:?} is not a JSON object", path);
        }

        Ok(Self {
            runtime,
            path,
            json,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared version of a package, from `devDependencies` or `dependencies`.
    pub fn declared_version(&self, package: &str) -> Option<&str> {
        let section = self.declared_section(package)?;
        self.json.get(section)?.get(package)?.as_str()
    }

    fn declared_section(&self, package: &str) -> Option<&'static str> {
        DEPENDENCY_SECTIONS
            .iter()
            .copied()
            .find(|section| {
                self.json
                    .get(section)
                    .and_then(|deps| deps.get(package))
                    .is_some()
            })
    }

    /// Set the version of every listed package that the manifest already
    /// declares. Packages the manifest does not declare are left out.
    pub fn apply(&mut self, versions: &IndexMap<String, String>) -> Vec<DependencyChange> {
        let mut changes = Vec::new();

        for (package, version) in versions {
            let Some(section) = self.declared_section(package) else {
                debug!("{} is not declared in {:?}, skipping", package, self.path);
                continue;
            };

            let from = self.declared_version(package).unwrap_or_default().to_string();
            if from == *version {
                continue;
            }

            let Some(entry) = self
                .json
                .get_mut(section)
                .and_then(|deps| deps.get_mut(package))
            else {
                continue;
            };

            *entry = Value::String(version.clone());
            changes.push(DependencyChange {
                package: package.clone(),
                section,
                from,
                to: version.clone(),
            });
        }

        changes
    }

    /// Write the manifest back, pretty-printed with a trailing newline.
    pub fn save(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.json)?;
        content.push('\n');
        self.runtime
            .write(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to save manifest to {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::sync::{Arc, Mutex};

    const MANIFEST: &str = r#"{
  "name": "workspace",
  "dependencies": {
    "parent": "1.0.0",
    "zeta": "1.0.0"
  },
  "devDependencies": {
    "child": "~1.0.0"
  }
}"#;

    fn runtime_with_manifest(content: &'static str) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/ws/package.json")))
            .returning(move |_| Ok(content.to_string()));
        runtime
    }

    fn versions(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(p, v)| (p.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_and_declared_version() {
        let runtime = runtime_with_manifest(MANIFEST);
        let manifest = PackageJsonManifest::load(&runtime, Path::new("/ws")).unwrap();

        assert_eq!(manifest.path(), Path::new("/ws/package.json"));
        assert_eq!(manifest.declared_version("parent"), Some("1.0.0"));
        assert_eq!(manifest.declared_version("child"), Some("~1.0.0"));
        assert_eq!(manifest.declared_version("missing"), None);
    }

    #[test]
    fn test_load_rejects_non_object() {
        let runtime = runtime_with_manifest("[]");
        let result = PackageJsonManifest::load(&runtime, Path::new("/ws"));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_updates_declared_packages_only() {
        let runtime = runtime_with_manifest(MANIFEST);
        let mut manifest = PackageJsonManifest::load(&runtime, Path::new("/ws")).unwrap();

        let changes = manifest.apply(&versions(&[
            ("parent", "2.0.0"),
            ("child", "2.0.0"),
            ("undeclared", "2.0.0"),
        ]));

        assert_eq!(
            changes,
            vec![
                DependencyChange {
                    package: "parent".into(),
                    section: "dependencies",
                    from: "1.0.0".into(),
                    to: "2.0.0".into(),
                },
                DependencyChange {
                    package: "child".into(),
                    section: "devDependencies",
                    from: "~1.0.0".into(),
                    to: "2.0.0".into(),
                },
            ]
        );
        assert_eq!(manifest.declared_version("parent"), Some("2.0.0"));
        assert_eq!(manifest.declared_version("undeclared"), None);
    }

    #[test]
    fn test_apply_prefers_dev_dependencies() {
        let runtime = runtime_with_manifest(
            r#"{
  "dependencies": { "parent": "0.9.0" },
  "devDependencies": { "parent": "1.0.0" }
}"#,
        );
        let mut manifest = PackageJsonManifest::load(&runtime, Path::new("/ws")).unwrap();
        assert_eq!(manifest.declared_version("parent"), Some("1.0.0"));

        let changes = manifest.apply(&versions(&[("parent", "2.0.0")]));

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].section, "devDependencies");
        assert_eq!(changes[0].from, "1.0.0");
        assert_eq!(manifest.json["dependencies"]["parent"], "0.9.0");
        assert_eq!(manifest.json["devDependencies"]["parent"], "2.0.0");
    }

    #[test]
    fn test_apply_skips_unchanged_versions() {
        let runtime = runtime_with_manifest(MANIFEST);
        let mut manifest = PackageJsonManifest::load(&runtime, Path::new("/ws")).unwrap();

        let changes = manifest.apply(&versions(&[("parent", "1.0.0")]));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_save_preserves_key_order() {
        let mut runtime = runtime_with_manifest(MANIFEST);
        let written = Arc::new(Mutex::new(String::new()));
        let written_clone = written.clone();
        runtime
            .expect_write()
            .with(eq(PathBuf::from("/ws/package.json")), mockall::predicate::always())
            .returning(move |_, contents| {
                *written_clone.lock().unwrap() = String::from_utf8(contents.to_vec()).unwrap();
                Ok(())
            });

        let mut manifest = PackageJsonManifest::load(&runtime, Path::new("/ws")).unwrap();
        manifest.apply(&versions(&[("zeta", "2.0.0")]));
        manifest.save().unwrap();

        let written = written.lock().unwrap().clone();
        assert!(written.ends_with("}\n"));
        let parent_at = written.find("\"parent\"").unwrap();
        let zeta_at = written.find("\"zeta\": \"2.0.0\"").unwrap();
        let dev_at = written.find("\"devDependencies\"").unwrap();
        assert!(parent_at < zeta_at);
        assert!(zeta_at < dev_at);
    }
}
