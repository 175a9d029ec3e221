use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Mock, Server, ServerGuard};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn create_workspace(root: &Path, dependencies: &[(&str, &str)]) {
    let deps = dependencies
        .iter()
        .map(|(name, version)| format!(r#"    "{}": "{}""#, name, version))
        .collect::<Vec<_>>()
        .join(",\n");
    fs::write(
        root.join("package.json"),
        format!(
            "{{\n  \"name\": \"workspace\",\n  \"dependencies\": {{\n{}\n  }}\n}}\n",
            deps
        ),
    )
    .unwrap();

    for (name, version) in dependencies {
        let dir = root.join("node_modules").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(r#"{{"name": "{}", "version": "{}"}}"#, name, version),
        )
        .unwrap();
    }
}

fn mock_json(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

fn migrator(root: &Path, url: &str) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("migrator"));
    cmd.env_remove("NPM_TOKEN")
        .env_remove("MIGRATOR_REGISTRY")
        .env_remove("MIGRATOR_FILES_URL")
        .arg("--root")
        .arg(root)
        .arg("--registry")
        .arg(url)
        .arg("--files-url")
        .arg(format!("{}/files", url));
    cmd
}

#[test]
fn test_end_to_end_migrate() {
    let mut server = Server::new();
    let url = server.url();

    let _parent = mock_json(
        &mut server,
        "/parent/2.0.0",
        r#"{"name": "parent", "version": "2.0.0", "nx-migrations": "./migrations.json"}"#,
    );
    let _parent_migrations = mock_json(
        &mut server,
        "/files/parent@2.0.0/migrations.json",
        r#"{
            "schematics": {
                "update-to-2": {
                    "version": "2.0.0",
                    "description": "Rename the config file",
                    "factory": "./src/migrations/update-2#run"
                }
            },
            "packageJsonUpdates": {
                "2.0.0": {
                    "version": "2.0.0",
                    "packages": {
                        "child": { "version": "2.0.0" },
                        "optional": { "version": "2.0.0", "ifPackageInstalled": "absent" }
                    }
                }
            }
        }"#,
    );
    let _child = mock_json(
        &mut server,
        "/child/2.0.0",
        r#"{"name": "child", "version": "2.0.0"}"#,
    );

    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    create_workspace(root, &[("parent", "1.0.0"), ("child", "1.0.0")]);

    migrator(root, &url)
        .arg("migrate")
        .arg("parent@2")
        .assert()
        .success()
        .stdout(predicate::str::contains("parent 1.0.0 -> 2.0.0"))
        .stdout(predicate::str::contains("child 1.0.0 -> 2.0.0"))
        .stdout(predicate::str::contains("update-to-2"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("package.json")).unwrap()).unwrap();
    assert_eq!(manifest["dependencies"]["parent"], "2.0.0");
    assert_eq!(manifest["dependencies"]["child"], "2.0.0");
    assert!(manifest["dependencies"].get("optional").is_none());

    let migrations: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("migrations.json")).unwrap()).unwrap();
    assert_eq!(
        migrations,
        serde_json::json!({
            "migrations": [{
                "package": "parent",
                "version": "2.0.0",
                "name": "update-to-2",
                "factory": "./src/migrations/update-2#run",
                "description": "Rename the config file"
            }]
        })
    );
}

#[test]
fn test_migrate_without_migrations_writes_no_file() {
    let mut server = Server::new();
    let url = server.url();

    let _parent = mock_json(
        &mut server,
        "/parent/latest",
        r#"{"name": "parent", "version": "1.1.0"}"#,
    );

    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    create_workspace(root, &[("parent", "1.0.0")]);

    migrator(root, &url)
        .arg("migrate")
        .arg("parent")
        .assert()
        .success()
        .stdout(predicate::str::contains("No migrations to run."));

    let manifest = fs::read_to_string(root.join("package.json")).unwrap();
    assert!(manifest.contains(r#""parent": "1.1.0""#));
    assert!(!root.join("migrations.json").exists());
}

#[test]
fn test_migrate_fails_when_package_not_installed() {
    let server = Server::new();
    let url = server.url();

    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    create_workspace(root, &[("parent", "1.0.0")]);

    migrator(root, &url)
        .arg("migrate")
        .arg("missing@2.0.0")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Cannot find package \"missing\" installed.",
        ));
}

#[test]
fn test_migrate_fails_when_root_metadata_is_unauthorized() {
    let mut server = Server::new();
    let url = server.url();

    let _parent = server.mock("GET", "/parent/2.0.0").with_status(401).create();

    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    create_workspace(root, &[("parent", "1.0.0")]);

    migrator(root, &url)
        .arg("migrate")
        .arg("parent@2.0.0")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed to fetch migration metadata for parent@2.0.0",
        ));

    let manifest = fs::read_to_string(root.join("package.json")).unwrap();
    assert!(manifest.contains(r#""parent": "1.0.0""#));
}

#[test]
fn test_migrate_rejects_malformed_from() {
    let server = Server::new();
    let url = server.url();

    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    create_workspace(root, &[("parent", "1.0.0")]);

    migrator(root, &url)
        .arg("migrate")
        .arg("parent@2.0.0")
        .arg("--from")
        .arg("parent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incorrect 'parent' format"));
}
