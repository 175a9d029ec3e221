use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    application::{MigrateOptions, MigrateReport, MigrateUseCase},
    runtime::Runtime,
};

pub mod config;
mod target;

pub use target::{DEFAULT_PACKAGE, DEFAULT_VERSION, TargetSpec, parse_package_versions};

use config::Config;

/// Resolve a package update and record it in the workspace
#[tracing::instrument(skip(runtime, root, registry_url, files_url))]
pub async fn migrate<R: Runtime>(
    runtime: R,
    target: &str,
    from: Option<&str>,
    to: Option<&str>,
    root: Option<PathBuf>,
    registry_url: Option<String>,
    files_url: Option<String>,
) -> Result<()> {
    let spec = target.parse::<TargetSpec>()?;
    let options = MigrateOptions {
        package: spec.package.clone(),
        version: spec.version.clone(),
        from: from.map(parse_package_versions).transpose()?.unwrap_or_default(),
        to: to.map(parse_package_versions).transpose()?.unwrap_or_default(),
    };
    debug!("Migrate options: {:?}", options);

    let config = Config::new(runtime, root, registry_url, files_url)?;
    let use_case = MigrateUseCase::new(&config.runtime, &config.registry, config.root.clone());

    println!("Fetching {}", spec);
    let report = use_case.execute(&options).await?;
    print_report(&report);

    Ok(())
}

fn print_report(report: &MigrateReport) {
    if report.changes.is_empty() && report.resolution.migrations.is_empty() {
        println!("Nothing to update.");
        return;
    }

    for change in &report.changes {
        println!(
            "  {} {} -> {} ({})",
            change.package, change.from, change.to, change.section
        );
    }

    for migration in &report.resolution.migrations {
        match &migration.description {
            Some(description) => println!(
                "  - {}: {} ({}): {}",
                migration.package, migration.name, migration.version, description
            ),
            None => println!(
                "  - {}: {} ({})",
                migration.package, migration.name, migration.version
            ),
        }
    }

    println!();
    println!("Updated {} package(s) in package.json.", report.changes.len());
    match &report.migrations_file {
        Some(path) => println!(
            "Wrote {} migration(s) to {}.",
            report.resolution.migrations.len(),
            path.display()
        ),
        None => println!("No migrations to run."),
    }
}
