use anyhow::Result;
use clap::Parser;
use migrator::commands::migrate;
use std::path::PathBuf;

/// migrator - Workspace package migrator
///
/// Resolve the package.json updates and migrations needed to move a workspace
/// to a new package version.
///
/// If the NPM_TOKEN environment variable is set, it will be used for authentication
/// against the registry.
///
/// Examples:
///   migrator migrate 9                          # Update @nrwl/workspace to 9.0.0
///   migrator migrate @nrwl/workspace@next       # Update to the next dist-tag
///   migrator migrate @nrwl/workspace --from @nrwl/workspace@8.0.0
#[derive(Parser, Debug)]
#[command(author, version = env!("MIGRATOR_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root directory (defaults to the current directory; also via MIGRATOR_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "MIGRATOR_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Registry URL (defaults to https://registry.npmjs.org)
    #[arg(
        long = "registry",
        env = "MIGRATOR_REGISTRY",
        value_name = "URL",
        global = true
    )]
    pub registry_url: Option<String>,

    /// URL serving published package files (defaults to https://unpkg.com)
    #[arg(
        long = "files-url",
        env = "MIGRATOR_FILES_URL",
        value_name = "URL",
        global = true
    )]
    pub files_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Update package.json and write migrations.json for a package update
    Migrate(MigrateArgs),
}

#[derive(clap::Args, Debug)]
pub struct MigrateArgs {
    /// Target in the format "package@version", "package" or "version"
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Treat packages as installed at these versions ("pkg@version,...")
    #[arg(long, value_name = "PACKAGES")]
    pub from: Option<String>,

    /// Pin packages to these versions ("pkg@version,...")
    #[arg(long, value_name = "PACKAGES")]
    pub to: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = migrator::runtime::RealRuntime;

    match cli.command {
        Commands::Migrate(args) => {
            migrate(
                runtime,
                &args.target,
                args.from.as_deref(),
                args.to.as_deref(),
                cli.root,
                cli.registry_url,
                cli.files_url,
            )
            .await?
        }
    }
    Ok(())
}
