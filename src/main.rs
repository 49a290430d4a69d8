//! Crosspack command line entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use crosspack::commands::{BuildCommand, CheckCommand, CreateCommand, Session, UpdateCommand};
use crosspack::core::{AppConfig, BuildRequest, CreateRequest, Output, TerminalOutput, APP_NAME, VERSION};
use crosspack::platforms::default_registry;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crosspack")]
#[command(about = "Package web apps with an embedded runtime", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildType {
    Debug,
    Release,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project in the current directory
    Create {
        /// Package ID, e.g. com.example.foo
        package_id: String,

        /// Target platforms, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "android")]
        platforms: Vec<String>,

        /// Channel name, version, release zip or unpacked release directory
        #[arg(long)]
        crosswalk: Option<String>,

        /// ABIs to create the project for, comma separated
        #[arg(short, long, value_delimiter = ',')]
        targets: Vec<String>,

        /// Use the lite runtime
        #[arg(long)]
        lite: bool,

        /// Depend on a shared runtime
        #[arg(long)]
        shared: bool,
    },

    /// Import a different runtime release into a project
    Update {
        /// Channel name, version, release zip or unpacked release directory
        version: Option<String>,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Build packages
    Build {
        #[arg(value_enum, default_value_t = BuildType::Debug)]
        build_type: BuildType,

        /// ABIs to build, comma separated
        #[arg(short, long, value_delimiter = ',')]
        targets: Vec<String>,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Check the host setup
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("{} v{} starting...", APP_NAME, VERSION);

    let output: Arc<dyn Output> = Arc::new(TerminalOutput::new());
    if let Err(e) = run(cli, output.clone()).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Arc<dyn Output>) -> Result<()> {
    let mut config = AppConfig::load().await?;
    config.apply_env();
    config.verbose |= cli.verbose;

    let session = Session::new(config, output.clone(), default_registry());

    match cli.command {
        Commands::Create {
            package_id,
            platforms,
            crosswalk,
            targets,
            lite,
            shared,
        } => {
            let command = CreateCommand {
                parent_dir: std::env::current_dir()?,
                package_id,
                platforms,
                request: CreateRequest {
                    version_spec: crosswalk,
                    targets,
                    lite,
                    shared,
                },
            };
            let root = command.execute(&session).await?;
            output.highlight(&format!("Project created at {}", root.display()));
        }
        Commands::Update { version, dir } => {
            UpdateCommand {
                project_dir: dir,
                version_spec: version,
            }
            .execute(&session)
            .await?;
        }
        Commands::Build {
            build_type,
            targets,
            dir,
        } => {
            let command = BuildCommand {
                project_dir: dir,
                request: BuildRequest {
                    release: matches!(build_type, BuildType::Release),
                    targets,
                },
            };
            let packages = command.execute(&session).await?;
            debug!("Built {} packages", packages.len());
        }
        Commands::Check => {
            if !CheckCommand.execute(&session).is_complete() {
                anyhow::bail!("Missing Android SDK tools");
            }
        }
    }
    Ok(())
}
