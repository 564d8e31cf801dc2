mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use coslift::PipelineError;
use coslift::build::ArchiveError;

#[derive(Parser)]
#[command(
    name = "coslift",
    about = "Upload Vercel build sources to IBM Cloud Object Storage"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive the source tree and upload it to COS
    Deploy {
        /// Path to coslift.toml (default: ./coslift.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
        /// Directory to archive, overriding `source_dir` from the config
        #[arg(long, short = 's')]
        source: Option<PathBuf>,
        /// Keep the local archive after a successful upload
        #[arg(long)]
        keep_archive: bool,
    },
    /// Build the source archive locally without uploading
    Archive {
        /// Directory to archive
        #[arg(long, short = 's', default_value = ".")]
        source: PathBuf,
        /// Output zip path (default: a timestamped file in the temp directory)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Exclusion pattern; repeat to build a list that replaces the defaults
        #[arg(long = "exclude", short = 'x', value_name = "PATTERN")]
        exclude: Vec<String>,
    },
    /// Show the resolved configuration (secrets are never printed)
    Config {
        /// Path to coslift.toml (default: ./coslift.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                // arch-lint: allow(no-error-swallowing) reason="unset or invalid RUST_LOG falls back to info"
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Deploy {
            config,
            source,
            keep_archive,
        } => commands::deploy(config.as_deref(), source.as_deref(), keep_archive).await?,
        Commands::Archive {
            source,
            output,
            exclude,
        } => commands::archive(&source, output.as_deref(), &exclude)?,
        Commands::Config { config } => commands::show_config(config.as_deref())?,
    }
    Ok(())
}

/// Exit code by error kind: 1 configuration, 2 credentials, 3 source or
/// archive, 4 upload.
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<PipelineError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<ArchiveError>().is_some() {
        return 3;
    }
    1
}
