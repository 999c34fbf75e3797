//! Dependency manifest CLI
//!
//! Entry point for the `depman` command-line tool.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dependency_manifest::{
    assemble, build_metadata, prune_file, HttpReleaseSource, PipelineConfig, PipelineResult,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "depman")]
#[command(about = "Assemble and prune versioned dependency manifests", version)]
struct Cli {
    /// Path to a pipeline config file (TOML); built-in defaults otherwise
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the descriptor for one upstream release and write it as JSON
    Metadata {
        /// Release version
        version: String,

        /// Dependency identifier
        id: String,

        /// Human-readable name
        name: String,

        /// Output file for the JSON descriptor
        output: PathBuf,
    },

    /// Merge verified build outputs into a manifest and prune it
    Assemble {
        /// Dependency identifier; build directories are named `<id>-*`
        id: String,

        /// Directory holding metadata descriptors and build directories
        artifact_root: PathBuf,

        /// Manifest to rewrite in place
        manifest: PathBuf,
    },

    /// Apply a manifest's retention policies in place
    Prune {
        /// Manifest to rewrite in place
        manifest: PathBuf,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> PipelineResult<()> {
    let config = PipelineConfig::load(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Metadata {
            version,
            id,
            name,
            output,
        } => {
            let source = HttpReleaseSource::new();
            build_metadata(&source, &config, &version, &id, &name, &output, &mut out)?;
        }
        Commands::Assemble {
            id,
            artifact_root,
            manifest,
        } => {
            assemble(&id, &artifact_root, &manifest, &config, &mut out)?;
        }
        Commands::Prune { manifest } => {
            prune_file(&manifest, &mut out)?;
        }
    }
    Ok(())
}

/// Diagnostics go to stderr so stdout stays a clean audit trail.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
