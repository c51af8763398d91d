use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod server;
mod snapshot;

/// Procedural neural-network backdrop for portfolio sites.
#[derive(Parser)]
#[command(name = "neuroscape")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scene configuration file (.json, .yaml or .yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Random seed; overrides the configuration's seed
    #[arg(short, long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a scene and write it as a snapshot
    Generate {
        /// Snapshot file; `.yaml`/`.yml` writes YAML, anything else JSON
        #[arg(short, long, default_value = "scene.json")]
        output: PathBuf,
    },
    /// Run the animation headless and print one JSON summary per frame
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: usize,

        /// Simulated frame rate
        #[arg(long, default_value = "60")]
        fps: f64,
    },
    /// Serve a site directory with live reload
    Serve {
        /// Directory holding index.html and the wasm bundle
        #[arg(long, default_value = "site")]
        site: PathBuf,

        /// Port to run the server on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { output } => {
            let config = snapshot::load_config(cli.config.as_deref(), cli.seed)?;
            let scene = snapshot::generate(&config);
            snapshot::write_snapshot(&scene, &output)?;
            info!(
                nodes = scene.summary.nodes,
                edges = scene.summary.edges,
                particles = scene.summary.particles,
                isolated = scene.summary.isolated_nodes,
                "generated scene in {}",
                output.display()
            );
        }
        Commands::Simulate { frames, fps } => {
            let config = snapshot::load_config(cli.config.as_deref(), cli.seed)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            snapshot::simulate(&config, frames, fps, |_, summary| {
                writeln!(out, "{}", serde_json::to_string(summary)?)?;
                Ok(())
            })?;
        }
        Commands::Serve { site, port } => {
            server::serve(&site, cli.config.as_deref(), port).await?;
        }
    }

    Ok(())
}
