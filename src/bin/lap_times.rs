use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dashkit::laps::aggregate::{build_aggregation, load_snapshot, save_snapshot};
use dashkit::laps::config::LapConfig;
use dashkit::laps::model::LapAggregation;
use dashkit::laps::render::{render_all, write_reports};
use dashkit::laps::server::{serve, Dashboard};
use dashkit::laps::telemetry::OpenF1Client;

#[derive(Parser)]
#[command(author, version, about = "Compare F1 lap times across two seasons")]
struct Cli {
    /// Load races, seasons and drivers from YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every race and save the lap data as JSON
    Fetch {
        #[arg(long, default_value = "lap_times.json")]
        save: PathBuf,
    },
    /// Write one standalone HTML chart per race
    Report {
        #[command(flatten)]
        source: DataArgs,
        #[arg(long, default_value = "charts")]
        out_dir: PathBuf,
    },
    /// Serve the race-selector dashboard
    Serve {
        #[command(flatten)]
        source: DataArgs,
        /// Overrides PORT and the config file
        #[arg(long)]
        port: Option<u16>,
        /// File each selection is exported to
        #[arg(long)]
        export: Option<PathBuf>,
        /// Write a new timestamped file per selection instead of overwriting
        #[arg(long, default_value_t = false)]
        versioned: bool,
    },
}

#[derive(Args)]
struct DataArgs {
    /// Use lap data saved by `fetch` instead of fetching again
    #[arg(long)]
    data: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LapConfig::load(path)?,
        None => LapConfig::default(),
    };
    config.apply_env()?;

    match cli.command {
        Command::Fetch { save } => {
            let aggregation = fetch(&config)?;
            save_snapshot(&aggregation, &save)?;
        }
        Command::Report { source, out_dir } => {
            let aggregation = obtain(&config, source.data.as_deref())?;
            let charts = render_all(&aggregation);
            let paths = write_reports(&charts, &out_dir)?;
            println!("Wrote {} charts to {}", paths.len(), out_dir.display());
            if aggregation.failure_count() > 0 {
                println!(
                    "{} race fetches failed; see the notes on the affected charts",
                    aggregation.failure_count()
                );
            }
        }
        Command::Serve {
            source,
            port,
            export,
            versioned,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(export) = export {
                config.export_path = export;
            }
            config.versioned_exports |= versioned;

            let aggregation = obtain(&config, source.data.as_deref())?;
            let dashboard = Dashboard::new(aggregation, config.export_target());
            serve(dashboard, SocketAddr::from(([0, 0, 0, 0], config.port)))?;
        }
    }

    Ok(())
}

fn fetch(config: &LapConfig) -> anyhow::Result<LapAggregation> {
    log::info!(
        "Fetching {} races for {} ({})",
        config.races.len(),
        config.drivers.join(", "),
        config.seasons_label()
    );
    let client = OpenF1Client::new(config).context("creating telemetry client")?;
    Ok(build_aggregation(&client, config))
}

fn obtain(config: &LapConfig, snapshot: Option<&Path>) -> anyhow::Result<LapAggregation> {
    match snapshot {
        Some(path) => load_snapshot(path),
        None => fetch(config),
    }
}
