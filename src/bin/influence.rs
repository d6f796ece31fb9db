use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use gridiron_influence::core::{
    config::Config,
    influence::PlayInfluence,
    play::{PlayRow, Role},
};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt};

#[derive(Parser, Debug)]
#[command(name = "influence")]
#[command(about = "Compute player influence and team control surfaces for a play", long_about = None)]
struct Cli {
    /// TOML file with one `[[rows]]` table per player-play row.
    rows: PathBuf,
    /// Zero-based index of the play within the rows.
    #[arg(short, long, default_value_t = 0)]
    play: usize,
    /// TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Cells with control within this distance of 0.5 count as contested.
    #[arg(long, default_value_t = 0.05)]
    contested_band: f64,
}

#[derive(Debug, Deserialize)]
struct RowsFile {
    rows: Vec<PlayRow>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Influence computation failed: {e:#}");
        std::process::exit(1);
    }
}

#[tracing::instrument(level = "info")]
fn run() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging().context("Failed to set up logging")?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    debug!("Using config {config:?}");

    let contents = fs::read_to_string(&cli.rows)
        .with_context(|| format!("Could not read rows file '{}'", cli.rows.display()))?;
    let file: RowsFile = toml::from_str(&contents)
        .with_context(|| format!("Could not parse rows file '{}'", cli.rows.display()))?;
    info!("Read {} rows", file.rows.len());

    let (play, influence) = PlayInfluence::from_rows(&file.rows, cli.play, &config)
        .with_context(|| format!("Failed to compute influence for play {}", cli.play))?;

    let carrier = &play.players()[play.ball_carrier()];
    info!(
        "Ball carrier {} in row {} at ({:.1}, {:.1})",
        carrier.nfl_id,
        play.ball_carrier(),
        carrier.position.x,
        carrier.position.y
    );

    let clearance = play.carrier_clearance();
    let nearest = &play.players()[clearance.nearest.0];
    info!(
        "Nearest opponent {} is {:.2} yards away",
        nearest.nfl_id, clearance.nearest.1
    );

    for (index, raster) in influence.rasters.iter().enumerate() {
        let role = play.role(index).unwrap_or(Role::TeamB);
        debug!(
            "Row {index:>2} ({role}): peak density {:.4}",
            raster.peak()
        );
    }

    let summary = influence
        .surfaces
        .summary(cli.contested_band)
        .context("Failed to summarize control surface")?;
    info!(
        "Team A stronghold at ({:.0}, {:.0}), team B stronghold at ({:.0}, {:.0})",
        summary.team_a_stronghold.0,
        summary.team_a_stronghold.1,
        summary.team_b_stronghold.0,
        summary.team_b_stronghold.1
    );
    info!(
        "Mean control {:.4}, {:.1}% of cells contested",
        summary.mean_control,
        summary.contested_fraction * 100.0
    );

    Ok(())
}

/// Logs to stdout and, when the log directory is writable, to a daily file.
/// The returned guard flushes the file writer on drop.
fn setup_logging() -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("Influence")
        .filename_suffix("log")
        .build("./logs")
    {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::Layer::new()
                .with_writer(writer)
                .with_line_number(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Warning: Could not set up file logging ({e}), using stdout only");
            (None, None)
        }
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_thread_names(true),
        )
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}
