//! tonal - harmonic analysis of MIDI files
//!
//! Subcommands:
//! - `tonal analyze <file.mid>` - Key regions, chords, tension and cadences
//! - `tonal profiles` - List available key profiles
//! - `tonal config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tonalconf::TonalConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod report;

#[derive(Parser)]
#[command(name = "tonal")]
#[command(about = "Real-time tonal analysis: keys, chords, tension and cadences")]
#[command(version)]
struct Cli {
    /// Config file, replacing ./tonal.toml
    #[arg(long, global = true, env = "TONAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a Standard MIDI File
    Analyze {
        /// Path to a .mid file
        file: PathBuf,

        /// Key profile (krumhansl, temperley, shaath, diatonic)
        #[arg(short, long)]
        profile: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Tempo for the bar grid, overriding the file's first tempo
        #[arg(long)]
        tempo: Option<f64>,

        /// Beats per bar, overriding the file's first time signature
        #[arg(long)]
        beats_per_bar: Option<f64>,
    },

    /// List available key profiles
    Profiles,

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
    }

    let (config, sources) = TonalConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    // Logs go to stderr so JSON on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            file,
            profile,
            format,
            tempo,
            beats_per_bar,
        } => {
            let options = commands::AnalyzeOptions {
                profile,
                format,
                tempo,
                beats_per_bar,
            };
            commands::analyze(&file, &options, &config)?;
        }
        Commands::Profiles => {
            commands::profiles();
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}
