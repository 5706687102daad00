//! CLI command implementations

use std::path::Path;

use anyhow::{Context, Result};
use tonal_engine::{Analyzer, ProfileRegistry};
use tonalconf::{ConfigSources, TonalConfig};
use tracing::info;

use crate::report;
use crate::OutputFormat;

pub struct AnalyzeOptions {
    pub profile: Option<String>,
    pub format: OutputFormat,
    pub tempo: Option<f64>,
    pub beats_per_bar: Option<f64>,
}

/// Analyze a MIDI file and print the result.
///
/// The bar grid comes from the command line when given, then from the
/// file's first tempo and time signature, then from configuration.
pub fn analyze(path: &Path, options: &AnalyzeOptions, config: &TonalConfig) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let import = note_stream::read_midi(&bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut settings = config.analysis.clone();
    if let Some(profile) = &options.profile {
        settings.profile = profile.clone();
    }
    settings.tempo_bpm = options
        .tempo
        .or_else(|| import.context.initial_bpm())
        .unwrap_or(settings.tempo_bpm);
    settings.beats_per_bar = options
        .beats_per_bar
        .or_else(|| import.context.beats_per_bar())
        .unwrap_or(settings.beats_per_bar);

    info!(
        file = %path.display(),
        notes = import.notes.len(),
        tempo_bpm = settings.tempo_bpm,
        beats_per_bar = settings.beats_per_bar,
        profile = %settings.profile,
        "analyzing"
    );

    let analyzer = Analyzer::builder().settings(settings).build()?;
    let analysis = analyzer.analyze(&import.notes);

    match options.format {
        OutputFormat::Json => {
            let output = serde_json::to_string_pretty(&analysis)?;
            println!("{}", output);
        }
        OutputFormat::Text => {
            print!("{}", report::render(&analysis));
        }
    }

    Ok(())
}

/// List the built-in key profiles with their major-key weights.
pub fn profiles() {
    let registry = ProfileRegistry::builtin();
    for profile in registry.iter() {
        let weights: Vec<String> = profile.major.iter().map(|w| format!("{:.2}", w)).collect();
        println!("{:<10} [{}]", profile.name, weights.join(", "));
    }
}

/// Print the effective configuration, annotated with where it came from.
pub fn show_config(config: &TonalConfig, sources: &ConfigSources) {
    if sources.files.is_empty() {
        println!("# No config files found, using defaults");
    }
    for file in &sources.files {
        println!("# Loaded: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# Override: {}", var);
    }
    println!();
    print!("{}", config.to_toml());
}
