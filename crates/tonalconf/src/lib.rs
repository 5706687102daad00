//! Minimal configuration loading for the tonal analysis engine.
//!
//! This crate only knows how to find, parse and layer configuration. It
//! does not validate musical settings; `tonal-engine` does that when it
//! builds an analyzer, so malformed values fail before any note is read.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/tonal/config.toml` (system)
//! 2. `~/.config/tonal/config.toml` (user)
//! 3. `./tonal.toml` (local override, replaced by an explicit path)
//! 4. Environment variables (`TONAL_*`)
//!
//! # Example Config
//!
//! ```toml
//! [analysis]
//! profile = "temperley"
//! window_bars = 4
//! hop_bars = 1
//! min_stable_windows = 3
//! confidence_threshold = 0.15
//!
//! [analysis.scoring]
//! diatonic_bonus = 0.15
//!
//! [analysis.scoring.quality_preference]
//! dom7 = -0.02
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod analysis;
pub mod loader;

pub use analysis::{AnalysisSettings, ScoringSettings, TelemetryConfig, TensionSettings};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TonalConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl TonalConfig {
    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = TonalConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_into(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> String {
        // Build TOML manually for nicer formatting
        let a = &self.analysis;
        let mut output = String::new();

        output.push_str("# Tonal analysis configuration\n\n");

        output.push_str("[analysis]\n");
        output.push_str(&format!("profile = \"{}\"\n", a.profile));
        output.push_str(&format!("window_bars = {:?}\n", a.window_bars));
        output.push_str(&format!("hop_bars = {:?}\n", a.hop_bars));
        output.push_str(&format!("chord_window_bars = {:?}\n", a.chord_window_bars));
        output.push_str(&format!("min_stable_windows = {}\n", a.min_stable_windows));
        output.push_str(&format!("confidence_threshold = {:?}\n", a.confidence_threshold));
        output.push_str(&format!("tempo_bpm = {:?}\n", a.tempo_bpm));
        output.push_str(&format!("beats_per_bar = {:?}\n", a.beats_per_bar));

        output.push_str("\n[analysis.scoring]\n");
        output.push_str(&format!("diatonic_bonus = {:?}\n", a.scoring.diatonic_bonus));
        output.push_str(&format!("non_chord_penalty = {:?}\n", a.scoring.non_chord_penalty));
        output.push_str(&format!(
            "missing_tone_weight = {:?}\n",
            a.scoring.missing_tone_weight
        ));

        if !a.scoring.quality_preference.is_empty() {
            output.push_str("\n[analysis.scoring.quality_preference]\n");
            for (quality, bias) in &a.scoring.quality_preference {
                output.push_str(&format!("{} = {:?}\n", quality, bias));
            }
        }

        output.push_str("\n[analysis.tension]\n");
        output.push_str(&format!("hierarchical = {:?}\n", a.tension.hierarchical));
        output.push_str(&format!("dissonance = {:?}\n", a.tension.dissonance));
        output.push_str(&format!("motion = {:?}\n", a.tension.motion));
        output.push_str(&format!("tendency = {:?}\n", a.tension.tendency));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TonalConfig::default();
        assert_eq!(config.analysis.profile, "krumhansl");
        assert_eq!(config.analysis.window_bars, 4.0);
        assert_eq!(config.analysis.min_stable_windows, 3);
        assert_eq!(config.analysis.scoring.diatonic_bonus, 0.15);
        assert_eq!(config.analysis.scoring.missing_tone_weight, 0.0);
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn test_to_toml_reparses() {
        let mut config = TonalConfig::default();
        config.analysis.profile = "shaath".to_string();
        config
            .analysis
            .scoring
            .quality_preference
            .insert("dom7".to_string(), -0.05);

        let toml = config.to_toml();
        assert!(toml.contains("[analysis]"));
        assert!(toml.contains("[analysis.scoring.quality_preference]"));

        let mut reparsed = TonalConfig::default();
        loader::apply_toml(&mut reparsed, &toml, Path::new("rendered.toml")).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_explicit_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[analysis]\nprofile = \"diatonic\"\nhop_bars = 0.5\n").unwrap();

        let (config, sources) = TonalConfig::load_with_sources_from(Some(&path)).unwrap();
        assert_eq!(config.analysis.profile, "diatonic");
        assert_eq!(config.analysis.hop_bars, 0.5);
        assert!(sources.files.contains(&path));
    }
}
