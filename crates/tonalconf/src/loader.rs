//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, TonalConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli). Only returns
/// files that exist.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/tonal/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("tonal/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("tonal.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Layer a TOML file over `config`.
pub fn load_into(config: &mut TonalConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Layer TOML text over `config`. Keys absent from the text keep their
/// current value, so later files only override what they mention.
pub fn apply_toml(config: &mut TonalConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let bad = |key: &str, expected: &str| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("`{}` must be {}", key, expected),
    };

    if let Some(analysis) = table.get("analysis").and_then(|v| v.as_table()) {
        let a = &mut config.analysis;

        if let Some(v) = analysis.get("profile") {
            a.profile = v.as_str().ok_or_else(|| bad("analysis.profile", "a string"))?.to_string();
        }
        for (key, slot) in [
            ("window_bars", &mut a.window_bars),
            ("hop_bars", &mut a.hop_bars),
            ("chord_window_bars", &mut a.chord_window_bars),
            ("confidence_threshold", &mut a.confidence_threshold),
            ("tempo_bpm", &mut a.tempo_bpm),
            ("beats_per_bar", &mut a.beats_per_bar),
        ] {
            if let Some(v) = analysis.get(key) {
                *slot = as_number(v).ok_or_else(|| bad(key, "a number"))?;
            }
        }
        if let Some(v) = analysis.get("min_stable_windows") {
            a.min_stable_windows = v
                .as_integer()
                .and_then(|i| u32::try_from(i).ok())
                .ok_or_else(|| bad("min_stable_windows", "a non-negative integer"))?;
        }

        if let Some(scoring) = analysis.get("scoring").and_then(|v| v.as_table()) {
            for (key, slot) in [
                ("diatonic_bonus", &mut a.scoring.diatonic_bonus),
                ("non_chord_penalty", &mut a.scoring.non_chord_penalty),
                ("missing_tone_weight", &mut a.scoring.missing_tone_weight),
            ] {
                if let Some(v) = scoring.get(key) {
                    *slot = as_number(v).ok_or_else(|| bad(key, "a number"))?;
                }
            }
            if let Some(prefs) = scoring.get("quality_preference").and_then(|v| v.as_table()) {
                for (quality, bias) in prefs {
                    let bias = as_number(bias).ok_or_else(|| bad(quality.as_str(), "a number"))?;
                    a.scoring.quality_preference.insert(quality.clone(), bias);
                }
            }
        }

        if let Some(tension) = analysis.get("tension").and_then(|v| v.as_table()) {
            for (key, slot) in [
                ("hierarchical", &mut a.tension.hierarchical),
                ("dissonance", &mut a.tension.dissonance),
                ("motion", &mut a.tension.motion),
                ("tendency", &mut a.tension.tendency),
            ] {
                if let Some(v) = tension.get(key) {
                    *slot = as_number(v).ok_or_else(|| bad(key, "a number"))?;
                }
            }
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(())
}

/// TOML integers are accepted where a float is expected (`window_bars = 4`).
fn as_number(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut TonalConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |name| env::var(name).ok());
}

/// Apply `TONAL_*` overrides read through `lookup`. Unparsable numbers are
/// ignored and leave the file value in place.
pub fn apply_overrides_from(
    config: &mut TonalConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let a = &mut config.analysis;

    if let Some(v) = lookup("TONAL_PROFILE") {
        a.profile = v;
        sources.env_overrides.push("TONAL_PROFILE".to_string());
    }

    for (name, slot) in [
        ("TONAL_WINDOW_BARS", &mut a.window_bars),
        ("TONAL_HOP_BARS", &mut a.hop_bars),
        ("TONAL_CONFIDENCE_THRESHOLD", &mut a.confidence_threshold),
        ("TONAL_TEMPO_BPM", &mut a.tempo_bpm),
    ] {
        if let Some(parsed) = lookup(name).and_then(|v| v.parse().ok()) {
            *slot = parsed;
            sources.env_overrides.push(name.to_string());
        }
    }

    if let Some(parsed) = lookup("TONAL_MIN_STABLE_WINDOWS").and_then(|v| v.parse().ok()) {
        a.min_stable_windows = parsed;
        sources
            .env_overrides
            .push("TONAL_MIN_STABLE_WINDOWS".to_string());
    }

    if let Some(v) = lookup("TONAL_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("TONAL_LOG_LEVEL".to_string());
    }
}
