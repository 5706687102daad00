//! Analysis settings - the raw, unvalidated configuration bundle.
//!
//! Values here are plain data. The engine validates them when it builds an
//! analyzer, so a bad profile name or a non-positive hop fails at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key-tracking, windowing and bar-grid settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Key profile name: krumhansl, temperley, shaath, diatonic.
    /// Default: krumhansl
    #[serde(default = "AnalysisSettings::default_profile")]
    pub profile: String,

    /// Key-estimation window length in bars.
    /// Default: 4
    #[serde(default = "AnalysisSettings::default_window_bars")]
    pub window_bars: f64,

    /// Hop between successive windows in bars.
    /// Default: 1
    #[serde(default = "AnalysisSettings::default_hop_bars")]
    pub hop_bars: f64,

    /// Chord-detection window length in bars.
    /// Default: 1
    #[serde(default = "AnalysisSettings::default_chord_window_bars")]
    pub chord_window_bars: f64,

    /// Consecutive agreeing hops required before a key change commits.
    /// Default: 3
    #[serde(default = "AnalysisSettings::default_min_stable_windows")]
    pub min_stable_windows: u32,

    /// Confidence margin a new key must hold over the current one.
    /// Default: 0.15
    #[serde(default = "AnalysisSettings::default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Tempo used for the bar grid when the input carries none.
    /// Default: 120
    #[serde(default = "AnalysisSettings::default_tempo_bpm")]
    pub tempo_bpm: f64,

    /// Quarter-note beats per bar.
    /// Default: 4
    #[serde(default = "AnalysisSettings::default_beats_per_bar")]
    pub beats_per_bar: f64,

    #[serde(default)]
    pub scoring: ScoringSettings,

    #[serde(default)]
    pub tension: TensionSettings,
}

impl AnalysisSettings {
    fn default_profile() -> String {
        "krumhansl".to_string()
    }

    fn default_window_bars() -> f64 {
        4.0
    }

    fn default_hop_bars() -> f64 {
        1.0
    }

    fn default_chord_window_bars() -> f64 {
        1.0
    }

    fn default_min_stable_windows() -> u32 {
        3
    }

    fn default_confidence_threshold() -> f64 {
        0.15
    }

    fn default_tempo_bpm() -> f64 {
        120.0
    }

    fn default_beats_per_bar() -> f64 {
        4.0
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            profile: Self::default_profile(),
            window_bars: Self::default_window_bars(),
            hop_bars: Self::default_hop_bars(),
            chord_window_bars: Self::default_chord_window_bars(),
            min_stable_windows: Self::default_min_stable_windows(),
            confidence_threshold: Self::default_confidence_threshold(),
            tempo_bpm: Self::default_tempo_bpm(),
            beats_per_bar: Self::default_beats_per_bar(),
            scoring: ScoringSettings::default(),
            tension: TensionSettings::default(),
        }
    }
}

/// Empirically tuned chord-scoring constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Added when the chord root is diatonic in the active key.
    #[serde(default = "ScoringSettings::default_diatonic_bonus")]
    pub diatonic_bonus: f64,

    /// Multiplies the fraction of energy outside the template.
    #[serde(default = "ScoringSettings::default_non_chord_penalty")]
    pub non_chord_penalty: f64,

    /// Multiplies the fraction of template tones with no energy. Off by
    /// default; raise it to prefer complete chords over partial matches.
    #[serde(default = "ScoringSettings::default_missing_tone_weight")]
    pub missing_tone_weight: f64,

    /// Per-quality bias overrides, keyed by quality name (e.g. `dom7`).
    #[serde(default)]
    pub quality_preference: BTreeMap<String, f64>,
}

impl ScoringSettings {
    fn default_diatonic_bonus() -> f64 {
        0.15
    }

    fn default_non_chord_penalty() -> f64 {
        0.3
    }

    fn default_missing_tone_weight() -> f64 {
        0.0
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            diatonic_bonus: Self::default_diatonic_bonus(),
            non_chord_penalty: Self::default_non_chord_penalty(),
            missing_tone_weight: Self::default_missing_tone_weight(),
            quality_preference: BTreeMap::new(),
        }
    }
}

/// Weights of the four tension components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionSettings {
    #[serde(default = "TensionSettings::default_hierarchical")]
    pub hierarchical: f64,
    #[serde(default = "TensionSettings::default_dissonance")]
    pub dissonance: f64,
    #[serde(default = "TensionSettings::default_motion")]
    pub motion: f64,
    #[serde(default = "TensionSettings::default_tendency")]
    pub tendency: f64,
}

impl TensionSettings {
    fn default_hierarchical() -> f64 {
        0.40
    }

    fn default_dissonance() -> f64 {
        0.25
    }

    fn default_motion() -> f64 {
        0.20
    }

    fn default_tendency() -> f64 {
        0.15
    }
}

impl Default for TensionSettings {
    fn default() -> Self {
        Self {
            hierarchical: Self::default_hierarchical(),
            dissonance: Self::default_dissonance(),
            motion: Self::default_motion(),
            tendency: Self::default_tendency(),
        }
    }
}

/// Logging settings for the binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    /// Default: warn
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
