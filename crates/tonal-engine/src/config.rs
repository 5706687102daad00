//! Validated analysis parameters.
//!
//! `tonalconf` hands over raw settings; everything here has been checked,
//! so the analysis passes themselves never fail.

use tonalconf::AnalysisSettings;

use crate::analyzer::Analyzer;
use crate::chord_templates::ChordScoring;
use crate::pitch_class::WindowGrid;
use crate::profiles::{KeyProfile, ProfileRegistry};
use crate::tension::TensionWeights;
use crate::types::ChordQuality;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub profile: KeyProfile,
    pub window_bars: f64,
    pub hop_bars: f64,
    pub chord_window_bars: f64,
    pub min_stable_windows: usize,
    pub confidence_threshold: f64,
    pub tempo_bpm: f64,
    pub beats_per_bar: f64,
    pub scoring: ChordScoring,
    pub tension: TensionWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            profile: KeyProfile::krumhansl(),
            window_bars: 4.0,
            hop_bars: 1.0,
            chord_window_bars: 1.0,
            min_stable_windows: 3,
            confidence_threshold: 0.15,
            tempo_bpm: 120.0,
            beats_per_bar: 4.0,
            scoring: ChordScoring::default(),
            tension: TensionWeights::default(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be a positive number, got {}", value)))
    }
}

fn weight(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and non-negative, got {}", value)))
    }
}

impl AnalysisConfig {
    /// Resolve the profile by name and validate every field.
    pub fn from_settings(settings: &AnalysisSettings, registry: &ProfileRegistry) -> Result<Self> {
        let profile = registry
            .get(&settings.profile)
            .cloned()
            .ok_or_else(|| Error::UnknownProfile(settings.profile.clone()))?;

        let mut quality_preference = ChordScoring::default_quality_preference();
        for (name, bias) in &settings.scoring.quality_preference {
            let quality: ChordQuality = name
                .parse()
                .map_err(|reason: String| invalid("scoring.quality_preference", reason))?;
            quality_preference.insert(quality, *bias);
        }

        let config = Self {
            profile,
            window_bars: settings.window_bars,
            hop_bars: settings.hop_bars,
            chord_window_bars: settings.chord_window_bars,
            min_stable_windows: settings.min_stable_windows as usize,
            confidence_threshold: settings.confidence_threshold,
            tempo_bpm: settings.tempo_bpm,
            beats_per_bar: settings.beats_per_bar,
            scoring: ChordScoring {
                diatonic_bonus: settings.scoring.diatonic_bonus,
                non_chord_penalty: settings.scoring.non_chord_penalty,
                missing_tone_weight: settings.scoring.missing_tone_weight,
                quality_preference,
            },
            tension: TensionWeights {
                hierarchical: settings.tension.hierarchical,
                dissonance: settings.tension.dissonance,
                motion: settings.tension.motion,
                tendency: settings.tension.tendency,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        positive("window_bars", self.window_bars)?;
        positive("hop_bars", self.hop_bars)?;
        positive("chord_window_bars", self.chord_window_bars)?;
        positive("tempo_bpm", self.tempo_bpm)?;
        positive("beats_per_bar", self.beats_per_bar)?;

        if self.min_stable_windows == 0 {
            return Err(invalid("min_stable_windows", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid(
                "confidence_threshold",
                format!("must lie in [0, 1], got {}", self.confidence_threshold),
            ));
        }
        if !self.profile.is_well_formed() {
            return Err(invalid("profile", format!("`{}` has a constant or non-finite vector", self.profile.name)));
        }

        for (field, value) in [
            ("scoring.diatonic_bonus", self.scoring.diatonic_bonus),
            ("scoring.non_chord_penalty", self.scoring.non_chord_penalty),
            ("scoring.missing_tone_weight", self.scoring.missing_tone_weight),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }
        if self.scoring.quality_preference.values().any(|b| !b.is_finite()) {
            return Err(invalid("scoring.quality_preference", "biases must be finite"));
        }

        weight("tension.hierarchical", self.tension.hierarchical)?;
        weight("tension.dissonance", self.tension.dissonance)?;
        weight("tension.motion", self.tension.motion)?;
        weight("tension.tendency", self.tension.tendency)?;
        Ok(())
    }

    /// `beats_per_bar * 60 / tempo_bpm`
    pub fn bar_seconds(&self) -> f64 {
        self.beats_per_bar * 60.0 / self.tempo_bpm
    }

    pub fn grid(&self) -> WindowGrid {
        let bar = self.bar_seconds();
        WindowGrid {
            window: self.window_bars * bar,
            hop: self.hop_bars * bar,
            chord_window: self.chord_window_bars * bar,
        }
    }
}

/// Builds an [`Analyzer`] from raw settings, failing fast on bad values.
#[derive(Debug, Clone)]
pub struct AnalyzerBuilder {
    settings: AnalysisSettings,
    registry: ProfileRegistry,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            settings: AnalysisSettings::default(),
            registry: ProfileRegistry::builtin(),
        }
    }

    pub fn settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.settings.profile = name.into();
        self
    }

    /// Register a custom profile. Select it with [`AnalyzerBuilder::profile`].
    pub fn register_profile(mut self, profile: KeyProfile) -> Self {
        self.registry.register(profile);
        self
    }

    /// Bar grid: tempo in quarter notes per minute and beats per bar.
    pub fn meter(mut self, tempo_bpm: f64, beats_per_bar: f64) -> Self {
        self.settings.tempo_bpm = tempo_bpm;
        self.settings.beats_per_bar = beats_per_bar;
        self
    }

    pub fn build(self) -> Result<Analyzer> {
        let config = AnalysisConfig::from_settings(&self.settings, &self.registry)?;
        Ok(Analyzer::from_config(config))
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_settings_defaults() {
        let config = AnalysisConfig::from_settings(&AnalysisSettings::default(), &ProfileRegistry::builtin()).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.bar_seconds(), 2.0);
        assert_eq!(config.grid().window, 8.0);
    }

    #[test]
    fn unknown_profile_fails_at_build() {
        let err = AnalyzerBuilder::new().profile("bach").build().unwrap_err();
        assert!(matches!(err, Error::UnknownProfile(ref name) if name == "bach"));
    }

    #[test]
    fn custom_profile_can_be_selected() {
        let mut custom = KeyProfile::temperley();
        custom.name = "mine".to_string();
        let analyzer = AnalyzerBuilder::new()
            .register_profile(custom)
            .profile("mine")
            .build()
            .unwrap();
        assert_eq!(analyzer.config().profile.name, "mine");
    }

    #[test]
    fn non_positive_hop_is_rejected() {
        let mut settings = AnalysisSettings::default();
        settings.hop_bars = 0.0;
        let err = AnalyzerBuilder::new().settings(settings).build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "hop_bars", .. }));
    }

    #[test]
    fn zero_stable_windows_is_rejected() {
        let mut settings = AnalysisSettings::default();
        settings.min_stable_windows = 0;
        let err = AnalyzerBuilder::new().settings(settings).build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "min_stable_windows", .. }));
    }

    #[test]
    fn threshold_outside_unit_range_is_rejected() {
        let mut settings = AnalysisSettings::default();
        settings.confidence_threshold = 1.5;
        assert!(AnalyzerBuilder::new().settings(settings).build().is_err());
    }

    #[test]
    fn quality_preference_overrides_by_name() {
        let mut settings = AnalysisSettings::default();
        settings.scoring.quality_preference.insert("dom7".to_string(), 0.05);
        let config = AnalysisConfig::from_settings(&settings, &ProfileRegistry::builtin()).unwrap();
        assert_eq!(config.scoring.preference(ChordQuality::Dominant7), 0.05);
        assert_eq!(config.scoring.preference(ChordQuality::Minor7), -0.02);

        settings.scoring.quality_preference.insert("ninth".to_string(), 0.05);
        let err = AnalysisConfig::from_settings(&settings, &ProfileRegistry::builtin()).unwrap_err();
        assert!(err.to_string().contains("ninth"));
    }

    #[test]
    fn negative_tension_weight_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.tension.motion = -0.1;
        assert!(config.validate().is_err());
    }
}
