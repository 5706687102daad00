use std::cmp::Ordering;

use note_stream::{NoteEvent, TimeExtent};
use tracing::info;

use crate::cadence::detect_cadences;
use crate::chords::detect_chords;
use crate::config::{AnalysisConfig, AnalyzerBuilder};
use crate::function::classify;
use crate::key::{estimate_key, KeyTracker};
use crate::live::LiveAnalyzer;
use crate::pitch_class::{chord_windows, key_windows, WindowGrid};
use crate::tension::tension_curve;
use crate::types::{ChordEvent, HarmonicAnalysis, KeyRegion};
use crate::Result;

/// Order in which notes are summed into windows. Floating-point sums depend
/// on it, so every pass must use the same one.
pub(crate) fn canonical_order(a: &NoteEvent, b: &NoteEvent) -> Ordering {
    a.start
        .total_cmp(&b.start)
        .then(a.pitch.cmp(&b.pitch))
        .then(a.channel.cmp(&b.channel))
        .then(a.end.total_cmp(&b.end))
        .then(a.velocity.cmp(&b.velocity))
}

/// Batch tonal analysis over a complete note list.
///
/// Deterministic: the same notes and configuration always produce the same
/// output, whatever order the notes are supplied in.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Validate `config` and wrap it.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    /// Callers must have validated `config`.
    pub(crate) fn from_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// An incremental analyzer sharing this configuration.
    pub fn live(&self) -> LiveAnalyzer {
        LiveAnalyzer::new(self.clone())
    }

    pub fn analyze(&self, notes: &[NoteEvent]) -> HarmonicAnalysis {
        let Some(extent) = TimeExtent::of_notes(notes) else {
            return HarmonicAnalysis::default();
        };

        let mut notes = notes.to_vec();
        notes.sort_by(canonical_order);

        let grid = self.config.grid();
        let key_regions = self.track_keys(&notes, &grid, &extent);
        let windows = chord_windows(&notes, &grid, &extent);
        let chords = detect_chords(&windows, &key_regions, &self.config.scoring);
        let analysis = self.assemble(key_regions, chords);

        info!(
            notes = notes.len(),
            regions = analysis.key_regions.len(),
            chords = analysis.chords.len(),
            cadences = analysis.cadences.len(),
            "analysis pass complete"
        );
        analysis
    }

    fn track_keys(&self, notes: &[NoteEvent], grid: &WindowGrid, extent: &TimeExtent) -> Vec<KeyRegion> {
        let mut tracker = KeyTracker::new(
            extent.start,
            self.config.min_stable_windows,
            self.config.confidence_threshold,
        );
        for hop in key_windows(notes, grid, extent) {
            let estimate = estimate_key(&hop.window.histogram, &self.config.profile);
            tracker.push(hop.anchor, estimate.as_ref());
        }
        tracker.finish(extent.end)
    }

    /// Everything downstream of chord detection: function, tension, cadences.
    pub(crate) fn assemble(&self, key_regions: Vec<KeyRegion>, mut chords: Vec<ChordEvent>) -> HarmonicAnalysis {
        classify(&mut chords);
        let tension = tension_curve(&chords, &self.config.tension);
        let cadences = detect_cadences(&chords);
        HarmonicAnalysis {
            key_regions,
            chords,
            tension,
            cadences,
        }
    }
}
