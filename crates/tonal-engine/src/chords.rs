use tracing::debug;

use crate::chord_templates::{best_match, ChordScoring};
use crate::pitch_class::PitchClassWindow;
use crate::scale::scale_degree;
use crate::types::{key_at, ChordEvent, HarmonicFunction, Key, KeyRegion};

/// Detect the chord of one window under `key`.
///
/// Function and secondary-dominant fields are left neutral; they depend on
/// the following chord and are filled in by [`crate::function::classify`].
pub fn detect_chord(window: &PitchClassWindow, key: Key, scoring: &ChordScoring) -> Option<ChordEvent> {
    let found = best_match(window, key, scoring)?;
    let degree = scale_degree(found.root, key);

    debug!(
        time = window.start,
        root = found.root,
        quality = %found.quality,
        degree,
        score = found.score,
        "chord window"
    );

    Some(ChordEvent {
        time: window.start,
        root: found.root,
        quality: found.quality,
        degree,
        score: found.score,
        function: HarmonicFunction::None,
        is_secondary_dominant: false,
        secondary_target: None,
        secondary_kind: None,
        key,
    })
}

/// Detect chords across windows, each under the key region containing its start.
/// Silent windows produce nothing.
pub fn detect_chords(
    windows: &[PitchClassWindow],
    regions: &[KeyRegion],
    scoring: &ChordScoring,
) -> Vec<ChordEvent> {
    windows
        .iter()
        .filter_map(|window| {
            let key = key_at(regions, window.start)?;
            detect_chord(window, key, scoring)
        })
        .collect()
}
