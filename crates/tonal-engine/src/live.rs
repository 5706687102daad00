//! Incremental analysis for notes arriving in real time.
//!
//! Windows are analyzed as soon as `advance(now)` passes their end. Chords
//! are issued under the key in force at that moment; when a key change
//! commits it is back-dated, and every chord, tension sample and cadence
//! from the new region's start onward is issued again. Consumers should
//! treat the last `min_stable_windows` hops as provisional.

use std::cmp::Ordering;

use note_stream::{NoteEvent, TimeExtent};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{canonical_order, Analyzer};
use crate::cadence::detect_cadences;
use crate::chords::detect_chord;
use crate::function::classify;
use crate::key::{estimate_key, KeyTracker};
use crate::pitch_class::{chord_window, key_window, PitchClassWindow, WindowGrid};
use crate::tension::tension_curve;
use crate::types::{CadenceEvent, ChordEvent, HarmonicAnalysis, Key, KeyRegion, TensionSample};

/// What changed during one [`LiveAnalyzer::advance`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    /// Regions closed by key changes committed during this call.
    pub key_regions: Vec<KeyRegion>,
    /// Key in force after this call, if any window has had energy yet.
    pub provisional_key: Option<Key>,
    /// When set, discard previously received chords, tension samples and
    /// cadences at or after this time; the vectors below replace them.
    pub revised_from: Option<f64>,
    pub chords: Vec<ChordEvent>,
    pub tension: Vec<TensionSample>,
    pub cadences: Vec<CadenceEvent>,
}

impl LiveUpdate {
    pub fn is_empty(&self) -> bool {
        self.key_regions.is_empty() && self.revised_from.is_none() && self.chords.is_empty()
    }
}

/// Cursor state, created once the first note is seen.
#[derive(Debug)]
struct Progress {
    extent_start: f64,
    next_key_hop: i64,
    next_chord_hop: i64,
    tracker: KeyTracker,
    windows: Vec<PitchClassWindow>,
    detected: Vec<Option<ChordEvent>>,
    regions_reported: usize,
}

/// Incremental counterpart of [`Analyzer`].
///
/// Notes must be pushed in onset order. [`LiveAnalyzer::finish`] returns the
/// definitive result, identical to a batch pass over the same notes.
#[derive(Debug)]
pub struct LiveAnalyzer {
    analyzer: Analyzer,
    grid: WindowGrid,
    notes: Vec<NoteEvent>,
    latest_end: f64,
    progress: Option<Progress>,
    published: Vec<ChordEvent>,
}

impl LiveAnalyzer {
    pub fn new(analyzer: Analyzer) -> Self {
        let grid = analyzer.config().grid();
        Self {
            analyzer,
            grid,
            notes: Vec::new(),
            latest_end: f64::NEG_INFINITY,
            progress: None,
            published: Vec::new(),
        }
    }

    pub fn push_note(&mut self, note: NoteEvent) {
        self.latest_end = self.latest_end.max(note.end);
        let at = self
            .notes
            .partition_point(|n| canonical_order(n, &note) != Ordering::Greater);
        self.notes.insert(at, note);
    }

    /// Analyze every window that ended at or before `now`.
    pub fn advance(&mut self, now: f64) -> LiveUpdate {
        let Some(first) = self.notes.first() else {
            return LiveUpdate::default();
        };
        let config = self.analyzer.config();
        let grid = self.grid;
        let progress = self.progress.get_or_insert_with(|| {
            let extent = TimeExtent::new(first.start, first.end);
            let first_hop = grid.first_hop(&extent);
            Progress {
                extent_start: first.start,
                next_key_hop: first_hop,
                next_chord_hop: first_hop,
                tracker: KeyTracker::new(first.start, config.min_stable_windows, config.confidence_threshold),
                windows: Vec::new(),
                detected: Vec::new(),
                regions_reported: 0,
            }
        });
        let extent = TimeExtent::new(progress.extent_start, self.latest_end);

        let mut revised_from: Option<f64> = None;
        while grid.hop_starts_before(progress.next_key_hop, extent.end)
            && grid.key_span(progress.next_key_hop).1 <= now
        {
            let hop = key_window(&self.notes, &grid, progress.next_key_hop, &extent);
            let estimate = estimate_key(&hop.window.histogram, &config.profile);
            if let Some(commit) = progress.tracker.push(hop.anchor, estimate.as_ref()) {
                revised_from = Some(revised_from.map_or(commit.start, |t: f64| t.min(commit.start)));
                for (window, slot) in progress.windows.iter().zip(progress.detected.iter_mut()) {
                    if window.start >= commit.start {
                        *slot = detect_chord(window, commit.new_key, &config.scoring);
                    }
                }
            }
            progress.next_key_hop += 1;
        }

        while grid.hop_starts_before(progress.next_chord_hop, extent.end)
            && grid.chord_span(progress.next_chord_hop).1 <= now
        {
            let window = chord_window(&self.notes, &grid, progress.next_chord_hop, &extent);
            let Some(key) = progress.tracker.key_at(window.start) else {
                // No key yet: hold chords back until the first estimate.
                break;
            };
            progress.detected.push(detect_chord(&window, key, &config.scoring));
            progress.windows.push(window);
            progress.next_chord_hop += 1;
        }

        let key_regions = progress.tracker.closed_regions()[progress.regions_reported..].to_vec();
        progress.regions_reported += key_regions.len();
        let provisional_key = progress.tracker.current_key();

        let mut chords: Vec<ChordEvent> = progress.detected.iter().flatten().cloned().collect();
        classify(&mut chords);

        // A new chord can change its predecessor's secondary status.
        if let Some(changed) = self.published.iter().zip(&chords).position(|(old, new)| old != new) {
            let t = chords[changed].time;
            revised_from = Some(revised_from.map_or(t, |r| r.min(t)));
        }
        let emit_from = match revised_from {
            Some(t) => chords.partition_point(|c| c.time < t),
            None => self.published.len(),
        };

        let tension = tension_curve(&chords, &config.tension);
        let cadences = detect_cadences(&chords);
        let emitted_since = chords.get(emit_from).map(|c| c.time);

        let update = LiveUpdate {
            key_regions,
            provisional_key,
            revised_from,
            chords: chords[emit_from..].to_vec(),
            tension: tension[emit_from..].to_vec(),
            cadences: match emitted_since {
                Some(t) => cadences.into_iter().filter(|c| c.time >= t).collect(),
                None => Vec::new(),
            },
        };

        debug!(
            now,
            chords = update.chords.len(),
            revised_from = ?update.revised_from,
            "live update"
        );

        self.published = chords;
        update
    }

    /// Close the stream and return the definitive analysis.
    pub fn finish(self) -> HarmonicAnalysis {
        self.analyzer.analyze(&self.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_note(pitch: u8, start: f64, end: f64) -> NoteEvent {
        NoteEvent::new(pitch, 90, start, end, 0).unwrap()
    }

    #[test]
    fn nothing_happens_before_first_note() {
        let mut live = Analyzer::builder().build().unwrap().live();
        assert!(live.advance(10.0).is_empty());
        assert_eq!(live.finish(), HarmonicAnalysis::default());
    }

    #[test]
    fn chords_are_issued_as_bars_complete() {
        let mut live = Analyzer::builder().build().unwrap().live();
        for pitch in [60, 64, 67] {
            live.push_note(make_note(pitch, 0.0, 2.0));
        }
        // The first key window ends at 5s; no chord can be keyed before that.
        assert!(live.advance(2.0).chords.is_empty());

        for pitch in [65, 69, 72] {
            live.push_note(make_note(pitch, 2.0, 4.0));
        }
        let update = live.advance(5.0);
        assert_eq!(update.provisional_key, Some(Key::major(0)));
        let roots: Vec<u8> = update.chords.iter().map(|c| c.root).collect();
        assert_eq!(roots, vec![0, 5]);
        assert_eq!(update.tension.len(), 2);
        assert_eq!(update.revised_from, None);

        // Nothing new until another window closes.
        assert!(live.advance(5.5).chords.is_empty());
    }
}
