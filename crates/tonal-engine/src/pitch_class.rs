//! Velocity-weighted pitch-class histograms over time windows.
//!
//! Each note adds `overlap_seconds * velocity` to its pitch class. Grid
//! positions are computed as `index * hop` rather than by accumulation so
//! batch and incremental passes land on bit-identical boundaries.

use note_stream::{NoteEvent, TimeExtent};
use serde::{Deserialize, Serialize};

/// A 12-bin histogram for one window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchClassWindow {
    pub start: f64,
    pub end: f64,
    pub histogram: [f64; 12],
}

impl PitchClassWindow {
    /// Sum the weighted pitch classes of every note overlapping `[start, end)`.
    pub fn accumulate(notes: &[NoteEvent], start: f64, end: f64) -> Self {
        let mut histogram = [0.0_f64; 12];
        for note in notes {
            let overlap = note.overlap(start, end);
            if overlap > 0.0 {
                histogram[note.pitch_class() as usize] += overlap * note.velocity as f64;
            }
        }
        Self {
            start,
            end,
            histogram,
        }
    }

    pub fn total(&self) -> f64 {
        self.histogram.iter().sum()
    }

    /// No energy at all: silence or only zero-velocity notes.
    pub fn is_silent(&self) -> bool {
        self.total() <= 0.0
    }
}

/// Bar grid in seconds, derived from tempo and meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowGrid {
    /// Length of a key window.
    pub window: f64,
    /// Distance between key-window anchors and chord-window starts.
    pub hop: f64,
    /// Length of a chord window.
    pub chord_window: f64,
}

impl WindowGrid {
    /// First hop index touching `extent`. The grid origin is time zero.
    pub fn first_hop(&self, extent: &TimeExtent) -> i64 {
        (extent.start / self.hop).floor() as i64
    }

    /// Whether hop `index` starts before `end`.
    pub fn hop_starts_before(&self, index: i64, end: f64) -> bool {
        (index as f64) * self.hop < end
    }

    /// Anchor time of hop `index`, clamped to the extent start.
    pub fn anchor(&self, index: i64, extent_start: f64) -> f64 {
        ((index as f64) * self.hop).max(extent_start)
    }

    /// Key window of hop `index`: centered on the hop, `window` wide.
    pub fn key_span(&self, index: i64) -> (f64, f64) {
        let centre = (index as f64 + 0.5) * self.hop;
        (centre - self.window / 2.0, centre + self.window / 2.0)
    }

    /// Chord window of hop `index`: starts on the hop.
    pub fn chord_span(&self, index: i64) -> (f64, f64) {
        let start = (index as f64) * self.hop;
        (start, start + self.chord_window)
    }
}

/// A key window tagged with the time its estimate is attributed to.
#[derive(Debug, Clone, PartialEq)]
pub struct HopWindow {
    pub index: i64,
    pub anchor: f64,
    pub window: PitchClassWindow,
}

/// Build the key window of a single hop, clipped to `extent`.
pub fn key_window(notes: &[NoteEvent], grid: &WindowGrid, index: i64, extent: &TimeExtent) -> HopWindow {
    let (start, end) = grid.key_span(index);
    HopWindow {
        index,
        anchor: grid.anchor(index, extent.start),
        window: PitchClassWindow::accumulate(notes, start.max(extent.start), end.min(extent.end)),
    }
}

/// Build the chord window of a single hop, clipped to `extent`.
pub fn chord_window(
    notes: &[NoteEvent],
    grid: &WindowGrid,
    index: i64,
    extent: &TimeExtent,
) -> PitchClassWindow {
    let (start, end) = grid.chord_span(index);
    PitchClassWindow::accumulate(notes, start.max(extent.start), end.min(extent.end))
}

/// Key windows for every hop whose anchor falls inside the extent.
pub fn key_windows(notes: &[NoteEvent], grid: &WindowGrid, extent: &TimeExtent) -> Vec<HopWindow> {
    let mut windows = Vec::new();
    let mut index = grid.first_hop(extent);
    while grid.hop_starts_before(index, extent.end) {
        windows.push(key_window(notes, grid, index, extent));
        index += 1;
    }
    windows
}

/// Chord windows for every hop inside the extent.
pub fn chord_windows(notes: &[NoteEvent], grid: &WindowGrid, extent: &TimeExtent) -> Vec<PitchClassWindow> {
    let mut windows = Vec::new();
    let mut index = grid.first_hop(extent);
    while grid.hop_starts_before(index, extent.end) {
        windows.push(chord_window(notes, grid, index, extent));
        index += 1;
    }
    windows
}
