use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single sounding note with absolute timing in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: u8,
    /// Onset in seconds
    pub start: f64,
    /// Release in seconds, never before `start`
    pub end: f64,
    pub channel: u8,
}

impl NoteEvent {
    /// Build a note, rejecting out-of-range MIDI values and inverted spans.
    pub fn new(pitch: u8, velocity: u8, start: f64, end: f64, channel: u8) -> Result<Self> {
        let reason = if pitch > 127 {
            Some("pitch exceeds 127")
        } else if velocity > 127 {
            Some("velocity exceeds 127")
        } else if !start.is_finite() || !end.is_finite() {
            Some("non-finite time")
        } else if end < start {
            Some("end precedes start")
        } else if channel > 15 {
            Some("channel exceeds 15")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidNote {
                pitch,
                velocity,
                start,
                end,
                reason,
            }),
            None => Ok(Self {
                pitch,
                velocity,
                start,
                end,
                channel,
            }),
        }
    }

    /// Pitch class 0–11 (C=0).
    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }

    /// Seconds of this note that fall inside `[from, to)`.
    pub fn overlap(&self, from: f64, to: f64) -> f64 {
        (self.end.min(to) - self.start.max(from)).max(0.0)
    }
}

/// Time span covered by a note list: earliest onset to latest release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeExtent {
    pub start: f64,
    pub end: f64,
}

impl TimeExtent {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// `None` for an empty note list.
    pub fn of_notes(notes: &[NoteEvent]) -> Option<Self> {
        let start = notes.iter().map(|n| n.start).reduce(f64::min)?;
        let end = notes.iter().map(|n| n.end).reduce(f64::max)?;
        Some(Self::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_span() {
        let err = NoteEvent::new(60, 80, 2.0, 1.0, 0).unwrap_err();
        assert!(err.to_string().contains("end precedes start"));
    }

    #[test]
    fn rejects_out_of_range_pitch() {
        assert!(NoteEvent::new(128, 80, 0.0, 1.0, 0).is_err());
        assert!(NoteEvent::new(60, 200, 0.0, 1.0, 0).is_err());
    }

    #[test]
    fn overlap_is_clipped_to_window() {
        let note = NoteEvent::new(64, 100, 1.0, 3.0, 0).unwrap();
        assert_eq!(note.pitch_class(), 4);
        assert_eq!(note.overlap(0.0, 2.0), 1.0);
        assert_eq!(note.overlap(1.5, 2.5), 1.0);
        assert_eq!(note.overlap(3.0, 4.0), 0.0);
        assert_eq!(note.overlap(4.0, 5.0), 0.0);
    }

    #[test]
    fn extent_spans_all_notes() {
        let notes = vec![
            NoteEvent::new(60, 80, 0.5, 1.0, 0).unwrap(),
            NoteEvent::new(62, 80, 0.0, 4.0, 0).unwrap(),
            NoteEvent::new(64, 80, 2.0, 6.0, 1).unwrap(),
        ];
        let extent = TimeExtent::of_notes(&notes).unwrap();
        assert_eq!(extent.start, 0.0);
        assert_eq!(extent.end, 6.0);
        assert!(TimeExtent::of_notes(&[]).is_none());
    }
}
