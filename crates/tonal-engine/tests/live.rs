//! The incremental analyzer converges on the batch result.

use note_stream::NoteEvent;
use pretty_assertions::assert_eq;
use tonal_engine::{Analyzer, CadenceEvent, ChordEvent, Key, LiveUpdate, TensionSample};

const BAR: f64 = 2.0;

const C_MAJOR_SCALE: [u8; 7] = [60, 62, 64, 65, 67, 69, 71];
const D_MAJOR_SCALE: [u8; 7] = [62, 64, 66, 67, 69, 71, 73];

fn make_note(pitch: u8, start: f64, end: f64) -> NoteEvent {
    NoteEvent::new(pitch, 90, start, end, 0).unwrap()
}

fn scale_bar(bar: usize, pitches: &[u8]) -> Vec<NoteEvent> {
    let step = BAR / pitches.len() as f64;
    let start = bar as f64 * BAR;
    pitches
        .iter()
        .enumerate()
        .map(|(i, &p)| make_note(p, start + i as f64 * step, start + (i + 1) as f64 * step))
        .collect()
}

fn block_bar(bar: usize, pitches: &[u8]) -> Vec<NoteEvent> {
    let start = bar as f64 * BAR;
    pitches.iter().map(|&p| make_note(p, start, start + BAR)).collect()
}

/// What a consumer holds after applying every update it has received.
#[derive(Default)]
struct View {
    chords: Vec<ChordEvent>,
    tension: Vec<TensionSample>,
    cadences: Vec<CadenceEvent>,
    revisions: usize,
}

impl View {
    fn apply(&mut self, update: LiveUpdate) {
        if let Some(t) = update.revised_from {
            self.revisions += 1;
            self.chords.retain(|c| c.time < t);
            self.tension.retain(|s| s.time < t);
            self.cadences.retain(|c| c.time < t);
        }
        self.chords.extend(update.chords);
        self.tension.extend(update.tension);
        self.cadences.extend(update.cadences);
    }
}

fn stream(bars: &[Vec<NoteEvent>]) -> (View, Vec<NoteEvent>) {
    let analyzer = Analyzer::builder().build().unwrap();
    let mut live = analyzer.live();
    let mut view = View::default();
    let mut all = Vec::new();

    for (bar, notes) in bars.iter().enumerate() {
        for note in notes {
            live.push_note(note.clone());
            all.push(note.clone());
        }
        view.apply(live.advance((bar + 1) as f64 * BAR));
    }
    view.apply(live.advance(1.0e6));

    assert_eq!(live.finish(), analyzer.analyze(&all));
    (view, all)
}

#[test]
fn streamed_cadences_match_batch() {
    let progression: [&[u8]; 8] = [
        &[60, 64, 67],
        &[65, 69, 72],
        &[67, 71, 74],
        &[60, 64, 67],
        &[60, 64, 67],
        &[62, 66, 69, 72],
        &[67, 71, 74, 77],
        &[60, 64, 67],
    ];
    let bars: Vec<Vec<NoteEvent>> = progression
        .iter()
        .enumerate()
        .map(|(bar, pitches)| block_bar(bar, pitches))
        .collect();

    let (view, all) = stream(&bars);
    let batch = Analyzer::builder().build().unwrap().analyze(&all);

    assert_eq!(view.chords, batch.chords);
    assert_eq!(view.tension, batch.tension);
    assert_eq!(view.cadences, batch.cadences);
}

#[test]
fn modulation_revises_issued_chords() {
    let bars: Vec<Vec<NoteEvent>> = (0..12)
        .map(|bar| scale_bar(bar, if bar < 8 { &C_MAJOR_SCALE } else { &D_MAJOR_SCALE }))
        .collect();

    let (view, all) = stream(&bars);
    let batch = Analyzer::builder().build().unwrap().analyze(&all);

    assert!(view.revisions > 0);
    assert_eq!(view.chords, batch.chords);
    assert_eq!(view.tension, batch.tension);
    assert_eq!(view.cadences, batch.cadences);
    assert_eq!(batch.key_regions[1].key(), Key::major(2));
}

#[test]
fn closed_regions_are_reported_once() {
    let analyzer = Analyzer::builder().build().unwrap();
    let mut live = analyzer.live();
    let mut reported = Vec::new();

    for bar in 0..12 {
        for note in scale_bar(bar, if bar < 8 { &C_MAJOR_SCALE } else { &D_MAJOR_SCALE }) {
            live.push_note(note);
        }
        let update = live.advance((bar + 1) as f64 * BAR);
        reported.extend(update.key_regions);
    }
    let update = live.advance(1.0e6);
    reported.extend(update.key_regions);

    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].key(), Key::major(0));
    assert_eq!((reported[0].start, reported[0].end), (0.0, 16.0));
    assert_eq!(update.provisional_key, Some(Key::major(2)));
}
