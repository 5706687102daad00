//! Scale degrees and diatonic membership relative to a key.

use crate::chord_templates::template_for;
use crate::types::{ChordQuality, Key, KeyMode};

/// Semitone offsets of degrees 1–7.
const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const NATURAL_MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

/// Raised leading tone of harmonic minor, also degree 7.
const MINOR_LEADING_TONE: u8 = 11;

/// Scale degree 1–7 of `pitch_class` in `key`, or 0 when chromatic.
pub fn scale_degree(pitch_class: u8, key: Key) -> u8 {
    let interval = (pitch_class % 12 + 12 - key.tonic()) % 12;
    let scale = match key.mode() {
        KeyMode::Major => &MAJOR_SCALE,
        KeyMode::Minor => {
            if interval == MINOR_LEADING_TONE {
                return 7;
            }
            &NATURAL_MINOR_SCALE
        }
    };
    scale
        .iter()
        .position(|&step| step == interval)
        .map_or(0, |i| i as u8 + 1)
}

/// Bitmask of the pitch classes that belong to `key`, relative to C.
/// Minor keys admit both the subtonic and the leading tone.
pub fn diatonic_mask(key: Key) -> u16 {
    let (scale, extra): (&[u8; 7], Option<u8>) = match key.mode() {
        KeyMode::Major => (&MAJOR_SCALE, None),
        KeyMode::Minor => (&NATURAL_MINOR_SCALE, Some(MINOR_LEADING_TONE)),
    };
    scale
        .iter()
        .copied()
        .chain(extra)
        .fold(0u16, |mask, step| mask | 1 << ((key.tonic() + step) % 12))
}

/// Whether every tone of the chord belongs to the key.
pub fn is_diatonic_chord(root: u8, quality: ChordQuality, key: Key) -> bool {
    let mask = diatonic_mask(key);
    let template = template_for(quality);
    (0..12u8)
        .filter(|&interval| template.intervals & (1 << interval) != 0)
        .all(|interval| mask & (1 << ((root + interval) % 12)) != 0)
}
