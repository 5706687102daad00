//! Harmonic function and applied (secondary) chords.

use crate::scale::is_diatonic_chord;
use crate::types::{ChordEvent, ChordQuality, HarmonicFunction, SecondaryKind};

/// Function of a scale degree: tonic {1, 6}, subdominant {2, 4},
/// dominant {5, 7}. Chromatic chords have none.
pub fn harmonic_function(degree: u8) -> HarmonicFunction {
    match degree {
        1 | 6 => HarmonicFunction::Tonic,
        2 | 4 => HarmonicFunction::Subdominant,
        5 | 7 => HarmonicFunction::Dominant,
        _ => HarmonicFunction::None,
    }
}

/// Targets that can be tonicized: diatonic, and not the tonic itself.
fn is_tonicizable(degree: u8) -> bool {
    (2..=7).contains(&degree)
}

/// How `current` tonicizes `next`, if it does.
///
/// An applied dominant is a major or dominant-seventh chord a perfect fifth
/// above its target. An applied leading-tone chord is diminished and sits a
/// semitone below. Either must borrow at least one tone from outside the
/// key, otherwise it is just a diatonic chord.
pub fn secondary_relation(current: &ChordEvent, next: &ChordEvent) -> Option<SecondaryKind> {
    if !is_tonicizable(next.degree) {
        return None;
    }
    if is_diatonic_chord(current.root, current.quality, current.key) {
        return None;
    }

    let root_motion = (next.root + 12 - current.root) % 12;
    match current.quality {
        ChordQuality::Major | ChordQuality::Dominant7 if root_motion == 5 => Some(SecondaryKind::Dominant),
        ChordQuality::Diminished | ChordQuality::Diminished7 | ChordQuality::HalfDiminished7
            if root_motion == 1 =>
        {
            Some(SecondaryKind::LeadingTone)
        }
        _ => None,
    }
}

/// Fill in function and secondary-dominant fields for a time-ordered run.
/// The last chord has no successor and is never secondary.
pub fn classify(chords: &mut [ChordEvent]) {
    for i in 0..chords.len() {
        let relation = chords
            .get(i + 1)
            .and_then(|next| secondary_relation(&chords[i], next));
        let target = chords.get(i + 1).map(|next| next.degree);

        let chord = &mut chords[i];
        chord.function = harmonic_function(chord.degree);
        chord.secondary_kind = relation;
        chord.is_secondary_dominant = relation.is_some();
        chord.secondary_target = relation.and(target);
    }
}
