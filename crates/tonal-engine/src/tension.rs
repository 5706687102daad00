//! Per-chord tension from four weighted components.

use crate::types::{ChordEvent, ChordQuality, TensionComponents, TensionSample};

/// Distance from the tonic by scale degree; index 0 is any chromatic root.
const HIERARCHICAL: [f64; 8] = [0.70, 0.0, 0.35, 0.45, 0.25, 0.60, 0.20, 0.85];

/// Cost of root motion indexed by the upward interval from the previous root.
/// Fifth-falls are smooth; the tritone is the roughest move.
const MOTION: [f64; 12] = [0.0, 0.55, 0.35, 0.30, 0.30, 0.10, 1.0, 0.25, 0.30, 0.30, 0.35, 0.55];

/// Pull of an applied dominant toward its target.
const SECONDARY_TENDENCY: f64 = 0.15;
/// Weaker pull of an applied chord aimed at the dominant itself.
const SECONDARY_TO_DOMINANT_TENDENCY: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensionWeights {
    pub hierarchical: f64,
    pub dissonance: f64,
    pub motion: f64,
    pub tendency: f64,
}

impl Default for TensionWeights {
    fn default() -> Self {
        Self {
            hierarchical: 0.40,
            dissonance: 0.25,
            motion: 0.20,
            tendency: 0.15,
        }
    }
}

pub fn hierarchical(degree: u8) -> f64 {
    HIERARCHICAL.get(degree as usize).copied().unwrap_or(HIERARCHICAL[0])
}

/// Intrinsic dissonance of a chord quality.
pub fn dissonance(quality: ChordQuality) -> f64 {
    match quality {
        ChordQuality::Major => 0.0,
        ChordQuality::Minor => 0.08,
        ChordQuality::Major7 => 0.05,
        ChordQuality::Minor7 => 0.12,
        ChordQuality::Dominant7 => 0.25,
        ChordQuality::Suspended4 => 0.15,
        ChordQuality::Suspended2 => 0.12,
        ChordQuality::Diminished => 0.35,
        ChordQuality::HalfDiminished7 => 0.40,
        ChordQuality::Diminished7 => 0.45,
        ChordQuality::Augmented => 0.30,
        ChordQuality::MinorMajor7 => 0.30,
        ChordQuality::Dominant7Sus4 => 0.22,
        ChordQuality::Add9 => 0.10,
        ChordQuality::Major6 => 0.06,
        ChordQuality::Minor6 => 0.14,
        ChordQuality::Power => 0.02,
    }
}

/// Root-motion cost into `root`. The first chord moves nowhere.
pub fn motion(previous_root: Option<u8>, root: u8) -> f64 {
    match previous_root {
        Some(prev) => MOTION[((root + 12 - prev % 12) % 12) as usize],
        None => 0.0,
    }
}

pub fn tendency(chord: &ChordEvent) -> f64 {
    if !chord.is_secondary_dominant {
        return 0.0;
    }
    if chord.secondary_target == Some(5) {
        SECONDARY_TO_DOMINANT_TENDENCY
    } else {
        SECONDARY_TENDENCY
    }
}

/// Tension of `chord` given the chord before it.
pub fn tension_for(chord: &ChordEvent, previous: Option<&ChordEvent>, weights: &TensionWeights) -> TensionSample {
    let components = TensionComponents {
        hierarchical: hierarchical(chord.degree),
        dissonance: dissonance(chord.quality),
        motion: motion(previous.map(|p| p.root), chord.root),
        tendency: tendency(chord),
    };
    let value = weights.hierarchical * components.hierarchical
        + weights.dissonance * components.dissonance
        + weights.motion * components.motion
        + weights.tendency * components.tendency;

    TensionSample {
        time: chord.time,
        value: value.clamp(0.0, 1.0),
        components,
    }
}

/// One sample per chord, in chord order.
pub fn tension_curve(chords: &[ChordEvent], weights: &TensionWeights) -> Vec<TensionSample> {
    chords
        .iter()
        .enumerate()
        .map(|(i, chord)| tension_for(chord, i.checked_sub(1).map(|p| &chords[p]), weights))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::scale_degree;
    use crate::types::{HarmonicFunction, Key};

    fn make_chord(time: f64, root: u8, quality: ChordQuality) -> ChordEvent {
        let key = Key::major(0);
        ChordEvent {
            time,
            root,
            quality,
            degree: scale_degree(root, key),
            score: 1.0,
            function: HarmonicFunction::None,
            is_secondary_dominant: false,
            secondary_target: None,
            secondary_kind: None,
            key,
        }
    }

    #[test]
    fn tonic_with_no_motion_is_relaxed() {
        let sample = tension_for(&make_chord(0.0, 0, ChordQuality::Major), None, &TensionWeights::default());
        assert_eq!(sample.value, 0.0);
        assert_eq!(sample.components.motion, 0.0);
    }

    #[test]
    fn dominant_seventh_is_tenser_than_tonic() {
        let weights = TensionWeights::default();
        let tonic = make_chord(0.0, 0, ChordQuality::Major);
        let dominant = make_chord(2.0, 7, ChordQuality::Dominant7);
        let home = make_chord(4.0, 0, ChordQuality::Major);

        let curve = tension_curve(&[tonic, dominant, home], &weights);
        assert!(curve[1].value > curve[0].value);
        assert!(curve[1].value > curve[2].value);
        // 0.40 * 0.60 + 0.25 * 0.25 + 0.20 * 0.25
        assert!((curve[1].value - 0.3525).abs() < 1e-12);
        assert_eq!(curve[2].components.motion, 0.10);
    }

    #[test]
    fn tritone_motion_is_maximal() {
        assert_eq!(motion(Some(0), 6), 1.0);
        assert_eq!(motion(Some(6), 0), 1.0);
        assert_eq!(motion(Some(7), 0), 0.10);
    }

    #[test]
    fn secondary_tendency() {
        let mut chord = make_chord(0.0, 2, ChordQuality::Major);
        assert_eq!(tendency(&chord), 0.0);
        chord.is_secondary_dominant = true;
        chord.secondary_target = Some(5);
        assert_eq!(tendency(&chord), 0.10);
        chord.secondary_target = Some(2);
        assert_eq!(tendency(&chord), 0.15);
    }

    #[test]
    fn value_stays_in_unit_range() {
        let weights = TensionWeights {
            hierarchical: 2.0,
            dissonance: 2.0,
            motion: 2.0,
            tendency: 2.0,
        };
        let a = make_chord(0.0, 1, ChordQuality::Diminished7);
        let b = make_chord(2.0, 7, ChordQuality::Diminished7);
        let curve = tension_curve(&[a, b], &weights);
        assert!(curve.iter().all(|s| (0.0..=1.0).contains(&s.value)));
        assert_eq!(curve[1].value, 1.0);
    }
}
