use std::collections::BTreeMap;

use crate::pitch_class::PitchClassWindow;
use crate::scale::scale_degree;
use crate::types::{ChordQuality, Key};

/// A chord template: quality enum + interval set from root (as bitmask over 12 pitch classes).
pub struct ChordTemplate {
    pub quality: ChordQuality,
    pub intervals: u16, // bitmask: bit i set means interval i is in the template
    pub size: usize,
}

impl ChordTemplate {
    const fn new(quality: ChordQuality, intervals: &[u8]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << intervals[i];
            i += 1;
        }
        Self {
            quality,
            intervals: mask,
            size: intervals.len(),
        }
    }

    pub fn contains(&self, interval: u8) -> bool {
        self.intervals & (1 << (interval % 12)) != 0
    }
}

/// All recognised chord templates. Order is significant: on an exact score
/// tie the earlier template wins.
pub static TEMPLATES: &[ChordTemplate] = &[
    ChordTemplate::new(ChordQuality::Major, &[0, 4, 7]),
    ChordTemplate::new(ChordQuality::Minor, &[0, 3, 7]),
    ChordTemplate::new(ChordQuality::Diminished, &[0, 3, 6]),
    ChordTemplate::new(ChordQuality::Augmented, &[0, 4, 8]),
    ChordTemplate::new(ChordQuality::Major7, &[0, 4, 7, 11]),
    ChordTemplate::new(ChordQuality::Dominant7, &[0, 4, 7, 10]),
    ChordTemplate::new(ChordQuality::Minor7, &[0, 3, 7, 10]),
    ChordTemplate::new(ChordQuality::HalfDiminished7, &[0, 3, 6, 10]),
    ChordTemplate::new(ChordQuality::Diminished7, &[0, 3, 6, 9]),
    ChordTemplate::new(ChordQuality::MinorMajor7, &[0, 3, 7, 11]),
    ChordTemplate::new(ChordQuality::Suspended4, &[0, 5, 7]),
    ChordTemplate::new(ChordQuality::Suspended2, &[0, 2, 7]),
    ChordTemplate::new(ChordQuality::Dominant7Sus4, &[0, 5, 7, 10]),
    ChordTemplate::new(ChordQuality::Add9, &[0, 2, 4, 7]),
    ChordTemplate::new(ChordQuality::Major6, &[0, 4, 7, 9]),
    ChordTemplate::new(ChordQuality::Minor6, &[0, 3, 7, 9]),
    ChordTemplate::new(ChordQuality::Power, &[0, 7]),
];

/// Template for `quality`. Every quality has exactly one.
pub fn template_for(quality: ChordQuality) -> &'static ChordTemplate {
    // TEMPLATES follows ChordQuality::ALL order.
    &TEMPLATES[quality as usize]
}

/// Empirically tuned scoring constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordScoring {
    pub diatonic_bonus: f64,
    pub non_chord_penalty: f64,
    pub missing_tone_weight: f64,
    pub quality_preference: BTreeMap<ChordQuality, f64>,
}

impl ChordScoring {
    /// Seventh and sixth chords are nudged down so a plain triad wins when
    /// the extension is weak; minMaj7 is nudged up to stay reachable.
    pub fn default_quality_preference() -> BTreeMap<ChordQuality, f64> {
        BTreeMap::from([
            (ChordQuality::Dominant7, -0.02),
            (ChordQuality::Minor7, -0.02),
            (ChordQuality::Major6, -0.03),
            (ChordQuality::Minor6, -0.03),
            (ChordQuality::MinorMajor7, 0.02),
        ])
    }

    pub fn preference(&self, quality: ChordQuality) -> f64 {
        self.quality_preference.get(&quality).copied().unwrap_or(0.0)
    }
}

impl Default for ChordScoring {
    fn default() -> Self {
        Self {
            diatonic_bonus: 0.15,
            non_chord_penalty: 0.3,
            missing_tone_weight: 0.0,
            quality_preference: Self::default_quality_preference(),
        }
    }
}

/// The winning template for one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordMatch {
    pub root: u8,
    pub quality: ChordQuality,
    pub score: f64,
}

/// Score one (root, template) pair against a histogram with energy `total`.
///
/// `match/total - penalty * nonChord/total + diatonicBonus + preference
///  - missingWeight * missing/size`
pub fn score_template(
    histogram: &[f64; 12],
    total: f64,
    root: u8,
    template: &ChordTemplate,
    key: Key,
    scoring: &ChordScoring,
) -> f64 {
    let mut matched = 0.0;
    let mut missing = 0usize;
    for interval in 0..12u8 {
        let energy = histogram[((root + interval) % 12) as usize];
        if template.contains(interval) {
            matched += energy;
            if energy <= 0.0 {
                missing += 1;
            }
        }
    }
    let non_chord = total - matched;

    let mut score = matched / total - scoring.non_chord_penalty * non_chord / total;
    if scale_degree(root, key) != 0 {
        score += scoring.diatonic_bonus;
    }
    score += scoring.preference(template.quality);
    score -= scoring.missing_tone_weight * missing as f64 / template.size as f64;
    score
}

/// Best (root, quality) for a window, or `None` when it has no energy.
///
/// Roots are tried 0..11 and templates in table order; a candidate must
/// score strictly higher to replace the incumbent.
pub fn best_match(window: &PitchClassWindow, key: Key, scoring: &ChordScoring) -> Option<ChordMatch> {
    let total = window.total();
    if total <= 0.0 {
        return None;
    }

    let mut best: Option<ChordMatch> = None;
    for root in 0..12u8 {
        for template in TEMPLATES {
            let score = score_template(&window.histogram, total, root, template, key, scoring);
            if best.map_or(true, |b| score > b.score) {
                best = Some(ChordMatch {
                    root,
                    quality: template.quality,
                    score,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(pitch_classes: &[u8]) -> PitchClassWindow {
        let mut histogram = [0.0; 12];
        for &pc in pitch_classes {
            histogram[pc as usize] += 100.0;
        }
        PitchClassWindow {
            start: 0.0,
            end: 2.0,
            histogram,
        }
    }

    fn detect(pitch_classes: &[u8], key: Key) -> ChordMatch {
        best_match(&window_of(pitch_classes), key, &ChordScoring::default()).unwrap()
    }

    #[test]
    fn templates_follow_quality_order() {
        assert_eq!(TEMPLATES.len(), ChordQuality::ALL.len());
        for (template, quality) in TEMPLATES.iter().zip(ChordQuality::ALL) {
            assert_eq!(template.quality, quality);
            assert_eq!(template_for(quality).quality, quality);
        }
    }

    #[test]
    fn test_template_bitmask() {
        let major = template_for(ChordQuality::Major);
        assert_eq!(major.intervals, 0b000010010001);
        assert_eq!(major.size, 3);
        assert!(template_for(ChordQuality::Dominant7).contains(10));
    }

    #[test]
    fn c_major_triad() {
        let m = detect(&[0, 4, 7], Key::major(0));
        assert_eq!((m.root, m.quality), (0, ChordQuality::Major));
        assert!((m.score - 1.15).abs() < 1e-12);
    }

    #[test]
    fn a_minor_triad() {
        let m = detect(&[9, 0, 4], Key::major(0));
        assert_eq!((m.root, m.quality), (9, ChordQuality::Minor));
    }

    #[test]
    fn g_dominant_seventh() {
        let m = detect(&[7, 11, 2, 5], Key::major(0));
        assert_eq!((m.root, m.quality), (7, ChordQuality::Dominant7));
    }

    #[test]
    fn b_diminished() {
        let m = detect(&[11, 2, 5], Key::major(0));
        assert_eq!((m.root, m.quality), (11, ChordQuality::Diminished));
    }

    #[test]
    fn d_major_in_c_is_chromatic_major() {
        let m = detect(&[2, 6, 9], Key::major(0));
        assert_eq!((m.root, m.quality), (2, ChordQuality::Major));
    }

    #[test]
    fn empty_window_has_no_chord() {
        let silent = window_of(&[]);
        assert!(best_match(&silent, Key::major(0), &ChordScoring::default()).is_none());
    }

    #[test]
    fn preference_is_configurable() {
        let mut scoring = ChordScoring::default();
        assert_eq!(scoring.preference(ChordQuality::Dominant7), -0.02);
        assert_eq!(scoring.preference(ChordQuality::Major), 0.0);

        // With a big enough bias sus4 beats the plain triad on C-E-G.
        scoring.quality_preference.insert(ChordQuality::Suspended4, 1.0);
        let m = best_match(&window_of(&[0, 4, 7]), Key::major(0), &scoring).unwrap();
        assert_eq!(m.quality, ChordQuality::Suspended4);
    }

    #[test]
    fn lone_root_reads_as_its_major_triad() {
        let m = detect(&[0], Key::major(0));
        assert_eq!((m.root, m.quality), (0, ChordQuality::Major));
        assert!((m.score - 1.15).abs() < 1e-12);
    }

    #[test]
    fn missing_tone_weight_is_opt_in() {
        assert_eq!(ChordScoring::default().missing_tone_weight, 0.0);

        let scoring = ChordScoring {
            missing_tone_weight: 0.1,
            ..ChordScoring::default()
        };
        let lone = best_match(&window_of(&[0]), Key::major(0), &scoring).unwrap();
        assert_eq!((lone.root, lone.quality), (0, ChordQuality::Power));
        assert!((lone.score - 1.10).abs() < 1e-12);

        let triad = best_match(&window_of(&[0, 4, 7]), Key::major(0), &scoring).unwrap();
        assert_eq!((triad.root, triad.quality), (0, ChordQuality::Major));
        assert!(lone.score < triad.score);
    }
}
