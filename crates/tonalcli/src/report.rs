//! Plain-text rendering of an analysis.

use std::fmt::Write as _;

use tonal_engine::{HarmonicAnalysis, HarmonicFunction};

fn function_label(function: HarmonicFunction) -> &'static str {
    match function {
        HarmonicFunction::Tonic => "T",
        HarmonicFunction::Subdominant => "S",
        HarmonicFunction::Dominant => "D",
        HarmonicFunction::None => "-",
    }
}

pub fn render(analysis: &HarmonicAnalysis) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Key regions:");
    for region in &analysis.key_regions {
        let _ = writeln!(
            out,
            "  {:>8.2}s - {:>8.2}s  {:<10} confidence {:.2}  ambiguity {:.2}",
            region.start,
            region.end,
            region.key().to_string(),
            region.confidence,
            region.ambiguity
        );
    }

    let _ = writeln!(out, "\nChords:");
    for (chord, tension) in analysis.chords.iter().zip(&analysis.tension) {
        let _ = writeln!(
            out,
            "  {:>8.2}s  {:<8} {:<9} {}  tension {:.2}",
            chord.time,
            chord.symbol(),
            chord.roman(),
            function_label(chord.function),
            tension.value
        );
    }

    let _ = writeln!(out, "\nCadences:");
    if analysis.cadences.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for cadence in &analysis.cadences {
        let _ = writeln!(out, "  {:>8.2}s  {}", cadence.time, cadence.cadence_type);
    }

    out
}
