use crate::types::{CadenceEvent, CadenceType, ChordEvent};

/// Cadence formed by the progression `previous -> current`, judged by
/// scale degree alone. Authentic and plagal arrivals take precedence over
/// the half cadence.
pub fn classify_cadence(previous: &ChordEvent, current: &ChordEvent) -> Option<CadenceType> {
    match (previous.degree, current.degree) {
        (5, 1) => Some(CadenceType::Pac),
        (7, 1) => Some(CadenceType::Iac),
        (4, 1) => Some(CadenceType::Pc),
        (5, 6) => Some(CadenceType::Dc),
        (prev, 5) if prev != 5 => Some(CadenceType::Hc),
        _ => None,
    }
}

/// Scan consecutive chord pairs. Each cadence is stamped with the time of
/// its arrival chord.
pub fn detect_cadences(chords: &[ChordEvent]) -> Vec<CadenceEvent> {
    chords
        .windows(2)
        .filter_map(|pair| {
            classify_cadence(&pair[0], &pair[1]).map(|cadence_type| CadenceEvent {
                time: pair[1].time,
                cadence_type,
            })
        })
        .collect()
}
