use crate::note::NoteEvent;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// General MIDI percussion channel (channel 10, zero-based 9).
const PERCUSSION_CHANNEL: u8 = 9;

/// Tempo assumed before the first tempo event (120 BPM).
const DEFAULT_MICROSECONDS_PER_BEAT: u32 = 500_000;

/// Timing metadata recovered from a Standard MIDI File.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiContext {
    pub ppq: u16,
    pub format: u8,
    pub track_count: usize,
    pub tempo_changes: Vec<TempoChange>,
    pub time_signatures: Vec<TimeSignature>,
    pub total_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoChange {
    pub tick: u64,
    pub seconds: f64,
    pub microseconds_per_beat: u32,
    pub bpm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSignature {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u8,
}

impl MidiContext {
    /// Tempo at the start of the file, if the file declares one.
    pub fn initial_bpm(&self) -> Option<f64> {
        self.tempo_changes.first().map(|t| t.bpm)
    }

    /// Bar length in quarter-note beats from the first time signature.
    pub fn beats_per_bar(&self) -> Option<f64> {
        self.time_signatures
            .first()
            .map(|ts| ts.numerator as f64 * 4.0 / ts.denominator.max(1) as f64)
    }
}

/// Notes and context extracted from a MIDI file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiImport {
    pub notes: Vec<NoteEvent>,
    pub context: MidiContext,
}

/// A note still measured in ticks, before the tempo map is applied.
#[derive(Debug, Clone, Copy)]
struct TickNote {
    onset: u64,
    offset: u64,
    pitch: u8,
    velocity: u8,
    channel: u8,
}

/// Piecewise-constant tempo map converting ticks to seconds.
struct TempoMap {
    /// (tick, seconds at tick, seconds per tick from here on)
    segments: Vec<(u64, f64, f64)>,
}

impl TempoMap {
    fn metrical(ppq: u16, changes: &[(u64, u32)]) -> Self {
        let ppq = ppq.max(1) as f64;
        let per_tick = |usec: u32| usec as f64 / 1_000_000.0 / ppq;

        let mut segments = vec![(0, 0.0, per_tick(DEFAULT_MICROSECONDS_PER_BEAT))];
        for &(tick, usec) in changes {
            let &(last_tick, last_seconds, last_rate) = segments.last().unwrap_or(&(0, 0.0, 0.0));
            let seconds = last_seconds + (tick - last_tick) as f64 * last_rate;
            if tick == last_tick {
                segments.pop();
            }
            segments.push((tick, seconds, per_tick(usec)));
        }

        Self { segments }
    }

    fn timecode(frames_per_second: f32, ticks_per_frame: u8) -> Self {
        let rate = 1.0 / (frames_per_second as f64 * ticks_per_frame.max(1) as f64);
        Self {
            segments: vec![(0, 0.0, rate)],
        }
    }

    fn seconds(&self, tick: u64) -> f64 {
        let idx = self.segments.partition_point(|&(t, _, _)| t <= tick);
        let (seg_tick, seg_seconds, rate) = self.segments[idx.saturating_sub(1)];
        seg_seconds + tick.saturating_sub(seg_tick) as f64 * rate
    }
}

/// Parse MIDI bytes into second-timed note events.
///
/// Note-on/note-off events are paired per (channel, pitch); a velocity-0
/// note-on counts as a note-off and re-triggered keys stack. Notes left open
/// at the end of their track close there. The percussion channel is skipped
/// because drum hits carry no pitch-class information.
pub fn read_midi(bytes: &[u8]) -> crate::Result<MidiImport> {
    let smf = Smf::parse(bytes).map_err(|e| crate::Error::MidiParse(e.to_string()))?;

    let format = match smf.header.format {
        midly::Format::SingleTrack => 0,
        midly::Format::Parallel => 1,
        midly::Format::Sequential => 2,
    };

    let mut tick_notes = Vec::new();
    let mut tempo_events: Vec<(u64, u32)> = Vec::new();
    let mut time_signatures = Vec::new();
    let mut total_ticks: u64 = 0;

    for track in smf.tracks.iter() {
        let mut current_tick: u64 = 0;
        // (channel, pitch) → stack of (onset_tick, velocity)
        let mut pending: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();

        for event in track {
            current_tick += event.delta.as_int() as u64;

            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    tempo_events.push((current_tick, tempo.as_int()));
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, denom_pow, _, _)) => {
                    time_signatures.push(TimeSignature {
                        tick: current_tick,
                        numerator: num,
                        denominator: 1u8.checked_shl(denom_pow as u32).unwrap_or(4),
                    });
                }
                TrackEventKind::Midi { channel, message } => {
                    let ch = channel.as_int();
                    if ch == PERCUSSION_CHANNEL {
                        continue;
                    }
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            pending
                                .entry((ch, key.as_int()))
                                .or_default()
                                .push((current_tick, vel.as_int()));
                        }
                        MidiMessage::NoteOff { key, .. } | MidiMessage::NoteOn { key, .. } => {
                            let slot = (ch, key.as_int());
                            if let Some((onset, velocity)) =
                                pending.get_mut(&slot).and_then(|stack| stack.pop())
                            {
                                tick_notes.push(TickNote {
                                    onset,
                                    offset: current_tick,
                                    pitch: slot.1,
                                    velocity,
                                    channel: ch,
                                });
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }

            total_ticks = total_ticks.max(current_tick);
        }

        for ((channel, pitch), stack) in pending {
            for (onset, velocity) in stack {
                tick_notes.push(TickNote {
                    onset,
                    offset: current_tick,
                    pitch,
                    velocity,
                    channel,
                });
            }
        }
    }

    // Format-1 files may repeat the tempo map on several tracks
    tempo_events.sort_by_key(|&(tick, _)| tick);
    tempo_events.dedup();
    time_signatures.sort_by_key(|t| t.tick);
    time_signatures.dedup_by(|a, b| a.tick == b.tick);

    let (ppq, tempo_map) = match smf.header.timing {
        Timing::Metrical(ticks) => (
            ticks.as_int(),
            TempoMap::metrical(ticks.as_int(), &tempo_events),
        ),
        Timing::Timecode(fps, subframe) => (480, TempoMap::timecode(fps.as_f32(), subframe)),
    };

    let tempo_changes = tempo_events
        .iter()
        .map(|&(tick, usec)| TempoChange {
            tick,
            seconds: tempo_map.seconds(tick),
            microseconds_per_beat: usec,
            bpm: 60_000_000.0 / usec.max(1) as f64,
        })
        .collect();

    let mut notes: Vec<NoteEvent> = tick_notes
        .iter()
        .map(|n| NoteEvent {
            pitch: n.pitch,
            velocity: n.velocity,
            start: tempo_map.seconds(n.onset),
            end: tempo_map.seconds(n.offset),
            channel: n.channel,
        })
        .collect();

    // Sort by onset, then pitch and channel for determinism
    notes.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then(a.pitch.cmp(&b.pitch))
            .then(a.channel.cmp(&b.channel))
            .then(a.end.total_cmp(&b.end))
    });

    let context = MidiContext {
        ppq,
        format,
        track_count: smf.tracks.len(),
        tempo_changes,
        time_signatures,
        total_seconds: tempo_map.seconds(total_ticks),
    };

    Ok(MidiImport { notes, context })
}
