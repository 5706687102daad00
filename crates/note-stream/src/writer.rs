use crate::note::NoteEvent;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};

/// How notes are laid out when exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    pub ppq: u16,
    /// Constant tempo used to place notes on the tick grid. Default: 120.
    pub tempo_bpm: f64,
    /// Meter stored in the conductor track. Default: 4/4.
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            ppq: 480,
            tempo_bpm: 120.0,
            numerator: 4,
            denominator: 4,
        }
    }
}

impl ExportOptions {
    fn ticks(&self, seconds: f64) -> u64 {
        let per_second = f64::from(self.ppq) * self.tempo_bpm / 60.0;
        (seconds.max(0.0) * per_second).round() as u64
    }
}

/// Encode notes as a format-1 Standard MIDI File: a conductor track with
/// tempo and meter, then one track holding every note.
pub fn write_midi(notes: &[NoteEvent], options: &ExportOptions) -> crate::Result<Vec<u8>> {
    let header = Header::new(Format::Parallel, Timing::Metrical(u15::new(options.ppq.min(0x7FFF))));
    let mut smf = Smf::new(header);
    smf.tracks.push(conductor_track(options));
    smf.tracks.push(note_track(notes, options));

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

fn at_start(kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(0),
        kind,
    }
}

fn conductor_track(options: &ExportOptions) -> Track<'static> {
    let usec_per_beat = (60_000_000.0 / options.tempo_bpm.max(1.0)).round() as u32;
    let denominator_pow = options.denominator.max(1).trailing_zeros() as u8;

    vec![
        at_start(TrackEventKind::Meta(MetaMessage::Tempo(u24::new(usec_per_beat.min(0xFF_FFFF))))),
        at_start(TrackEventKind::Meta(MetaMessage::TimeSignature(
            options.numerator,
            denominator_pow,
            24,
            8,
        ))),
        at_start(TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ]
}

fn note_track(notes: &[NoteEvent], options: &ExportOptions) -> Track<'static> {
    // (tick, is_on, message); offs sort before ons that share a tick.
    let mut timeline: Vec<(u64, bool, u4, MidiMessage)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let channel = u4::new(note.channel & 0x0F);
        let key = u7::new(note.pitch.min(127));
        timeline.push((
            options.ticks(note.start),
            true,
            channel,
            MidiMessage::NoteOn {
                key,
                vel: u7::new(note.velocity.clamp(1, 127)),
            },
        ));
        timeline.push((
            options.ticks(note.end),
            false,
            channel,
            MidiMessage::NoteOff { key, vel: u7::new(0) },
        ));
    }
    timeline.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut track = Vec::with_capacity(timeline.len() + 1);
    let mut last_tick = 0u64;
    for (tick, _, channel, message) in timeline {
        let delta = (tick - last_tick).min(0x0FFF_FFFF) as u32;
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }
    track.push(at_start(TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    track
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smf::read_midi;
    use pretty_assertions::assert_eq;

    fn note(pitch: u8, start: f64, end: f64) -> NoteEvent {
        NoteEvent::new(pitch, 100, start, end, 0).unwrap()
    }

    #[test]
    fn written_file_reads_back() {
        let notes = vec![note(60, 0.0, 2.0), note(64, 0.0, 2.0), note(67, 2.0, 4.0)];
        let bytes = write_midi(&notes, &ExportOptions::default()).unwrap();

        let import = read_midi(&bytes).unwrap();
        assert_eq!(import.context.track_count, 2);
        assert_eq!(import.notes.len(), notes.len());
        for (read, written) in import.notes.iter().zip(&notes) {
            assert_eq!(read.pitch, written.pitch);
            assert_eq!(read.velocity, written.velocity);
            assert!((read.start - written.start).abs() < 1e-9);
            assert!((read.end - written.end).abs() < 1e-9);
        }
        assert_eq!(import.context.beats_per_bar(), Some(4.0));
    }

    #[test]
    fn tempo_and_meter_are_written() {
        let options = ExportOptions {
            tempo_bpm: 90.0,
            numerator: 3,
            ..ExportOptions::default()
        };
        let bytes = write_midi(&[note(62, 0.0, 1.0)], &options).unwrap();

        let import = read_midi(&bytes).unwrap();
        assert!((import.context.initial_bpm().unwrap() - 90.0).abs() < 0.01);
        assert_eq!(import.context.beats_per_bar(), Some(3.0));
        assert!((import.notes[0].end - 1.0).abs() < 1e-3);
    }

    #[test]
    fn repeated_pitch_releases_before_retrigger() {
        // Back-to-back notes on one key must stay two separate notes.
        let notes = vec![note(60, 0.0, 1.0), note(60, 1.0, 2.0)];
        let bytes = write_midi(&notes, &ExportOptions::default()).unwrap();

        let import = read_midi(&bytes).unwrap();
        let spans: Vec<(f64, f64)> = import.notes.iter().map(|n| (n.start, n.end)).collect();
        assert_eq!(spans, vec![(0.0, 1.0), (1.0, 2.0)]);
    }
}
