pub mod note;
pub mod smf;
pub mod writer;

pub use note::{NoteEvent, TimeExtent};
pub use smf::{read_midi, MidiContext, MidiImport, TempoChange, TimeSignature};
pub use writer::{write_midi, ExportOptions};

/// Errors from note construction and MIDI file handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    #[error("MIDI write error: {0}")]
    MidiWrite(#[from] std::io::Error),

    #[error("invalid note (pitch {pitch}, velocity {velocity}, {start}s..{end}s): {reason}")]
    InvalidNote {
        pitch: u8,
        velocity: u8,
        start: f64,
        end: f64,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
