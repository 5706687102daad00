//! Real-time tonal analysis of note streams.
//!
//! Six stages share one data flow:
//! - **Pitch-class aggregation**: velocity-weighted histograms over bar windows
//! - **Key estimation**: correlation with rotated key profiles, smoothed by
//!   hysteresis into a timeline of key regions
//! - **Chord detection**: best of 17 templates per window, biased toward the key
//! - **Function**: tonic / subdominant / dominant and applied dominants
//! - **Tension**: weighted hierarchical, dissonance, motion and tendency terms
//! - **Cadences**: PAC, IAC, HC, PC and DC from consecutive chord degrees
//!
//! [`Analyzer`] runs the whole pass over a finished note list;
//! [`LiveAnalyzer`] runs it incrementally as notes arrive.

pub mod analyzer;
pub mod cadence;
pub mod chord_templates;
pub mod chords;
pub mod config;
pub mod function;
pub mod key;
pub mod live;
pub mod pitch_class;
pub mod profiles;
pub mod scale;
pub mod tension;
pub mod types;

pub use analyzer::Analyzer;
pub use config::{AnalysisConfig, AnalyzerBuilder};
pub use live::{LiveAnalyzer, LiveUpdate};
pub use profiles::{KeyProfile, ProfileRegistry};
pub use types::{
    CadenceEvent, CadenceType, ChordEvent, ChordQuality, HarmonicAnalysis, HarmonicFunction, Key,
    KeyMode, KeyRegion, SecondaryKind, TensionComponents, TensionSample,
};

/// Errors raised while building an analyzer. Analysis itself cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("unknown key profile: {0}")]
    UnknownProfile(String),
}

pub type Result<T> = std::result::Result<T, Error>;
