use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Pitch classes conventionally spelled with flats.
pub static FLAT_KEY_ROOTS: [u8; 6] = [1, 3, 5, 6, 8, 10];

/// Spell a pitch class, with flats when `use_flats` is set.
pub fn note_name(pitch_class: u8, use_flats: bool) -> &'static str {
    let names = if use_flats {
        &NOTE_NAMES_FLAT
    } else {
        &NOTE_NAMES_SHARP
    };
    names[(pitch_class % 12) as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

/// A tonic pitch class plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    tonic: u8,
    mode: KeyMode,
}

impl Key {
    pub fn new(tonic: u8, mode: KeyMode) -> Self {
        Self {
            tonic: tonic % 12,
            mode,
        }
    }

    pub fn major(tonic: u8) -> Self {
        Self::new(tonic, KeyMode::Major)
    }

    pub fn minor(tonic: u8) -> Self {
        Self::new(tonic, KeyMode::Minor)
    }

    /// Tonic pitch class, always 0–11.
    pub fn tonic(&self) -> u8 {
        self.tonic % 12
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    /// Flat keys spell every chord root with flats (F major, Bb minor...).
    pub fn prefers_flats(&self) -> bool {
        match self.mode {
            KeyMode::Major => FLAT_KEY_ROOTS.contains(&self.tonic()),
            // Relative major decides: D minor -> F major.
            KeyMode::Minor => FLAT_KEY_ROOTS.contains(&((self.tonic() + 3) % 12)),
        }
    }

    pub fn tonic_name(&self) -> &'static str {
        note_name(self.tonic(), self.prefers_flats())
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::major(0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic_name(), self.mode)
    }
}

/// A contiguous span in one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRegion {
    pub tonic: u8,
    pub mode: KeyMode,
    /// Mean of `(r + 1) / 2` for the region's key over its windows.
    pub confidence: f64,
    /// Mean window ambiguity; near 1 when the top two keys are tied.
    pub ambiguity: f64,
    pub start: f64,
    pub end: f64,
}

impl KeyRegion {
    pub fn key(&self) -> Key {
        Key::new(self.tonic, self.mode)
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

/// Find the key active at `time`. The last region also owns its end point.
pub fn key_at(regions: &[KeyRegion], time: f64) -> Option<Key> {
    regions
        .iter()
        .find(|r| r.contains(time))
        .or_else(|| regions.last().filter(|r| time >= r.end))
        .or_else(|| regions.first().filter(|r| time < r.start))
        .map(KeyRegion::key)
}

/// The seventeen recognised chord qualities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChordQuality {
    #[serde(rename = "major")]
    Major,
    #[serde(rename = "minor")]
    Minor,
    #[serde(rename = "dim")]
    Diminished,
    #[serde(rename = "aug")]
    Augmented,
    #[serde(rename = "maj7")]
    Major7,
    #[serde(rename = "dom7")]
    Dominant7,
    #[serde(rename = "min7")]
    Minor7,
    #[serde(rename = "hdim7")]
    HalfDiminished7,
    #[serde(rename = "dim7")]
    Diminished7,
    #[serde(rename = "min_maj7")]
    MinorMajor7,
    #[serde(rename = "sus4")]
    Suspended4,
    #[serde(rename = "sus2")]
    Suspended2,
    #[serde(rename = "7sus4")]
    Dominant7Sus4,
    #[serde(rename = "add9")]
    Add9,
    #[serde(rename = "6")]
    Major6,
    #[serde(rename = "min6")]
    Minor6,
    #[serde(rename = "power")]
    Power,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 17] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Major7,
        ChordQuality::Dominant7,
        ChordQuality::Minor7,
        ChordQuality::HalfDiminished7,
        ChordQuality::Diminished7,
        ChordQuality::MinorMajor7,
        ChordQuality::Suspended4,
        ChordQuality::Suspended2,
        ChordQuality::Dominant7Sus4,
        ChordQuality::Add9,
        ChordQuality::Major6,
        ChordQuality::Minor6,
        ChordQuality::Power,
    ];

    /// Stable name used in output and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Dominant7 => "dom7",
            ChordQuality::Minor7 => "min7",
            ChordQuality::HalfDiminished7 => "hdim7",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::MinorMajor7 => "min_maj7",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Dominant7Sus4 => "7sus4",
            ChordQuality::Add9 => "add9",
            ChordQuality::Major6 => "6",
            ChordQuality::Minor6 => "min6",
            ChordQuality::Power => "power",
        }
    }

    /// Lead-sheet suffix appended to the root name.
    pub fn symbol_suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::MinorMajor7 => "m(maj7)",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Dominant7Sus4 => "7sus4",
            ChordQuality::Add9 => "add9",
            ChordQuality::Major6 => "6",
            ChordQuality::Minor6 => "m6",
            ChordQuality::Power => "5",
        }
    }

    /// Qualities built on a minor third, written with lower-case numerals.
    pub fn has_minor_third(&self) -> bool {
        matches!(
            self,
            ChordQuality::Minor
                | ChordQuality::Diminished
                | ChordQuality::Minor7
                | ChordQuality::HalfDiminished7
                | ChordQuality::Diminished7
                | ChordQuality::MinorMajor7
                | ChordQuality::Minor6
        )
    }

    fn numeral_suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major | ChordQuality::Minor => "",
            ChordQuality::Diminished => "°",
            ChordQuality::Augmented => "+",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Dominant7 | ChordQuality::Minor7 => "7",
            ChordQuality::HalfDiminished7 => "ø7",
            ChordQuality::Diminished7 => "°7",
            ChordQuality::MinorMajor7 => "(maj7)",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Dominant7Sus4 => "7sus4",
            ChordQuality::Add9 => "add9",
            ChordQuality::Major6 | ChordQuality::Minor6 => "6",
            ChordQuality::Power => "5",
        }
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChordQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChordQuality::ALL
            .iter()
            .copied()
            .find(|q| q.name() == s)
            .ok_or_else(|| format!("unknown chord quality `{}`", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
    /// Chromatic chords with no functional role.
    None,
}

/// How a chromatic chord tonicizes the chord after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryKind {
    /// V/x: a major or dominant-seventh chord a fifth above its target.
    Dominant,
    /// vii°/x: a diminished chord a semitone below its target.
    LeadingTone,
}

/// A detected chord with its role in the active key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub time: f64,
    pub root: u8,
    pub quality: ChordQuality,
    /// Scale degree 1–7 in the active key, 0 when chromatic.
    pub degree: u8,
    pub score: f64,
    pub function: HarmonicFunction,
    pub is_secondary_dominant: bool,
    /// Degree of the tonicized chord when secondary.
    pub secondary_target: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_kind: Option<SecondaryKind>,
    /// Key in which `degree` was computed.
    pub key: Key,
}

const MAJOR_NUMERALS: [&str; 12] = [
    "I", "bII", "II", "bIII", "III", "IV", "#IV", "V", "bVI", "VI", "bVII", "VII",
];
const MINOR_NUMERALS: [&str; 12] = [
    "I", "bII", "II", "III", "#III", "IV", "#IV", "V", "VI", "#VI", "VII", "VII",
];

/// Triad numerals of the diatonic degrees, used as the target of `V/x`.
const MAJOR_DEGREE_NUMERALS: [&str; 7] = ["I", "ii", "iii", "IV", "V", "vi", "vii°"];
const MINOR_DEGREE_NUMERALS: [&str; 7] = ["i", "ii°", "III", "iv", "V", "VI", "VII"];

impl ChordEvent {
    /// Lead-sheet symbol, spelled for the active key: "G7", "Bbmaj7", "F#m".
    pub fn symbol(&self) -> String {
        format!(
            "{}{}",
            note_name(self.root, self.key.prefers_flats()),
            self.quality.symbol_suffix()
        )
    }

    /// Roman numeral relative to the active key: "V7", "ii", "V/V", "vii°/ii".
    pub fn roman(&self) -> String {
        if let (Some(kind), Some(target)) = (self.secondary_kind, self.secondary_target) {
            let numerals = match self.key.mode() {
                KeyMode::Major => &MAJOR_DEGREE_NUMERALS,
                KeyMode::Minor => &MINOR_DEGREE_NUMERALS,
            };
            let applied = match (kind, self.quality) {
                (SecondaryKind::Dominant, ChordQuality::Dominant7) => "V7",
                (SecondaryKind::Dominant, _) => "V",
                (SecondaryKind::LeadingTone, ChordQuality::Diminished7) => "vii°7",
                (SecondaryKind::LeadingTone, ChordQuality::HalfDiminished7) => "viiø7",
                (SecondaryKind::LeadingTone, _) => "vii°",
            };
            let target = numerals[(target.clamp(1, 7) - 1) as usize];
            return format!("{}/{}", applied, target);
        }

        let interval = ((self.root % 12 + 12 - self.key.tonic()) % 12) as usize;
        let base = match self.key.mode() {
            KeyMode::Major => MAJOR_NUMERALS[interval],
            KeyMode::Minor => MINOR_NUMERALS[interval],
        };
        let base = if self.quality.has_minor_third() {
            base.to_lowercase()
        } else {
            base.to_string()
        };
        format!("{}{}", base, self.quality.numeral_suffix())
    }
}

/// Weighted parts of a tension value, each already in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensionComponents {
    pub hierarchical: f64,
    pub dissonance: f64,
    pub motion: f64,
    pub tendency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionSample {
    pub time: f64,
    pub value: f64,
    pub components: TensionComponents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CadenceType {
    /// Perfect authentic: V -> I
    Pac,
    /// Imperfect authentic: vii° -> I
    Iac,
    /// Half: arrival on V
    Hc,
    /// Plagal: IV -> I
    Pc,
    /// Deceptive: V -> vi
    Dc,
}

impl fmt::Display for CadenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CadenceType::Pac => "PAC",
            CadenceType::Iac => "IAC",
            CadenceType::Hc => "HC",
            CadenceType::Pc => "PC",
            CadenceType::Dc => "DC",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceEvent {
    pub time: f64,
    #[serde(rename = "type")]
    pub cadence_type: CadenceType,
}

/// Everything one analysis pass produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonicAnalysis {
    pub key_regions: Vec<KeyRegion>,
    pub chords: Vec<ChordEvent>,
    pub tension: Vec<TensionSample>,
    pub cadences: Vec<CadenceEvent>,
}
