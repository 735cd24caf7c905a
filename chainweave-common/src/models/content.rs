//! Source material catalog
//!
//! Programs and instruments ingested from outside. Fabrication only ever
//! reads these; every relationship is an id pointing into the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role a program plays in a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProgramType {
    /// Long narrative arc
    Macro,
    /// Harmonic progression
    Main,
    /// Percussive layer
    Rhythm,
    /// Melodic detail layer
    Detail,
    /// Ambient layer
    Background,
}

impl ProgramType {
    /// Whether choices of this type advance by sequence binding offset
    pub fn is_bound_by_offset(&self) -> bool {
        matches!(self, ProgramType::Macro | ProgramType::Main)
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgramType::Macro => "Macro",
            ProgramType::Main => "Main",
            ProgramType::Rhythm => "Rhythm",
            ProgramType::Detail => "Detail",
            ProgramType::Background => "Background",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub program_type: ProgramType,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub tempo: f64,
    #[serde(default)]
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramMeme {
    pub id: Uuid,
    pub program_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequence {
    pub id: Uuid,
    pub program_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub key: String,
    /// Length in beats
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub density: f64,
}

/// Attachment of a sequence to a program at an offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSequenceBinding {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_sequence_id: Uuid,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSequenceBindingMeme {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_sequence_binding_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceChord {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_sequence_id: Uuid,
    pub position: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramVoice {
    pub id: Uuid,
    pub program_id: Uuid,
    pub instrument_type: InstrumentType,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternType {
    Loop,
    Intro,
    Outro,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequencePattern {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_sequence_id: Uuid,
    pub program_voice_id: Uuid,
    pub pattern_type: PatternType,
    pub name: String,
    /// Length in beats
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequencePatternEvent {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_sequence_pattern_id: Uuid,
    pub position: f64,
    pub duration: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentType {
    Percussive,
    Harmonic,
    Melodic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: Uuid,
    pub name: String,
    pub instrument_type: InstrumentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentAudio {
    pub id: Uuid,
    pub instrument_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub waveform_key: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub tempo: f64,
    #[serde(default)]
    pub pitch: f64,
}

/// Flat, serializable form of a catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentCatalog {
    pub programs: Vec<Program>,
    pub program_memes: Vec<ProgramMeme>,
    pub program_sequences: Vec<ProgramSequence>,
    pub program_sequence_bindings: Vec<ProgramSequenceBinding>,
    pub program_sequence_binding_memes: Vec<ProgramSequenceBindingMeme>,
    pub program_sequence_chords: Vec<ProgramSequenceChord>,
    pub program_voices: Vec<ProgramVoice>,
    pub program_sequence_patterns: Vec<ProgramSequencePattern>,
    pub program_sequence_pattern_events: Vec<ProgramSequencePatternEvent>,
    pub instruments: Vec<Instrument>,
    pub instrument_audios: Vec<InstrumentAudio>,
}

impl ContentCatalog {
    /// Total number of entities
    pub fn len(&self) -> usize {
        self.programs.len()
            + self.program_memes.len()
            + self.program_sequences.len()
            + self.program_sequence_bindings.len()
            + self.program_sequence_binding_memes.len()
            + self.program_sequence_chords.len()
            + self.program_voices.len()
            + self.program_sequence_patterns.len()
            + self.program_sequence_pattern_events.len()
            + self.instruments.len()
            + self.instrument_audios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
