//! Segment model and the entities crafted into a segment

use super::content::ProgramType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentState {
    /// Scheduled, not yet crafted
    Planned,
    /// A fabricator is working on it
    Crafting,
    /// Terminal: fabrication completed
    Crafted,
    /// Fabrication gave up on it
    Failed,
}

impl SegmentState {
    /// Whether this state is the terminal crafted state
    pub fn is_crafted(&self) -> bool {
        matches!(self, SegmentState::Crafted)
    }
}

/// How a segment relates to its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    /// First segment of a chain, or a fresh start after a broken predecessor
    Initial,
    /// Same main program, next sequence binding offset
    Continue,
    /// Same macro program, new main program
    NextMain,
    /// New macro program
    NextMacro,
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentType::Initial => "Initial",
            SegmentType::Continue => "Continue",
            SegmentType::NextMain => "NextMain",
            SegmentType::NextMacro => "NextMacro",
        };
        f.write_str(name)
    }
}

/// The unit of fabrication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: Uuid,
    pub chain_id: Uuid,
    /// Position in the chain, starting at 0
    pub offset: i64,
    pub state: SegmentState,
    #[serde(default)]
    pub segment_type: Option<SegmentType>,
    /// Tonal center, as chord text
    #[serde(default)]
    pub key: String,
    /// Beats per minute
    #[serde(default)]
    pub tempo: Option<f64>,
    /// Length in beats
    #[serde(default)]
    pub total: Option<u32>,
    pub begin_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    /// Seconds of audio rendered ahead of `begin_at`
    #[serde(default)]
    pub waveform_preroll: f64,
    /// Content-addressed storage key of the rendered waveform
    #[serde(default)]
    pub waveform_key: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub arrangements: Vec<Arrangement>,
    #[serde(default)]
    pub picks: Vec<Pick>,
    /// Kept in ascending position order
    #[serde(default)]
    pub chords: Vec<SegmentChord>,
    #[serde(default)]
    pub memes: Vec<SegmentMeme>,
    #[serde(default)]
    pub messages: Vec<SegmentMessage>,
    #[serde(default)]
    pub report: BTreeMap<String, serde_json::Value>,
}

impl Segment {
    /// Create a planned segment with empty sub-collections
    pub fn new(chain_id: Uuid, offset: i64, begin_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chain_id,
            offset,
            state: SegmentState::Planned,
            segment_type: None,
            key: String::new(),
            tempo: None,
            total: None,
            begin_at,
            end_at: None,
            waveform_preroll: 0.0,
            waveform_key: None,
            choices: Vec::new(),
            arrangements: Vec::new(),
            picks: Vec::new(),
            chords: Vec::new(),
            memes: Vec::new(),
            messages: Vec::new(),
            report: BTreeMap::new(),
        }
    }

    /// Whether this is the first segment of its chain
    pub fn is_initial(&self) -> bool {
        self.offset == 0
    }

    /// Whether a non-empty waveform key has been assigned
    pub fn has_waveform_key(&self) -> bool {
        self.waveform_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    /// First choice of the given program type
    pub fn choice_of_type(&self, program_type: ProgramType) -> Option<&Choice> {
        self.choices.iter().find(|c| c.program_type == program_type)
    }

    /// All choices of the given program type
    pub fn choices_of_type(&self, program_type: ProgramType) -> Vec<&Choice> {
        self.choices
            .iter()
            .filter(|c| c.program_type == program_type)
            .collect()
    }

    /// Arrangements made for one choice
    pub fn arrangements_of_choice(&self, choice_id: Uuid) -> Vec<&Arrangement> {
        self.arrangements
            .iter()
            .filter(|a| a.choice_id == choice_id)
            .collect()
    }

    /// Names of the segment's memes
    pub fn meme_names(&self) -> impl Iterator<Item = &str> {
        self.memes.iter().map(|m| m.name.as_str())
    }

    pub fn add_choice(&mut self, mut choice: Choice) -> &Choice {
        choice.segment_id = self.id;
        self.choices.push(choice);
        &self.choices[self.choices.len() - 1]
    }

    pub fn add_arrangement(&mut self, mut arrangement: Arrangement) -> &Arrangement {
        arrangement.segment_id = self.id;
        self.arrangements.push(arrangement);
        &self.arrangements[self.arrangements.len() - 1]
    }

    pub fn add_pick(&mut self, mut pick: Pick) -> &Pick {
        pick.segment_id = self.id;
        self.picks.push(pick);
        &self.picks[self.picks.len() - 1]
    }

    /// Add a chord, keeping chords in ascending position order
    ///
    /// A chord at a position already present lands after the existing one.
    pub fn add_chord(&mut self, mut chord: SegmentChord) -> &SegmentChord {
        chord.segment_id = self.id;
        let index = self
            .chords
            .partition_point(|existing| existing.position <= chord.position);
        self.chords.insert(index, chord);
        &self.chords[index]
    }

    pub fn add_meme(&mut self, mut meme: SegmentMeme) -> &SegmentMeme {
        meme.segment_id = self.id;
        self.memes.push(meme);
        &self.memes[self.memes.len() - 1]
    }

    pub fn add_message(&mut self, mut message: SegmentMessage) -> &SegmentMessage {
        message.segment_id = self.id;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}

/// Which program (and, for macro/main, which sequence binding) was selected
/// for one layer of a segment
///
/// A choice without a sequence binding is "by sequence": its sequence is
/// picked once at random. A choice with one advances deterministically
/// by sequence binding offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: Uuid,
    #[serde(default)]
    pub segment_id: Uuid,
    pub program_id: Uuid,
    pub program_type: ProgramType,
    #[serde(default)]
    pub program_sequence_binding_id: Option<Uuid>,
    /// Semitones applied to the chosen program
    #[serde(default)]
    pub transpose: i32,
}

impl Choice {
    pub fn new(program_id: Uuid, program_type: ProgramType) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id: Uuid::nil(),
            program_id,
            program_type,
            program_sequence_binding_id: None,
            transpose: 0,
        }
    }

    /// Bind this choice to a sequence binding
    pub fn with_sequence_binding(mut self, binding_id: Uuid) -> Self {
        self.program_sequence_binding_id = Some(binding_id);
        self
    }
}

/// Voice of a chosen program arranged onto an instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrangement {
    pub id: Uuid,
    #[serde(default)]
    pub segment_id: Uuid,
    pub choice_id: Uuid,
    pub program_voice_id: Uuid,
    pub instrument_id: Uuid,
}

impl Arrangement {
    pub fn new(choice_id: Uuid, program_voice_id: Uuid, instrument_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id: Uuid::nil(),
            choice_id,
            program_voice_id,
            instrument_id,
        }
    }
}

/// One placed audio of an arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub id: Uuid,
    #[serde(default)]
    pub segment_id: Uuid,
    pub arrangement_id: Uuid,
    pub instrument_audio_id: Uuid,
    /// Start, in seconds from segment begin
    pub start: f64,
    /// Length, in seconds
    pub length: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    /// Pitch, in Hz
    #[serde(default)]
    pub pitch: f64,
}

fn default_amplitude() -> f64 {
    1.0
}

impl Pick {
    pub fn new(arrangement_id: Uuid, instrument_audio_id: Uuid, start: f64, length: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id: Uuid::nil(),
            arrangement_id,
            instrument_audio_id,
            start,
            length,
            amplitude: default_amplitude(),
            pitch: 0.0,
        }
    }
}

/// Chord sounding from a beat position onward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentChord {
    pub id: Uuid,
    #[serde(default)]
    pub segment_id: Uuid,
    pub position: f64,
    pub name: String,
}

impl SegmentChord {
    pub fn new(position: f64, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id: Uuid::nil(),
            position,
            name: name.into(),
        }
    }
}

/// Meme attached to a segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMeme {
    pub id: Uuid,
    #[serde(default)]
    pub segment_id: Uuid,
    pub name: String,
}

impl SegmentMeme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id: Uuid::nil(),
            name: name.into(),
        }
    }
}

/// Severity of a segment message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Info,
    Warning,
    Error,
}

/// Human-readable note left on a segment during fabrication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMessage {
    pub id: Uuid,
    #[serde(default)]
    pub segment_id: Uuid,
    pub message_type: MessageType,
    pub body: String,
}

impl SegmentMessage {
    pub fn new(message_type: MessageType, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id: Uuid::nil(),
            message_type,
            body: body.into(),
        }
    }
}
