//! Entity models
//!
//! Chains and segments are owned by the fabrication side; the content
//! catalog (programs, instruments and everything hanging off them) is
//! ingested read-only and referenced by id.

pub mod chain;
pub mod content;
pub mod segment;

pub use chain::{Chain, ChainState};
pub use content::{
    ContentCatalog, Instrument, InstrumentAudio, InstrumentType, PatternType, Program,
    ProgramMeme, ProgramSequence, ProgramSequenceBinding, ProgramSequenceBindingMeme,
    ProgramSequenceChord, ProgramSequencePattern, ProgramSequencePatternEvent, ProgramType,
    ProgramVoice,
};
pub use segment::{
    Arrangement, Choice, MessageType, Pick, Segment, SegmentChord, SegmentMeme, SegmentMessage,
    SegmentState, SegmentType,
};
