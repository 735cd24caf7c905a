//! Read-only source material for one chain
//!
//! An arena of catalog entities with id indices. Collections keep catalog
//! order, so anything selected from them with a seeded generator is
//! reproducible.

use crate::sequence_binding::OffsetAxis;
use crate::store::{StoreError, StoreResult};
use chainweave_common::models::{
    ContentCatalog, Instrument, InstrumentAudio, PatternType, Program, ProgramMeme,
    ProgramSequence, ProgramSequenceBinding, ProgramSequenceBindingMeme, ProgramSequenceChord,
    ProgramSequencePattern, ProgramSequencePatternEvent, ProgramVoice,
};
use std::collections::HashMap;
use uuid::Uuid;

fn index_by<T>(items: &[T], id: impl Fn(&T) -> Uuid) -> HashMap<Uuid, usize> {
    items.iter().enumerate().map(|(i, item)| (id(item), i)).collect()
}

fn not_found(kind: &str, id: Uuid) -> StoreError {
    StoreError::NotFound(format!("{} {}", kind, id))
}

#[derive(Debug, Clone, Default)]
pub struct SourceMaterial {
    catalog: ContentCatalog,
    programs: HashMap<Uuid, usize>,
    sequences: HashMap<Uuid, usize>,
    bindings: HashMap<Uuid, usize>,
    voices: HashMap<Uuid, usize>,
    instruments: HashMap<Uuid, usize>,
    audios: HashMap<Uuid, usize>,
}

impl SourceMaterial {
    pub fn from_catalog(catalog: ContentCatalog) -> Self {
        Self {
            programs: index_by(&catalog.programs, |p| p.id),
            sequences: index_by(&catalog.program_sequences, |s| s.id),
            bindings: index_by(&catalog.program_sequence_bindings, |b| b.id),
            voices: index_by(&catalog.program_voices, |v| v.id),
            instruments: index_by(&catalog.instruments, |i| i.id),
            audios: index_by(&catalog.instrument_audios, |a| a.id),
            catalog,
        }
    }

    /// Number of entities ingested
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn program(&self, id: Uuid) -> StoreResult<&Program> {
        self.programs
            .get(&id)
            .map(|&i| &self.catalog.programs[i])
            .ok_or_else(|| not_found("Program", id))
    }

    pub fn sequence(&self, id: Uuid) -> StoreResult<&ProgramSequence> {
        self.sequences
            .get(&id)
            .map(|&i| &self.catalog.program_sequences[i])
            .ok_or_else(|| not_found("ProgramSequence", id))
    }

    pub fn sequence_binding(&self, id: Uuid) -> StoreResult<&ProgramSequenceBinding> {
        self.bindings
            .get(&id)
            .map(|&i| &self.catalog.program_sequence_bindings[i])
            .ok_or_else(|| not_found("ProgramSequenceBinding", id))
    }

    pub fn voice(&self, id: Uuid) -> StoreResult<&ProgramVoice> {
        self.voices
            .get(&id)
            .map(|&i| &self.catalog.program_voices[i])
            .ok_or_else(|| not_found("ProgramVoice", id))
    }

    pub fn instrument(&self, id: Uuid) -> StoreResult<&Instrument> {
        self.instruments
            .get(&id)
            .map(|&i| &self.catalog.instruments[i])
            .ok_or_else(|| not_found("Instrument", id))
    }

    pub fn instrument_audio(&self, id: Uuid) -> StoreResult<&InstrumentAudio> {
        self.audios
            .get(&id)
            .map(|&i| &self.catalog.instrument_audios[i])
            .ok_or_else(|| not_found("InstrumentAudio", id))
    }

    pub fn all_instruments(&self) -> &[Instrument] {
        &self.catalog.instruments
    }

    pub fn sequences_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequence> {
        self.catalog
            .program_sequences
            .iter()
            .filter(|s| s.program_id == program_id)
            .collect()
    }

    pub fn bindings_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequenceBinding> {
        self.catalog
            .program_sequence_bindings
            .iter()
            .filter(|b| b.program_id == program_id)
            .collect()
    }

    pub fn bindings_at_offset(&self, program_id: Uuid, offset: i64) -> Vec<&ProgramSequenceBinding> {
        self.catalog
            .program_sequence_bindings
            .iter()
            .filter(|b| b.program_id == program_id && b.offset == offset)
            .collect()
    }

    /// Distinct binding offsets of a program
    pub fn offset_axis(&self, program_id: Uuid) -> OffsetAxis {
        OffsetAxis::new(self.bindings_of_program(program_id).into_iter().map(|b| b.offset))
    }

    pub fn memes_of_program(&self, program_id: Uuid) -> Vec<&ProgramMeme> {
        self.catalog
            .program_memes
            .iter()
            .filter(|m| m.program_id == program_id)
            .collect()
    }

    pub fn memes_of_binding(&self, binding_id: Uuid) -> Vec<&ProgramSequenceBindingMeme> {
        self.catalog
            .program_sequence_binding_memes
            .iter()
            .filter(|m| m.program_sequence_binding_id == binding_id)
            .collect()
    }

    /// Program memes plus the memes of its bindings at offset 0
    ///
    /// What a program sounds like when a chain first enters it.
    pub fn memes_at_beginning(&self, program_id: Uuid) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .memes_of_program(program_id)
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        for binding in self.bindings_at_offset(program_id, 0) {
            names.extend(self.memes_of_binding(binding.id).into_iter().map(|m| m.name.as_str()));
        }
        names
    }

    /// Chords of a sequence in ascending position order
    pub fn chords_of_sequence(&self, sequence_id: Uuid) -> Vec<&ProgramSequenceChord> {
        let mut chords: Vec<&ProgramSequenceChord> = self
            .catalog
            .program_sequence_chords
            .iter()
            .filter(|c| c.program_sequence_id == sequence_id)
            .collect();
        chords.sort_by(|a, b| a.position.total_cmp(&b.position));
        chords
    }

    pub fn voices_of_program(&self, program_id: Uuid) -> Vec<&ProgramVoice> {
        self.catalog
            .program_voices
            .iter()
            .filter(|v| v.program_id == program_id)
            .collect()
    }

    pub fn patterns(
        &self,
        sequence_id: Uuid,
        voice_id: Uuid,
        pattern_type: PatternType,
    ) -> Vec<&ProgramSequencePattern> {
        self.catalog
            .program_sequence_patterns
            .iter()
            .filter(|p| {
                p.program_sequence_id == sequence_id
                    && p.program_voice_id == voice_id
                    && p.pattern_type == pattern_type
            })
            .collect()
    }

    pub fn events_of_pattern(&self, pattern_id: Uuid) -> Vec<&ProgramSequencePatternEvent> {
        self.catalog
            .program_sequence_pattern_events
            .iter()
            .filter(|e| e.program_sequence_pattern_id == pattern_id)
            .collect()
    }

    pub fn audios_of_instrument(&self, instrument_id: Uuid) -> Vec<&InstrumentAudio> {
        self.catalog
            .instrument_audios
            .iter()
            .filter(|a| a.instrument_id == instrument_id)
            .collect()
    }
}
