//! A small chain with a catalog to fabricate against
//!
//! Catalog:
//! - Macro "Arc" (memes EPIC), bindings at offsets 0, 1, 2 carrying
//!   DAWN, NOON, DUSK
//! - Main "Theme" (memes SMOOTH), bindings at offsets 0 and 1 to the
//!   sequences "Verse" (key Am) and "Chorus" (key F); offset 0 carries CALM
//! - Rhythm "Beat" (memes DARK) with two unbound sequences and a kick voice
//! - Instrument "Drums" with one audio

#![allow(dead_code)]

use chainweave_common::config::FabricationSettings;
use chainweave_common::models::{
    Chain, ChainState, Choice, ContentCatalog, Instrument, InstrumentAudio, InstrumentType,
    PatternType, Program, ProgramMeme, ProgramSequence, ProgramSequenceBinding,
    ProgramSequenceBindingMeme, ProgramSequencePattern, ProgramType, ProgramVoice, Segment,
    SegmentMeme, SegmentState,
};
use chainweave_fab::store::{HashedKeyGenerator, MemoryStore};
use chainweave_fab::Collaborators;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub struct World {
    pub store: Arc<MemoryStore>,
    pub chain_id: Uuid,
    pub settings: FabricationSettings,
    pub macro_program: Uuid,
    /// Indexed by offset
    pub macro_bindings: Vec<Uuid>,
    pub main_program: Uuid,
    /// Indexed by offset
    pub main_bindings: Vec<Uuid>,
    pub main_sequences: Vec<Uuid>,
    pub rhythm_program: Uuid,
    pub rhythm_sequences: Vec<Uuid>,
    pub rhythm_voice: Uuid,
    pub kick_loop: Uuid,
    pub instrument: Uuid,
    pub audio: Uuid,
}

fn program(id: Uuid, name: &str, program_type: ProgramType, key: &str) -> Program {
    Program {
        id,
        name: name.to_string(),
        program_type,
        key: key.to_string(),
        tempo: 120.0,
        density: 0.6,
    }
}

fn sequence(id: Uuid, program_id: Uuid, name: &str, key: &str) -> ProgramSequence {
    ProgramSequence {
        id,
        program_id,
        name: name.to_string(),
        key: key.to_string(),
        total: 16,
        density: 0.6,
    }
}

fn binding(id: Uuid, program_id: Uuid, sequence_id: Uuid, offset: i64) -> ProgramSequenceBinding {
    ProgramSequenceBinding {
        id,
        program_id,
        program_sequence_id: sequence_id,
        offset,
    }
}

fn program_meme(program_id: Uuid, name: &str) -> ProgramMeme {
    ProgramMeme {
        id: Uuid::new_v4(),
        program_id,
        name: name.to_string(),
    }
}

fn binding_meme(program_id: Uuid, binding_id: Uuid, name: &str) -> ProgramSequenceBindingMeme {
    ProgramSequenceBindingMeme {
        id: Uuid::new_v4(),
        program_id,
        program_sequence_binding_id: binding_id,
        name: name.to_string(),
    }
}

fn ids(n: usize) -> Vec<Uuid> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

impl World {
    pub fn new() -> Self {
        Self::with_chain_state(ChainState::Fabricate)
    }

    pub fn with_chain_state(state: ChainState) -> Self {
        let chain = Chain::new("Test Chain", state);
        let chain_id = chain.id;

        let macro_program = Uuid::new_v4();
        let macro_sequences = ids(3);
        let macro_bindings = ids(3);
        let main_program = Uuid::new_v4();
        let main_sequences = ids(2);
        let main_bindings = ids(2);
        let rhythm_program = Uuid::new_v4();
        let rhythm_sequences = ids(2);
        let rhythm_voice = Uuid::new_v4();
        let kick_loop = Uuid::new_v4();
        let instrument = Uuid::new_v4();
        let audio = Uuid::new_v4();

        let mut catalog = ContentCatalog {
            programs: vec![
                program(macro_program, "Arc", ProgramType::Macro, "C"),
                program(main_program, "Theme", ProgramType::Main, "Am"),
                program(rhythm_program, "Beat", ProgramType::Rhythm, "E"),
            ],
            program_memes: vec![
                program_meme(macro_program, "Epic"),
                program_meme(main_program, "Smooth"),
                program_meme(rhythm_program, "Dark"),
            ],
            ..Default::default()
        };

        for (offset, (seq, bind)) in macro_sequences.iter().zip(&macro_bindings).enumerate() {
            let name = ["Dawn", "Noon", "Dusk"][offset];
            catalog
                .program_sequences
                .push(sequence(*seq, macro_program, name, "C"));
            catalog
                .program_sequence_bindings
                .push(binding(*bind, macro_program, *seq, offset as i64));
            catalog
                .program_sequence_binding_memes
                .push(binding_meme(macro_program, *bind, name));
        }

        for (offset, (seq, bind)) in main_sequences.iter().zip(&main_bindings).enumerate() {
            let (name, key) = [("Verse", "Am"), ("Chorus", "F")][offset];
            catalog
                .program_sequences
                .push(sequence(*seq, main_program, name, key));
            catalog
                .program_sequence_bindings
                .push(binding(*bind, main_program, *seq, offset as i64));
        }
        catalog
            .program_sequence_binding_memes
            .push(binding_meme(main_program, main_bindings[0], "Calm"));

        for (i, seq) in rhythm_sequences.iter().enumerate() {
            catalog.program_sequences.push(sequence(
                *seq,
                rhythm_program,
                ["Groove A", "Groove B"][i],
                "",
            ));
        }
        catalog.program_voices.push(ProgramVoice {
            id: rhythm_voice,
            program_id: rhythm_program,
            instrument_type: InstrumentType::Percussive,
            name: "Kick".to_string(),
        });
        catalog.program_sequence_patterns.push(ProgramSequencePattern {
            id: kick_loop,
            program_id: rhythm_program,
            program_sequence_id: rhythm_sequences[0],
            program_voice_id: rhythm_voice,
            pattern_type: PatternType::Loop,
            name: "Four on the floor".to_string(),
            total: 4,
        });
        catalog.instruments.push(Instrument {
            id: instrument,
            name: "Drums".to_string(),
            instrument_type: InstrumentType::Percussive,
        });
        catalog.instrument_audios.push(InstrumentAudio {
            id: audio,
            instrument_id: instrument,
            name: "Kick".to_string(),
            waveform_key: "kick.wav".to_string(),
            start: 0.0,
            length: 0.5,
            tempo: 120.0,
            pitch: 55.0,
        });

        let store = Arc::new(MemoryStore::new());
        store.put_chain(chain);
        store.put_catalog(chain_id, catalog);

        Self {
            store,
            chain_id,
            settings: FabricationSettings::default(),
            macro_program,
            macro_bindings,
            main_program,
            main_bindings,
            main_sequences,
            rhythm_program,
            rhythm_sequences,
            rhythm_voice,
            kick_loop,
            instrument,
            audio,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.store.clone(),
            self.store.clone(),
            Arc::new(HashedKeyGenerator),
            Arc::new(self.settings.clone()),
        )
    }

    pub fn macro_choice(&self, offset: usize) -> Choice {
        Choice::new(self.macro_program, ProgramType::Macro)
            .with_sequence_binding(self.macro_bindings[offset])
    }

    pub fn main_choice(&self, offset: usize) -> Choice {
        Choice::new(self.main_program, ProgramType::Main)
            .with_sequence_binding(self.main_bindings[offset])
    }

    pub fn rhythm_choice(&self) -> Choice {
        Choice::new(self.rhythm_program, ProgramType::Rhythm)
    }

    fn segment(&self, offset: i64, state: SegmentState) -> Segment {
        let begin_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::seconds(8 * offset);
        let mut segment = Segment::new(self.chain_id, offset, begin_at);
        segment.state = state;
        segment.key = "Am".to_string();
        segment.tempo = Some(120.0);
        segment.total = Some(16);
        segment
    }

    /// Store a crafted segment with the given macro/main binding offsets
    pub fn crafted(
        &self,
        offset: i64,
        macro_offset: Option<usize>,
        main_offset: Option<usize>,
        memes: &[&str],
    ) -> Segment {
        let mut segment = self.segment(offset, SegmentState::Crafted);
        if let Some(o) = macro_offset {
            segment.add_choice(self.macro_choice(o));
        }
        if let Some(o) = main_offset {
            segment.add_choice(self.main_choice(o));
        }
        for meme in memes {
            segment.add_meme(SegmentMeme::new(*meme));
        }
        segment.end_at = Some(segment.begin_at + chrono::Duration::seconds(8));
        self.store.put_segment(segment.clone());
        segment
    }

    /// Store a segment in any state with no choices
    pub fn stored(&self, offset: i64, state: SegmentState) -> Segment {
        let segment = self.segment(offset, state);
        self.store.put_segment(segment.clone());
        segment
    }

    /// Store a planned segment with no choices
    pub fn planned(&self, offset: i64) -> Segment {
        self.stored(offset, SegmentState::Planned)
    }
}
