//! Fabricator facade
//!
//! One `Fabricator` owns one segment for one fabrication pass. Construction
//! checks every precondition and fails with a fatal error if any of them
//! does not hold:
//!
//! 1. The chain exists and is fabricating
//! 2. Chain config and source material are readable
//! 3. The previous segment, if there is one, is `Crafted`
//! 4. The segment has a waveform key (generated and persisted if missing)
//!
//! After that the craft layers read context through the accessors and
//! append entities through the `add_*` passthroughs, then call
//! [`Fabricator::finalize`] to persist the resolved type.
//!
//! A fabricator is single-threaded: its memo tables are plain cells and
//! are dropped with it.

use crate::catalog::SourceMaterial;
use crate::chord_lookup::segment_chord_at;
use crate::error::{FabricationError, Result};
use crate::meme_isometry::MemeIsometry;
use crate::output::{container_extension, OutputAudioFormat};
use crate::retrospective::{ConstellationGroups, LookupError, SegmentRetrospective};
use crate::segment_type::{resolve_segment_type, PredecessorRunways};
use crate::sequence_binding::SequenceRunway;
use crate::store::{ContentStore, KeyGenerator, SegmentStore, StoreError};
use crate::time_computer::TimeComputer;
use chainweave_common::config::FabricationSettings;
use chainweave_common::models::{
    Arrangement, Chain, Choice, InstrumentAudio, PatternType, Pick, Program, ProgramSequence,
    ProgramSequenceBinding, ProgramSequencePattern, ProgramType, ProgramVoice, Segment,
    SegmentChord, SegmentMeme, SegmentMessage, SegmentType,
};
use chainweave_common::time::{duration_between, seconds_to_duration};
use chainweave_common::{ChainConfigType, ChainConfig};
use once_cell::unsync::OnceCell;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Everything a fabricator talks to outside its own segment
#[derive(Clone)]
pub struct Collaborators {
    pub segments: Arc<dyn SegmentStore>,
    pub content: Arc<dyn ContentStore>,
    pub keys: Arc<dyn KeyGenerator>,
    pub settings: Arc<FabricationSettings>,
}

impl Collaborators {
    pub fn new(
        segments: Arc<dyn SegmentStore>,
        content: Arc<dyn ContentStore>,
        keys: Arc<dyn KeyGenerator>,
        settings: Arc<FabricationSettings>,
    ) -> Self {
        Self {
            segments,
            content,
            keys,
            settings,
        }
    }
}

/// Predecessor runways as seen through the retrospective and catalog
struct Predecessor<'a> {
    retrospective: &'a SegmentRetrospective,
    source: &'a SourceMaterial,
}

impl Predecessor<'_> {
    fn runway_of(&self, program_type: ProgramType) -> std::result::Result<SequenceRunway, LookupError> {
        let choice = self.retrospective.previous_choice_of_type(program_type)?;
        let binding_id = choice
            .program_sequence_binding_id
            .ok_or(LookupError::NoSequenceBinding(choice.id))?;
        let binding = self.source.sequence_binding(binding_id)?;
        Ok(SequenceRunway::new(
            binding.offset,
            self.source.offset_axis(binding.program_id),
        ))
    }
}

impl PredecessorRunways for Predecessor<'_> {
    fn previous_main_runway(&self) -> std::result::Result<SequenceRunway, LookupError> {
        self.runway_of(ProgramType::Main)
    }

    fn previous_macro_runway(&self) -> std::result::Result<SequenceRunway, LookupError> {
        self.runway_of(ProgramType::Macro)
    }
}

pub struct Fabricator {
    segment: Segment,
    chain: Chain,
    /// Chain values, falling back to configured defaults
    chain_configs: BTreeMap<ChainConfigType, String>,
    source: SourceMaterial,
    retrospective: SegmentRetrospective,
    segments: Arc<dyn SegmentStore>,
    settings: Arc<FabricationSettings>,
    started_at: Instant,
    segment_type: OnceCell<SegmentType>,
    time_computer: OnceCell<TimeComputer>,
    /// Choice id → randomly selected sequence id, for choices by sequence
    sequence_for_choice: RefCell<HashMap<Uuid, Uuid>>,
    rng: RefCell<StdRng>,
    /// Set once, on the first Continue finalize with a non-empty run
    continued_segments: OnceCell<Vec<Segment>>,
}

fn rng_for(segment_id: Uuid) -> StdRng {
    let mut seed = [0u8; 32];
    seed[..16].copy_from_slice(segment_id.as_bytes());
    seed[16..].copy_from_slice(segment_id.as_bytes());
    StdRng::from_seed(seed)
}

fn resolve_chain_configs(
    chain_values: Vec<ChainConfig>,
    settings: &FabricationSettings,
) -> BTreeMap<ChainConfigType, String> {
    let mut resolved: BTreeMap<ChainConfigType, String> = ChainConfigType::ALL
        .into_iter()
        .filter_map(|key| {
            settings
                .chain_config_default(key)
                .map(|value| (key, value.to_string()))
        })
        .collect();
    for config in chain_values {
        resolved.insert(config.key, config.value);
    }
    resolved
}

impl Fabricator {
    /// Check preconditions and take ownership of `segment`
    pub fn new(mut segment: Segment, collaborators: &Collaborators) -> Result<Self> {
        let segment_id = segment.id;
        let started_at = Instant::now();
        let settings = collaborators.settings.clone();

        let chain = collaborators
            .segments
            .read_chain(segment.chain_id)
            .map_err(|e| FabricationError::fatal(segment_id, format!("Cannot read chain: {}", e)))?;
        if !chain.state.is_fabricating() {
            return Err(FabricationError::fatal(
                segment_id,
                format!("Chain {} is {:?}, not fabricating", chain.id, chain.state),
            ));
        }
        info!("[segId={}] Chain {} ({})", segment_id, chain.name, chain.id);

        let chain_values = match collaborators.segments.read_chain_configs(chain.id) {
            Ok(configs) => configs,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => {
                return Err(FabricationError::fatal(
                    segment_id,
                    format!("Cannot read chain configs: {}", e),
                ))
            }
        };
        let chain_configs = resolve_chain_configs(chain_values, &settings);
        info!("[segId={}] Chain configs {:?}", segment_id, chain_configs);

        let source = collaborators.content.ingest(chain.id).map_err(|e| {
            FabricationError::fatal(segment_id, format!("Cannot ingest source material: {}", e))
        })?;
        info!("[segId={}] Source material with {} entities", segment_id, source.len());

        let retrospective = SegmentRetrospective::new(
            collaborators.segments.clone(),
            chain.id,
            segment.offset,
            settings.retrospective_cache_capacity,
        );
        if segment.offset > 0 {
            match retrospective.previous_segment() {
                Ok(Some(previous)) if !previous.state.is_crafted() => {
                    return Err(FabricationError::fatal(
                        segment_id,
                        format!(
                            "Previous segment {} at offset {} is {:?}, not Crafted",
                            previous.id, previous.offset, previous.state
                        ),
                    ));
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    return Err(FabricationError::fatal(
                        segment_id,
                        format!(
                            "No segment at offset {} precedes this one",
                            segment.offset - 1
                        ),
                    ));
                }
                Err(e) => {
                    return Err(FabricationError::fatal(
                        segment_id,
                        format!("Cannot read previous segment: {}", e),
                    ))
                }
            }
        }

        if !segment.has_waveform_key() {
            let container = chain_configs
                .get(&ChainConfigType::OutputContainer)
                .ok_or_else(|| {
                    FabricationError::fatal(segment_id, "No output container configured")
                })?;
            let prefix = format!("chains-{}-segments-{}", chain.id, segment.offset);
            let key = collaborators
                .keys
                .generate_key(&prefix, &container_extension(container));
            segment.waveform_key = Some(key);
            collaborators.segments.update_segment(&segment).map_err(|e| {
                FabricationError::fatal(segment_id, format!("Cannot persist waveform key: {}", e))
            })?;
            info!(
                "[segId={}] Generated waveform key {}",
                segment_id,
                segment.waveform_key.as_deref().unwrap_or_default()
            );
        }

        Ok(Self {
            rng: RefCell::new(rng_for(segment_id)),
            segment,
            chain,
            chain_configs,
            source,
            retrospective,
            segments: collaborators.segments.clone(),
            settings,
            started_at,
            segment_type: OnceCell::new(),
            time_computer: OnceCell::new(),
            sequence_for_choice: RefCell::new(HashMap::new()),
            continued_segments: OnceCell::new(),
        })
    }

    fn domain(&self, message: impl Into<String>) -> FabricationError {
        FabricationError::domain(self.segment.id, message)
    }

    fn store_error(&self, e: StoreError) -> FabricationError {
        FabricationError::store(self.segment.id, e)
    }

    fn lookup_error(&self, e: LookupError) -> FabricationError {
        match e {
            LookupError::Store(source) => self.store_error(source),
            other => self.domain(other.to_string()),
        }
    }

    // ---- chain and config ----

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn chain_id(&self) -> Uuid {
        self.chain.id
    }

    /// Chain value for a key, or its configured default
    pub fn chain_config(&self, key: ChainConfigType) -> Result<&str> {
        self.chain_configs
            .get(&key)
            .map(String::as_str)
            .ok_or_else(|| self.domain(format!("No default value for {}", key)))
    }

    pub fn all_chain_configs(&self) -> &BTreeMap<ChainConfigType, String> {
        &self.chain_configs
    }

    pub fn source_material(&self) -> &SourceMaterial {
        &self.source
    }

    // ---- segment ----

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Mutable access to the owned segment
    ///
    /// Drops the memoized time computer, since tempo or length may change.
    pub fn segment_mut(&mut self) -> &mut Segment {
        self.time_computer.take();
        &mut self.segment
    }

    pub fn into_segment(self) -> Segment {
        self.segment
    }

    pub fn is_initial_segment(&self) -> bool {
        self.segment.is_initial()
    }

    pub fn add_choice(&mut self, choice: Choice) -> &Choice {
        self.segment.add_choice(choice)
    }

    pub fn add_arrangement(&mut self, arrangement: Arrangement) -> &Arrangement {
        self.segment.add_arrangement(arrangement)
    }

    pub fn add_pick(&mut self, pick: Pick) -> &Pick {
        self.segment.add_pick(pick)
    }

    pub fn add_chord(&mut self, chord: SegmentChord) -> &SegmentChord {
        self.segment.add_chord(chord)
    }

    pub fn add_meme(&mut self, meme: SegmentMeme) -> &SegmentMeme {
        self.segment.add_meme(meme)
    }

    pub fn add_message(&mut self, message: SegmentMessage) -> &SegmentMessage {
        self.segment.add_message(message)
    }

    pub fn put_report(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.segment.report.insert(key.into(), value.into());
    }

    /// Name of the chord leading up to `position`, or the segment key
    pub fn chord_at(&self, position: f64) -> &str {
        segment_chord_at(&self.segment.chords, &self.segment.key, position)
    }

    pub fn arrangements_of_choice(&self, choice: &Choice) -> Vec<&Arrangement> {
        self.segment.arrangements_of_choice(choice.id)
    }

    /// Audio of every pick in the segment
    pub fn picked_audios(&self) -> Result<Vec<&InstrumentAudio>> {
        self.segment
            .picks
            .iter()
            .map(|pick| {
                self.source.instrument_audio(pick.instrument_audio_id).map_err(|_| {
                    self.domain(format!(
                        "Unable to find audio {} of pick {}",
                        pick.instrument_audio_id, pick.id
                    ))
                })
            })
            .collect()
    }

    /// `end_at - begin_at` plus the waveform preroll
    pub fn segment_total_length(&self) -> Result<Duration> {
        let end_at = self
            .segment
            .end_at
            .ok_or_else(|| self.domain("Cannot compute total length of segment with no end"))?;
        let length = duration_between(self.segment.begin_at, end_at)
            .ok_or_else(|| self.domain("Segment ends before it begins"))?;
        Ok(length + seconds_to_duration(self.segment.waveform_preroll))
    }

    /// Seconds since this fabricator was constructed
    pub fn elapsed_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Segment with every sub-collection, as pretty JSON
    pub fn result_metadata_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.segment)
            .map_err(|e| self.domain(format!("Cannot serialize segment: {}", e)))
    }

    // ---- output ----

    fn numeric_config<T: std::str::FromStr>(&self, key: ChainConfigType) -> Result<T> {
        let value = self.chain_config(key)?;
        value
            .trim()
            .parse()
            .map_err(|_| self.domain(format!("{} is not a number: {}", key, value)))
    }

    pub fn output_audio_format(&self) -> Result<OutputAudioFormat> {
        Ok(OutputAudioFormat::new(
            self.chain_config(ChainConfigType::OutputEncoding)?,
            self.numeric_config(ChainConfigType::OutputFrameRate)?,
            self.numeric_config(ChainConfigType::OutputSampleBits)?,
            self.numeric_config(ChainConfigType::OutputChannels)?,
        ))
    }

    pub fn output_file_path(&self) -> Result<String> {
        let key = self
            .segment
            .waveform_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| self.domain("Segment has no waveform key"))?;
        Ok(format!("{}{}", self.settings.temp_file_path_prefix, key))
    }

    // ---- choices ----

    pub fn current_choice_of_type(&self, program_type: ProgramType) -> Result<&Choice> {
        self.segment
            .choice_of_type(program_type)
            .ok_or_else(|| self.domain(format!("No current {} choice", program_type)))
    }

    pub fn current_macro_choice(&self) -> Result<&Choice> {
        self.current_choice_of_type(ProgramType::Macro)
    }

    pub fn current_main_choice(&self) -> Result<&Choice> {
        self.current_choice_of_type(ProgramType::Main)
    }

    pub fn current_rhythm_choice(&self) -> Result<&Choice> {
        self.current_choice_of_type(ProgramType::Rhythm)
    }

    pub fn current_detail_choices(&self) -> Vec<&Choice> {
        self.segment.choices_of_type(ProgramType::Detail)
    }

    pub fn previous_macro_choice(&self) -> Result<Choice> {
        self.retrospective
            .previous_choice_of_type(ProgramType::Macro)
            .map_err(|e| self.lookup_error(e))
    }

    pub fn previous_main_choice(&self) -> Result<Choice> {
        self.retrospective
            .previous_choice_of_type(ProgramType::Main)
            .map_err(|e| self.lookup_error(e))
    }

    pub fn program(&self, choice: &Choice) -> Result<&Program> {
        self.source
            .program(choice.program_id)
            .map_err(|e| self.store_error(e))
    }

    pub fn sequence_binding(&self, choice: &Choice) -> Result<&ProgramSequenceBinding> {
        let binding_id =
            choice
                .program_sequence_binding_id
                .ok_or(FabricationError::NoSequenceBinding {
                    segment_id: self.segment.id,
                    choice_id: choice.id,
                })?;
        self.source
            .sequence_binding(binding_id)
            .map_err(|e| self.store_error(e))
    }

    /// Sequence of a choice
    ///
    /// Bound choices follow their binding. A choice by sequence gets one
    /// sequence of its program at random, the same one on every call.
    pub fn sequence(&self, choice: &Choice) -> Result<&ProgramSequence> {
        if choice.program_sequence_binding_id.is_some() {
            let binding = self.sequence_binding(choice)?;
            return self
                .source
                .sequence(binding.program_sequence_id)
                .map_err(|e| self.store_error(e));
        }

        let remembered = self.sequence_for_choice.borrow().get(&choice.id).copied();
        if let Some(sequence_id) = remembered {
            return self.source.sequence(sequence_id).map_err(|e| self.store_error(e));
        }

        let program = self.program(choice)?;
        let sequence = self.randomly_select_sequence(program).ok_or_else(|| {
            self.domain(format!("Program {} has no sequences", program.id))
        })?;
        self.sequence_for_choice
            .borrow_mut()
            .insert(choice.id, sequence.id);
        debug!(
            "[segId={}] Selected sequence {} for choice {}",
            self.segment.id, sequence.name, choice.id
        );
        Ok(sequence)
    }

    pub fn randomly_select_sequence(&self, program: &Program) -> Option<&ProgramSequence> {
        let candidates = self.source.sequences_of_program(program.id);
        candidates.choose(&mut *self.rng.borrow_mut()).copied()
    }

    pub fn randomly_select_sequence_binding_at_offset(
        &self,
        program: &Program,
        offset: i64,
    ) -> Result<&ProgramSequenceBinding> {
        let candidates = self.source.bindings_at_offset(program.id, offset);
        candidates
            .choose(&mut *self.rng.borrow_mut())
            .copied()
            .ok_or_else(|| {
                self.domain(format!(
                    "Program {} has no sequence binding at offset {}",
                    program.id, offset
                ))
            })
    }

    /// A pattern of the sequence for the voice and type, if any exists
    pub fn randomly_select_pattern(
        &self,
        sequence: &ProgramSequence,
        voice: &ProgramVoice,
        pattern_type: PatternType,
    ) -> Option<&ProgramSequencePattern> {
        let candidates = self.source.patterns(sequence.id, voice.id, pattern_type);
        candidates.choose(&mut *self.rng.borrow_mut()).copied()
    }

    /// Sequence key for bound choices, program key otherwise
    pub fn key_for_choice(&self, choice: &Choice) -> Result<&str> {
        let program = self.program(choice)?;
        if choice.program_sequence_binding_id.is_some() {
            return Ok(self.sequence(choice)?.key.as_str());
        }
        Ok(program.key.as_str())
    }

    /// Program memes plus, for bound choices, the binding's memes
    pub fn memes_of_choice(&self, choice: &Choice) -> Result<Vec<SegmentMeme>> {
        let program = self.program(choice)?;
        let mut memes: Vec<SegmentMeme> = self
            .source
            .memes_of_program(program.id)
            .into_iter()
            .map(|m| SegmentMeme::new(m.name.clone()))
            .collect();
        if choice.program_sequence_binding_id.is_some() {
            let binding = self.sequence_binding(choice)?;
            memes.extend(
                self.source
                    .memes_of_binding(binding.id)
                    .into_iter()
                    .map(|m| SegmentMeme::new(m.name.clone())),
            );
        }
        Ok(memes)
    }

    // ---- sequence binding navigation ----

    fn runway(&self, choice: &Choice) -> Result<SequenceRunway> {
        let binding = self.sequence_binding(choice)?;
        Ok(SequenceRunway::new(
            binding.offset,
            self.source.offset_axis(binding.program_id),
        ))
    }

    pub fn sequence_binding_offset_for_choice(&self, choice: &Choice) -> Result<i64> {
        Ok(self.sequence_binding(choice)?.offset)
    }

    pub fn max_available_sequence_binding_offset(&self, choice: &Choice) -> Result<i64> {
        self.runway(choice)?
            .axis
            .max_offset()
            .map_err(|e| self.domain(e.to_string()))
    }

    /// Next bound offset of the choice's program, wrapping to 0
    pub fn next_sequence_binding_offset(&self, choice: &Choice) -> Result<i64> {
        Ok(self.runway(choice)?.next_offset())
    }

    pub fn has_one_more_sequence_binding_offset(&self, choice: &Choice) -> Result<bool> {
        Ok(self.runway(choice)?.has_one_more())
    }

    pub fn has_two_more_sequence_binding_offsets(&self, choice: &Choice) -> Result<bool> {
        Ok(self.runway(choice)?.has_two_more())
    }

    // ---- memes ----

    pub fn meme_isometry_of_segment(&self) -> MemeIsometry {
        MemeIsometry::of_memes(self.segment.meme_names())
    }

    /// Memes the current macro program opens with
    pub fn meme_isometry_of_current_macro(&self) -> Result<MemeIsometry> {
        let choice = self.current_macro_choice()?;
        let program = self.program(choice)?;
        Ok(MemeIsometry::of_memes(self.source.memes_at_beginning(program.id)))
    }

    /// Memes of the previous macro's next sequence; empty if unknown
    pub fn meme_isometry_of_next_sequence_in_previous_macro(&self) -> MemeIsometry {
        match self.next_sequence_memes_in_previous_macro() {
            Ok(isometry) => isometry,
            Err(e) => {
                debug!(
                    "[segId={}] No meme isometry of previous macro: {}",
                    self.segment.id, e
                );
                MemeIsometry::none()
            }
        }
    }

    fn next_sequence_memes_in_previous_macro(&self) -> Result<MemeIsometry> {
        let choice = self.previous_macro_choice()?;
        let program = self.program(&choice)?;
        if choice.program_sequence_binding_id.is_none() {
            return Ok(MemeIsometry::of_memes(self.source.memes_at_beginning(program.id)));
        }

        let next_offset = self.next_sequence_binding_offset(&choice)?;
        let mut isometry = MemeIsometry::of_memes(
            self.source
                .memes_of_program(program.id)
                .into_iter()
                .map(|m| m.name.as_str()),
        );
        for binding in self.source.bindings_at_offset(program.id, next_offset) {
            for meme in self.source.memes_of_binding(binding.id) {
                isometry.add(&meme.name);
            }
        }
        Ok(isometry)
    }

    // ---- retrospective ----

    /// The crafted segment immediately before this one
    pub fn previous_segment(&self) -> Result<Segment> {
        self.retrospective
            .previous_segment()
            .map_err(|e| self.store_error(e))?
            .ok_or_else(|| self.domain("Initial segment has no previous segment"))
    }

    /// Previous segments that share the current main program
    pub fn previous_segments_with_same_main_program(&self) -> Vec<Segment> {
        let binding_offset = self
            .current_main_choice()
            .ok()
            .and_then(|choice| self.sequence_binding_offset_for_choice(choice).ok());
        self.retrospective
            .previous_segments_with_same_main_program(binding_offset)
    }

    fn constellation_groups(&self) -> ConstellationGroups {
        ConstellationGroups::of_segments(&self.previous_segments_with_same_main_program())
    }

    pub fn meme_constellation_choices_of_previous_segments(&self) -> BTreeMap<String, Vec<Choice>> {
        self.constellation_groups().choices
    }

    pub fn meme_constellation_arrangements_of_previous_segments(
        &self,
    ) -> BTreeMap<String, Vec<Arrangement>> {
        self.constellation_groups().arrangements
    }

    pub fn meme_constellation_picks_of_previous_segments(&self) -> BTreeMap<String, Vec<Pick>> {
        self.constellation_groups().picks
    }

    /// Segments snapshotted when this segment first finalized as `Continue`
    pub fn continued_segments(&self) -> &[Segment] {
        self.continued_segments.get().map(Vec::as_slice).unwrap_or(&[])
    }

    // ---- type and time ----

    /// Type of this segment, resolved on first call
    pub fn segment_type(&self) -> SegmentType {
        *self.segment_type.get_or_init(|| {
            let resolved = resolve_segment_type(
                self.segment.offset,
                &Predecessor {
                    retrospective: &self.retrospective,
                    source: &self.source,
                },
            );
            info!("[segId={}] Resolved type {}", self.segment.id, resolved);
            resolved
        })
    }

    fn build_time_computer(&self) -> Result<TimeComputer> {
        let to_tempo = self
            .segment
            .tempo
            .ok_or_else(|| self.domain("Cannot compute time of segment with no tempo"))?;
        let total = self
            .segment
            .total
            .ok_or_else(|| self.domain("Cannot compute time of segment with no total"))?;
        let from_tempo = if self.segment.offset <= 0 {
            to_tempo
        } else {
            let previous = self
                .retrospective
                .previous_segment()
                .map_err(|e| self.store_error(e))?
                .ok_or_else(|| self.domain("Cannot compute time without a previous segment"))?;
            previous.tempo.ok_or_else(|| {
                self.domain(format!(
                    "Previous segment {} at offset {} has no tempo",
                    previous.id, previous.offset
                ))
            })?
        };
        TimeComputer::with_resolution(
            f64::from(total),
            from_tempo,
            to_tempo,
            self.settings.frames_per_beat,
            self.settings.resolution_hz,
        )
        .map_err(|e| self.domain(e.to_string()))
    }

    /// Seconds from segment start at a beat position
    ///
    /// The first call builds the time map and records its basis in the
    /// segment report.
    pub fn seconds_at_position(&mut self, position: f64) -> Result<f64> {
        let fresh = self.time_computer.get().is_none();
        let computer = self
            .time_computer
            .get_or_try_init(|| self.build_time_computer())?;
        let seconds = computer.seconds_at_position(position);
        if fresh {
            let (total, from, to) = (
                computer.total_beats(),
                computer.from_tempo(),
                computer.to_tempo(),
            );
            debug!(
                "[segId={}] Time computer over {} beats, {} → {} BPM",
                self.segment.id, total, from, to
            );
            self.put_report("totalBeats", total);
            self.put_report("fromTempo", from);
            self.put_report("toTempo", to);
        }
        Ok(seconds)
    }

    // ---- finalize ----

    /// Persist the resolved type, snapshotting the continued run on `Continue`
    pub fn finalize(&mut self) -> Result<()> {
        let segment_type = self.segment_type();
        self.segment.segment_type = Some(segment_type);

        if segment_type == SegmentType::Continue && self.continued_segments.get().is_none() {
            let previous = self.previous_segments_with_same_main_program();
            if !previous.is_empty() {
                let ids: Vec<String> = previous.iter().map(|s| s.id.to_string()).collect();
                info!(
                    "[segId={}] Continues main sequence of previous segments: {}",
                    self.segment.id,
                    ids.join(",")
                );
                self.put_report("continuedSegments", ids);
                self.continued_segments.get_or_init(|| previous);
            }
        }

        self.segments
            .update_segment(&self.segment)
            .map_err(|e| self.store_error(e))?;
        info!(
            "[segId={}] Finalized {} segment at offset {}",
            self.segment.id, segment_type, self.segment.offset
        );
        Ok(())
    }
}
