//! Read-only view of the segments already crafted before this one
//!
//! Lookups go through a small FIFO cache keyed by `(chain_id, offset)`, so
//! each distinct segment is fetched from the store at most once per
//! fabrication pass as long as the cache has room.

use crate::meme_isometry::MemeIsometry;
use crate::store::{SegmentStore, StoreError};
use chainweave_common::models::{Arrangement, Choice, Pick, ProgramType, Segment};
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Why a predecessor lookup produced nothing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("No previous segment")]
    NoPreviousSegment,

    #[error("Previous segment has no {0} choice")]
    NoChoice(ProgramType),

    #[error("Choice {0} has no sequence binding")]
    NoSequenceBinding(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

type SegmentKey = (Uuid, i64);

/// Bounded FIFO memo of segment reads; `None` records a confirmed absence
#[derive(Debug)]
struct SegmentCache {
    capacity: usize,
    order: VecDeque<SegmentKey>,
    entries: HashMap<SegmentKey, Option<Segment>>,
}

impl SegmentCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    fn get(&self, key: &SegmentKey) -> Option<&Option<Segment>> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: SegmentKey, value: Option<Segment>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key, value).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

/// Previous segments' pooled entities, keyed by meme constellation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstellationGroups {
    pub choices: BTreeMap<String, Vec<Choice>>,
    pub arrangements: BTreeMap<String, Vec<Arrangement>>,
    pub picks: BTreeMap<String, Vec<Pick>>,
}

impl ConstellationGroups {
    pub fn of_segments(segments: &[Segment]) -> Self {
        let mut groups = Self::default();
        for segment in segments {
            let constellation = MemeIsometry::of_memes(segment.meme_names()).constellation();
            groups
                .choices
                .entry(constellation.clone())
                .or_default()
                .extend(segment.choices.iter().cloned());
            groups
                .arrangements
                .entry(constellation.clone())
                .or_default()
                .extend(segment.arrangements.iter().cloned());
            groups
                .picks
                .entry(constellation)
                .or_default()
                .extend(segment.picks.iter().cloned());
        }
        groups
    }
}

pub struct SegmentRetrospective {
    store: Arc<dyn SegmentStore>,
    chain_id: Uuid,
    offset: i64,
    cache: RefCell<SegmentCache>,
    same_main: OnceCell<Vec<Segment>>,
}

impl SegmentRetrospective {
    pub fn new(store: Arc<dyn SegmentStore>, chain_id: Uuid, offset: i64, capacity: usize) -> Self {
        Self {
            store,
            chain_id,
            offset,
            cache: RefCell::new(SegmentCache::new(capacity)),
            same_main: OnceCell::new(),
        }
    }

    /// Segment at an offset of this chain, `None` when the store has none
    pub fn segment_at_offset(&self, offset: i64) -> Result<Option<Segment>, StoreError> {
        let key = (self.chain_id, offset);
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let found = match self.store.read_segment_at_offset(self.chain_id, offset) {
            Ok(segment) => Some(segment),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        self.cache.borrow_mut().insert(key, found.clone());
        Ok(found)
    }

    /// The segment at `offset - 1`; `None` for the first segment
    pub fn previous_segment(&self) -> Result<Option<Segment>, StoreError> {
        if self.offset <= 0 {
            return Ok(None);
        }
        self.segment_at_offset(self.offset - 1)
    }

    pub fn previous_choice_of_type(&self, program_type: ProgramType) -> Result<Choice, LookupError> {
        let previous = self.previous_segment()?.ok_or(LookupError::NoPreviousSegment)?;
        previous
            .choice_of_type(program_type)
            .cloned()
            .ok_or(LookupError::NoChoice(program_type))
    }

    /// The run of segments that share the current main program
    ///
    /// Walks back as many segments as the current main choice's binding
    /// offset. Empty when there is no such offset, the range is empty, or
    /// the store fails. The first non-empty answer is memoized.
    pub fn previous_segments_with_same_main_program(
        &self,
        main_binding_offset: Option<i64>,
    ) -> Vec<Segment> {
        if let Some(cached) = self.same_main.get() {
            return cached.clone();
        }

        let Some(binding_offset) = main_binding_offset else {
            return Vec::new();
        };
        let from = self.offset - binding_offset;
        let to = self.offset - 1;
        if self.offset <= 0 || from < 0 || from > to {
            return Vec::new();
        }

        match self.store.read_segments_in_offset_range(self.chain_id, from, to) {
            Ok(segments) => {
                debug!(
                    "Found {} previous segments with same main program in offsets {}..={}",
                    segments.len(),
                    from,
                    to
                );
                {
                    let mut cache = self.cache.borrow_mut();
                    for segment in &segments {
                        cache.insert((self.chain_id, segment.offset), Some(segment.clone()));
                    }
                }
                if segments.is_empty() {
                    return segments;
                }
                self.same_main.get_or_init(|| segments).clone()
            }
            Err(e) => {
                warn!(
                    "Could not read previous segments in offsets {}..={}: {}",
                    from, to, e
                );
                Vec::new()
            }
        }
    }
}
