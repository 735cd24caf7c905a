//! In-memory chain, segment, and catalog store
//!
//! Backs the chain driver and the test suites. Maps sit behind `RwLock`s so
//! one store can serve fabricators of several chains from worker threads.
//! Fault switches make reads or writes fail with [`StoreError::Fault`];
//! read counters show how often each call reached the store.

use super::{ContentStore, SegmentStore, StoreError, StoreResult};
use crate::catalog::SourceMaterial;
use chainweave_common::models::{Chain, ContentCatalog, Segment};
use chainweave_common::ChainConfig;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Snapshot of store call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCounts {
    pub chain: u64,
    pub chain_configs: u64,
    pub segment_at_offset: u64,
    pub segments_in_range: u64,
    pub updates: u64,
    pub ingests: u64,
}

#[derive(Debug, Default)]
struct Counters {
    chain: AtomicU64,
    chain_configs: AtomicU64,
    segment_at_offset: AtomicU64,
    segments_in_range: AtomicU64,
    updates: AtomicU64,
    ingests: AtomicU64,
}

#[derive(Debug, Default)]
struct Faults {
    segment_reads: AtomicBool,
    chain_reads: AtomicBool,
    updates: AtomicBool,
    ingest: AtomicBool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    chains: RwLock<HashMap<Uuid, Chain>>,
    configs: RwLock<HashMap<Uuid, Vec<ChainConfig>>>,
    /// Segments per chain, keyed by offset
    segments: RwLock<HashMap<Uuid, BTreeMap<i64, Segment>>>,
    catalogs: RwLock<HashMap<Uuid, ContentCatalog>>,
    counters: Counters,
    faults: Faults,
}

// Every write is a single insert, so a poisoned map is still consistent
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_chain(&self, chain: Chain) {
        write(&self.chains).insert(chain.id, chain);
    }

    pub fn put_chain_config(&self, config: ChainConfig) {
        let mut configs = write(&self.configs);
        let entries = configs.entry(config.chain_id).or_default();
        entries.retain(|existing| existing.key != config.key);
        entries.push(config);
    }

    /// Insert or replace a segment at its offset
    pub fn put_segment(&self, segment: Segment) {
        write(&self.segments)
            .entry(segment.chain_id)
            .or_default()
            .insert(segment.offset, segment);
    }

    pub fn put_catalog(&self, chain_id: Uuid, catalog: ContentCatalog) {
        write(&self.catalogs).insert(chain_id, catalog);
    }

    pub fn chain_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = read(&self.chains).keys().copied().collect();
        ids.sort();
        ids
    }

    /// All segments of a chain, ascending by offset
    pub fn segments_of_chain(&self, chain_id: Uuid) -> Vec<Segment> {
        read(&self.segments)
            .get(&chain_id)
            .map(|by_offset| by_offset.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn read_counts(&self) -> ReadCounts {
        let c = &self.counters;
        ReadCounts {
            chain: c.chain.load(Ordering::Relaxed),
            chain_configs: c.chain_configs.load(Ordering::Relaxed),
            segment_at_offset: c.segment_at_offset.load(Ordering::Relaxed),
            segments_in_range: c.segments_in_range.load(Ordering::Relaxed),
            updates: c.updates.load(Ordering::Relaxed),
            ingests: c.ingests.load(Ordering::Relaxed),
        }
    }

    /// Make segment reads fail with a storage fault
    pub fn fail_reads(&self, fail: bool) {
        self.faults.segment_reads.store(fail, Ordering::Relaxed);
    }

    /// Make chain and chain config reads fail with a storage fault
    pub fn fail_chain_reads(&self, fail: bool) {
        self.faults.chain_reads.store(fail, Ordering::Relaxed);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.faults.updates.store(fail, Ordering::Relaxed);
    }

    pub fn fail_ingest(&self, fail: bool) {
        self.faults.ingest.store(fail, Ordering::Relaxed);
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::Relaxed) {
            Err(StoreError::Fault(format!("Injected fault reading {}", what)))
        } else {
            Ok(())
        }
    }
}

impl SegmentStore for MemoryStore {
    fn read_chain(&self, chain_id: Uuid) -> StoreResult<Chain> {
        bump(&self.counters.chain);
        Self::check(&self.faults.chain_reads, "chain")?;
        read(&self.chains)
            .get(&chain_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Chain {}", chain_id)))
    }

    fn read_chain_configs(&self, chain_id: Uuid) -> StoreResult<Vec<ChainConfig>> {
        bump(&self.counters.chain_configs);
        Self::check(&self.faults.chain_reads, "chain configs")?;
        read(&self.configs)
            .get(&chain_id)
            .filter(|configs| !configs.is_empty())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Configs of chain {}", chain_id)))
    }

    fn read_segment_at_offset(&self, chain_id: Uuid, offset: i64) -> StoreResult<Segment> {
        bump(&self.counters.segment_at_offset);
        Self::check(&self.faults.segment_reads, "segment")?;
        read(&self.segments)
            .get(&chain_id)
            .and_then(|by_offset| by_offset.get(&offset))
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("Segment at offset {} of chain {}", offset, chain_id))
            })
    }

    fn read_segments_in_offset_range(
        &self,
        chain_id: Uuid,
        from: i64,
        to: i64,
    ) -> StoreResult<Vec<Segment>> {
        bump(&self.counters.segments_in_range);
        Self::check(&self.faults.segment_reads, "segments")?;
        if from > to {
            return Ok(Vec::new());
        }
        Ok(read(&self.segments)
            .get(&chain_id)
            .map(|by_offset| by_offset.range(from..=to).map(|(_, s)| s.clone()).collect())
            .unwrap_or_default())
    }

    fn update_segment(&self, segment: &Segment) -> StoreResult<()> {
        bump(&self.counters.updates);
        if self.faults.updates.load(Ordering::Relaxed) {
            return Err(StoreError::Fault(format!(
                "Injected fault updating segment {}",
                segment.id
            )));
        }

        let mut segments = write(&self.segments);
        let by_offset = segments
            .get_mut(&segment.chain_id)
            .ok_or_else(|| StoreError::NotFound(format!("Chain {}", segment.chain_id)))?;
        match by_offset.get(&segment.offset) {
            Some(existing) if existing.id == segment.id => {
                by_offset.insert(segment.offset, segment.clone());
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("Segment {}", segment.id))),
        }
    }
}

impl ContentStore for MemoryStore {
    fn ingest(&self, chain_id: Uuid) -> StoreResult<SourceMaterial> {
        bump(&self.counters.ingests);
        Self::check(&self.faults.ingest, "source material")?;
        read(&self.catalogs)
            .get(&chain_id)
            .cloned()
            .map(SourceMaterial::from_catalog)
            .ok_or_else(|| StoreError::NotFound(format!("Source material of chain {}", chain_id)))
    }
}
