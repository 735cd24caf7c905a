//! Collaborator traits for persistence, catalog ingestion, and key generation
//!
//! The fabricator never touches storage directly. Everything it reads or
//! writes outside its own segment goes through these traits, so a pass can
//! run against the in-memory [`MemoryStore`] as easily as a real backend.

mod fixture;
mod memory;

pub use fixture::{Fixture, FixtureChain};
pub use memory::{MemoryStore, ReadCounts};

use crate::catalog::SourceMaterial;
use chainweave_common::models::{Chain, Segment};
use chainweave_common::ChainConfig;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Failure of a collaborator call
///
/// `NotFound` is an ordinary answer ("nothing there"); `Fault` means the
/// backend itself misbehaved and the answer is unknown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage fault: {0}")]
    Fault(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Chain and segment persistence
pub trait SegmentStore: Send + Sync {
    fn read_chain(&self, chain_id: Uuid) -> StoreResult<Chain>;

    /// Config entries set on a chain; `NotFound` when the chain has none
    fn read_chain_configs(&self, chain_id: Uuid) -> StoreResult<Vec<ChainConfig>>;

    fn read_segment_at_offset(&self, chain_id: Uuid, offset: i64) -> StoreResult<Segment>;

    /// Segments with `from <= offset <= to`, ascending by offset
    fn read_segments_in_offset_range(
        &self,
        chain_id: Uuid,
        from: i64,
        to: i64,
    ) -> StoreResult<Vec<Segment>>;

    fn update_segment(&self, segment: &Segment) -> StoreResult<()>;
}

/// Source material ingestion
pub trait ContentStore: Send + Sync {
    /// Everything fabrication may read for one chain
    fn ingest(&self, chain_id: Uuid) -> StoreResult<SourceMaterial>;
}

/// Content-addressed waveform key generation
pub trait KeyGenerator: Send + Sync {
    fn generate_key(&self, prefix: &str, extension: &str) -> String;
}

/// Keys of the form `<prefix>-<sha256(prefix) first 16 hex>.<extension>`
///
/// The same prefix and extension always give the same key.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedKeyGenerator;

impl KeyGenerator for HashedKeyGenerator {
    fn generate_key(&self, prefix: &str, extension: &str) -> String {
        let digest = format!("{:x}", Sha256::digest(prefix.as_bytes()));
        format!("{}-{}.{}", prefix, &digest[..16], extension)
    }
}
