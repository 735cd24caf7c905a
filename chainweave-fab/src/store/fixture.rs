//! TOML fixtures describing chains, their planned segments, and a catalog
//!
//! ```toml
//! [catalog]
//! programs = [{ id = "...", name = "Arc", program_type = "Macro", tempo = 120.0 }]
//!
//! [[chains]]
//! id = "..."
//! name = "Demo"
//! state = "Fabricate"
//! begin_at = "2026-01-01T00:00:00Z"
//!
//! [chains.config]
//! OutputContainer = "OGG"
//!
//! [[chains.segments]]
//! offset = 0
//! tempo = 120.0
//! total = 16
//! choices = [{ program_id = "...", program_type = "Main", binding_id = "..." }]
//! ```
//!
//! Every chain gets its own copy of the shared catalog. Segments default
//! to `Planned`; their begin time defaults to the chain's.

use super::MemoryStore;
use chainweave_common::models::{
    Chain, ChainState, Choice, ContentCatalog, ProgramType, Segment, SegmentMeme, SegmentState,
};
use chainweave_common::{ChainConfig, ChainConfigType, Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub catalog: ContentCatalog,
    #[serde(default)]
    pub chains: Vec<FixtureChain>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureChain {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_chain_state")]
    pub state: ChainState,
    pub begin_at: DateTime<Utc>,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    #[serde(default)]
    pub segments: Vec<FixtureSegment>,
}

fn default_chain_state() -> ChainState {
    ChainState::Fabricate
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSegment {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub offset: i64,
    #[serde(default = "default_segment_state")]
    pub state: SegmentState,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub tempo: Option<f64>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub begin_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub waveform_key: Option<String>,
    #[serde(default)]
    pub choices: Vec<FixtureChoice>,
    #[serde(default)]
    pub memes: Vec<String>,
}

fn default_segment_state() -> SegmentState {
    SegmentState::Planned
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureChoice {
    pub program_id: Uuid,
    pub program_type: ProgramType,
    #[serde(default)]
    pub binding_id: Option<Uuid>,
}

impl FixtureSegment {
    fn into_segment(self, chain_id: Uuid, chain_begin_at: DateTime<Utc>) -> Segment {
        let mut segment = Segment::new(chain_id, self.offset, self.begin_at.unwrap_or(chain_begin_at));
        if let Some(id) = self.id {
            segment.id = id;
        }
        segment.state = self.state;
        segment.key = self.key;
        segment.tempo = self.tempo;
        segment.total = self.total;
        segment.end_at = self.end_at;
        segment.waveform_key = self.waveform_key;
        for choice in self.choices {
            let mut built = Choice::new(choice.program_id, choice.program_type);
            built.program_sequence_binding_id = choice.binding_id;
            segment.add_choice(built);
        }
        for meme in self.memes {
            segment.add_meme(SegmentMeme::new(meme));
        }
        segment
    }
}

impl Fixture {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let fixture: Fixture = toml::from_str(content)?;
        fixture.validate()?;
        Ok(fixture)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        for chain in &self.chains {
            for key in chain.config.keys() {
                key.parse::<ChainConfigType>().map_err(|_| {
                    Error::InvalidInput(format!("Chain {}: unknown config key {}", chain.name, key))
                })?;
            }
            let mut offsets: Vec<i64> = chain.segments.iter().map(|s| s.offset).collect();
            offsets.sort_unstable();
            if offsets.windows(2).any(|pair| pair[0] == pair[1]) {
                return Err(Error::InvalidInput(format!(
                    "Chain {}: duplicate segment offset",
                    chain.name
                )));
            }
            if offsets.first().is_some_and(|&first| first < 0) {
                return Err(Error::InvalidInput(format!(
                    "Chain {}: negative segment offset",
                    chain.name
                )));
            }
        }
        Ok(())
    }

    /// Load every chain, config, segment, and catalog into a new store
    pub fn into_store(self) -> Result<MemoryStore> {
        let store = MemoryStore::new();
        for chain in self.chains {
            store.put_chain(Chain {
                id: chain.id,
                name: chain.name.clone(),
                state: chain.state,
            });
            for (key, value) in chain.config {
                store.put_chain_config(ChainConfig::new(chain.id, key.parse()?, value));
            }
            let segment_count = chain.segments.len();
            for segment in chain.segments {
                store.put_segment(segment.into_segment(chain.id, chain.begin_at));
            }
            store.put_catalog(chain.id, self.catalog.clone());
            info!("Loaded chain {} ({}) with {} segments", chain.name, chain.id, segment_count);
        }
        Ok(store)
    }
}
