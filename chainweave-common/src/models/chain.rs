//! Chain model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainState {
    Draft,
    Ready,
    Fabricate,
    Complete,
    Failed,
}

impl ChainState {
    /// Whether segments of a chain in this state may be fabricated
    pub fn is_fabricating(&self) -> bool {
        matches!(self, ChainState::Fabricate)
    }
}

/// An ordered, append-only sequence of segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub id: Uuid,
    pub name: String,
    pub state: ChainState,
}

impl Chain {
    pub fn new(name: impl Into<String>, state: ChainState) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            state,
        }
    }
}
