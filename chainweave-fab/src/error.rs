//! Error types for chainweave-fab
//!
//! Every fabrication error names the segment it happened on, rendered as a
//! `[segId=...]` prefix so log lines and scheduler alerts can be traced back.
//!
//! - `Fatal`: construction-time, non-retryable for this fabricator. The
//!   scheduler is expected to revert and re-queue the segment.
//! - `Domain`, `Store`, `NoSequenceBinding`: operation-time. Only the
//!   operation that raised them is aborted.

use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum FabricationError {
    /// Preconditions for fabricating this segment do not hold
    #[error("[segId={segment_id}] Fatal: {message}")]
    Fatal { segment_id: Uuid, message: String },

    /// A referenced entity or required field is missing
    #[error("[segId={segment_id}] {message}")]
    Domain { segment_id: Uuid, message: String },

    /// A collaborator call failed during an operation
    #[error("[segId={segment_id}] {source}")]
    Store {
        segment_id: Uuid,
        #[source]
        source: StoreError,
    },

    /// Offset navigation asked of a choice made by sequence
    #[error("[segId={segment_id}] Choice {choice_id} has no sequence binding")]
    NoSequenceBinding { segment_id: Uuid, choice_id: Uuid },
}

impl FabricationError {
    pub fn fatal(segment_id: Uuid, message: impl Into<String>) -> Self {
        FabricationError::Fatal {
            segment_id,
            message: message.into(),
        }
    }

    pub fn domain(segment_id: Uuid, message: impl Into<String>) -> Self {
        FabricationError::Domain {
            segment_id,
            message: message.into(),
        }
    }

    pub fn store(segment_id: Uuid, source: StoreError) -> Self {
        FabricationError::Store { segment_id, source }
    }

    /// Whether the segment must be reverted and re-queued
    pub fn is_fatal(&self) -> bool {
        matches!(self, FabricationError::Fatal { .. })
    }

    pub fn segment_id(&self) -> Uuid {
        match self {
            FabricationError::Fatal { segment_id, .. }
            | FabricationError::Domain { segment_id, .. }
            | FabricationError::Store { segment_id, .. }
            | FabricationError::NoSequenceBinding { segment_id, .. } => *segment_id,
        }
    }
}

/// Convenience Result type using FabricationError
pub type Result<T> = std::result::Result<T, FabricationError>;
