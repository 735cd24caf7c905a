//! Segment type resolution
//!
//! Classifies a segment by how much runway its predecessor's programs have
//! left:
//!
//! ```text
//! offset 0 ─────────────────────────────────────────────► Initial
//! previous main has ≥ 1 more binding offset ─────────────► Continue
//! previous macro has ≥ 2 more binding offsets ───────────► NextMain
//! otherwise ─────────────────────────────────────────────► NextMacro
//! any predecessor lookup failure ────────────────────────► Initial
//! ```
//!
//! A macro with exactly one more offset resolves to NextMacro, not NextMain.

use crate::retrospective::LookupError;
use crate::sequence_binding::SequenceRunway;
use chainweave_common::models::SegmentType;
use tracing::debug;

/// Runways of the predecessor's macro and main choices
pub trait PredecessorRunways {
    fn previous_main_runway(&self) -> Result<SequenceRunway, LookupError>;
    fn previous_macro_runway(&self) -> Result<SequenceRunway, LookupError>;
}

/// Resolve the type of the segment at `offset`
///
/// Never fails. A predecessor that cannot be read forces a fresh start.
pub fn resolve_segment_type(offset: i64, predecessor: &impl PredecessorRunways) -> SegmentType {
    if offset <= 0 {
        return SegmentType::Initial;
    }

    let main = match predecessor.previous_main_runway() {
        Ok(runway) => runway,
        Err(e) => {
            debug!("No previous main runway at offset {} ({}), starting fresh", offset, e);
            return SegmentType::Initial;
        }
    };
    if main.has_one_more() {
        return SegmentType::Continue;
    }

    let macro_runway = match predecessor.previous_macro_runway() {
        Ok(runway) => runway,
        Err(e) => {
            debug!("No previous macro runway at offset {} ({}), starting fresh", offset, e);
            return SegmentType::Initial;
        }
    };
    if macro_runway.has_two_more() {
        SegmentType::NextMain
    } else {
        SegmentType::NextMacro
    }
}
