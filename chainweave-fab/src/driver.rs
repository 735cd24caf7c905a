//! Chain driver
//!
//! Fabricates every `Planned` segment of a chain, one at a time in offset
//! order. Each chain runs on its own blocking worker, so independent chains
//! proceed concurrently while a chain's own segments never overlap.
//!
//! Per segment:
//! 1. Begin where the previous segment ended (when known)
//! 2. Construct the fabricator; a fatal error halts the chain
//! 3. Resolve the segment type
//! 4. Compute the segment's length in seconds and set its end
//! 5. Mark it `Crafted` and finalize

use crate::error::FabricationError;
use crate::fabricator::{Collaborators, Fabricator};
use chainweave_common::models::{SegmentState, SegmentType};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

/// What happened to one segment
#[derive(Debug, Clone, Serialize)]
pub struct SegmentOutcome {
    pub segment_id: Uuid,
    pub offset: i64,
    pub segment_type: Option<SegmentType>,
    /// Length of the segment's beats, in seconds
    pub seconds: Option<f64>,
    pub waveform_key: Option<String>,
    pub error: Option<String>,
}

/// What happened to one chain
#[derive(Debug, Clone, Serialize)]
pub struct ChainReport {
    pub chain_id: Uuid,
    pub outcomes: Vec<SegmentOutcome>,
    /// Set when a fatal error stopped the chain
    pub halted: Option<String>,
}

impl ChainReport {
    pub fn crafted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }
}

fn failed(segment_id: Uuid, offset: i64, e: &FabricationError) -> SegmentOutcome {
    SegmentOutcome {
        segment_id,
        offset,
        segment_type: None,
        seconds: None,
        waveform_key: None,
        error: Some(e.to_string()),
    }
}

/// Fabricate the planned segments of one chain, synchronously
pub fn fabricate_chain(collaborators: &Collaborators, chain_id: Uuid) -> ChainReport {
    let mut report = ChainReport {
        chain_id,
        outcomes: Vec::new(),
        halted: None,
    };

    let segments = match collaborators
        .segments
        .read_segments_in_offset_range(chain_id, 0, i64::MAX)
    {
        Ok(segments) => segments,
        Err(e) => {
            error!("Cannot read segments of chain {}: {}", chain_id, e);
            report.halted = Some(e.to_string());
            return report;
        }
    };

    let mut previous_end: Option<DateTime<Utc>> = None;
    for mut segment in segments {
        if segment.state != SegmentState::Planned {
            previous_end = segment.end_at;
            continue;
        }
        if let Some(end) = previous_end {
            segment.begin_at = end;
        }

        let segment_id = segment.id;
        let offset = segment.offset;
        let mut fabricator = match Fabricator::new(segment, collaborators) {
            Ok(fabricator) => fabricator,
            Err(e) => {
                error!("Chain {} halted at offset {}: {}", chain_id, offset, e);
                report.outcomes.push(failed(segment_id, offset, &e));
                report.halted = Some(e.to_string());
                break;
            }
        };

        let segment_type = fabricator.segment_type();

        let total = fabricator.segment().total;
        let seconds = match total {
            Some(total) => match fabricator.seconds_at_position(f64::from(total)) {
                Ok(seconds) => Some(seconds),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            },
            None => None,
        };

        {
            let segment = fabricator.segment_mut();
            if let Some(seconds) = seconds {
                let micros = (seconds * 1_000_000.0).round() as i64;
                segment.end_at = Some(segment.begin_at + ChronoDuration::microseconds(micros));
            }
            segment.state = SegmentState::Crafted;
        }

        if let Err(e) = fabricator.finalize() {
            error!("Chain {} halted at offset {}: {}", chain_id, offset, e);
            report.outcomes.push(failed(segment_id, offset, &e));
            report.halted = Some(e.to_string());
            break;
        }

        let segment = fabricator.into_segment();
        info!(
            "Crafted {} segment {} at offset {} of chain {}",
            segment_type, segment.id, segment.offset, chain_id
        );
        previous_end = segment.end_at;
        report.outcomes.push(SegmentOutcome {
            segment_id: segment.id,
            offset: segment.offset,
            segment_type: Some(segment_type),
            seconds,
            waveform_key: segment.waveform_key,
            error: None,
        });
    }

    report
}

/// Fabricate several chains concurrently, one blocking worker per chain
pub async fn fabricate_chains(collaborators: Collaborators, chain_ids: Vec<Uuid>) -> Vec<ChainReport> {
    let handles: Vec<_> = chain_ids
        .into_iter()
        .map(|chain_id| {
            let collaborators = collaborators.clone();
            (
                chain_id,
                tokio::task::spawn_blocking(move || fabricate_chain(&collaborators, chain_id)),
            )
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (chain_id, handle) in handles {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("Worker for chain {} failed: {}", chain_id, e);
                reports.push(ChainReport {
                    chain_id,
                    outcomes: Vec::new(),
                    halted: Some(e.to_string()),
                });
            }
        }
    }
    reports
}
