//! Navigation along a program's sequence binding offsets
//!
//! A macro or main program binds its sequences at integer offsets. A choice
//! bound to one of them sits somewhere on that axis; these functions answer
//! where it can go next and how much runway is left.

use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Program has no sequence bindings")]
    NoBindings,
}

/// Distinct sequence binding offsets of one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetAxis {
    offsets: BTreeSet<i64>,
}

impl OffsetAxis {
    pub fn new(offsets: impl IntoIterator<Item = i64>) -> Self {
        Self {
            offsets: offsets.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> impl Iterator<Item = i64> + '_ {
        self.offsets.iter().copied()
    }

    /// Largest bound offset
    pub fn max_offset(&self) -> Result<i64, NavigationError> {
        self.offsets.last().copied().ok_or(NavigationError::NoBindings)
    }

    /// Smallest bound offset strictly after `current`, wrapping to 0
    pub fn next_offset(&self, current: i64) -> i64 {
        self.offsets
            .range((current.saturating_add(1))..)
            .next()
            .copied()
            .unwrap_or(0)
    }

    /// Whether at least `n` more offsets lie ahead of `current`
    ///
    /// An axis without bindings has no runway.
    pub fn has_at_least_n_more(&self, current: i64, n: i64) -> bool {
        self.max_offset()
            .map(|max| max >= current.saturating_add(n))
            .unwrap_or(false)
    }
}

/// A choice's position on its program's offset axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRunway {
    pub current_offset: i64,
    pub axis: OffsetAxis,
}

impl SequenceRunway {
    pub fn new(current_offset: i64, axis: OffsetAxis) -> Self {
        Self {
            current_offset,
            axis,
        }
    }

    pub fn next_offset(&self) -> i64 {
        self.axis.next_offset(self.current_offset)
    }

    pub fn has_one_more(&self) -> bool {
        self.axis.has_at_least_n_more(self.current_offset, 1)
    }

    pub fn has_two_more(&self) -> bool {
        self.axis.has_at_least_n_more(self.current_offset, 2)
    }
}
