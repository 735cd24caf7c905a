//! Meme set fingerprints and compatibility scores
//!
//! Meme names are normalized to trimmed uppercase. A leading `!` marks an
//! exclusion meme; it stays part of the name, so `!BUSY` and `BUSY` never
//! match each other.
//!
//! - **Constellation**: the normalized names sorted and joined with `_`.
//!   Two meme sets are the same theme iff their constellations are equal.
//! - **Score**: the share of this isometry's memes that a candidate set
//!   contains verbatim.

use std::collections::BTreeSet;

/// Separator between names in a constellation
const CONSTELLATION_SEPARATOR: &str = "_";

/// Prefix marking an exclusion meme
pub const EXCLUSION_PREFIX: char = '!';

/// Normalize a meme name for comparison
pub fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Whether a (normalized or raw) meme name is an exclusion constraint
pub fn is_exclusion(name: &str) -> bool {
    name.trim_start().starts_with(EXCLUSION_PREFIX)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemeIsometry {
    sources: BTreeSet<String>,
}

impl MemeIsometry {
    /// An isometry with no memes, scoring 0 against anything
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of_memes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut isometry = Self::none();
        for name in names {
            isometry.add(name.as_ref());
        }
        isometry
    }

    /// Add one meme; blank names are ignored
    pub fn add(&mut self, name: &str) {
        let normalized = normalize(name);
        if !normalized.is_empty() {
            self.sources.insert(normalized);
        }
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }

    /// Canonical, order-independent fingerprint of the meme set
    pub fn constellation(&self) -> String {
        // BTreeSet iterates sorted
        self.sources
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(CONSTELLATION_SEPARATOR)
    }

    /// Fraction of this isometry's memes present in `candidates`, in [0, 1]
    pub fn score<I, S>(&self, candidates: I) -> f64
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.sources.is_empty() {
            return 0.0;
        }

        let matched = candidates
            .into_iter()
            .map(|name| normalize(name.as_ref()))
            .collect::<BTreeSet<_>>()
            .intersection(&self.sources)
            .count();

        matched as f64 / self.sources.len() as f64
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
