//! # Chainweave Fabrication Core (chainweave-fab)
//!
//! Decides, for one segment at a time, how it continues the chain before it.
//!
//! **Purpose:** Classify each segment (`Initial`, `Continue`, `NextMain`,
//! `NextMacro`), keep it continuous with prior segments' programs and memes,
//! and map beat positions to seconds across a tempo change.
//!
//! **Architecture:** Pure components (time computer, sequence binding
//! navigation, meme isometry, chord lookup, segment type resolution) wired
//! together by the [`Fabricator`] facade, which owns the segment under
//! fabrication and talks to persistence through the traits in [`store`].

pub mod catalog;
pub mod chord_lookup;
pub mod driver;
pub mod error;
pub mod fabricator;
pub mod meme_isometry;
pub mod output;
pub mod retrospective;
pub mod segment_type;
pub mod sequence_binding;
pub mod store;
pub mod time_computer;

pub use catalog::SourceMaterial;
pub use error::{FabricationError, Result};
pub use fabricator::{Collaborators, Fabricator};
pub use meme_isometry::MemeIsometry;
pub use time_computer::TimeComputer;
