//! # Chainweave Common Library
//!
//! Shared code for the chainweave fabrication crates including:
//! - Chain, segment and catalog entity models
//! - Chain configuration keys and their documented defaults
//! - Fabrication settings loading
//! - Common error type
//! - Timestamp utilities

pub mod chain_config;
pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use chain_config::{ChainConfig, ChainConfigType};
pub use error::{Error, Result};
