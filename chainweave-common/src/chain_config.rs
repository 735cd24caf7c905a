//! Chain configuration keys
//!
//! A chain carries typed key → value pairs describing its output. Any key
//! the chain does not set falls back to a configured default (see
//! [`crate::config::FabricationSettings::chain_config_defaults`]), which
//! starts out pre-filled with the built-in values below.
//!
//! | Key               | Built-in default |
//! |-------------------|------------------|
//! | `OutputEncoding`  | `PCM_SIGNED`     |
//! | `OutputFrameRate` | `48000`          |
//! | `OutputSampleBits`| `16`             |
//! | `OutputChannels`  | `2`              |
//! | `OutputContainer` | `WAV`            |

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Chain configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainConfigType {
    /// Sample encoding of the output audio, e.g. `PCM_SIGNED` or `PCM_FLOAT`
    OutputEncoding,
    /// Output frames per second
    OutputFrameRate,
    /// Bits per output sample
    OutputSampleBits,
    /// Number of output channels
    OutputChannels,
    /// Output container, which also names the waveform file extension
    OutputContainer,
}

impl ChainConfigType {
    /// Every chain configuration key
    pub const ALL: [ChainConfigType; 5] = [
        ChainConfigType::OutputEncoding,
        ChainConfigType::OutputFrameRate,
        ChainConfigType::OutputSampleBits,
        ChainConfigType::OutputChannels,
        ChainConfigType::OutputContainer,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainConfigType::OutputEncoding => "OutputEncoding",
            ChainConfigType::OutputFrameRate => "OutputFrameRate",
            ChainConfigType::OutputSampleBits => "OutputSampleBits",
            ChainConfigType::OutputChannels => "OutputChannels",
            ChainConfigType::OutputContainer => "OutputContainer",
        }
    }

    /// Built-in default value
    pub fn builtin_default(&self) -> &'static str {
        match self {
            ChainConfigType::OutputEncoding => "PCM_SIGNED",
            ChainConfigType::OutputFrameRate => "48000",
            ChainConfigType::OutputSampleBits => "16",
            ChainConfigType::OutputChannels => "2",
            ChainConfigType::OutputContainer => "WAV",
        }
    }
}

impl fmt::Display for ChainConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainConfigType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ChainConfigType::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown chain config key: {}", s)))
    }
}

/// One configured value of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: Uuid,
    pub key: ChainConfigType,
    pub value: String,
}

impl ChainConfig {
    pub fn new(chain_id: Uuid, key: ChainConfigType, value: impl Into<String>) -> Self {
        Self {
            chain_id,
            key,
            value: value.into(),
        }
    }
}
