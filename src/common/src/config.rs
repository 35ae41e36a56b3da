//! Init-time console configuration.
//!
//! The ring buffer capacity is a build-time const generic on the console
//! itself; everything else that the interpreter may choose lives here.

use crate::error::ConsoleError;

/// Default interrupt character: ASCII ETX (Ctrl-C).
pub const DEFAULT_SENTINEL: u32 = 0x03;

/// Largest code point a 6-byte legacy sequence can carry.
pub const MAX_CODE_POINT: u32 = 0x7FFF_FFFF;

/// Longest variable-length sequence the decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceLimit {
    /// Original UTF-8 design: lead bytes announce up to 6 bytes.
    #[default]
    Legacy,
    /// Modern UTF-8: at most 4 bytes, `0xF8..=0xFF` pass through raw.
    Utf8,
}

impl SequenceLimit {
    /// Maximum sequence length in bytes.
    pub const fn max_len(self) -> u8 {
        match self {
            SequenceLimit::Legacy => 6,
            SequenceLimit::Utf8 => 4,
        }
    }

    /// Largest code point a sequence of `max_len` bytes can encode.
    pub const fn max_code_point(self) -> u32 {
        match self {
            SequenceLimit::Legacy => MAX_CODE_POINT,
            SequenceLimit::Utf8 => 0x1F_FFFF,
        }
    }
}

/// Console configuration, fixed once the console is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsoleConfig {
    sentinel: Option<u32>,
    sequence_limit: SequenceLimit,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleConfig {
    /// Ctrl-C as interrupt character, legacy 6-byte decoding.
    pub const fn new() -> Self {
        Self {
            sentinel: Some(DEFAULT_SENTINEL),
            sequence_limit: SequenceLimit::Legacy,
        }
    }

    /// Sets the interrupt character.
    pub const fn with_sentinel(mut self, code_point: u32) -> Self {
        self.sentinel = Some(code_point);
        self
    }

    /// Disables the interrupt character; every code point is delivered.
    pub const fn without_sentinel(mut self) -> Self {
        self.sentinel = None;
        self
    }

    /// Sets the longest accepted sequence.
    pub const fn with_sequence_limit(mut self, limit: SequenceLimit) -> Self {
        self.sequence_limit = limit;
        self
    }

    /// The interrupt character, if enabled.
    pub const fn sentinel(&self) -> Option<u32> {
        self.sentinel
    }

    /// The longest accepted sequence.
    pub const fn sequence_limit(&self) -> SequenceLimit {
        self.sequence_limit
    }

    /// Checks that the sentinel is something the decoder can produce.
    pub fn validate(&self) -> Result<(), ConsoleError> {
        match self.sentinel {
            Some(cp) if cp > self.sequence_limit.max_code_point() => {
                Err(ConsoleError::InvalidSentinel(cp))
            }
            _ => Ok(()),
        }
    }
}
