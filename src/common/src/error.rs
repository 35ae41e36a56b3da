//! System-wide error types for Kaiku.
//!
//! The ingestion pipeline itself never fails: overflow and malformed input
//! are counted, not raised. These errors only cover setup and handle misuse.

use core::fmt;

/// Console setup and ownership errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConsoleError {
    /// Sentinel cannot be produced by the decoder
    InvalidSentinel(u32),
    /// The system console was already initialized
    AlreadyInitialized,
    /// The system console has not been initialized
    NotInitialized,
    /// The producer side is already claimed
    ProducerBusy,
    /// The consumer side is already claimed
    ConsumerBusy,
    /// Executor run queue is full
    TaskQueueFull,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::InvalidSentinel(cp) => {
                write!(f, "sentinel {:#x} is not a decodable code point", cp)
            }
            ConsoleError::AlreadyInitialized => write!(f, "console already initialized"),
            ConsoleError::NotInitialized => write!(f, "console not initialized"),
            ConsoleError::ProducerBusy => write!(f, "console producer already claimed"),
            ConsoleError::ConsumerBusy => write!(f, "console consumer already claimed"),
            ConsoleError::TaskQueueFull => write!(f, "executor task queue full"),
        }
    }
}
