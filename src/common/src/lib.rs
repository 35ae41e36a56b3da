//! Types shared between the Kaiku console crates.
//!
//! - `config`: init-time console configuration
//! - `error`: setup and ownership errors
//! - `poll`: stream poll flags

#![no_std]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod poll;

pub use config::{ConsoleConfig, SequenceLimit, DEFAULT_SENTINEL, MAX_CODE_POINT};
pub use error::ConsoleError;
pub use poll::PollFlags;
