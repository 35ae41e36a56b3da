//! Stream poll flags.
//!
//! Bit values match the interpreter's `MP_STREAM_POLL_*` constants so the
//! flags can be passed through its `ioctl` poll request unchanged.

use bitflags::bitflags;

bitflags! {
    /// Readiness flags requested from and reported by a poll query.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PollFlags: u16 {
        /// At least one byte is waiting to be read.
        const READ  = 0x0001;
        /// Output can be written without blocking.
        const WRITE = 0x0004;
        /// Error condition.
        const ERR   = 0x0008;
        /// Peer hung up.
        const HUP   = 0x0010;
    }
}
