//! Interrupt character relay.
//!
//! Runs in the foreground once a character has been dequeued, never from the
//! receive interrupt: the interpreter's cancellation path may unwind, which
//! is not interrupt-safe.

use crate::decode::CodePoint;
use kaiku_hal::CancelSignal;

/// What the relay did with a code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relayed {
    /// Ordinary input for the caller.
    Deliver(CodePoint),
    /// The interrupt character was swallowed and cancellation requested.
    Cancelled,
}

/// Turns the configured interrupt character into a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptRelay {
    sentinel: Option<CodePoint>,
}

impl InterruptRelay {
    /// Relay for `sentinel`; `None` lets every code point through.
    pub const fn new(sentinel: Option<CodePoint>) -> Self {
        Self { sentinel }
    }

    /// The configured interrupt character.
    pub const fn sentinel(&self) -> Option<CodePoint> {
        self.sentinel
    }

    /// Passes `code` through, or swallows it and calls `cancel` exactly once.
    pub fn relay<C: CancelSignal + ?Sized>(&self, code: CodePoint, cancel: &mut C) -> Relayed {
        if self.sentinel == Some(code) {
            cancel.cancel();
            Relayed::Cancelled
        } else {
            Relayed::Deliver(code)
        }
    }
}
