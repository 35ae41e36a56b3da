//! Foreground side of the console: blocking reads and readiness polls.
//!
//! A read is a two-state loop. While `Polling` it tries to decode one
//! character: an ordinary character moves it to `Done`, the interrupt
//! character triggers cancellation and keeps polling, and an empty or
//! incomplete ring costs exactly one call to the host's pending-work hook.
//! There is no timeout.

use core::sync::atomic::Ordering;

use kaiku_common::PollFlags;
use kaiku_hal::{CancelSignal, PendingWork};

use crate::console::Console;
use crate::decode::{CodePoint, Decoded};
use crate::relay::Relayed;
use crate::ring::{ByteQueue, Consumer};
use crate::stream::CharStream;

/// Result of a single non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A character for the caller.
    Char(CodePoint),
    /// The interrupt character was read and cancellation requested.
    Cancelled,
    /// No complete character is buffered yet.
    NotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Polling,
    Done(CodePoint),
}

/// Flags a poll query reports for `requested` with `available` bytes queued.
pub(crate) fn read_flags(requested: PollFlags, available: usize) -> PollFlags {
    if requested.contains(PollFlags::READ) && available > 0 {
        PollFlags::READ
    } else {
        PollFlags::empty()
    }
}

/// Exclusive consumer handle for one console.
pub struct Reader<'a, const N: usize> {
    console: &'a Console<N>,
    rx: Consumer<'a, N>,
}

impl<'a, const N: usize> Reader<'a, N> {
    pub(crate) fn new(console: &'a Console<N>, rx: Consumer<'a, N>) -> Self {
        Self { console, rx }
    }

    pub(crate) fn console(&self) -> &'a Console<N> {
        self.console
    }

    /// Bytes buffered right now, complete characters or not.
    pub fn available(&self) -> usize {
        self.rx.available()
    }

    /// Non-blocking readiness query.
    pub fn poll(&self, requested: PollFlags) -> PollFlags {
        read_flags(requested, self.rx.available())
    }

    /// Tries to decode and relay one character.
    pub fn step<C: CancelSignal + ?Sized>(&mut self, cancel: &mut C) -> Step {
        self.report_overflow();

        let decoded = self.console.decoder.decode(&mut self.rx);
        if let Decoded::Raw(byte) = decoded {
            self.console.raw_bytes.fetch_add(1, Ordering::Relaxed);
            log::debug!("console passing stray byte {:#04x} through", byte);
        }
        let Some(code) = decoded.code_point() else {
            return Step::NotReady;
        };

        match self.console.relay.relay(code, cancel) {
            Relayed::Deliver(code) => Step::Char(code),
            Relayed::Cancelled => {
                self.console.cancellations.fetch_add(1, Ordering::Relaxed);
                Step::Cancelled
            }
        }
    }

    /// Returns the next character if one is already buffered.
    ///
    /// Interrupt characters in front of it are relayed on the way.
    pub fn try_read<C: CancelSignal + ?Sized>(&mut self, cancel: &mut C) -> Option<CodePoint> {
        loop {
            match self.step(cancel) {
                Step::Char(code) => return Some(code),
                Step::Cancelled => continue,
                Step::NotReady => return None,
            }
        }
    }

    /// Waits for the next character, running `pending` once per empty poll.
    ///
    /// Never returns the interrupt character: each one calls `cancel` once
    /// and the wait goes on.
    pub fn blocking_read<C, P>(&mut self, cancel: &mut C, pending: &mut P) -> CodePoint
    where
        C: CancelSignal + ?Sized,
        P: PendingWork + ?Sized,
    {
        let mut state = ReadState::Polling;
        loop {
            state = match state {
                ReadState::Polling => match self.step(cancel) {
                    Step::Char(code) => ReadState::Done(code),
                    Step::Cancelled => ReadState::Polling,
                    Step::NotReady => {
                        pending.run_pending();
                        ReadState::Polling
                    }
                },
                ReadState::Done(code) => return code,
            };
        }
    }

    /// Turns this reader into an async stream of characters.
    pub fn into_stream<C: CancelSignal>(self, cancel: C) -> CharStream<'a, N, C> {
        CharStream::new(self, cancel)
    }

    /// Logs drops the foreground has not reported yet.
    fn report_overflow(&self) {
        let total = self.rx.dropped_total();
        let reported = self.console.reported_drops.swap(total, Ordering::Relaxed);
        if total != reported {
            log::warn!(
                "console rx overflow: {} bytes dropped ({} since reset)",
                total.wrapping_sub(reported),
                total
            );
        }
    }
}
