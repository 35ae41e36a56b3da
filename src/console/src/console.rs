//! The console: one receive ring plus everything needed to read from it.
//!
//! A [`Console`] is created once (usually in a `static`) and never torn
//! down. The receive interrupt borrows a [`ByteSink`] from it, the
//! foreground borrows a [`Reader`]; each can be held by one owner at a time.

use core::sync::atomic::{AtomicUsize, Ordering};

use futures_util::task::AtomicWaker;
use kaiku_common::{ConsoleConfig, ConsoleError, PollFlags};
use kaiku_hal::InterruptController;

use crate::decode::{Decoder, SequenceTable};
use crate::reader::{read_flags, Reader};
use crate::relay::InterruptRelay;
use crate::ring::{ByteQueue, RingBuffer};
use crate::sink::ByteSink;

/// Snapshot of the console's receive counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxStats {
    /// Bytes accepted into the ring.
    pub received: usize,
    /// Bytes discarded because the ring was full.
    pub dropped: usize,
    /// Interrupt characters turned into cancellation requests.
    pub cancellations: usize,
    /// Stray bytes passed through undecoded.
    pub raw_bytes: usize,
    /// Bytes waiting in the ring right now.
    pub buffered: usize,
}

/// Interrupt-fed console input with a fixed receive capacity of `N` bytes.
pub struct Console<const N: usize> {
    config: ConsoleConfig,
    pub(crate) rx: RingBuffer<N>,
    pub(crate) decoder: Decoder,
    pub(crate) relay: InterruptRelay,
    /// Woken by the sink whenever bytes are published.
    pub(crate) rx_waker: AtomicWaker,
    pub(crate) received: AtomicUsize,
    pub(crate) cancellations: AtomicUsize,
    pub(crate) raw_bytes: AtomicUsize,
    /// Drop total the foreground has already logged.
    pub(crate) reported_drops: AtomicUsize,
}

impl<const N: usize> Default for Console<N> {
    fn default() -> Self {
        Self::new(ConsoleConfig::new())
    }
}

impl<const N: usize> Console<N> {
    /// Creates a console. Usable in `static` initializers.
    ///
    /// `config` is taken as is; use [`try_new`](Self::try_new) to validate.
    pub const fn new(config: ConsoleConfig) -> Self {
        Self {
            config,
            rx: RingBuffer::new(),
            decoder: Decoder::new(SequenceTable::for_limit(config.sequence_limit())),
            relay: InterruptRelay::new(config.sentinel()),
            rx_waker: AtomicWaker::new(),
            received: AtomicUsize::new(0),
            cancellations: AtomicUsize::new(0),
            raw_bytes: AtomicUsize::new(0),
            reported_drops: AtomicUsize::new(0),
        }
    }

    /// Validates `config`, then creates a console.
    pub fn try_new(config: ConsoleConfig) -> Result<Self, ConsoleError> {
        config.validate()?;
        let console = Self::new(config);
        let longest = console.decoder.table().max_len();
        if longest > N {
            log::debug!(
                "console rx buffer ({} bytes) below {}-byte sequences, long leads pass raw",
                N,
                longest
            );
        }
        Ok(console)
    }

    /// The configuration this console was created with.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Receive ring capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Claims the producer side for the receive interrupt.
    pub fn sink(&self) -> Result<ByteSink<'_, N>, ConsoleError> {
        let producer = self.rx.producer().ok_or(ConsoleError::ProducerBusy)?;
        Ok(ByteSink::new(self, producer))
    }

    /// Claims the consumer side for the foreground.
    pub fn reader(&self) -> Result<Reader<'_, N>, ConsoleError> {
        let consumer = self.rx.consumer().ok_or(ConsoleError::ConsumerBusy)?;
        Ok(Reader::new(self, consumer))
    }

    /// Non-blocking readiness query; needs no reader.
    ///
    /// Reports [`PollFlags::READ`] when it was requested and at least one
    /// byte is buffered, even if that byte does not complete a character.
    pub fn poll(&self, requested: PollFlags) -> PollFlags {
        read_flags(requested, self.rx.available())
    }

    /// Current receive counters.
    pub fn stats(&self) -> RxStats {
        RxStats {
            received: self.received.load(Ordering::Relaxed),
            dropped: self.rx.dropped_total(),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            raw_bytes: self.raw_bytes.load(Ordering::Relaxed),
            buffered: self.rx.available(),
        }
    }

    /// Soft-reboot reset: discards buffered input and zeroes the counters.
    ///
    /// The receive interrupt is masked through `irq` for the duration.
    /// Fails with [`ConsoleError::ConsumerBusy`] while a reader is alive.
    pub fn soft_reset<I: InterruptController>(&self, irq: &mut I) -> Result<(), ConsoleError> {
        let mut rx = self.rx.consumer().ok_or(ConsoleError::ConsumerBusy)?;
        let discarded = irq.without_interrupts(|| {
            let discarded = rx.available();
            rx.reset();
            self.received.store(0, Ordering::Relaxed);
            self.cancellations.store(0, Ordering::Relaxed);
            self.raw_bytes.store(0, Ordering::Relaxed);
            self.reported_drops.store(0, Ordering::Relaxed);
            discarded
        });
        log::debug!("console soft reset, {} buffered bytes discarded", discarded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaiku_common::SequenceLimit;

    struct FakeIrq {
        masked: bool,
        disables: u32,
    }

    impl InterruptController for FakeIrq {
        fn enable(&mut self) {
            self.masked = false;
        }

        fn disable(&mut self) {
            self.masked = true;
            self.disables += 1;
        }

        fn is_enabled(&self) -> bool {
            !self.masked
        }
    }

    #[test]
    fn test_try_new_validates() {
        let bad = ConsoleConfig::new()
            .with_sequence_limit(SequenceLimit::Utf8)
            .with_sentinel(0x7FFF_FFFF);
        assert_eq!(
            Console::<8>::try_new(bad).err(),
            Some(ConsoleError::InvalidSentinel(0x7FFF_FFFF))
        );
        assert!(Console::<8>::try_new(ConsoleConfig::new()).is_ok());
        // Shorter than the longest legacy sequence: accepted, long leads
        // are decoded as raw bytes instead.
        assert!(Console::<4>::try_new(ConsoleConfig::new()).is_ok());
    }

    #[test]
    fn test_handles_claimed_once() {
        let console = Console::<8>::default();
        let sink = console.sink().unwrap();
        assert_eq!(console.sink().err(), Some(ConsoleError::ProducerBusy));
        let reader = console.reader().unwrap();
        assert_eq!(console.reader().err(), Some(ConsoleError::ConsumerBusy));
        drop((sink, reader));
        assert!(console.sink().is_ok());
    }

    #[test]
    fn test_poll_reports_buffered_bytes() {
        let console = Console::<8>::default();
        assert_eq!(console.poll(PollFlags::READ), PollFlags::empty());

        console.sink().unwrap().on_rx_complete(&[0xE2]);
        // Only one byte of three: still readable as far as poll is concerned.
        assert_eq!(console.poll(PollFlags::READ), PollFlags::READ);
        assert_eq!(console.poll(PollFlags::READ), PollFlags::READ);
        assert_eq!(console.poll(PollFlags::WRITE), PollFlags::empty());
        assert_eq!(
            console.poll(PollFlags::READ | PollFlags::WRITE),
            PollFlags::READ
        );
    }

    #[test]
    fn test_soft_reset_clears_buffer_and_stats() {
        let console = Console::<4>::default();
        console.sink().unwrap().on_rx_complete(b"abcdef");
        assert_eq!(
            console.stats(),
            RxStats {
                received: 4,
                dropped: 2,
                cancellations: 0,
                raw_bytes: 0,
                buffered: 4,
            }
        );

        let mut irq = FakeIrq {
            masked: false,
            disables: 0,
        };
        console.soft_reset(&mut irq).unwrap();
        assert!(!irq.masked);
        assert_eq!(irq.disables, 1);
        assert_eq!(console.stats(), RxStats::default());
        assert_eq!(console.poll(PollFlags::READ), PollFlags::empty());
    }

    #[test]
    fn test_soft_reset_inside_masked_section_stays_masked() {
        let console = Console::<4>::default();
        console.sink().unwrap().on_rx_complete(b"ab");

        let mut irq = FakeIrq {
            masked: true,
            disables: 0,
        };
        console.soft_reset(&mut irq).unwrap();
        assert!(irq.masked);
        assert_eq!(console.stats().buffered, 0);
    }

    #[test]
    fn test_soft_reset_refused_while_reading() {
        let console = Console::<4>::default();
        let _reader = console.reader().unwrap();
        let mut irq = FakeIrq {
            masked: false,
            disables: 0,
        };
        assert_eq!(
            console.soft_reset(&mut irq),
            Err(ConsoleError::ConsumerBusy)
        );
        assert_eq!(irq.disables, 0);
    }
}
