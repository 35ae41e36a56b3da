//! Receive-interrupt side of the console.
//!
//! Called synchronously from the UART receive-complete interrupt with the
//! bytes the hardware just delivered (typically up to 32 per interrupt).
//! The slice points into driver memory that is reused as soon as the
//! callback returns, so everything that fits is copied out immediately.
//!
//! Nothing here blocks or logs. Overflow is counted by the ring and reported
//! later by the foreground reader.

use core::sync::atomic::Ordering;

use kaiku_hal::RxCompleteHandler;

use crate::console::Console;
use crate::ring::Producer;

/// Exclusive producer handle for one console.
pub struct ByteSink<'a, const N: usize> {
    console: &'a Console<N>,
    producer: Producer<'a, N>,
}

impl<'a, const N: usize> ByteSink<'a, N> {
    pub(crate) fn new(console: &'a Console<N>, producer: Producer<'a, N>) -> Self {
        Self { console, producer }
    }

    /// Copies a received burst into the ring, oldest byte first.
    ///
    /// Whatever does not fit is dropped from the end of the burst; bytes
    /// already buffered are never touched. Returns the number dropped.
    pub fn on_rx_complete(&mut self, bytes: &[u8]) -> usize {
        let dropped = self.producer.put_burst(bytes);
        let accepted = bytes.len() - dropped;
        if accepted > 0 {
            self.console.received.fetch_add(accepted, Ordering::Relaxed);
            self.console.rx_waker.wake();
        }
        dropped
    }

    /// Free space in the receive ring right now.
    pub fn free(&self) -> usize {
        self.producer.free()
    }
}

impl<const N: usize> RxCompleteHandler for ByteSink<'_, N> {
    fn on_rx_complete(&mut self, bytes: &[u8]) -> usize {
        ByteSink::on_rx_complete(self, bytes)
    }
}
