//! Single-producer / single-consumer byte ring shared with interrupt context.
//!
//! The receive interrupt is the only producer and the foreground reader the
//! only consumer. Neither side ever blocks or takes a lock:
//!
//! - the producer owns `tail` and only ever increments `count`
//! - the consumer owns `head` and only ever decrements `count`
//!
//! `count` is the single source of truth for full and empty, so `head == tail`
//! never has to mean two things. Payload bytes are written before the
//! `Release` increment of `count` that exposes them, and each side loads
//! `count` with `Acquire` before touching a slot the other side may have
//! just handed over.
//!
//! Overflow policy is **drop-newest**: when the ring is full, incoming bytes
//! are discarded and everything already buffered is kept untouched. Drops are
//! counted in [`RingBuffer::dropped_total`].
//!
//! Targets whose atomics lack read-modify-write (`thumbv6m`, for one) need
//! the count updates wrapped in a critical section instead.

use core::{
    cell::UnsafeCell,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Result of offering one byte to the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The byte was queued.
    Accepted,
    /// The ring was full; the byte was discarded and counted.
    Dropped,
}

/// Read side of a byte queue, as seen by the character decoder.
///
/// Offsets are logical: `0` is the oldest queued byte.
pub trait ByteQueue {
    /// Most bytes the queue can ever hold at once.
    fn capacity(&self) -> usize;

    /// Number of bytes currently queued.
    fn available(&self) -> usize;

    /// Returns the byte `offset` positions after the oldest one.
    fn peek_at(&self, offset: usize) -> Option<u8>;

    /// Removes up to `n` of the oldest bytes; returns how many were removed.
    fn discard(&mut self, n: usize) -> usize;

    /// Number of bytes queued at or after logical `offset`.
    fn available_from(&self, offset: usize) -> usize {
        self.available().saturating_sub(offset)
    }

    /// Returns the oldest byte without removing it.
    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    /// Removes and returns the oldest byte.
    fn get(&mut self) -> Option<u8> {
        let byte = self.peek_at(0)?;
        self.discard(1);
        Some(byte)
    }
}

/// Fixed-capacity byte ring with an explicit fill count.
///
/// Capacity is a build-time constant; `N == 0` fails to compile. Shared use
/// goes through [`producer`](Self::producer) and
/// [`consumer`](Self::consumer), each of which can be held by one owner at a
/// time. The `&mut self` methods are for single-context use.
pub struct RingBuffer<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
    /// Next read position. Consumer-owned.
    head: AtomicUsize,
    /// Next write position. Producer-owned.
    tail: AtomicUsize,
    /// Bytes currently queued.
    count: AtomicUsize,
    /// Bytes discarded by the overflow policy since the last reset.
    dropped: AtomicUsize,
    producer_claimed: AtomicBool,
    consumer_claimed: AtomicBool,
}

// Safety: slots are only touched through the producer/consumer discipline
// described in the module docs, and at most one handle of each kind exists.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    const NON_EMPTY: () = assert!(N > 0, "ring buffer capacity must be non-zero");

    /// Creates an empty ring. Usable in `static` initializers.
    #[allow(clippy::let_unit_value)]
    pub const fn new() -> Self {
        let () = Self::NON_EMPTY;
        Self {
            buf: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
            producer_claimed: AtomicBool::new(false),
            consumer_claimed: AtomicBool::new(false),
        }
    }

    /// Maximum number of bytes the ring holds.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of bytes currently queued.
    pub fn available(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Number of bytes queued at or after logical `offset` from the head.
    pub fn available_from(&self, offset: usize) -> usize {
        self.available().saturating_sub(offset)
    }

    /// `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// `true` when the next byte would be dropped.
    pub fn is_full(&self) -> bool {
        self.available() == N
    }

    /// Total bytes dropped by the overflow policy since the last reset.
    pub fn dropped_total(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Counts bytes that were turned away before reaching the ring.
    pub(crate) fn record_dropped(&self, n: usize) {
        self.dropped.fetch_add(n, Ordering::Relaxed);
    }

    /// Claims the producer side. Returns `None` while another producer
    /// handle is alive.
    pub fn producer(&self) -> Option<Producer<'_, N>> {
        self.producer_claimed
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Producer { ring: self })
    }

    /// Claims the consumer side. Returns `None` while another consumer
    /// handle is alive.
    pub fn consumer(&self) -> Option<Consumer<'_, N>> {
        self.consumer_claimed
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Consumer { ring: self })
    }

    /// Queues one byte, dropping it if the ring is full.
    pub fn put(&mut self, byte: u8) -> PutOutcome {
        // Safety: `&mut self` rules out any other producer.
        unsafe { self.push_raw(byte) }
    }

    /// Queues as much of `bytes` as fits, in order; returns the number dropped.
    pub fn put_burst(&mut self, bytes: &[u8]) -> usize {
        // Safety: `&mut self` rules out any other producer.
        unsafe { self.push_slice_raw(bytes) }
    }

    /// Removes and returns the oldest byte.
    pub fn get(&mut self) -> Option<u8> {
        // Safety: `&mut self` rules out any other consumer.
        let byte = unsafe { self.peek_raw(0) }?;
        unsafe { self.discard_raw(1) };
        Some(byte)
    }

    /// Returns the oldest byte without removing it.
    pub fn peek(&mut self) -> Option<u8> {
        // Safety: `&mut self` rules out any other consumer.
        unsafe { self.peek_raw(0) }
    }

    /// Empties the ring and zeroes the drop counter.
    pub fn reset(&mut self) {
        *self.head.get_mut() = 0;
        *self.tail.get_mut() = 0;
        *self.count.get_mut() = 0;
        *self.dropped.get_mut() = 0;
    }

    /// # Safety
    ///
    /// Caller must be the only producer.
    unsafe fn push_raw(&self, byte: u8) -> PutOutcome {
        // Safety: forwarded from the caller.
        if unsafe { self.push_slice_raw(core::slice::from_ref(&byte)) } == 0 {
            PutOutcome::Accepted
        } else {
            PutOutcome::Dropped
        }
    }

    /// # Safety
    ///
    /// Caller must be the only producer.
    unsafe fn push_slice_raw(&self, bytes: &[u8]) -> usize {
        // Acquire pairs with the consumer's Release decrement: slots it has
        // released are fully read before we overwrite them.
        let count = self.count.load(Ordering::Acquire);
        let copied = bytes.len().min(N - count);

        let base = self.buf.get().cast::<u8>();
        let mut tail = self.tail.load(Ordering::Relaxed);
        for &byte in &bytes[..copied] {
            // Safety: `tail < N`, and the slot lies outside the `count`
            // queued bytes, so the consumer is not reading it.
            unsafe { base.add(tail).write(byte) };
            tail = if tail + 1 == N { 0 } else { tail + 1 };
        }
        self.tail.store(tail, Ordering::Relaxed);

        if copied > 0 {
            // Publish: payload is written before the count exposes it.
            self.count.fetch_add(copied, Ordering::Release);
        }

        let dropped = bytes.len() - copied;
        if dropped > 0 {
            self.dropped.fetch_add(dropped, Ordering::Relaxed);
        }
        dropped
    }

    /// # Safety
    ///
    /// Caller must be the only consumer.
    unsafe fn peek_raw(&self, offset: usize) -> Option<u8> {
        let count = self.count.load(Ordering::Acquire);
        if offset >= count {
            return None;
        }
        let head = self.head.load(Ordering::Relaxed);
        let index = (head + offset) % N;
        // Safety: `index < N` and the slot is among the `count` published
        // bytes, which the producer does not touch until we release them.
        Some(unsafe { self.buf.get().cast::<u8>().add(index).read() })
    }

    /// # Safety
    ///
    /// Caller must be the only consumer.
    unsafe fn discard_raw(&self, n: usize) -> usize {
        let n = n.min(self.count.load(Ordering::Relaxed));
        if n == 0 {
            return 0;
        }
        let head = self.head.load(Ordering::Relaxed);
        self.head.store((head + n) % N, Ordering::Relaxed);
        // Hand the slots back to the producer.
        self.count.fetch_sub(n, Ordering::Release);
        n
    }
}

/// Exclusive write handle, held by the receive interrupt.
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Queues one byte, dropping it if the ring is full.
    pub fn put(&mut self, byte: u8) -> PutOutcome {
        // Safety: this handle is the only producer.
        unsafe { self.ring.push_raw(byte) }
    }

    /// Queues as much of `bytes` as fits, in order; returns the number dropped.
    pub fn put_burst(&mut self, bytes: &[u8]) -> usize {
        // Safety: this handle is the only producer.
        unsafe { self.ring.push_slice_raw(bytes) }
    }

    /// Free slots right now. May grow concurrently as the consumer reads.
    pub fn free(&self) -> usize {
        N - self.ring.available()
    }
}

impl<const N: usize> Drop for Producer<'_, N> {
    fn drop(&mut self) {
        self.ring.producer_claimed.store(false, Ordering::Release);
    }
}

/// Exclusive read handle, held by the foreground.
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Total bytes dropped by the overflow policy since the last reset.
    pub fn dropped_total(&self) -> usize {
        self.ring.dropped_total()
    }

    /// Discards every queued byte; returns how many were discarded.
    pub fn clear(&mut self) -> usize {
        let queued = self.available();
        self.discard(queued)
    }

    /// Discards every queued byte and zeroes the drop counter.
    ///
    /// Run with the receive interrupt masked for an exact reset; otherwise
    /// bytes arriving concurrently are either kept or counted as usual.
    pub fn reset(&mut self) {
        self.clear();
        self.ring.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> ByteQueue for Consumer<'_, N> {
    fn capacity(&self) -> usize {
        N
    }

    fn available(&self) -> usize {
        self.ring.available()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        // Safety: this handle is the only consumer, and `discard` needs
        // `&mut self`, so no slot we read can be released meanwhile.
        unsafe { self.ring.peek_raw(offset) }
    }

    fn discard(&mut self, n: usize) -> usize {
        // Safety: this handle is the only consumer.
        unsafe { self.ring.discard_raw(n) }
    }
}

impl<const N: usize> Drop for Consumer<'_, N> {
    fn drop(&mut self) {
        self.ring.consumer_claimed.store(false, Ordering::Release);
    }
}
