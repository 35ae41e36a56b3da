//! Variable-length character decoding straight out of the receive ring.
//!
//! The decoder is stateless: each call looks at the bytes currently queued,
//! and either consumes one whole character or consumes nothing. A sequence
//! whose tail has not arrived yet simply stays in the ring until a later
//! call finds it complete.

use crate::ring::ByteQueue;
use kaiku_common::SequenceLimit;

/// A decoded code point. Raw pass-through bytes are reported by value too.
pub type CodePoint = u32;

/// Outcome of one decode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Nothing is queued.
    Empty,
    /// The lead byte announces `needed` bytes but only `buffered` are queued.
    /// Nothing was consumed.
    Incomplete {
        /// Sequence length announced by the lead byte.
        needed: usize,
        /// Bytes queued right now.
        buffered: usize,
    },
    /// A complete character was consumed.
    Char(CodePoint),
    /// A byte that cannot start a sequence was consumed and passed through.
    Raw(u8),
}

impl Decoded {
    /// The value to hand to the reader, if a byte or character was consumed.
    pub fn code_point(self) -> Option<CodePoint> {
        match self {
            Decoded::Char(cp) => Some(cp),
            Decoded::Raw(byte) => Some(CodePoint::from(byte)),
            Decoded::Empty | Decoded::Incomplete { .. } => None,
        }
    }
}

/// Sequence length announced by each possible lead byte.
#[derive(Clone, PartialEq, Eq)]
pub struct SequenceTable([u8; 256]);

impl core::fmt::Debug for SequenceTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SequenceTable")
            .field("max_len", &self.max_len())
            .finish()
    }
}

impl SequenceTable {
    /// Lead bytes up to `0xFD` announce 1 to 6 bytes.
    pub const LEGACY: SequenceTable = SequenceTable::with_max_len(6);
    /// Lead bytes stop at `0xF7` (4 bytes); anything longer passes through.
    pub const UTF8: SequenceTable = SequenceTable::with_max_len(4);

    /// Builds the standard table with sequences longer than `max_len`
    /// demoted to single-byte pass-through.
    pub const fn with_max_len(max_len: u8) -> Self {
        let mut table = [1u8; 256];
        let mut lead = 0xC0;
        while lead < 0xFE {
            let len = match lead {
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                0xF8..=0xFB => 5,
                _ => 6,
            };
            if len <= max_len {
                table[lead] = len;
            }
            lead += 1;
        }
        SequenceTable(table)
    }

    /// Table for a configured sequence limit.
    pub const fn for_limit(limit: SequenceLimit) -> Self {
        Self::with_max_len(limit.max_len())
    }

    /// Sequence length announced by `lead`.
    pub const fn sequence_len(&self, lead: u8) -> usize {
        self.0[lead as usize] as usize
    }

    /// Longest sequence any lead byte announces.
    pub fn max_len(&self) -> usize {
        self.0.iter().copied().max().map_or(1, usize::from)
    }
}

/// Payload bits of a lead byte that starts a `len`-byte sequence.
const fn lead_mask(len: usize) -> u8 {
    0x7F >> len
}

/// Stateless character decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    table: SequenceTable,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(SequenceTable::LEGACY)
    }
}

impl Decoder {
    /// Creates a decoder using `table` for lead byte lengths.
    pub const fn new(table: SequenceTable) -> Self {
        Self { table }
    }

    /// The lead byte table in use.
    pub fn table(&self) -> &SequenceTable {
        &self.table
    }

    /// Decodes at most one character from the front of `queue`.
    ///
    /// Consumes exactly the bytes of the character it returns, or nothing
    /// at all. Never fails: a byte that cannot lead a sequence comes back
    /// as [`Decoded::Raw`], and so does a lead byte announcing more bytes
    /// than `queue` can hold. Continuation bytes are packed without being
    /// checked.
    pub fn decode<Q: ByteQueue + ?Sized>(&self, queue: &mut Q) -> Decoded {
        let Some(lead) = queue.peek() else {
            return Decoded::Empty;
        };

        let mut needed = self.table.sequence_len(lead);
        if needed > queue.capacity() {
            // Would never fit, so waiting for the tail would stall the reader.
            needed = 1;
        }
        let buffered = queue.available_from(0);
        if buffered < needed {
            return Decoded::Incomplete { needed, buffered };
        }

        if needed == 1 {
            queue.discard(1);
            return if lead.is_ascii() {
                Decoded::Char(CodePoint::from(lead))
            } else {
                Decoded::Raw(lead)
            };
        }

        let mut code = CodePoint::from(lead & lead_mask(needed));
        for offset in 1..needed {
            let Some(byte) = queue.peek_at(offset) else {
                return Decoded::Incomplete { needed, buffered };
            };
            code = (code << 6) | CodePoint::from(byte & 0x3F);
        }
        queue.discard(needed);
        Decoded::Char(code)
    }
}

/// Encodes `code` with the same scheme the decoder reverses.
///
/// Returns the encoded bytes and their count, or `None` when `code` needs
/// more than `max_len` bytes. Values below `0x80` always take one byte.
pub fn encode(code: CodePoint, max_len: usize) -> Option<([u8; 6], usize)> {
    let len = match code {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x1_0000..=0x1F_FFFF => 4,
        0x20_0000..=0x3FF_FFFF => 5,
        0x400_0000..=0x7FFF_FFFF => 6,
        _ => return None,
    };
    if len > max_len {
        return None;
    }

    let mut out = [0u8; 6];
    if len == 1 {
        out[0] = code as u8;
        return Some((out, 1));
    }

    let mut rest = code;
    for slot in out[1..len].iter_mut().rev() {
        *slot = 0x80 | (rest & 0x3F) as u8;
        rest >>= 6;
    }
    // Leading ones count the sequence length, then a zero separator.
    let marker = !(0xFFu8 >> len);
    out[0] = marker | rest as u8;
    Some((out, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingBuffer;

    #[test]
    fn test_table_lengths() {
        let table = SequenceTable::LEGACY;
        assert_eq!(table.sequence_len(b'A'), 1);
        assert_eq!(table.sequence_len(0x80), 1);
        assert_eq!(table.sequence_len(0xC3), 2);
        assert_eq!(table.sequence_len(0xE2), 3);
        assert_eq!(table.sequence_len(0xF0), 4);
        assert_eq!(table.sequence_len(0xF8), 5);
        assert_eq!(table.sequence_len(0xFC), 6);
        assert_eq!(table.sequence_len(0xFE), 1);
        assert_eq!(table.sequence_len(0xFF), 1);
        assert_eq!(table.max_len(), 6);

        let utf8 = SequenceTable::UTF8;
        assert_eq!(utf8.sequence_len(0xF4), 4);
        assert_eq!(utf8.sequence_len(0xF8), 1);
        assert_eq!(utf8.sequence_len(0xFD), 1);
        assert_eq!(utf8.max_len(), 4);
    }

    #[test]
    fn test_partial_sequence_left_untouched() {
        let ring = RingBuffer::<8>::new();
        let mut tx = ring.producer().unwrap();
        let mut rx = ring.consumer().unwrap();
        let decoder = Decoder::default();

        tx.put(0xC3);
        assert_eq!(
            decoder.decode(&mut rx),
            Decoded::Incomplete {
                needed: 2,
                buffered: 1
            }
        );
        assert_eq!(rx.available(), 1);

        tx.put(0xA9);
        assert_eq!(decoder.decode(&mut rx), Decoded::Char(0xE9));
        assert_eq!(decoder.decode(&mut rx), Decoded::Empty);
    }

    #[test]
    fn test_one_character_per_call() {
        let ring = RingBuffer::<16>::new();
        let mut tx = ring.producer().unwrap();
        let mut rx = ring.consumer().unwrap();
        let decoder = Decoder::default();

        // "a€b": the euro sign is three bytes.
        tx.put_burst(&[b'a', 0xE2, 0x82, 0xAC, b'b']);
        assert_eq!(decoder.decode(&mut rx), Decoded::Char(u32::from(b'a')));
        assert_eq!(decoder.decode(&mut rx), Decoded::Char(0x20AC));
        assert_eq!(decoder.decode(&mut rx), Decoded::Char(u32::from(b'b')));
        assert_eq!(decoder.decode(&mut rx), Decoded::Empty);
    }

    #[test]
    fn test_stray_bytes_pass_through_raw() {
        let ring = RingBuffer::<8>::new();
        let mut tx = ring.producer().unwrap();
        let mut rx = ring.consumer().unwrap();
        let decoder = Decoder::default();

        tx.put_burst(&[0x80, 0xFF, b'x']);
        assert_eq!(decoder.decode(&mut rx), Decoded::Raw(0x80));
        assert_eq!(decoder.decode(&mut rx), Decoded::Raw(0xFF));
        assert_eq!(decoder.decode(&mut rx).code_point(), Some(u32::from(b'x')));
    }

    #[test]
    fn test_legacy_six_byte_sequence() {
        let ring = RingBuffer::<8>::new();
        let mut tx = ring.producer().unwrap();
        let mut rx = ring.consumer().unwrap();

        let (bytes, len) = encode(0x7FFF_FFFF, 6).unwrap();
        assert_eq!(&bytes[..len], &[0xFD, 0xBF, 0xBF, 0xBF, 0xBF, 0xBF]);
        tx.put_burst(&bytes[..len]);
        assert_eq!(Decoder::default().decode(&mut rx), Decoded::Char(0x7FFF_FFFF));
    }

    #[test]
    fn test_utf8_table_demotes_long_leads() {
        let ring = RingBuffer::<8>::new();
        let mut tx = ring.producer().unwrap();
        let mut rx = ring.consumer().unwrap();
        let decoder = Decoder::new(SequenceTable::UTF8);

        tx.put_burst(&[0xF8, 0x88, 0x80, 0x80, 0x80]);
        assert_eq!(decoder.decode(&mut rx), Decoded::Raw(0xF8));
        assert_eq!(decoder.decode(&mut rx), Decoded::Raw(0x88));
        assert_eq!(rx.available(), 3);
    }

    #[test]
    fn test_lead_longer_than_queue_passes_through() {
        let ring = RingBuffer::<4>::new();
        let mut tx = ring.producer().unwrap();
        let mut rx = ring.consumer().unwrap();
        let decoder = Decoder::default();

        tx.put_burst(&[0xF8, b'a', b'b', b'c']);
        assert_eq!(decoder.decode(&mut rx), Decoded::Raw(0xF8));
        assert_eq!(decoder.decode(&mut rx), Decoded::Char(u32::from(b'a')));

        // Sequences that fit still decode in a small ring.
        let mut small = RingBuffer::<4>::new();
        small.put_burst(&[0xF0, 0x9F, 0x98, 0x80]);
        let mut rx_small = small.consumer().unwrap();
        assert_eq!(decoder.decode(&mut rx_small), Decoded::Char(0x1_F600));
    }

    #[test]
    fn test_byte_at_a_time_never_emits_early() {
        let samples = [
            0x24, 0xA2, 0x939, 0x20AC, 0xD55C, 0x1_0348, 0x10_FFFF, 0x20_0000, 0x400_0000,
        ];
        let decoder = Decoder::default();

        for &code in &samples {
            let ring = RingBuffer::<8>::new();
            let mut tx = ring.producer().unwrap();
            let mut rx = ring.consumer().unwrap();
            let (bytes, len) = encode(code, 6).unwrap();

            for (i, &byte) in bytes[..len].iter().enumerate() {
                tx.put(byte);
                let result = decoder.decode(&mut rx);
                if i + 1 < len {
                    assert!(
                        matches!(result, Decoded::Incomplete { .. }),
                        "early result for {:#x} after {} bytes: {:?}",
                        code,
                        i + 1,
                        result
                    );
                    assert_eq!(rx.available(), i + 1);
                } else {
                    assert_eq!(result, Decoded::Char(code));
                    assert_eq!(rx.available(), 0);
                }
            }
        }
    }

    #[test]
    fn test_encode_matches_core_utf8() {
        let mut buf = [0u8; 4];
        for ch in ['A', 'é', '€', '한', '𐍈'] {
            let expected = ch.encode_utf8(&mut buf).as_bytes();
            let (bytes, len) = encode(u32::from(ch), 4).unwrap();
            assert_eq!(&bytes[..len], expected);
        }
        assert_eq!(encode(0x20_0000, 4), None);
        assert_eq!(encode(0x8000_0000, 6), None);
    }
}
