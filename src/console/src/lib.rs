//! Kaiku console input pipeline
//!
//! Interrupt-driven console ingestion for a REPL running on a small
//! microcontroller: the UART receive interrupt feeds a bounded ring, and a
//! cooperative foreground decodes characters out of it.
//!
//! # Architecture
//!
//! ```text
//! UART rx interrupt ──▶ ByteSink ──▶ RingBuffer ──▶ Decoder ──▶ InterruptRelay ──▶ Reader / CharStream
//!                                                                   │
//!                                                                   └──▶ CancelSignal
//! ```
//!
//! - `ring`: lock-free single-producer / single-consumer byte ring
//! - `sink`: receive-interrupt producer
//! - `decode`: stateless variable-length character decoder
//! - `relay`: interrupt character to cancellation
//! - `reader`: blocking reads and poll queries
//! - `stream`: async reads woken by the receive interrupt
//! - `console`: owns one ring and hands out the two ends
//! - `executor`: cooperative tasks, usable as the pending-work hook
//! - `global`: the statically allocated system console
//!
//! # Safety
//!
//! The only unsafe code is the slot access in `ring`. Each block documents
//! which side of the producer/consumer split it relies on.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod console;
pub mod decode;
pub mod executor;
pub mod global;
pub mod reader;
pub mod relay;
pub mod ring;
pub mod sink;
pub mod stream;

pub use console::{Console, RxStats};
pub use decode::{CodePoint, Decoded, Decoder, SequenceTable};
pub use executor::{yield_now, Executor, TaskId};
pub use reader::{Reader, Step};
pub use relay::{InterruptRelay, Relayed};
pub use ring::{ByteQueue, Consumer, Producer, PutOutcome, RingBuffer};
pub use sink::ByteSink;
pub use stream::CharStream;

pub use kaiku_common::{ConsoleConfig, ConsoleError, PollFlags, SequenceLimit};
pub use kaiku_hal::{CancelSignal, InterruptController, PendingWork, RxCompleteHandler};
