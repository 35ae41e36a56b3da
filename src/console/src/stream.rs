//! Async character stream.
//!
//! Instead of spinning on the pending-work hook, a task waiting for input
//! parks its waker in the console. The receive interrupt wakes it as soon as
//! it publishes bytes, and the stream decodes again.

use core::{
    pin::Pin,
    task::{Context, Poll},
};

use futures_util::stream::Stream;
use kaiku_hal::CancelSignal;

use crate::decode::CodePoint;
use crate::reader::Reader;

/// An endless stream of characters from one console.
///
/// Interrupt characters never come out of the stream; each one calls the
/// cancellation capability instead.
pub struct CharStream<'a, const N: usize, C> {
    reader: Reader<'a, N>,
    cancel: C,
}

impl<'a, const N: usize, C: CancelSignal> CharStream<'a, N, C> {
    pub(crate) fn new(reader: Reader<'a, N>, cancel: C) -> Self {
        Self { reader, cancel }
    }

    /// Gives the reader and cancellation capability back.
    pub fn into_parts(self) -> (Reader<'a, N>, C) {
        (self.reader, self.cancel)
    }
}

impl<const N: usize, C: CancelSignal + Unpin> Stream for CharStream<'_, N, C> {
    type Item = CodePoint;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<CodePoint>> {
        let this = self.get_mut();

        // fast path
        if let Some(code) = this.reader.try_read(&mut this.cancel) {
            return Poll::Ready(Some(code));
        }

        let waker = &this.reader.console().rx_waker;
        waker.register(cx.waker());
        match this.reader.try_read(&mut this.cancel) {
            Some(code) => {
                waker.take();
                Poll::Ready(Some(code))
            }
            None => Poll::Pending,
        }
    }
}
