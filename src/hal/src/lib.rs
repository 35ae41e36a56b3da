//! Kaiku Hardware Abstraction Layer (HAL) traits.
//!
//! This crate defines the seams between the console ingestion pipeline and
//! its collaborators: the UART driver that delivers received bytes, the
//! interrupt controller, and the interpreter that consumes characters.

#![no_std]

/// Receiver of UART receive-complete notifications.
///
/// Implemented by the console's byte sink. The UART driver calls it from its
/// receive interrupt with the bytes that just arrived.
pub trait RxCompleteHandler {
    /// Handles a burst of received bytes.
    ///
    /// `bytes` lives in driver memory that may be reused as soon as this
    /// returns, so implementations copy out before returning. Returns the
    /// number of bytes that could not be accepted.
    fn on_rx_complete(&mut self, bytes: &[u8]) -> usize;
}

/// Cancellation capability owned by the interpreter.
///
/// Invoked with no arguments each time the interrupt character is read.
/// What cancellation means is entirely up to the implementor.
pub trait CancelSignal {
    /// Requests cancellation of the running program.
    fn cancel(&mut self);
}

impl<F: FnMut()> CancelSignal for F {
    fn cancel(&mut self) {
        self()
    }
}

/// Host hook that runs deferred work while the foreground waits for input.
pub trait PendingWork {
    /// Runs whatever timers or deferred callbacks are ready, then returns.
    fn run_pending(&mut self);
}

impl<F: FnMut()> PendingWork for F {
    fn run_pending(&mut self) {
        self()
    }
}

/// Trait for controlling interrupts.
pub trait InterruptController {
    /// Enables the interrupts this controller gates.
    fn enable(&mut self);
    /// Disables the interrupts this controller gates.
    fn disable(&mut self);
    /// Whether the gated interrupts are currently enabled.
    fn is_enabled(&self) -> bool;

    /// Runs `f` with interrupts disabled, then restores the previous state.
    ///
    /// Nests: called inside an already masked section, it leaves the
    /// interrupts masked.
    fn without_interrupts<R>(&mut self, f: impl FnOnce() -> R) -> R
    where
        Self: Sized,
    {
        let was_enabled = self.is_enabled();
        if was_enabled {
            self.disable();
        }
        let result = f();
        if was_enabled {
            self.enable();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingIrq {
        enabled: bool,
        toggles: u32,
    }

    impl InterruptController for CountingIrq {
        fn enable(&mut self) {
            self.enabled = true;
            self.toggles += 1;
        }

        fn disable(&mut self) {
            self.enabled = false;
            self.toggles += 1;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    #[test]
    fn test_closure_is_cancel_signal() {
        let mut calls = 0;
        {
            let mut cancel = || calls += 1;
            cancel.cancel();
            cancel.cancel();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_without_interrupts_restores_state() {
        let mut irq = CountingIrq {
            enabled: true,
            toggles: 0,
        };
        let seen = irq.without_interrupts(|| 7);
        assert_eq!(seen, 7);
        assert!(irq.enabled);
        assert_eq!(irq.toggles, 2);
    }

    #[test]
    fn test_without_interrupts_keeps_masked_section_masked() {
        let mut irq = CountingIrq {
            enabled: false,
            toggles: 0,
        };
        irq.without_interrupts(|| ());
        assert!(!irq.enabled);
        assert_eq!(irq.toggles, 0);
    }
}
