//! The system console: one statically allocated console for the REPL UART.
//!
//! These are the entry points a port wires up:
//!
//! - [`init`] once at startup, before the receive interrupt is enabled
//! - [`on_rx_complete`] from the UART receive-complete interrupt
//! - [`stdin_rx_chr`] and [`stdio_poll`] from the interpreter's stdio layer
//! - [`soft_reset`] on soft reboot

use kaiku_common::{ConsoleConfig, ConsoleError, PollFlags};
use kaiku_hal::{CancelSignal, InterruptController, PendingWork};
use spin::Once;

use crate::console::Console;
use crate::decode::CodePoint;

/// Receive capacity of the system console, in bytes.
pub const RX_CAPACITY: usize = 260;

/// The system console type.
pub type SystemConsole = Console<RX_CAPACITY>;

static CONSOLE: Once<SystemConsole> = Once::new();

/// Creates the system console.
///
/// Fails if `config` is invalid or the console already exists; the
/// existing console keeps its original configuration.
pub fn init(config: ConsoleConfig) -> Result<&'static SystemConsole, ConsoleError> {
    config.validate()?;
    if CONSOLE.is_completed() {
        return Err(ConsoleError::AlreadyInitialized);
    }

    let mut created = false;
    let console = CONSOLE.call_once(|| {
        created = true;
        Console::new(config)
    });
    if !created {
        return Err(ConsoleError::AlreadyInitialized);
    }

    log::debug!(
        "system console ready: {} byte rx buffer, interrupt char {:?}",
        RX_CAPACITY,
        config.sentinel()
    );
    Ok(console)
}

/// The system console, once [`init`] has run.
pub fn console() -> Result<&'static SystemConsole, ConsoleError> {
    CONSOLE.get().ok_or(ConsoleError::NotInitialized)
}

/// UART receive-complete callback. Returns the number of bytes dropped.
///
/// Input arriving before [`init`] is dropped without a trace. A nested call
/// (the producer is still claimed) drops its burst and counts it.
pub fn on_rx_complete(bytes: &[u8]) -> usize {
    let Ok(console) = console() else {
        return bytes.len();
    };
    match console.sink() {
        Ok(mut sink) => sink.on_rx_complete(bytes),
        Err(_) => {
            console.rx.record_dropped(bytes.len());
            bytes.len()
        }
    }
}

/// Blocks until the next character arrives.
///
/// `pending` runs once each time no complete character is buffered; each
/// interrupt character calls `cancel` instead of being returned.
pub fn stdin_rx_chr<C, P>(cancel: &mut C, pending: &mut P) -> Result<CodePoint, ConsoleError>
where
    C: CancelSignal + ?Sized,
    P: PendingWork + ?Sized,
{
    let mut reader = console()?.reader()?;
    Ok(reader.blocking_read(cancel, pending))
}

/// Readiness flags for the interpreter's stdio poll. Empty before [`init`].
pub fn stdio_poll(requested: PollFlags) -> PollFlags {
    console().map_or(PollFlags::empty(), |console| console.poll(requested))
}

/// Soft-reboot reset of the system console.
pub fn soft_reset<I: InterruptController>(irq: &mut I) -> Result<(), ConsoleError> {
    console()?.soft_reset(irq)
}
