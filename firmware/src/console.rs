#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Line queue feeding the optional UART console.
//!
//! The polling task never blocks on the UART: rendered lines are offered to a
//! small channel and dropped when the console task falls behind.

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};

pub use acs712_core::telemetry::ReportLine as ConsoleLine;

/// Number of lines buffered between the polling and console tasks.
pub const CONSOLE_QUEUE_DEPTH: usize = 4;

#[cfg(target_os = "none")]
type ConsoleMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type ConsoleMutex = NoopRawMutex;

/// Queue carrying rendered report lines.
pub type ConsoleQueue = Channel<ConsoleMutex, ConsoleLine, CONSOLE_QUEUE_DEPTH>;

/// Producer side of the console queue.
pub type ConsoleSender<'a> = Sender<'a, ConsoleMutex, ConsoleLine, CONSOLE_QUEUE_DEPTH>;

/// Consumer side of the console queue.
pub type ConsoleReceiver<'a> = Receiver<'a, ConsoleMutex, ConsoleLine, CONSOLE_QUEUE_DEPTH>;

/// Outcome of offering a line to the console.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Offer {
    Queued,
    Dropped,
}

/// Offers `line` without waiting for space.
pub fn offer(sender: &ConsoleSender<'_>, line: ConsoleLine) -> Offer {
    match sender.try_send(line) {
        Ok(()) => Offer::Queued,
        Err(TrySendError::Full(_)) => Offer::Dropped,
    }
}
