//! Capture loop: reads raw bytes from the terminal and feeds the relay queue
//!
//! Every injected correction is a backspace immediately followed by one
//! replacement byte, and the terminal hands both back to us on the read
//! side. A backspace therefore puts the loop into a one-shot suppression
//! state that discards the byte after it. A backspace typed by the user
//! looks exactly the same, so it also swallows the next real keystroke.

use super::EngineStats;
use crate::typo::BACKSPACE;
use crossbeam_channel::{Sender, TrySendError};
use std::io::{self, BufReader, Read};
use std::sync::Arc;
use thiserror::Error;

/// Unrecoverable failure of the capture loop
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("reading from terminal failed: {0}")]
    Read(#[source] io::Error),
    #[error("capture thread panicked")]
    Panicked,
}

/// Self-echo suppression state of one terminal channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuppressionState {
    /// Forward everything except backspaces
    #[default]
    Normal,
    /// Discard the next byte, whatever it is
    SuppressOne,
}

impl SuppressionState {
    /// Advance the state machine by one byte.
    ///
    /// Returns `true` if the byte should be forwarded to the workers.
    pub fn admit(&mut self, byte: u8) -> bool {
        match *self {
            Self::SuppressOne => {
                *self = Self::Normal;
                false
            }
            Self::Normal if byte == BACKSPACE => {
                *self = Self::SuppressOne;
                false
            }
            Self::Normal => true,
        }
    }
}

/// Single reader for one terminal channel.
///
/// Owns the channel's [`SuppressionState`]; only one capture loop may run
/// per channel.
pub struct CaptureLoop {
    queue: Sender<u8>,
    stats: Arc<EngineStats>,
    state: SuppressionState,
}

impl CaptureLoop {
    pub fn new(queue: Sender<u8>, stats: Arc<EngineStats>) -> Self {
        Self {
            queue,
            stats,
            state: SuppressionState::Normal,
        }
    }

    pub fn state(&self) -> SuppressionState {
        self.state
    }

    /// Read until end of stream.
    ///
    /// Never blocks on the relay queue: bytes that do not fit are dropped.
    /// Returns `Ok(())` on end of stream or once every worker is gone.
    pub fn run<R: Read>(&mut self, reader: R) -> Result<(), CaptureError> {
        // `Bytes` retries reads interrupted by signals.
        for byte in BufReader::new(reader).bytes() {
            let byte = byte.map_err(CaptureError::Read)?;

            if !self.state.admit(byte) {
                self.stats.record_suppressed();
                continue;
            }

            match self.queue.try_send(byte) {
                Ok(()) => self.stats.record_captured(),
                Err(TrySendError::Full(_)) => {
                    self.stats.record_dropped();
                    log::trace!("relay queue full, dropped {:#04x}", byte);
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::debug!("relay queue closed, stopping capture");
                    return Ok(());
                }
            }
        }

        log::debug!("terminal reached end of stream");
        Ok(())
    }
}
