//! Delayed injection of synthetic keystrokes
//!
//! Corrections are written after a short pause so the terminal has already
//! echoed the real keystroke, which makes the typo look like it was noticed
//! and fixed a beat later.

use super::EngineStats;
use crate::typo::InjectionRequest;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Something that accepts bytes as if they were typed at the terminal
pub trait InputSink: Send + Sync {
    fn push_byte(&self, byte: u8) -> io::Result<()>;
}

/// Push every byte of `request` into `sink`, stopping at the first failure
pub fn write_request(sink: &dyn InputSink, request: &InjectionRequest) -> io::Result<()> {
    for &byte in request.as_bytes() {
        sink.push_byte(byte)?;
    }
    Ok(())
}

/// Handle used by workers to schedule injections.
///
/// Backed by a fixed pool of injection threads: at most `max_in_flight`
/// requests are being written at once and at most as many again wait for
/// a free thread. Anything beyond that is dropped.
#[derive(Clone)]
pub struct Injector {
    tx: Sender<InjectionRequest>,
    stats: Arc<EngineStats>,
}

impl Injector {
    /// Start the injection threads
    pub fn spawn(
        sink: Arc<dyn InputSink>,
        delay: Duration,
        max_in_flight: usize,
        stats: Arc<EngineStats>,
    ) -> io::Result<(Self, Vec<JoinHandle<()>>)> {
        let max_in_flight = max_in_flight.max(1);
        let (tx, rx) = bounded::<InjectionRequest>(max_in_flight);
        let mut handles = Vec::with_capacity(max_in_flight);

        for i in 0..max_in_flight {
            let rx = rx.clone();
            let sink = Arc::clone(&sink);
            let stats = Arc::clone(&stats);
            let handle = thread::Builder::new()
                .name(format!("batty-inject-{}", i))
                .spawn(move || {
                    for request in rx.iter() {
                        thread::sleep(delay);
                        match write_request(sink.as_ref(), &request) {
                            Ok(()) => stats.record_injected(),
                            Err(e) => {
                                log::warn!(
                                    "injection of {:?} abandoned: {}",
                                    request.as_bytes(),
                                    e
                                );
                                stats.record_injection_failure();
                            }
                        }
                    }
                })?;
            handles.push(handle);
        }

        Ok((Self { tx, stats }, handles))
    }

    /// Queue a request without blocking.
    ///
    /// Returns `false` if the request was dropped.
    pub fn submit(&self, request: InjectionRequest) -> bool {
        if request.is_empty() {
            return true;
        }
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                log::debug!("injection backlog full, dropped {:?}", request.as_bytes());
                self.stats.record_injection_failure();
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
