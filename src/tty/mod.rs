//! Terminal interception engine
//!
//! ```text
//! device -> capture loop -> relay queue -> workers -> decision hook
//!                                                        |
//! device input buffer <------ injector (TIOCSTI) <-------+
//! ```
//!
//! One capture thread per device, a fixed worker pool, and a fixed pool of
//! injection threads. Nothing is cancelled: the engine stops when the
//! device reaches end of stream or the process exits.

mod capture;
#[cfg(unix)]
mod channel;
mod inject;
mod stats;
mod worker;

pub use capture::{CaptureError, CaptureLoop, SuppressionState};
#[cfg(unix)]
pub use channel::{OpenError, TerminalChannel, TtyWriter};
pub use inject::{write_request, InputSink, Injector};
pub use stats::{EngineStats, StatsSnapshot};
pub use worker::WorkerPool;

use crate::config::EngineConfig;
use crate::typo::DecisionHook;
use crossbeam_channel::{bounded, Receiver};
use std::io::{self, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Builds and starts the capture/worker/injector pipeline
pub struct Engine {
    config: EngineConfig,
    stats: Arc<EngineStats>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            stats: Arc::new(EngineStats::new()),
        }
    }

    /// Hook an open terminal channel with `hook`
    #[cfg(unix)]
    pub fn hook_channel(
        self,
        channel: TerminalChannel,
        hook: Arc<dyn DecisionHook>,
    ) -> io::Result<EngineHandle> {
        log::info!("hooking {}", channel.path().display());
        let (reader, writer) = channel.into_parts();
        self.hook(reader, writer, hook)
    }

    /// Start capturing from `reader`, injecting decisions into `sink`
    pub fn hook<R>(
        self,
        reader: R,
        sink: Arc<dyn InputSink>,
        hook: Arc<dyn DecisionHook>,
    ) -> io::Result<EngineHandle>
    where
        R: Read + Send + 'static,
    {
        let Self { config, stats } = self;

        let (injector, injectors) = Injector::spawn(
            sink,
            config.injection_delay(),
            config.max_in_flight,
            Arc::clone(&stats),
        )?;

        let (queue_tx, queue_rx) = bounded(config.queue_capacity.max(1));
        let workers = WorkerPool::spawn(
            config.workers,
            queue_rx,
            hook,
            injector,
            Arc::clone(&stats),
        )?;

        let (done_tx, done) = bounded(1);
        let capture_stats = Arc::clone(&stats);
        let capture = thread::Builder::new()
            .name("batty-capture".to_string())
            .spawn(move || {
                let result = CaptureLoop::new(queue_tx, capture_stats).run(reader);
                if let Err(e) = &result {
                    log::error!("{}", e);
                }
                let _ = done_tx.send(result);
            })?;

        log::debug!(
            "engine started: {} workers, queue {}, {} injectors",
            workers.len(),
            config.queue_capacity,
            injectors.len()
        );

        Ok(EngineHandle {
            done,
            capture,
            workers,
            injectors,
            stats,
        })
    }
}

/// Running engine
pub struct EngineHandle {
    done: Receiver<Result<(), CaptureError>>,
    capture: JoinHandle<()>,
    workers: WorkerPool,
    injectors: Vec<JoinHandle<()>>,
    stats: Arc<EngineStats>,
}

impl EngineHandle {
    /// Yields the capture loop's result once, when it stops.
    ///
    /// Hand what it yields to [`EngineHandle::finish`]; [`EngineHandle::wait`]
    /// would find the channel already drained.
    pub fn done(&self) -> &Receiver<Result<(), CaptureError>> {
        &self.done
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Block until capture stops and every queued character and injection
    /// has been processed, then return the final counters.
    pub fn wait(self) -> Result<StatsSnapshot, CaptureError> {
        let result = self.done.recv().unwrap_or(Err(CaptureError::Panicked));
        self.finish(result)
    }

    /// Like [`EngineHandle::wait`], for a capture result already taken
    /// from [`EngineHandle::done`].
    pub fn finish(
        self,
        result: Result<(), CaptureError>,
    ) -> Result<StatsSnapshot, CaptureError> {
        if self.capture.join().is_err() {
            log::error!("capture thread panicked");
        }
        self.workers.join();
        for handle in self.injectors {
            if handle.join().is_err() {
                log::error!("injection thread panicked");
            }
        }
        result.map(|()| self.stats.snapshot())
    }
}
