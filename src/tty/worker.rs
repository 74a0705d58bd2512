//! Worker pool draining the relay queue

use super::inject::Injector;
use super::EngineStats;
use crate::typo::DecisionHook;
use crossbeam_channel::Receiver;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Fixed set of threads that run the decision hook on captured characters.
///
/// Each worker decides one character fully before taking the next, but
/// nothing orders the workers against each other.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        count: usize,
        queue: Receiver<u8>,
        hook: Arc<dyn DecisionHook>,
        injector: Injector,
        stats: Arc<EngineStats>,
    ) -> io::Result<Self> {
        let mut handles = Vec::with_capacity(count);

        for i in 0..count.max(1) {
            let queue = queue.clone();
            let hook = Arc::clone(&hook);
            let injector = injector.clone();
            let stats = Arc::clone(&stats);
            let handle = thread::Builder::new()
                .name(format!("batty-worker-{}", i))
                .spawn(move || {
                    for input in queue.iter() {
                        let request = hook.decide(input);
                        if request.is_empty() {
                            continue;
                        }
                        stats.record_typo();
                        injector.submit(request);
                    }
                })?;
            handles.push(handle);
        }

        Ok(Self { handles })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to finish; they stop once the queue closes.
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                log::error!("worker thread panicked");
            }
        }
    }
}
