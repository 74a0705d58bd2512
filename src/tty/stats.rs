//! Engine counters

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the capture loop, workers and injectors
#[derive(Debug, Default)]
pub struct EngineStats {
    captured: AtomicU64,
    suppressed: AtomicU64,
    dropped: AtomicU64,
    typos: AtomicU64,
    injected: AtomicU64,
    injection_failures: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Characters forwarded to the relay queue
    pub captured: u64,
    /// Backspaces and the characters discarded after them
    pub suppressed: u64,
    /// Characters lost to a full relay queue
    pub dropped: u64,
    /// Non-empty decisions handed to the injector
    pub typos: u64,
    /// Injections written in full
    pub injected: u64,
    /// Injections abandoned (write failure or full backlog)
    pub injection_failures: u64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_captured(&self) {
        self.captured.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_typo(&self) {
        self.typos.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_injected(&self) {
        self.injected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_injection_failure(&self) {
        self.injection_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            captured: self.captured.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            typos: self.typos.load(Ordering::Relaxed),
            injected: self.injected.load(Ordering::Relaxed),
            injection_failures: self.injection_failures.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "captured {}, suppressed {}, dropped {}, typos {}, injected {}, failed {}",
            self.captured,
            self.suppressed,
            self.dropped,
            self.typos,
            self.injected,
            self.injection_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = EngineStats::new();
        stats.record_captured();
        stats.record_captured();
        stats.record_dropped();
        stats.record_typo();
        stats.record_injection_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.captured, 2);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(snapshot.typos, 1);
        assert_eq!(snapshot.injected, 0);
        assert_eq!(snapshot.injection_failures, 1);
    }

    #[test]
    fn snapshot_display() {
        let snapshot = StatsSnapshot {
            captured: 3,
            ..Default::default()
        };
        assert!(snapshot.to_string().starts_with("captured 3,"));
    }
}
