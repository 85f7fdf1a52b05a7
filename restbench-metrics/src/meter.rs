use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Throughput counter: number of events plus a mean rate derived from the
/// observation window handed in at snapshot time.
#[derive(Debug, Default)]
pub struct Meter {
    count: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSummary {
    pub count: u64,
    /// Mean events per second over the observation window.
    pub mean_rate: f64,
}

impl Meter {
    #[inline]
    pub fn mark(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn summary(&self, elapsed: Duration) -> MeterSummary {
        let count = self.count();
        let secs = elapsed.as_secs_f64().max(1e-9);
        MeterSummary {
            count,
            mean_rate: (count as f64) / secs,
        }
    }
}
