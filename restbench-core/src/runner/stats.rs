use restbench_metrics::{HistogramSummary, LatencyHistogram, Meter, MeterSummary};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::config::StageKind;

/// Per stage-group accumulator: one meter and one latency histogram.
#[derive(Debug, Default)]
pub struct StatsBucket {
    meter: Meter,
    histogram: LatencyHistogram,
}

impl StatsBucket {
    pub fn record(&self, elapsed: Duration) {
        self.meter.mark();
        self.histogram.record(elapsed);
    }

    #[must_use]
    pub fn summary(&self, elapsed: Duration) -> StageStats {
        StageStats {
            meter: self.meter.summary(elapsed),
            histogram: self.histogram.summary(),
        }
    }
}

/// Shared run-wide statistics. Updated from concurrently running iterations,
/// so everything inside is atomics or mutex-guarded.
#[derive(Debug, Default)]
pub struct RunStats {
    before: StatsBucket,
    before_main: StatsBucket,
    main: StatsBucket,
    after_main: StatsBucket,
    after: StatsBucket,
    failed_requests: AtomicU64,
}

impl RunStats {
    #[must_use]
    pub fn bucket(&self, kind: StageKind) -> &StatsBucket {
        match kind {
            StageKind::Before => &self.before,
            StageKind::BeforeMain => &self.before_main,
            StageKind::Main => &self.main,
            StageKind::AfterMain => &self.after_main,
            StageKind::After => &self.after,
        }
    }

    pub fn record_request(&self, kind: StageKind, elapsed: Duration) {
        self.bucket(kind).record(elapsed);
    }

    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn failed_requests_total(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn summarize(&self, total_elapsed: Duration) -> RunResult {
        RunResult {
            total_elapsed,
            before: self.before.summary(total_elapsed),
            before_main: self.before_main.summary(total_elapsed),
            main: self.main.summary(total_elapsed),
            after_main: self.after_main.summary(total_elapsed),
            after: self.after.summary(total_elapsed),
            failed_requests_total: self.failed_requests_total(),
        }
    }
}

/// Final per stage-group statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageStats {
    pub meter: MeterSummary,
    pub histogram: HistogramSummary,
}

/// The single final result of a run, produced exactly once after the `after`
/// stage completes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Wall time from just before `before` to just after `after`.
    pub total_elapsed: Duration,
    pub before: StageStats,
    pub before_main: StageStats,
    pub main: StageStats,
    pub after_main: StageStats,
    pub after: StageStats,
    pub failed_requests_total: u64,
}

impl RunResult {
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> &StageStats {
        match kind {
            StageKind::Before => &self.before,
            StageKind::BeforeMain => &self.before_main,
            StageKind::Main => &self.main,
            StageKind::AfterMain => &self.after_main,
            StageKind::After => &self.after,
        }
    }

    pub fn stages(&self) -> impl Iterator<Item = (StageKind, &StageStats)> {
        StageKind::ALL.iter().map(|kind| (*kind, self.stage(*kind)))
    }
}
