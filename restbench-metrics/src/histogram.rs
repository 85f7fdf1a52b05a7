use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Latency distribution over one group of requests.
///
/// Samples are recorded in microseconds; summaries are reported in
/// milliseconds. The histogram itself does not retain exact sums, so the sum
/// is tracked separately alongside it.
#[derive(Debug)]
pub struct LatencyHistogram {
    hist_us: Mutex<Histogram<u64>>,
    sum_us: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramSummary {
    pub count: u64,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub mean_ms: Option<f64>,
    pub sum_ms: Option<f64>,
    pub p95_ms: Option<f64>,
}

fn new_latency_hist() -> Histogram<u64> {
    // Track up to 60s in microseconds (with 3 sigfigs).
    match Histogram::<u64>::new_with_bounds(1, 60_000_000, 3) {
        Ok(h) => h,
        Err(err) => panic!("failed to init histogram: {err}"),
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self {
            hist_us: Mutex::new(new_latency_hist()),
            sum_us: AtomicU64::new(0),
        }
    }
}

impl LatencyHistogram {
    pub fn record(&self, elapsed: Duration) {
        let us = elapsed.as_micros().min(u128::from(u64::MAX)) as u64;

        {
            let mut h = self.hist_us.lock();
            // Values above the tracked bound saturate rather than error out.
            let _ = h.record(us.clamp(1, 60_000_000));
        }

        self.sum_us.fetch_add(us, Ordering::Relaxed);
    }

    #[must_use]
    pub fn summary(&self) -> HistogramSummary {
        let h = self.hist_us.lock();
        let count = h.len();

        if count == 0 {
            return HistogramSummary {
                count: 0,
                min_ms: None,
                max_ms: None,
                mean_ms: None,
                sum_ms: None,
                p95_ms: None,
            };
        }

        let to_ms = |us: u64| (us as f64) / 1000.0;
        let sum_us = self.sum_us.load(Ordering::Relaxed);

        HistogramSummary {
            count,
            min_ms: Some(to_ms(h.min())),
            max_ms: Some(to_ms(h.max())),
            mean_ms: Some(h.mean() / 1000.0),
            sum_ms: Some(to_ms(sum_us)),
            p95_ms: Some(to_ms(h.value_at_quantile(0.95))),
        }
    }
}
