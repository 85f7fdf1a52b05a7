use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out iteration indices to worker tasks. Each index in
/// `[0, requests)` is handed out exactly once; `None` once exhausted.
#[derive(Debug)]
pub struct IterationGate {
    counter: AtomicU64,
    total: u64,
}

impl IterationGate {
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            counter: AtomicU64::new(0),
            total,
        }
    }

    pub fn next(&self) -> Option<u64> {
        let idx = self.counter.fetch_add(1, Ordering::Relaxed);
        (idx < self.total).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_each_index_once_then_none() {
        let gate = IterationGate::new(3);
        assert_eq!(gate.next(), Some(0));
        assert_eq!(gate.next(), Some(1));
        assert_eq!(gate.next(), Some(2));
        assert_eq!(gate.next(), None);
        assert_eq!(gate.next(), None);
    }

    #[test]
    fn zero_total_yields_nothing() {
        let gate = IterationGate::new(0);
        assert_eq!(gate.next(), None);
    }
}
