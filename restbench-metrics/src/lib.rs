pub mod histogram;
pub mod meter;

pub use histogram::{HistogramSummary, LatencyHistogram};
pub use meter::{Meter, MeterSummary};
