use hdrhistogram::Histogram;
use serde::Serialize;
use tracing::warn;

use super::Sample;

/// Distribution of `rate_per_second` across one statistic.
/// Serialized into the JSON snapshots next to the raw series.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PercentileSet {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub count: u64,
}

impl PercentileSet {
    pub fn from_samples(samples: &[Sample]) -> Self {
        // 3 significant figures, auto-resizing to the largest rate seen
        let Ok(mut hist) = Histogram::<u64>::new(3) else {
            return Self::empty();
        };
        for sample in samples {
            if let Err(e) = hist.record(sample.rate_per_second) {
                warn!(rate = sample.rate_per_second, error = %e, "rate left out of summary");
            }
        }
        Self::from_histogram(&hist)
    }

    /// Returns zeroed values if the histogram is empty.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_percentile(50.0),
            p95: hist.value_at_percentile(95.0),
            p99: hist.value_at_percentile(99.0),
            count: hist.len(),
        }
    }

    pub fn empty() -> Self {
        Self {
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0,
            p95: 0,
            p99: 0,
            count: 0,
        }
    }
}
