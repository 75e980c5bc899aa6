use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latency statistics over the successful requests of a run, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub avg: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub stdev: f64,
}

impl LatencyStats {
    /// Compute statistics from latencies in seconds. Returns `None` for an empty set.
    pub fn from_secs(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let avg = statistical::mean(samples);
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // NOTE: Sample variance is undefined for fewer than two samples.
        let stdev = if samples.len() > 1 {
            statistical::standard_deviation(samples, Some(avg))
        } else {
            0.
        };

        Some(Self {
            avg,
            median: statistical::median(samples),
            min,
            max,
            stdev,
        })
    }

    pub fn from_durations(durations: &[Duration]) -> Option<Self> {
        let secs: Vec<f64> = durations.iter().map(Duration::as_secs_f64).collect();
        Self::from_secs(&secs)
    }
}
