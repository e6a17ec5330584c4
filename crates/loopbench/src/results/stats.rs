//! Summary statistics over a batch of observations.

use serde::Serialize;

use crate::runner::RunObservation;

/// Mean/σ/min/max summary of one batch's wall-clock times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchStats {
    /// Number of observations.
    pub runs: usize,
    /// Mean wall-clock seconds.
    pub mean_seconds: f64,
    /// Population standard deviation.
    pub std_dev_seconds: f64,
    /// Fastest run.
    pub min_seconds: f64,
    /// Slowest run.
    pub max_seconds: f64,
}

/// Compute summary statistics for a batch. An empty batch yields zeros.
pub fn compute_stats(observations: &[RunObservation]) -> BatchStats {
    if observations.is_empty() {
        return BatchStats {
            runs: 0,
            mean_seconds: 0.0,
            std_dev_seconds: 0.0,
            min_seconds: 0.0,
            max_seconds: 0.0,
        };
    }

    let times: Vec<f64> = observations.iter().map(|o| o.wall_seconds).collect();
    let n = times.len() as f64;
    let mean = times.iter().sum::<f64>() / n;
    let variance = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;

    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    BatchStats {
        runs: times.len(),
        mean_seconds: mean,
        std_dev_seconds: variance.sqrt(),
        min_seconds: min,
        max_seconds: max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(wall_seconds: f64) -> RunObservation {
        RunObservation {
            input_size: 1000,
            wall_seconds,
            exit_status: 0,
        }
    }

    #[test]
    fn empty_batch_is_all_zeros() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.runs, 0);
        assert_eq!(stats.mean_seconds, 0.0);
    }

    #[test]
    fn summary_over_known_samples() {
        let stats = compute_stats(&[obs(1.0), obs(2.0), obs(3.0)]);
        assert_eq!(stats.runs, 3);
        assert!((stats.mean_seconds - 2.0).abs() < 1e-12);
        assert!((stats.std_dev_seconds - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min_seconds, 1.0);
        assert_eq!(stats.max_seconds, 3.0);
    }
}
