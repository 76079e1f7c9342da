/*!
 * Robust constant-shift estimation from matched event pairs.
 *
 * Each pair contributes `midpoint(target) - midpoint(source)`. Samples outside
 * the 1.5 × IQR band are discarded, then the estimate is rejected when too few
 * samples remain, when the first and second halves of the track disagree
 * (the offset drifts instead of being constant) or when it is implausibly large.
 */

use crate::app_config::SyncConfig;
use crate::errors::ShiftError;
use crate::subtitle_processor::SubtitleEvent;

/// Accepted estimate with the figures it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftEstimate {
    /// Rounded mean of the inliers, in ms
    pub shift_ms: i64,
    pub samples: usize,
    pub inliers: usize,
    pub first_half_mean: f64,
    pub second_half_mean: f64,
}

#[derive(Debug, Clone)]
pub struct ShiftEstimator {
    min_inliers: usize,
    max_half_difference_ms: f64,
    max_shift_ms: i64,
}

impl Default for ShiftEstimator {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl ShiftEstimator {
    pub fn new(min_inliers: usize, max_half_difference_ms: f64, max_shift_ms: i64) -> Self {
        Self {
            min_inliers,
            max_half_difference_ms,
            max_shift_ms,
        }
    }

    /// The magnitude bound is the full search window, twice the configured half-window
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.min_inliers, config.max_half_difference_ms, config.window_ms())
    }

    /// Per-pair midpoint offsets, in pair order
    pub fn sample_shifts(pairs: &[(&SubtitleEvent, &SubtitleEvent)]) -> Vec<i64> {
        pairs
            .iter()
            .map(|(target, source)| target.midpoint_ms() - source.midpoint_ms())
            .collect()
    }

    /// Estimate the shift that moves `source` events onto their `target` partners
    pub fn estimate(&self, pairs: &[(&SubtitleEvent, &SubtitleEvent)]) -> Result<ShiftEstimate, ShiftError> {
        self.estimate_from_shifts(&Self::sample_shifts(pairs))
    }

    pub fn estimate_from_shifts(&self, shifts: &[i64]) -> Result<ShiftEstimate, ShiftError> {
        if shifts.is_empty() {
            return Err(ShiftError::NoData);
        }

        let mut sorted: Vec<f64> = shifts.iter().map(|&s| s as f64).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = percentile(&sorted, 25.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let (low, high) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inliers: Vec<f64> = shifts
            .iter()
            .map(|&s| s as f64)
            .filter(|&s| s >= low && s <= high)
            .collect();

        if inliers.len() < self.min_inliers {
            return Err(ShiftError::InsufficientData {
                inliers: inliers.len(),
                required: self.min_inliers,
            });
        }

        let (first_half, second_half) = inliers.split_at(inliers.len() / 2);
        let first_half_mean = mean(first_half);
        let second_half_mean = mean(second_half);
        if (first_half_mean - second_half_mean).abs() > self.max_half_difference_ms {
            return Err(ShiftError::InconsistentHalves {
                first_half: first_half_mean,
                second_half: second_half_mean,
            });
        }

        let average = mean(&inliers);
        if average.abs() > self.max_shift_ms as f64 {
            return Err(ShiftError::ExcessiveShift {
                shift: average,
                max: self.max_shift_ms,
            });
        }

        Ok(ShiftEstimate {
            shift_ms: average.round() as i64,
            samples: shifts.len(),
            inliers: inliers.len(),
            first_half_mean,
            second_half_mean,
        })
    }
}

/// Linear-interpolated percentile of sorted values
fn percentile(sorted: &[f64], percent: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let position = percent / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
