//! Signal: Core container for single-channel time series

use crate::error::CycleResult;
use crate::signal_error;
use serde::{Deserialize, Serialize};

/// Single-channel, uniformly sampled time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    samples: Vec<f64>,
    sampling_rate: f64,
}

impl Signal {
    /// Create new signal from samples and sampling rate (Hz)
    pub fn new(samples: Vec<f64>, sampling_rate: f64) -> CycleResult<Self> {
        validate_samples(&samples)?;

        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(signal_error!("sampling rate must be positive, got {}", sampling_rate));
        }

        Ok(Signal { samples, sampling_rate })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if signal is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow the samples
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Consume the signal and return its samples
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    /// Sampling rate in Hz
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }
}

/// Reject sample sequences the pipeline cannot analyse
pub fn validate_samples(samples: &[f64]) -> CycleResult<()> {
    if samples.is_empty() {
        return Err(signal_error!("signal contains no samples"));
    }

    if let Some(index) = samples.iter().position(|x| !x.is_finite()) {
        return Err(signal_error!("sample {} is not finite", index));
    }

    Ok(())
}

/// Median of a sample slice, `None` when empty
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
