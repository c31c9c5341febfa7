//! Burst classifiers
//!
//! Each classifier marks candidate cycles from its own metric set, then drops
//! candidate runs shorter than the minimum burst length.

use crate::burst::{ConsistencyMetrics, DualThresholdMetrics};
use crate::config::{ConsistencyThresholds, DualThresholdClassifierConfig};

/// Per-cycle burst decision over one metric set
pub trait BurstClassifier: Send + Sync {
    /// Metrics of a single cycle
    type Metrics;

    /// Get classifier name/identifier
    fn name(&self) -> &str;

    /// Minimum number of consecutive cycles forming a burst
    fn n_cycles_min(&self) -> usize;

    /// Cycles meeting every criterion, before the run-length rule
    fn candidates(&self, metrics: &[Self::Metrics]) -> Vec<bool>;

    /// Final burst label of every cycle
    fn classify(&self, metrics: &[Self::Metrics]) -> Vec<bool> {
        let mut is_burst = self.candidates(metrics);
        enforce_min_run(&mut is_burst, self.n_cycles_min());
        is_burst
    }
}

/// Relabel runs of `true` shorter than `n_cycles_min` as `false`
pub fn enforce_min_run(is_burst: &mut [bool], n_cycles_min: usize) {
    let mut run_start: Option<usize> = None;

    for i in 0..=is_burst.len() {
        let bursting = is_burst.get(i).copied().unwrap_or(false);
        match (bursting, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start < n_cycles_min {
                    is_burst[start..i].iter_mut().for_each(|b| *b = false);
                }
                run_start = None;
            }
            _ => {}
        }
    }
}

/// Bursts from shape consistency between neighboring cycles
#[derive(Debug, Clone)]
pub struct ConsistencyClassifier {
    thresholds: ConsistencyThresholds,
}

impl ConsistencyClassifier {
    pub fn new(thresholds: ConsistencyThresholds) -> Self {
        Self { thresholds }
    }

    fn meets_thresholds(&self, metrics: &ConsistencyMetrics) -> bool {
        let t = &self.thresholds;

        metrics.amplitude_fraction >= t.amp_fraction
            && metrics.amplitude_consistency >= t.amp_consistency
            && metrics.period_consistency.map_or(false, |p| p >= t.period_consistency)
            && metrics.monotonicity >= t.monotonicity
    }
}

impl BurstClassifier for ConsistencyClassifier {
    type Metrics = ConsistencyMetrics;

    fn name(&self) -> &str {
        "consistency"
    }

    fn n_cycles_min(&self) -> usize {
        self.thresholds.n_cycles_min
    }

    fn candidates(&self, metrics: &[ConsistencyMetrics]) -> Vec<bool> {
        let last = metrics.len().saturating_sub(1);

        metrics.iter()
            .enumerate()
            .map(|(i, m)| {
                let is_edge = i == 0 || i == last;
                !(self.thresholds.exclude_edges && is_edge) && self.meets_thresholds(m)
            })
            .collect()
    }
}

/// Bursts from the fraction of each cycle above the dual amplitude threshold
#[derive(Debug, Clone)]
pub struct DualThresholdClassifier {
    config: DualThresholdClassifierConfig,
}

impl DualThresholdClassifier {
    pub fn new(config: DualThresholdClassifierConfig) -> Self {
        Self { config }
    }
}

impl BurstClassifier for DualThresholdClassifier {
    type Metrics = DualThresholdMetrics;

    fn name(&self) -> &str {
        "dual_threshold"
    }

    fn n_cycles_min(&self) -> usize {
        self.config.n_cycles_min
    }

    fn candidates(&self, metrics: &[DualThresholdMetrics]) -> Vec<bool> {
        metrics.iter()
            .map(|m| m.burst_fraction > self.config.burst_fraction_threshold)
            .collect()
    }
}
