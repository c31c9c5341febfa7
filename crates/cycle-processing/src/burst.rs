//! Burst metrics per cycle
//!
//! Two disjoint metric sets exist: shape consistency between neighboring cycles,
//! and the fraction of each cycle spent above a dual amplitude threshold.

use crate::amplitude::amp_by_time;
use crate::config::{BurstDetectionMethod, BurstFractionConfig, ResolvedBurstConfig};
use crate::shape::{ShapeFeatureTable, ShapeFeatures};
use cycle_core::{median, CenterExtrema, CycleError, CyclePoints, CycleResult, FrequencyRange};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Relative tolerance under which two cycle amplitudes count as tied
pub const AMPLITUDE_TIE_TOLERANCE: f64 = 1e-9;

/// Column names of the consistency metrics
pub const CONSISTENCY_COLUMNS: [&str; 4] = [
    "amplitude_fraction",
    "amplitude_consistency",
    "period_consistency",
    "monotonicity",
];

/// Column names of the dual-threshold metrics
pub const DUAL_THRESHOLD_COLUMNS: [&str; 1] = ["burst_fraction"];

/// Shape consistency of one cycle with its neighbors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyMetrics {
    /// Rank of the cycle amplitude among all cycles, in (0, 1]
    pub amplitude_fraction: f64,
    /// Worst rise/decay magnitude ratio within the cycle and with adjacent flanks
    pub amplitude_consistency: f64,
    /// Worst period ratio with the neighboring cycles, `None` without neighbors
    pub period_consistency: Option<f64>,
    /// Fraction of samples moving in the flank direction
    pub monotonicity: f64,
}

impl ConsistencyMetrics {
    pub fn get(&self, column: &str) -> Option<f64> {
        match column {
            "amplitude_fraction" => Some(self.amplitude_fraction),
            "amplitude_consistency" => Some(self.amplitude_consistency),
            "period_consistency" => self.period_consistency,
            "monotonicity" => Some(self.monotonicity),
            _ => None,
        }
    }
}

/// Fraction of one cycle marked bursting by the amplitude detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualThresholdMetrics {
    pub burst_fraction: f64,
}

impl DualThresholdMetrics {
    pub fn get(&self, column: &str) -> Option<f64> {
        match column {
            "burst_fraction" => Some(self.burst_fraction),
            _ => None,
        }
    }
}

/// Burst metrics of every cycle, in the shape of the detection method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "rows", rename_all = "snake_case")]
pub enum BurstMetricTable {
    Cycles(Vec<ConsistencyMetrics>),
    Amplitude(Vec<DualThresholdMetrics>),
}

impl BurstMetricTable {
    pub fn method(&self) -> BurstDetectionMethod {
        match self {
            BurstMetricTable::Cycles(_) => BurstDetectionMethod::Cycles,
            BurstMetricTable::Amplitude(_) => BurstDetectionMethod::Amplitude,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BurstMetricTable::Cycles(rows) => rows.len(),
            BurstMetricTable::Amplitude(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> &'static [&'static str] {
        match self {
            BurstMetricTable::Cycles(_) => &CONSISTENCY_COLUMNS,
            BurstMetricTable::Amplitude(_) => &DUAL_THRESHOLD_COLUMNS,
        }
    }

    /// Value of `column` for cycle `index`
    pub fn value(&self, index: usize, column: &str) -> Option<f64> {
        match self {
            BurstMetricTable::Cycles(rows) => rows.get(index)?.get(column),
            BurstMetricTable::Amplitude(rows) => rows.get(index)?.get(column),
        }
    }
}

/// Compute the metrics the resolved detection method needs
pub fn compute_burst_metrics(
    signal: &[f64],
    shapes: &ShapeFeatureTable,
    cyclepoints: &CyclePoints,
    sampling_rate: f64,
    band: FrequencyRange,
    config: &ResolvedBurstConfig,
) -> CycleResult<BurstMetricTable> {
    ensure_aligned("shape features", shapes.len(), "cyclepoints", cyclepoints.len())?;

    let table = match config {
        ResolvedBurstConfig::Consistency(_) => {
            BurstMetricTable::Cycles(compute_consistency_metrics(signal, shapes, cyclepoints)?)
        }
        ResolvedBurstConfig::DualThreshold { fraction, .. } => {
            BurstMetricTable::Amplitude(
                compute_burst_fraction(signal, cyclepoints, sampling_rate, band, fraction)?
            )
        }
    };

    debug!(method = %table.method(), cycles = table.len(), "Computed burst metrics");
    Ok(table)
}

/// Consistency metrics of every cycle
pub fn compute_consistency_metrics(
    signal: &[f64],
    shapes: &ShapeFeatureTable,
    cyclepoints: &CyclePoints,
) -> CycleResult<Vec<ConsistencyMetrics>> {
    ensure_aligned("shape features", shapes.len(), "cyclepoints", cyclepoints.len())?;

    let rows = shapes.rows();
    let amplitude_fraction = amplitude_fraction(&shapes.volt_amp());

    let metrics = (0..rows.len())
        .map(|i| ConsistencyMetrics {
            amplitude_fraction: amplitude_fraction[i],
            amplitude_consistency: amplitude_consistency(rows, i, cyclepoints.center_extrema()),
            period_consistency: period_consistency(rows, i),
            monotonicity: monotonicity(signal, cyclepoints, i),
        })
        .collect();

    Ok(metrics)
}

/// Rank of each amplitude divided by the count, ties sharing the highest rank
pub fn amplitude_fraction(amplitudes: &[f64]) -> Vec<f64> {
    let mut sorted = amplitudes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = amplitudes.len() as f64;
    amplitudes.iter()
        .map(|&amp| {
            let limit = amp + AMPLITUDE_TIE_TOLERANCE * amp.abs();
            sorted.partition_point(|&other| other <= limit) as f64 / n
        })
        .collect()
}

/// Ratio of the smaller to the larger magnitude, 1.0 when both vanish
fn magnitude_ratio(a: f64, b: f64) -> f64 {
    let (a, b) = (a.abs(), b.abs());
    let larger = a.max(b);
    if larger == 0.0 {
        1.0
    } else {
        a.min(b) / larger
    }
}

fn amplitude_consistency(rows: &[ShapeFeatures], i: usize, center: CenterExtrema) -> f64 {
    let current = &rows[i];
    let previous = i.checked_sub(1).and_then(|j| rows.get(j));
    let next = rows.get(i + 1);

    let mut consistency = magnitude_ratio(current.volt_rise, current.volt_decay);

    // Each neighbor contributes the flank that shares an extremum with this cycle
    let (with_previous, with_next) = match center {
        CenterExtrema::Peak => (
            previous.map(|p| magnitude_ratio(current.volt_rise, p.volt_decay)),
            next.map(|n| magnitude_ratio(n.volt_rise, current.volt_decay)),
        ),
        CenterExtrema::Trough => (
            previous.map(|p| magnitude_ratio(p.volt_rise, current.volt_decay)),
            next.map(|n| magnitude_ratio(current.volt_rise, n.volt_decay)),
        ),
    };

    for ratio in [with_previous, with_next].into_iter().flatten() {
        consistency = consistency.min(ratio);
    }
    consistency
}

fn period_consistency(rows: &[ShapeFeatures], i: usize) -> Option<f64> {
    let period = rows[i].period as f64;
    let previous = i.checked_sub(1).and_then(|j| rows.get(j));
    let next = rows.get(i + 1);

    [previous, next]
        .into_iter()
        .flatten()
        .map(|neighbor| magnitude_ratio(period, neighbor.period as f64))
        .reduce(f64::min)
}

fn monotonicity(signal: &[f64], cyclepoints: &CyclePoints, i: usize) -> f64 {
    let point = &cyclepoints.as_slice()[i];
    let lead = &signal[point.sample_last_edge..=point.sample_center];
    let trail = &signal[point.sample_center..=point.sample_next_edge];

    // Peak-centered cycles rise into the center, trough-centered cycles fall into it
    let (lead_rising, trail_rising) = match cyclepoints.center_extrema() {
        CenterExtrema::Peak => (true, false),
        CenterExtrema::Trough => (false, true),
    };

    (directional_fraction(lead, lead_rising) + directional_fraction(trail, trail_rising)) / 2.0
}

fn directional_fraction(flank: &[f64], rising: bool) -> f64 {
    let steps = flank.len().saturating_sub(1);
    if steps == 0 {
        return 0.0;
    }

    let matching = flank.windows(2)
        .filter(|pair| if rising { pair[1] > pair[0] } else { pair[1] < pair[0] })
        .count();
    matching as f64 / steps as f64
}

/// Hysteresis detector over an amplitude series
///
/// A sample enters the bursting state once `amplitude > high` and leaves it once
/// `amplitude < low`.
pub fn dual_threshold_mask(amplitude: &[f64], low: f64, high: f64) -> Vec<bool> {
    let mut bursting = false;

    amplitude.iter()
        .map(|&amp| {
            if bursting {
                if amp < low {
                    bursting = false;
                }
            } else if amp > high {
                bursting = true;
            }
            bursting
        })
        .collect()
}

/// Clear bursting runs shorter than `min_samples`
pub fn remove_short_bursts(mask: &mut [bool], min_samples: usize) {
    let mut start = 0;
    while start < mask.len() {
        if !mask[start] {
            start += 1;
            continue;
        }

        let end = mask[start..].iter()
            .position(|&b| !b)
            .map_or(mask.len(), |offset| start + offset);

        if end - start < min_samples {
            mask[start..end].iter_mut().for_each(|b| *b = false);
        }
        start = end;
    }
}

/// Sample-level burst mask of the whole signal
pub fn detect_bursts_dual_threshold(
    signal: &[f64],
    sampling_rate: f64,
    band: FrequencyRange,
    config: &BurstFractionConfig,
) -> CycleResult<Vec<bool>> {
    let amplitude = amp_by_time(signal, sampling_rate, band, &config.filter, false)?;

    let normalizer = match median(&amplitude) {
        Some(m) if m > 0.0 => m,
        other => {
            warn!(median = ?other, "Narrowband amplitude has no positive median, no samples are bursting");
            return Ok(vec![false; signal.len()]);
        }
    };

    let normalized: Vec<f64> = amplitude.iter().map(|a| a / normalizer).collect();
    let mut mask = dual_threshold_mask(&normalized, config.amp_threshes.low, config.amp_threshes.high);

    let min_samples = (config.n_cycles_min as f64 * sampling_rate / band.center()).ceil() as usize;
    remove_short_bursts(&mut mask, min_samples);

    debug!(
        bursting = mask.iter().filter(|&&b| b).count(),
        min_samples,
        "Applied dual amplitude threshold"
    );

    Ok(mask)
}

/// Fraction of each cycle, edge to edge inclusive, marked bursting
pub fn compute_burst_fraction(
    signal: &[f64],
    cyclepoints: &CyclePoints,
    sampling_rate: f64,
    band: FrequencyRange,
    config: &BurstFractionConfig,
) -> CycleResult<Vec<DualThresholdMetrics>> {
    let mask = detect_bursts_dual_threshold(signal, sampling_rate, band, config)?;

    cyclepoints.iter()
        .map(|point| {
            let cycle = mask.get(point.sample_last_edge..=point.sample_next_edge)
                .ok_or_else(|| CycleError::ComputationFailed {
                    stage: "burst fraction",
                    message: format!(
                        "cycle [{}, {}] exceeds the signal length {}",
                        point.sample_last_edge, point.sample_next_edge, mask.len()
                    ),
                })?;
            let bursting = cycle.iter().filter(|&&b| b).count();
            Ok(DualThresholdMetrics { burst_fraction: bursting as f64 / cycle.len() as f64 })
        })
        .collect()
}

pub(crate) fn ensure_aligned(
    left: &'static str,
    left_len: usize,
    right: &'static str,
    right_len: usize,
) -> CycleResult<()> {
    if left_len != right_len {
        return Err(CycleError::TableMisaligned { left, left_len, right, right_len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cycle_core::CyclePoint;

    fn shape(period: usize, volt_rise: f64, volt_decay: f64) -> ShapeFeatures {
        ShapeFeatures {
            period,
            time_peak: period / 2,
            time_trough: period / 2,
            time_rise: period / 2,
            time_decay: period / 2,
            volt_peak: volt_rise / 2.0,
            volt_trough: -volt_rise / 2.0,
            volt_rise,
            volt_decay,
            volt_amp: (volt_rise + volt_decay) / 2.0,
            time_rdsym: 0.5,
            time_ptsym: 0.5,
            band_amp: 1.0,
        }
    }

    #[test]
    fn test_amplitude_fraction_ranks() {
        let fractions = amplitude_fraction(&[1.0, 3.0, 2.0, 3.0]);
        assert_eq!(fractions, vec![0.25, 1.0, 0.5, 1.0]);

        let uniform = amplitude_fraction(&[2.0, 2.0 + 1e-12, 2.0]);
        assert!(uniform.iter().all(|&f| f == 1.0));
    }

    #[test]
    fn test_amplitude_consistency_neighbors() {
        let rows = vec![shape(100, 2.0, 1.0), shape(100, 2.0, 2.0), shape(100, 4.0, 2.0)];

        // Peak-centered: own flanks 2/2, previous decay 1 vs rise 2, next rise 4 vs decay 2
        assert_eq!(amplitude_consistency(&rows, 1, CenterExtrema::Peak), 0.5);
        // First cycle only has the next neighbor: own 1/2, next rise 2 vs decay 1
        assert_eq!(amplitude_consistency(&rows, 0, CenterExtrema::Peak), 0.5);

        let single = vec![shape(100, 3.0, 3.0)];
        assert_eq!(amplitude_consistency(&single, 0, CenterExtrema::Trough), 1.0);
    }

    #[test]
    fn test_period_consistency_edges() {
        let rows = vec![shape(100, 1.0, 1.0), shape(80, 1.0, 1.0), shape(100, 1.0, 1.0)];

        assert_eq!(period_consistency(&rows, 0), Some(0.8));
        assert_eq!(period_consistency(&rows, 1), Some(0.8));
        assert_eq!(period_consistency(&rows[..1], 0), None);
    }

    #[test]
    fn test_monotonicity() {
        let signal = vec![-1.0, 0.0, 1.0, 0.5, 2.0, 1.0, 0.0, -1.0];
        let points = CyclePoints::new(CenterExtrema::Peak, vec![CyclePoint {
            sample_center: 4,
            sample_last_edge: 0,
            sample_next_edge: 7,
            sample_zerox_lead: 1,
            sample_zerox_trail: 6,
            sample_last_zerox_trail: 0,
        }]).unwrap();

        // Rise: 3 of 4 steps up, decay: 3 of 3 steps down
        assert!((monotonicity(&signal, &points, 0) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_dual_threshold_hysteresis() {
        let amplitude = [0.5, 1.5, 2.5, 1.5, 1.0, 0.9, 1.8, 1.9, 2.1, 0.5];
        let mask = dual_threshold_mask(&amplitude, 1.0, 2.0);

        assert_eq!(
            mask,
            vec![false, false, true, true, true, false, false, false, true, false]
        );

        // Above low but never above high
        assert!(dual_threshold_mask(&[1.5, 1.9, 1.5], 1.0, 2.0).iter().all(|&b| !b));
    }

    #[test]
    fn test_remove_short_bursts() {
        let mut mask = vec![true, true, false, true, true, true, false, true];
        remove_short_bursts(&mut mask, 3);
        assert_eq!(mask, vec![false, false, false, true, true, true, false, false]);
    }

    #[test]
    fn test_flat_signal_has_no_bursts() {
        let config = BurstFractionConfig {
            amp_threshes: Default::default(),
            filter: Default::default(),
            n_cycles_min: 3,
        };
        let mask = detect_bursts_dual_threshold(
            &vec![0.0; 2000], 1000.0, FrequencyRange::new(8.0, 12.0), &config,
        ).unwrap();
        assert!(mask.iter().all(|&b| !b));
    }

    #[test]
    fn test_metric_table_columns() {
        let table = BurstMetricTable::Amplitude(vec![DualThresholdMetrics { burst_fraction: 0.75 }]);
        assert_eq!(table.column_names(), &["burst_fraction"]);
        assert_eq!(table.value(0, "burst_fraction"), Some(0.75));
        assert_eq!(table.value(0, "monotonicity"), None);
        assert_eq!(table.value(1, "burst_fraction"), None);
    }
}
