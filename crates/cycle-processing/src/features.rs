//! Cycle-by-cycle feature computation
//!
//! [`compute_features`] drives shape extraction, burst metric computation and burst
//! classification in sequence and merges the results into one cycle-indexed table.

use crate::burst::{compute_burst_metrics, ensure_aligned, BurstMetricTable};
use crate::classifier::{BurstClassifier, ConsistencyClassifier, DualThresholdClassifier};
use crate::config::{BurstDetectionMethod, FeatureConfig, ResolvedBurstConfig};
use crate::shape::{compute_shape_features, ShapeConfig, ShapeFeatureTable, ShapeFeatures, SHAPE_COLUMNS};
use cycle_core::{config_error, validate_samples, CyclePoints, CycleResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Name of the burst label column
pub const IS_BURST_COLUMN: &str = "is_burst";

/// Shape features, burst metrics and burst labels of every cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    shapes: ShapeFeatureTable,
    burst_metrics: BurstMetricTable,
    is_burst: Vec<bool>,
}

impl FeatureTable {
    /// Merge the per-cycle tables, which must describe the same cycles
    pub fn new(
        shapes: ShapeFeatureTable,
        burst_metrics: BurstMetricTable,
        is_burst: Vec<bool>,
    ) -> CycleResult<Self> {
        ensure_aligned("shape features", shapes.len(), "burst metrics", burst_metrics.len())?;
        ensure_aligned("shape features", shapes.len(), "burst labels", is_burst.len())?;

        Ok(Self { shapes, burst_metrics, is_burst })
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn method(&self) -> BurstDetectionMethod {
        self.burst_metrics.method()
    }

    pub fn shapes(&self) -> &ShapeFeatureTable {
        &self.shapes
    }

    pub fn burst_metrics(&self) -> &BurstMetricTable {
        &self.burst_metrics
    }

    pub fn is_burst(&self) -> &[bool] {
        &self.is_burst
    }

    /// Column names in table order: shape, burst metrics, then `is_burst`
    pub fn column_names(&self) -> Vec<&'static str> {
        SHAPE_COLUMNS.iter()
            .chain(self.burst_metrics.column_names())
            .copied()
            .chain(std::iter::once(IS_BURST_COLUMN))
            .collect()
    }

    pub fn row(&self, index: usize) -> Option<FeatureRow<'_>> {
        Some(FeatureRow {
            index,
            shape: self.shapes.get(index)?,
            burst_metrics: &self.burst_metrics,
            is_burst: *self.is_burst.get(index)?,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = FeatureRow<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// One numeric column; non-comparable values are `None`
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        if name == IS_BURST_COLUMN || !self.column_names().iter().any(|c| *c == name) {
            return None;
        }
        Some(self.rows().map(|row| row.get(name)).collect())
    }

    pub fn burst_count(&self) -> usize {
        self.is_burst.iter().filter(|&&b| b).count()
    }

    /// Inclusive cycle index ranges of consecutive bursting cycles
    pub fn burst_segments(&self) -> Vec<(usize, usize)> {
        let mut segments = Vec::new();
        let mut start = None;

        for (i, &bursting) in self.is_burst.iter().enumerate() {
            match (bursting, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    segments.push((s, i - 1));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            segments.push((s, self.is_burst.len() - 1));
        }

        segments
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_json(&self) -> CycleResult<String> {
        let rows: Vec<Value> = self.rows()
            .map(|row| {
                let mut object = Map::new();
                for column in self.column_names() {
                    let value = if column == IS_BURST_COLUMN {
                        Value::Bool(row.is_burst)
                    } else {
                        row.get(column).map_or(Value::Null, Value::from)
                    };
                    object.insert(column.to_string(), value);
                }
                Value::Object(object)
            })
            .collect();

        serde_json::to_string_pretty(&rows)
            .map_err(|e| config_error!("failed to serialize feature table: {}", e))
    }
}

/// View of a single cycle in a [`FeatureTable`]
#[derive(Debug, Clone, Copy)]
pub struct FeatureRow<'a> {
    pub index: usize,
    pub shape: &'a ShapeFeatures,
    burst_metrics: &'a BurstMetricTable,
    pub is_burst: bool,
}

impl<'a> FeatureRow<'a> {
    /// Shape or burst metric value by column name
    pub fn get(&self, column: &str) -> Option<f64> {
        self.shape.get(column)
            .or_else(|| self.burst_metrics.value(self.index, column))
    }
}

/// Result of [`compute_features`]
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutput {
    Table(FeatureTable),
    WithCyclePoints {
        features: FeatureTable,
        cyclepoints: CyclePoints,
    },
}

impl FeatureOutput {
    pub fn features(&self) -> &FeatureTable {
        match self {
            FeatureOutput::Table(features) => features,
            FeatureOutput::WithCyclePoints { features, .. } => features,
        }
    }

    pub fn cyclepoints(&self) -> Option<&CyclePoints> {
        match self {
            FeatureOutput::Table(_) => None,
            FeatureOutput::WithCyclePoints { cyclepoints, .. } => Some(cyclepoints),
        }
    }

    pub fn into_parts(self) -> (FeatureTable, Option<CyclePoints>) {
        match self {
            FeatureOutput::Table(features) => (features, None),
            FeatureOutput::WithCyclePoints { features, cyclepoints } => (features, Some(cyclepoints)),
        }
    }
}

/// Compute shape and burst features for each cycle of `signal`
///
/// Configuration is validated before any signal work starts. Failures from cycle
/// extraction or amplitude estimation are returned unchanged.
pub fn compute_features(signal: &[f64], config: &FeatureConfig) -> CycleResult<FeatureOutput> {
    let resolved = config.resolve()?;
    validate_samples(signal)?;

    let shape_config = ShapeConfig {
        sampling_rate: config.sampling_rate,
        band: config.frequency_range,
        center_extrema: config.center_extrema,
        extrema: &config.extrema,
        increase_fft_padding: config.increase_fft_padding,
    };
    let (shapes, cyclepoints) = compute_shape_features(signal, &shape_config)?;

    let burst_metrics = compute_burst_metrics(
        signal,
        &shapes,
        &cyclepoints,
        config.sampling_rate,
        config.frequency_range,
        &resolved,
    )?;

    let is_burst = classify(&burst_metrics, &resolved)?;

    let features = FeatureTable::new(shapes, burst_metrics, is_burst)?;

    info!(
        cycles = features.len(),
        bursts = features.burst_count(),
        method = %features.method(),
        center = %config.center_extrema,
        "Computed cycle features"
    );

    if config.return_cyclepoints {
        Ok(FeatureOutput::WithCyclePoints { features, cyclepoints })
    } else {
        Ok(FeatureOutput::Table(features))
    }
}

fn classify(metrics: &BurstMetricTable, config: &ResolvedBurstConfig) -> CycleResult<Vec<bool>> {
    match (metrics, config) {
        (BurstMetricTable::Cycles(rows), ResolvedBurstConfig::Consistency(thresholds)) => {
            Ok(run_classifier(&ConsistencyClassifier::new(*thresholds), rows))
        }
        (BurstMetricTable::Amplitude(rows), ResolvedBurstConfig::DualThreshold { classifier, .. }) => {
            Ok(run_classifier(&DualThresholdClassifier::new(*classifier), rows))
        }
        (metrics, config) => Err(config_error!(
            "'{}' burst metrics cannot be classified with '{}' settings",
            metrics.method(), config.method()
        )),
    }
}

fn run_classifier<C: BurstClassifier>(classifier: &C, metrics: &[C::Metrics]) -> Vec<bool> {
    let is_burst = classifier.classify(metrics);
    debug!(
        classifier = classifier.name(),
        n_cycles_min = classifier.n_cycles_min(),
        cycles = is_burst.len(),
        "Classified bursts"
    );
    is_burst
}
