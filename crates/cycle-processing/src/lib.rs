//! Cycle-Processing: Cycle-by-cycle oscillation features and burst detection
//!
//! Narrowband filtering, cycle extraction, shape features, burst metrics and
//! the two burst classifiers, driven by [`compute_features`].

pub mod filters;
pub mod amplitude;
pub mod extrema;
pub mod shape;
pub mod burst;
pub mod classifier;
pub mod config;
pub mod features;

pub use filters::{FirFilter, NarrowbandFilterConfig, filter_narrowband};
pub use amplitude::{amp_by_time, analytic_signal};
pub use extrema::{compute_cyclepoints, find_extrema, find_zerox, ExtremaConfig};
pub use shape::{compute_shape_features, ShapeConfig, ShapeFeatureTable, ShapeFeatures};
pub use burst::{
    compute_burst_metrics, BurstMetricTable, ConsistencyMetrics, DualThresholdMetrics
};
pub use classifier::{BurstClassifier, ConsistencyClassifier, DualThresholdClassifier};
pub use config::{
    AmpThresholds, BurstDetection, BurstDetectionMethod, BurstFractionConfig,
    ConsistencyParams, ConsistencyThresholds, DualThresholdClassifierConfig,
    DualThresholdParams, FeatureConfig, FeatureConfigBuilder, ResolvedBurstConfig
};
pub use features::{compute_features, FeatureOutput, FeatureRow, FeatureTable};
