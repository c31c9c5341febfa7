//! Configuration for feature computation and burst detection
//!
//! Per-method settings carry optional fields; [`FeatureConfig::resolve`] fills the
//! defaults and validates once, producing a [`ResolvedBurstConfig`] the pipeline
//! dispatches on.

use crate::extrema::ExtremaConfig;
use crate::filters::NarrowbandFilterConfig;
use cycle_core::{config_error, CenterExtrema, CycleError, CycleResult, FrequencyRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum burst length, in cycles, used by both methods
pub const DEFAULT_N_CYCLES_MIN: usize = 3;

/// Burst detection algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstDetectionMethod {
    /// Consistency of consecutive cycle shapes
    Cycles,
    /// Dual amplitude threshold on the narrowband envelope
    Amplitude,
}

impl BurstDetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BurstDetectionMethod::Cycles => "cycles",
            BurstDetectionMethod::Amplitude => "amplitude",
        }
    }
}

impl fmt::Display for BurstDetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BurstDetectionMethod {
    type Err = CycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cycles" => Ok(BurstDetectionMethod::Cycles),
            "amplitude" => Ok(BurstDetectionMethod::Amplitude),
            other => Err(config_error!(
                "invalid burst detection method '{}', either 'cycles' or 'amplitude' must be specified",
                other
            )),
        }
    }
}

/// Low and high hysteresis thresholds on median-normalized amplitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct AmpThresholds {
    pub low: f64,
    pub high: f64,
}

impl AmpThresholds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn validate(&self) -> CycleResult<()> {
        if !(self.low.is_finite() && self.high.is_finite()) || self.low < 0.0 {
            return Err(config_error!(
                "amplitude thresholds must be finite and non-negative, got ({}, {})",
                self.low, self.high
            ));
        }

        if self.low >= self.high {
            return Err(config_error!(
                "low amplitude threshold ({}) must be below the high threshold ({})",
                self.low, self.high
            ));
        }

        Ok(())
    }
}

impl Default for AmpThresholds {
    fn default() -> Self {
        Self { low: 1.0, high: 2.0 }
    }
}

impl From<(f64, f64)> for AmpThresholds {
    fn from((low, high): (f64, f64)) -> Self {
        Self { low, high }
    }
}

impl From<AmpThresholds> for (f64, f64) {
    fn from(thresholds: AmpThresholds) -> Self {
        (thresholds.low, thresholds.high)
    }
}

/// Optional settings for consistency burst detection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyParams {
    pub amp_fraction_threshold: Option<f64>,
    pub amp_consistency_threshold: Option<f64>,
    pub period_consistency_threshold: Option<f64>,
    pub monotonicity_threshold: Option<f64>,
    pub n_cycles_min: Option<usize>,
    /// Never mark the first and last cycle as bursting
    pub exclude_edges: Option<bool>,
}

/// Optional settings for dual amplitude threshold burst detection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DualThresholdParams {
    pub amp_threshes: Option<AmpThresholds>,
    /// Narrowband filter used for the amplitude envelope
    pub filter: Option<NarrowbandFilterConfig>,
    pub n_cycles_min: Option<usize>,
    /// Fraction of a cycle's samples that must be bursting
    pub burst_fraction_threshold: Option<f64>,
}

/// Burst detection method together with its settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BurstDetection {
    Cycles(ConsistencyParams),
    Amplitude(DualThresholdParams),
}

impl BurstDetection {
    pub fn method(&self) -> BurstDetectionMethod {
        match self {
            BurstDetection::Cycles(_) => BurstDetectionMethod::Cycles,
            BurstDetection::Amplitude(_) => BurstDetectionMethod::Amplitude,
        }
    }

    /// Default settings for a method
    pub fn for_method(method: BurstDetectionMethod) -> Self {
        match method {
            BurstDetectionMethod::Cycles => BurstDetection::Cycles(ConsistencyParams::default()),
            BurstDetectionMethod::Amplitude => BurstDetection::Amplitude(DualThresholdParams::default()),
        }
    }

    /// Fill defaults and validate
    pub fn resolve(&self) -> CycleResult<ResolvedBurstConfig> {
        let resolved = match self {
            BurstDetection::Cycles(params) => {
                let defaults = ConsistencyThresholds::default();
                ResolvedBurstConfig::Consistency(ConsistencyThresholds {
                    amp_fraction: params.amp_fraction_threshold.unwrap_or(defaults.amp_fraction),
                    amp_consistency: params.amp_consistency_threshold.unwrap_or(defaults.amp_consistency),
                    period_consistency: params.period_consistency_threshold.unwrap_or(defaults.period_consistency),
                    monotonicity: params.monotonicity_threshold.unwrap_or(defaults.monotonicity),
                    n_cycles_min: params.n_cycles_min.unwrap_or(defaults.n_cycles_min),
                    exclude_edges: params.exclude_edges.unwrap_or(defaults.exclude_edges),
                })
            }
            BurstDetection::Amplitude(params) => {
                let n_cycles_min = params.n_cycles_min.unwrap_or(DEFAULT_N_CYCLES_MIN);
                ResolvedBurstConfig::DualThreshold {
                    fraction: BurstFractionConfig {
                        amp_threshes: params.amp_threshes.unwrap_or_default(),
                        filter: params.filter.unwrap_or_default(),
                        n_cycles_min,
                    },
                    classifier: DualThresholdClassifierConfig {
                        burst_fraction_threshold: params.burst_fraction_threshold
                            .unwrap_or(DualThresholdClassifierConfig::DEFAULT_BURST_FRACTION),
                        n_cycles_min,
                    },
                }
            }
        };

        resolved.validate()?;
        Ok(resolved)
    }
}

impl Default for BurstDetection {
    fn default() -> Self {
        BurstDetection::Cycles(ConsistencyParams::default())
    }
}

/// Resolved thresholds for the consistency classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyThresholds {
    pub amp_fraction: f64,
    pub amp_consistency: f64,
    pub period_consistency: f64,
    pub monotonicity: f64,
    pub n_cycles_min: usize,
    pub exclude_edges: bool,
}

impl Default for ConsistencyThresholds {
    fn default() -> Self {
        Self {
            amp_fraction: 0.0,
            amp_consistency: 0.5,
            period_consistency: 0.5,
            monotonicity: 0.8,
            n_cycles_min: DEFAULT_N_CYCLES_MIN,
            exclude_edges: true,
        }
    }
}

impl ConsistencyThresholds {
    pub fn validate(&self) -> CycleResult<()> {
        let thresholds = [
            ("amp_fraction_threshold", self.amp_fraction),
            ("amp_consistency_threshold", self.amp_consistency),
            ("period_consistency_threshold", self.period_consistency),
            ("monotonicity_threshold", self.monotonicity),
        ];

        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(config_error!("{} must be within [0, 1], got {}", name, value));
            }
        }

        validate_n_cycles_min(self.n_cycles_min)
    }
}

/// Settings consumed while computing the per-cycle burst fraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstFractionConfig {
    pub amp_threshes: AmpThresholds,
    pub filter: NarrowbandFilterConfig,
    /// Also sets the minimum sample-level burst duration
    pub n_cycles_min: usize,
}

impl BurstFractionConfig {
    pub fn validate(&self) -> CycleResult<()> {
        self.amp_threshes.validate()?;
        self.filter.validate()?;
        validate_n_cycles_min(self.n_cycles_min)
    }
}

/// Settings for the dual-threshold classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualThresholdClassifierConfig {
    pub burst_fraction_threshold: f64,
    pub n_cycles_min: usize,
}

impl DualThresholdClassifierConfig {
    /// Majority of the cycle bursting
    pub const DEFAULT_BURST_FRACTION: f64 = 0.5;

    pub fn validate(&self) -> CycleResult<()> {
        if !(0.0..1.0).contains(&self.burst_fraction_threshold) {
            return Err(config_error!(
                "burst_fraction_threshold must be within [0, 1), got {}",
                self.burst_fraction_threshold
            ));
        }

        validate_n_cycles_min(self.n_cycles_min)
    }
}

impl Default for DualThresholdClassifierConfig {
    fn default() -> Self {
        Self {
            burst_fraction_threshold: Self::DEFAULT_BURST_FRACTION,
            n_cycles_min: DEFAULT_N_CYCLES_MIN,
        }
    }
}

/// Burst detection settings with every default filled in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedBurstConfig {
    Consistency(ConsistencyThresholds),
    DualThreshold {
        fraction: BurstFractionConfig,
        classifier: DualThresholdClassifierConfig,
    },
}

impl ResolvedBurstConfig {
    pub fn method(&self) -> BurstDetectionMethod {
        match self {
            ResolvedBurstConfig::Consistency(_) => BurstDetectionMethod::Cycles,
            ResolvedBurstConfig::DualThreshold { .. } => BurstDetectionMethod::Amplitude,
        }
    }

    pub fn validate(&self) -> CycleResult<()> {
        match self {
            ResolvedBurstConfig::Consistency(thresholds) => thresholds.validate(),
            ResolvedBurstConfig::DualThreshold { fraction, classifier } => {
                fraction.validate()?;
                classifier.validate()
            }
        }
    }
}

fn validate_n_cycles_min(n_cycles_min: usize) -> CycleResult<()> {
    if n_cycles_min == 0 {
        return Err(config_error!("n_cycles_min must be at least 1"));
    }
    Ok(())
}

fn default_return_cyclepoints() -> bool {
    true
}

/// Complete configuration of one feature computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Sampling rate (Hz)
    pub sampling_rate: f64,
    /// Band of the oscillation of interest
    pub frequency_range: FrequencyRange,
    #[serde(default)]
    pub center_extrema: CenterExtrema,
    #[serde(default)]
    pub burst_detection: BurstDetection,
    #[serde(default)]
    pub extrema: ExtremaConfig,
    /// Zero-pad the Hilbert transform to a power of two
    #[serde(default)]
    pub increase_fft_padding: bool,
    #[serde(default = "default_return_cyclepoints")]
    pub return_cyclepoints: bool,
}

impl FeatureConfig {
    /// Consistency detection with default thresholds
    pub fn consistency_default(sampling_rate: f64, frequency_range: FrequencyRange) -> Self {
        Self {
            sampling_rate,
            frequency_range,
            center_extrema: CenterExtrema::Peak,
            burst_detection: BurstDetection::for_method(BurstDetectionMethod::Cycles),
            extrema: ExtremaConfig::default(),
            increase_fft_padding: false,
            return_cyclepoints: true,
        }
    }

    /// Dual-threshold detection with default thresholds
    pub fn amplitude_default(sampling_rate: f64, frequency_range: FrequencyRange) -> Self {
        Self {
            burst_detection: BurstDetection::for_method(BurstDetectionMethod::Amplitude),
            ..Self::consistency_default(sampling_rate, frequency_range)
        }
    }

    pub fn builder(sampling_rate: f64, frequency_range: FrequencyRange) -> FeatureConfigBuilder {
        FeatureConfigBuilder::new(sampling_rate, frequency_range)
    }

    pub fn validate(&self) -> CycleResult<()> {
        self.resolve().map(|_| ())
    }

    /// Validate everything and fill burst detection defaults
    pub fn resolve(&self) -> CycleResult<ResolvedBurstConfig> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(config_error!("sampling rate must be positive, got {}", self.sampling_rate));
        }

        self.frequency_range.validate(self.sampling_rate)?;
        self.extrema.validate()?;
        self.burst_detection.resolve()
    }

    pub fn method(&self) -> BurstDetectionMethod {
        self.burst_detection.method()
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> CycleResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| config_error!("failed to serialize configuration: {}", e))
    }

    /// Import and validate configuration from JSON
    pub fn from_json(json: &str) -> CycleResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| config_error!("failed to parse configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for [`FeatureConfig`]
#[derive(Debug, Clone)]
pub struct FeatureConfigBuilder {
    config: FeatureConfig,
    method_name: Option<String>,
    burst_detection: Option<BurstDetection>,
}

impl FeatureConfigBuilder {
    pub fn new(sampling_rate: f64, frequency_range: FrequencyRange) -> Self {
        Self {
            config: FeatureConfig::consistency_default(sampling_rate, frequency_range),
            method_name: None,
            burst_detection: None,
        }
    }

    pub fn center_extrema(mut self, center_extrema: CenterExtrema) -> Self {
        self.config.center_extrema = center_extrema;
        self
    }

    /// Select the method by name, checked in [`build`](Self::build)
    pub fn burst_detection_method(mut self, method: &str) -> Self {
        self.method_name = Some(method.to_string());
        self
    }

    pub fn burst_detection(mut self, burst_detection: BurstDetection) -> Self {
        self.burst_detection = Some(burst_detection);
        self
    }

    pub fn consistency(self, params: ConsistencyParams) -> Self {
        self.burst_detection(BurstDetection::Cycles(params))
    }

    pub fn amplitude(self, params: DualThresholdParams) -> Self {
        self.burst_detection(BurstDetection::Amplitude(params))
    }

    pub fn extrema(mut self, extrema: ExtremaConfig) -> Self {
        self.config.extrema = extrema;
        self
    }

    pub fn increase_fft_padding(mut self, enabled: bool) -> Self {
        self.config.increase_fft_padding = enabled;
        self
    }

    pub fn return_cyclepoints(mut self, enabled: bool) -> Self {
        self.config.return_cyclepoints = enabled;
        self
    }

    pub fn build(self) -> CycleResult<FeatureConfig> {
        let mut config = self.config;

        let method = self.method_name
            .as_deref()
            .map(BurstDetectionMethod::from_str)
            .transpose()?;

        config.burst_detection = match (method, self.burst_detection) {
            (Some(method), Some(detection)) if detection.method() != method => {
                return Err(config_error!(
                    "settings for '{}' burst detection given with method '{}'",
                    detection.method(), method
                ));
            }
            (_, Some(detection)) => detection,
            (Some(method), None) => BurstDetection::for_method(method),
            (None, None) => BurstDetection::default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band() -> FrequencyRange {
        FrequencyRange::new(8.0, 12.0)
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("cycles".parse::<BurstDetectionMethod>().unwrap(), BurstDetectionMethod::Cycles);
        assert_eq!("amplitude".parse::<BurstDetectionMethod>().unwrap(), BurstDetectionMethod::Amplitude);
        assert!("wavelet".parse::<BurstDetectionMethod>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_consistency_defaults() {
        let resolved = FeatureConfig::consistency_default(1000.0, band()).resolve().unwrap();

        assert_eq!(resolved, ResolvedBurstConfig::Consistency(ConsistencyThresholds {
            amp_fraction: 0.0,
            amp_consistency: 0.5,
            period_consistency: 0.5,
            monotonicity: 0.8,
            n_cycles_min: 3,
            exclude_edges: true,
        }));
    }

    #[test]
    fn test_amplitude_defaults() {
        let resolved = FeatureConfig::amplitude_default(1000.0, band()).resolve().unwrap();

        match resolved {
            ResolvedBurstConfig::DualThreshold { fraction, classifier } => {
                assert_eq!(fraction.amp_threshes, AmpThresholds::new(1.0, 2.0));
                assert_eq!(fraction.filter, NarrowbandFilterConfig::default());
                assert_eq!(fraction.n_cycles_min, 3);
                assert_eq!(classifier.burst_fraction_threshold, 0.5);
                assert_eq!(classifier.n_cycles_min, 3);
            }
            other => panic!("expected dual threshold config, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_params_keep_defaults() {
        let config = FeatureConfig::builder(1000.0, band())
            .amplitude(DualThresholdParams { n_cycles_min: Some(4), ..Default::default() })
            .build()
            .unwrap();

        match config.resolve().unwrap() {
            ResolvedBurstConfig::DualThreshold { fraction, classifier } => {
                assert_eq!(fraction.amp_threshes, AmpThresholds::default());
                assert_eq!(fraction.n_cycles_min, 4);
                assert_eq!(classifier.n_cycles_min, 4);
            }
            other => panic!("expected dual threshold config, got {:?}", other),
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = FeatureConfig::consistency_default(1000.0, band());
        assert!(config.validate().is_ok());

        config.sampling_rate = 0.0;
        assert!(config.validate().unwrap_err().is_configuration());

        let config = FeatureConfig::consistency_default(1000.0, FrequencyRange::new(12.0, 8.0));
        assert!(config.validate().is_err());

        let inverted = BurstDetection::Amplitude(DualThresholdParams {
            amp_threshes: Some(AmpThresholds::new(2.0, 1.0)),
            ..Default::default()
        });
        assert!(inverted.resolve().unwrap_err().is_configuration());

        let out_of_range = BurstDetection::Cycles(ConsistencyParams {
            monotonicity_threshold: Some(1.5),
            ..Default::default()
        });
        assert!(out_of_range.resolve().is_err());

        let zero_run = BurstDetection::Cycles(ConsistencyParams {
            n_cycles_min: Some(0),
            ..Default::default()
        });
        assert!(zero_run.resolve().is_err());
    }

    #[test]
    fn test_builder_method_name() {
        let config = FeatureConfig::builder(1000.0, band())
            .burst_detection_method("amplitude")
            .center_extrema(CenterExtrema::Trough)
            .build()
            .unwrap();
        assert_eq!(config.method(), BurstDetectionMethod::Amplitude);
        assert_eq!(config.center_extrema, CenterExtrema::Trough);

        let unknown = FeatureConfig::builder(1000.0, band())
            .burst_detection_method("wavelet")
            .build();
        assert!(unknown.unwrap_err().is_configuration());

        let mismatched = FeatureConfig::builder(1000.0, band())
            .burst_detection_method("cycles")
            .amplitude(DualThresholdParams::default())
            .build();
        assert!(mismatched.is_err());
    }

    #[test]
    fn test_json_serialization() {
        let config = FeatureConfig::builder(1000.0, band())
            .amplitude(DualThresholdParams {
                amp_threshes: Some(AmpThresholds::new(1.5, 3.0)),
                ..Default::default()
            })
            .build()
            .unwrap();

        let json = config.to_json().unwrap();
        assert!(json.contains("\"method\": \"amplitude\""));

        let parsed = FeatureConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_json_defaults_and_unknown_method() {
        let minimal = r#"{
            "sampling_rate": 1000.0,
            "frequency_range": { "low": 8.0, "high": 12.0 },
            "burst_detection": { "method": "amplitude", "amp_threshes": [1.0, 3.0] }
        }"#;
        let config = FeatureConfig::from_json(minimal).unwrap();
        assert_eq!(config.center_extrema, CenterExtrema::Peak);
        assert!(config.return_cyclepoints);
        assert_eq!(
            config.burst_detection,
            BurstDetection::Amplitude(DualThresholdParams {
                amp_threshes: Some(AmpThresholds::new(1.0, 3.0)),
                ..Default::default()
            })
        );

        let unknown = r#"{
            "sampling_rate": 1000.0,
            "frequency_range": { "low": 8.0, "high": 12.0 },
            "burst_detection": { "method": "wavelet" }
        }"#;
        assert!(FeatureConfig::from_json(unknown).unwrap_err().is_configuration());
    }
}
