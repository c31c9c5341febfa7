//! Per-cycle waveform shape features

use crate::amplitude::amp_by_time;
use crate::extrema::{compute_cyclepoints, ExtremaConfig};
use crate::filters::NarrowbandFilterConfig;
use cycle_core::{CenterExtrema, CyclePoint, CyclePoints, CycleResult, FrequencyRange};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shape feature columns, in table order
pub const SHAPE_COLUMNS: [&str; 13] = [
    "period",
    "time_peak",
    "time_trough",
    "time_rise",
    "time_decay",
    "volt_peak",
    "volt_trough",
    "volt_rise",
    "volt_decay",
    "volt_amp",
    "time_rdsym",
    "time_ptsym",
    "band_amp",
];

/// Shape of a single cycle
///
/// Durations are in samples. Fields always describe the actual peak and trough of
/// the waveform, whichever extremum the cycle is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeFeatures {
    /// Samples between the two edge extrema
    pub period: usize,
    /// Duration of the peak between its zero-crossings
    pub time_peak: usize,
    /// Duration of the trough between its zero-crossings
    pub time_trough: usize,
    /// Samples from trough to peak
    pub time_rise: usize,
    /// Samples from peak to trough
    pub time_decay: usize,
    pub volt_peak: f64,
    pub volt_trough: f64,
    /// Voltage change over the rise flank
    pub volt_rise: f64,
    /// Voltage change over the decay flank
    pub volt_decay: f64,
    /// Mean of rise and decay voltage
    pub volt_amp: f64,
    /// Fraction of the period spent rising
    pub time_rdsym: f64,
    /// Fraction of peak plus trough time spent in the peak
    pub time_ptsym: f64,
    /// Mean narrowband amplitude over the cycle
    pub band_amp: f64,
}

impl ShapeFeatures {
    /// Look up a column by name
    pub fn get(&self, column: &str) -> Option<f64> {
        let value = match column {
            "period" => self.period as f64,
            "time_peak" => self.time_peak as f64,
            "time_trough" => self.time_trough as f64,
            "time_rise" => self.time_rise as f64,
            "time_decay" => self.time_decay as f64,
            "volt_peak" => self.volt_peak,
            "volt_trough" => self.volt_trough,
            "volt_rise" => self.volt_rise,
            "volt_decay" => self.volt_decay,
            "volt_amp" => self.volt_amp,
            "time_rdsym" => self.time_rdsym,
            "time_ptsym" => self.time_ptsym,
            "band_amp" => self.band_amp,
            _ => return None,
        };
        Some(value)
    }

    /// Measure a peak-centered cycle of `signal`
    fn measure(signal: &[f64], amplitude: &[f64], point: &CyclePoint) -> Self {
        let period = point.period();
        let time_peak = point.sample_zerox_trail - point.sample_zerox_lead;
        let time_trough = point.sample_zerox_lead - point.sample_last_zerox_trail;
        let time_rise = point.sample_center - point.sample_last_edge;
        let time_decay = point.sample_next_edge - point.sample_center;

        let volt_peak = signal[point.sample_center];
        let volt_trough = signal[point.sample_last_edge];
        let volt_rise = volt_peak - volt_trough;
        let volt_decay = volt_peak - signal[point.sample_next_edge];

        let cycle_amp = &amplitude[point.sample_last_edge..point.sample_next_edge];
        let band_amp = cycle_amp.iter().sum::<f64>() / cycle_amp.len() as f64;

        Self {
            period,
            time_peak,
            time_trough,
            time_rise,
            time_decay,
            volt_peak,
            volt_trough,
            volt_rise,
            volt_decay,
            volt_amp: (volt_rise + volt_decay) / 2.0,
            time_rdsym: time_rise as f64 / period as f64,
            time_ptsym: time_peak as f64 / (time_peak + time_trough) as f64,
            band_amp,
        }
    }

    /// Relabel features measured on the inverted signal of a trough-centered cycle
    fn relabel_inverted(self) -> Self {
        Self {
            period: self.period,
            time_peak: self.time_trough,
            time_trough: self.time_peak,
            time_rise: self.time_decay,
            time_decay: self.time_rise,
            volt_peak: -self.volt_trough,
            volt_trough: -self.volt_peak,
            volt_rise: self.volt_decay,
            volt_decay: self.volt_rise,
            volt_amp: self.volt_amp,
            time_rdsym: 1.0 - self.time_rdsym,
            time_ptsym: 1.0 - self.time_ptsym,
            band_amp: self.band_amp,
        }
    }
}

/// Cycle-indexed shape feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeFeatureTable {
    rows: Vec<ShapeFeatures>,
}

impl ShapeFeatureTable {
    pub fn new(rows: Vec<ShapeFeatures>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ShapeFeatures] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&ShapeFeatures> {
        self.rows.get(index)
    }

    /// One column across all cycles
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        self.rows.iter().map(|row| row.get(name)).collect()
    }

    pub fn volt_amp(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.volt_amp).collect()
    }
}

/// Settings for shape extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeConfig<'a> {
    pub sampling_rate: f64,
    pub band: FrequencyRange,
    pub center_extrema: CenterExtrema,
    pub extrema: &'a ExtremaConfig,
    pub increase_fft_padding: bool,
}

/// Locate every cycle of `signal` and measure its shape
pub fn compute_shape_features(
    signal: &[f64],
    config: &ShapeConfig<'_>,
) -> CycleResult<(ShapeFeatureTable, CyclePoints)> {
    let cyclepoints = compute_cyclepoints(
        signal,
        config.sampling_rate,
        config.band,
        config.center_extrema,
        config.extrema,
    )?;

    let aligned = config.center_extrema.align(signal);

    let amplitude = amp_by_time(
        &aligned,
        config.sampling_rate,
        config.band,
        &NarrowbandFilterConfig::default(),
        config.increase_fft_padding,
    )?;

    let rows = cyclepoints.iter()
        .map(|point| {
            let features = ShapeFeatures::measure(&aligned, &amplitude, point);
            match config.center_extrema {
                CenterExtrema::Peak => features,
                CenterExtrema::Trough => features.relabel_inverted(),
            }
        })
        .collect::<Vec<_>>();

    debug!(cycles = rows.len(), center = %config.center_extrema, "Computed shape features");

    Ok((ShapeFeatureTable::new(rows), cyclepoints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(n_samples: usize) -> Vec<f64> {
        (0..n_samples)
            .map(|i| (2.0 * PI * 10.0 * i as f64 / 1000.0).sin())
            .collect()
    }

    #[test]
    fn test_measure_single_cycle() {
        let signal = vec![-1.0, -0.5, 0.0, 0.5, 2.0, 0.5, 0.0, -0.5, -1.0, -0.5];
        let amplitude = vec![1.0; signal.len()];
        let point = CyclePoint {
            sample_center: 4,
            sample_last_edge: 0,
            sample_next_edge: 8,
            sample_zerox_lead: 2,
            sample_zerox_trail: 6,
            sample_last_zerox_trail: 0,
        };

        let features = ShapeFeatures::measure(&signal, &amplitude, &point);
        assert_eq!(features.period, 8);
        assert_eq!(features.time_peak, 4);
        assert_eq!(features.time_trough, 2);
        assert_eq!(features.time_rise, 4);
        assert_eq!(features.volt_peak, 2.0);
        assert_eq!(features.volt_rise, 3.0);
        assert_eq!(features.volt_decay, 3.0);
        assert_eq!(features.volt_amp, 3.0);
        assert_eq!(features.time_rdsym, 0.5);
        assert!((features.time_ptsym - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(features.band_amp, 1.0);

        assert_eq!(features.get("time_trough"), Some(2.0));
        assert_eq!(features.get("is_burst"), None);
    }

    #[test]
    fn test_relabel_inverted() {
        let measured = ShapeFeatures {
            period: 100,
            time_peak: 60,
            time_trough: 40,
            time_rise: 30,
            time_decay: 70,
            volt_peak: 2.0,
            volt_trough: -1.0,
            volt_rise: 3.0,
            volt_decay: 2.5,
            volt_amp: 2.75,
            time_rdsym: 0.3,
            time_ptsym: 0.6,
            band_amp: 1.2,
        };

        let relabelled = measured.relabel_inverted();
        assert_eq!(relabelled.time_peak, 40);
        assert_eq!(relabelled.time_rise, 70);
        assert_eq!(relabelled.volt_peak, 1.0);
        assert_eq!(relabelled.volt_trough, -2.0);
        assert_eq!(relabelled.volt_rise, 2.5);
        assert!((relabelled.time_rdsym - 0.7).abs() < 1e-12);
        assert!((relabelled.time_ptsym - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_sine_shape() {
        let signal = sine(3000);
        let extrema = ExtremaConfig::default();
        let config = ShapeConfig {
            sampling_rate: 1000.0,
            band: FrequencyRange::new(8.0, 12.0),
            center_extrema: CenterExtrema::Peak,
            extrema: &extrema,
            increase_fft_padding: false,
        };

        let (shapes, cyclepoints) = compute_shape_features(&signal, &config).unwrap();
        assert_eq!(shapes.len(), cyclepoints.len());
        assert_eq!(shapes.column("period").unwrap().len(), shapes.len());

        for row in shapes.rows() {
            assert_eq!(row.period, 100);
            assert!((row.volt_amp - 2.0).abs() < 1e-9);
            assert!((row.time_rdsym - 0.5).abs() < 1e-9);
            assert!((row.time_ptsym - 0.5).abs() < 0.03);
        }
    }
}
