//! Narrowband FIR filtering
//!
//! Windowed-sinc bandpass design (Hamming window) applied as a zero-phase,
//! same-length convolution through a real FFT.

use cycle_core::{config_error, CycleError, CycleResult, FrequencyRange};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Filter length used when neither cycles nor seconds are given
pub const DEFAULT_FILTER_CYCLES: f64 = 3.0;

/// Length settings for the narrowband filter
///
/// At most one of the two fields may be set. With neither set the filter spans
/// [`DEFAULT_FILTER_CYCLES`] cycles of the low cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrowbandFilterConfig {
    /// Filter length in cycles of the low cutoff frequency
    pub n_cycles: Option<f64>,
    /// Filter length in seconds
    pub n_seconds: Option<f64>,
}

impl NarrowbandFilterConfig {
    /// Filter spanning `n_cycles` cycles of the low cutoff
    pub fn cycles(n_cycles: f64) -> Self {
        Self { n_cycles: Some(n_cycles), n_seconds: None }
    }

    /// Filter spanning `n_seconds` seconds
    pub fn seconds(n_seconds: f64) -> Self {
        Self { n_cycles: None, n_seconds: Some(n_seconds) }
    }

    pub fn validate(&self) -> CycleResult<()> {
        match (self.n_cycles, self.n_seconds) {
            (Some(_), Some(_)) => {
                Err(config_error!("filter length accepts n_cycles or n_seconds, not both"))
            }
            (Some(cycles), None) if !(cycles.is_finite() && cycles > 0.0) => {
                Err(config_error!("filter n_cycles must be positive, got {}", cycles))
            }
            (None, Some(seconds)) if !(seconds.is_finite() && seconds > 0.0) => {
                Err(config_error!("filter n_seconds must be positive, got {}", seconds))
            }
            _ => Ok(()),
        }
    }

    /// Number of taps for the given sampling rate and low cutoff, always odd
    pub fn filter_length(&self, sampling_rate: f64, low_cutoff: f64) -> CycleResult<usize> {
        self.validate()?;

        let seconds = match (self.n_cycles, self.n_seconds) {
            (_, Some(seconds)) => seconds,
            (Some(cycles), None) => cycles / low_cutoff,
            (None, None) => DEFAULT_FILTER_CYCLES / low_cutoff,
        };

        let mut length = (sampling_rate * seconds).ceil() as usize;
        if length % 2 == 0 {
            length += 1;
        }

        if length < 3 {
            return Err(config_error!(
                "filter of {} seconds at {} Hz is too short to design", seconds, sampling_rate
            ));
        }

        Ok(length)
    }
}

/// Linear-phase FIR bandpass filter
#[derive(Debug, Clone, PartialEq)]
pub struct FirFilter {
    coefficients: Vec<f64>,
    band: FrequencyRange,
    sampling_rate: f64,
}

impl FirFilter {
    /// Design a Hamming-windowed bandpass with unit gain at the band center
    pub fn bandpass(
        band: FrequencyRange,
        sampling_rate: f64,
        config: &NarrowbandFilterConfig,
    ) -> CycleResult<Self> {
        band.validate(sampling_rate)?;
        let length = config.filter_length(sampling_rate, band.low)?;

        let nyquist = sampling_rate / 2.0;
        let low = band.low / nyquist;
        let high = band.high / nyquist;
        let alpha = (length - 1) as f64 / 2.0;

        let mut coefficients: Vec<f64> = (0..length)
            .map(|n| {
                let m = n as f64 - alpha;
                let ideal = high * sinc(high * m) - low * sinc(low * m);
                let window = 0.54 - 0.46 * (2.0 * PI * n as f64 / (length - 1) as f64).cos();
                ideal * window
            })
            .collect();

        // Normalize so the response at the band center is exactly one
        let center = band.center() / nyquist;
        let gain: f64 = coefficients.iter()
            .enumerate()
            .map(|(n, h)| h * (PI * (n as f64 - alpha) * center).cos())
            .sum();

        if gain.abs() < f64::EPSILON {
            return Err(CycleError::ComputationFailed {
                stage: "filter design",
                message: format!("bandpass {:?} has no gain at its center", band),
            });
        }

        for coefficient in coefficients.iter_mut() {
            *coefficient /= gain;
        }

        Ok(Self { coefficients, band, sampling_rate })
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn band(&self) -> FrequencyRange {
        self.band
    }

    /// Magnitude of the frequency response at `frequency` Hz
    pub fn gain_at(&self, frequency: f64) -> f64 {
        let omega = 2.0 * PI * frequency / self.sampling_rate;
        let (re, im) = self.coefficients.iter()
            .enumerate()
            .fold((0.0, 0.0), |(re, im), (n, h)| {
                let phase = omega * n as f64;
                (re + h * phase.cos(), im - h * phase.sin())
            });
        (re * re + im * im).sqrt()
    }

    /// Filter a signal, returning an output of the same length
    ///
    /// The output is centered on the kernel, so the filter introduces no delay.
    pub fn apply(&self, signal: &[f64]) -> CycleResult<Vec<f64>> {
        if self.coefficients.len() > signal.len() {
            return Err(CycleError::FilterTooLong {
                filter_len: self.coefficients.len(),
                signal_len: signal.len(),
            });
        }

        let full_len = signal.len() + self.coefficients.len() - 1;
        let fft_len = full_len.next_power_of_two();

        let mut planner = RealFftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let mut signal_buffer = forward.make_input_vec();
        signal_buffer[..signal.len()].copy_from_slice(signal);
        let mut signal_spectrum = forward.make_output_vec();
        forward.process(&mut signal_buffer, &mut signal_spectrum)
            .map_err(|e| fft_error("filter", e))?;

        let mut kernel_buffer = forward.make_input_vec();
        kernel_buffer[..self.coefficients.len()].copy_from_slice(&self.coefficients);
        let mut kernel_spectrum = forward.make_output_vec();
        forward.process(&mut kernel_buffer, &mut kernel_spectrum)
            .map_err(|e| fft_error("filter", e))?;

        for (s, k) in signal_spectrum.iter_mut().zip(kernel_spectrum.iter()) {
            *s = *s * *k;
        }

        // DC and Nyquist bins of a real sequence have no imaginary part
        if let Some(first) = signal_spectrum.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = signal_spectrum.last_mut() {
            last.im = 0.0;
        }

        let mut output = inverse.make_output_vec();
        inverse.process(&mut signal_spectrum, &mut output)
            .map_err(|e| fft_error("filter", e))?;

        let offset = (self.coefficients.len() - 1) / 2;
        let scale = 1.0 / fft_len as f64;

        Ok(output[offset..offset + signal.len()]
            .iter()
            .map(|x| x * scale)
            .collect())
    }
}

/// Bandpass a signal to `band` with the given length settings
pub fn filter_narrowband(
    signal: &[f64],
    sampling_rate: f64,
    band: FrequencyRange,
    config: &NarrowbandFilterConfig,
) -> CycleResult<Vec<f64>> {
    FirFilter::bandpass(band, sampling_rate, config)?.apply(signal)
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

pub(crate) fn fft_error(stage: &'static str, error: impl std::fmt::Display) -> CycleError {
    CycleError::ComputationFailed {
        stage,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f64, sampling_rate: f64, n_samples: usize) -> Vec<f64> {
        (0..n_samples)
            .map(|i| (2.0 * PI * frequency * i as f64 / sampling_rate).sin())
            .collect()
    }

    #[test]
    fn test_filter_length() {
        let default = NarrowbandFilterConfig::default();
        assert_eq!(default.filter_length(1000.0, 8.0).unwrap(), 375);
        assert_eq!(default.filter_length(1000.0, 10.0).unwrap(), 301);

        let seconds = NarrowbandFilterConfig::seconds(0.5);
        assert_eq!(seconds.filter_length(1000.0, 8.0).unwrap(), 501);

        let both = NarrowbandFilterConfig { n_cycles: Some(3.0), n_seconds: Some(0.5) };
        assert!(both.validate().unwrap_err().is_configuration());
        assert!(NarrowbandFilterConfig::cycles(0.0).validate().is_err());
        assert!(NarrowbandFilterConfig::seconds(-1.0).validate().is_err());
    }

    #[test]
    fn test_bandpass_design() {
        let band = FrequencyRange::new(8.0, 12.0);
        let filter = FirFilter::bandpass(band, 1000.0, &NarrowbandFilterConfig::default()).unwrap();

        assert_eq!(filter.len(), 375);
        assert!((filter.gain_at(10.0) - 1.0).abs() < 1e-9);
        assert!(filter.gain_at(40.0) < 0.05);
        assert!(filter.gain_at(0.0) < 0.05);

        // Linear phase
        let h = filter.coefficients();
        for i in 0..h.len() / 2 {
            assert!((h[i] - h[h.len() - 1 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_apply_is_centered() {
        let band = FrequencyRange::new(8.0, 12.0);
        let filter = FirFilter::bandpass(band, 1000.0, &NarrowbandFilterConfig::default()).unwrap();

        let mut impulse = vec![0.0; 1001];
        impulse[500] = 1.0;
        let response = filter.apply(&impulse).unwrap();

        assert_eq!(response.len(), impulse.len());
        let h = filter.coefficients();
        for j in [0, 100, 187, 300, 374] {
            assert!((response[313 + j] - h[j]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_passband_and_stopband() {
        let band = FrequencyRange::new(8.0, 12.0);
        let config = NarrowbandFilterConfig::default();

        let passed = filter_narrowband(&sine(10.0, 1000.0, 4000), 1000.0, band, &config).unwrap();
        let middle_peak = passed[1500..2500].iter().fold(0.0_f64, |a, &b| a.max(b.abs()));
        assert!((middle_peak - 1.0).abs() < 0.02);

        let rejected = filter_narrowband(&sine(40.0, 1000.0, 4000), 1000.0, band, &config).unwrap();
        let middle_peak = rejected[1500..2500].iter().fold(0.0_f64, |a, &b| a.max(b.abs()));
        assert!(middle_peak < 0.05);
    }

    #[test]
    fn test_filter_too_long() {
        let band = FrequencyRange::new(8.0, 12.0);
        let result = filter_narrowband(&[0.0; 200], 1000.0, band, &NarrowbandFilterConfig::default());

        assert_eq!(result, Err(CycleError::FilterTooLong { filter_len: 375, signal_len: 200 }));
    }
}
