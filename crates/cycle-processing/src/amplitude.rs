//! Analytic signal and instantaneous amplitude

use crate::filters::{fft_error, filter_narrowband, NarrowbandFilterConfig};
use cycle_core::{CycleResult, FrequencyRange};
use num_complex::Complex;
use rustfft::FftPlanner;

/// Analytic signal via the FFT Hilbert transform
///
/// With `increase_fft_padding` the transform runs on the next power of two and the
/// result is truncated back to the input length.
pub fn analytic_signal(signal: &[f64], increase_fft_padding: bool) -> CycleResult<Vec<Complex<f64>>> {
    if signal.is_empty() {
        return Ok(Vec::new());
    }

    let n_fft = if increase_fft_padding {
        signal.len().next_power_of_two()
    } else {
        signal.len()
    };

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n_fft);
    let inverse = planner.plan_fft_inverse(n_fft);

    let mut buffer: Vec<Complex<f64>> = signal.iter()
        .map(|&x| Complex::new(x, 0.0))
        .collect();
    buffer.resize(n_fft, Complex::new(0.0, 0.0));

    forward.process(&mut buffer);

    // Keep DC (and Nyquist for even lengths), double positive, zero negative frequencies
    let half = n_fft / 2;
    for (k, bin) in buffer.iter_mut().enumerate() {
        let weight = if k == 0 || (n_fft % 2 == 0 && k == half) {
            1.0
        } else if k < (n_fft + 1) / 2 {
            2.0
        } else {
            0.0
        };
        *bin *= weight;
    }

    inverse.process(&mut buffer);

    let scale = 1.0 / n_fft as f64;
    buffer.truncate(signal.len());
    for value in buffer.iter_mut() {
        *value *= scale;
    }

    if buffer.iter().any(|c| !(c.re.is_finite() && c.im.is_finite())) {
        return Err(fft_error("hilbert transform", "non-finite analytic signal"));
    }

    Ok(buffer)
}

/// Instantaneous amplitude of the narrowband component in `band`
pub fn amp_by_time(
    signal: &[f64],
    sampling_rate: f64,
    band: FrequencyRange,
    filter: &NarrowbandFilterConfig,
    increase_fft_padding: bool,
) -> CycleResult<Vec<f64>> {
    let filtered = filter_narrowband(signal, sampling_rate, band, filter)?;
    let analytic = analytic_signal(&filtered, increase_fft_padding)?;

    Ok(analytic.iter().map(|c| c.norm()).collect())
}
