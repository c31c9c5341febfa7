//! Oscillation simulator with per-cycle amplitude patterns

use crate::signal_patterns::SignalPattern;
use cycle_core::{config_error, CycleResult, Signal};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for oscillation simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscillationConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Oscillation frequency in Hz
    pub frequency: f64,
    /// Amplitude envelope
    pub pattern: SignalPattern,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

/// Additive noise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self { gaussian_std: 0.0 }
    }
}

impl Default for OscillationConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 1000.0,
            frequency: 10.0,
            pattern: SignalPattern::Stationary { amplitude: 1.0 },
            noise: NoiseConfig::default(),
            seed: Some(0),
        }
    }
}

impl OscillationConfig {
    pub fn validate(&self) -> CycleResult<()> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(config_error!("sampling rate must be positive, got {}", self.sampling_rate));
        }

        if !(self.frequency > 0.0 && self.frequency < self.sampling_rate / 2.0) {
            return Err(config_error!(
                "oscillation frequency {} Hz must lie between 0 and Nyquist ({} Hz)",
                self.frequency, self.sampling_rate / 2.0
            ));
        }

        if !(self.noise.gaussian_std.is_finite() && self.noise.gaussian_std >= 0.0) {
            return Err(config_error!(
                "noise standard deviation must be non-negative, got {}", self.noise.gaussian_std
            ));
        }

        Ok(())
    }
}

/// Oscillation simulator
///
/// The waveform is `-a(k) * cos(2 pi f t)`: every cycle runs trough to trough and
/// its amplitude `a(k)` comes from the configured pattern.
pub struct OscillationSimulator {
    config: OscillationConfig,
    rng: StdRng,
    normal_dist: Normal<f64>,
}

impl OscillationSimulator {
    /// Create new simulator with configuration
    pub fn new(config: OscillationConfig) -> CycleResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std)
            .map_err(|e| config_error!("failed to create normal distribution: {}", e))?;

        Ok(Self { config, rng, normal_dist })
    }

    /// Generate `duration` seconds of signal
    pub fn generate(&mut self, duration: f64) -> CycleResult<Signal> {
        let n_samples = (duration * self.config.sampling_rate).round() as usize;
        Signal::new(self.generate_samples(n_samples), self.config.sampling_rate)
    }

    /// Generate a fixed number of samples
    pub fn generate_samples(&mut self, n_samples: usize) -> Vec<f64> {
        let dt = 1.0 / self.config.sampling_rate;
        let add_noise = self.config.noise.gaussian_std > 0.0;

        let mut samples: Vec<f64> = (0..n_samples)
            .map(|i| self.clean_sample(i, i as f64 * dt))
            .collect();

        if add_noise {
            for value in samples.iter_mut() {
                *value += self.normal_dist.sample(&mut self.rng);
            }
        }

        samples
    }

    fn clean_sample(&self, index: usize, time: f64) -> f64 {
        let cycle = self.cycle_of_sample(index);
        let amplitude = self.config.pattern.amplitude_at(cycle, time);
        -amplitude * (2.0 * PI * self.config.frequency * time).cos()
    }

    /// Index of the cycle a sample belongs to
    pub fn cycle_of_sample(&self, index: usize) -> usize {
        let samples_per_cycle = self.config.sampling_rate / self.config.frequency;
        // Nudge past rounding so a sample exactly on a boundary opens the next cycle
        ((index as f64 + 1e-9) / samples_per_cycle).floor() as usize
    }

    /// Get current configuration
    pub fn config(&self) -> &OscillationConfig {
        &self.config
    }
}
