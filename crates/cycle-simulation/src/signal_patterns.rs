//! Amplitude envelopes for simulated oscillations

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Amplitude envelope of a simulated oscillation
///
/// Cycle-based patterns change amplitude only at cycle boundaries, which fall on
/// troughs of the generated waveform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    /// Constant amplitude
    Stationary { amplitude: f64 },
    /// A single run of high-amplitude cycles on a low-amplitude background
    Bursts {
        background_amplitude: f64,
        burst_amplitude: f64,
        burst_start_cycle: usize,
        burst_cycles: usize,
    },
    /// Alternating runs of high- and low-amplitude cycles
    BurstTrain {
        background_amplitude: f64,
        burst_amplitude: f64,
        on_cycles: usize,
        off_cycles: usize,
    },
    /// Sinusoidal amplitude modulation
    AmplitudeModulated {
        amplitude: f64,
        depth: f64,
        modulation_frequency: f64,
    },
}

impl SignalPattern {
    /// Amplitude during `cycle` at `time` seconds
    pub fn amplitude_at(&self, cycle: usize, time: f64) -> f64 {
        match self {
            SignalPattern::Stationary { amplitude } => *amplitude,

            SignalPattern::Bursts {
                background_amplitude, burst_amplitude, burst_start_cycle, burst_cycles,
            } => {
                if (*burst_start_cycle..burst_start_cycle + burst_cycles).contains(&cycle) {
                    *burst_amplitude
                } else {
                    *background_amplitude
                }
            },

            SignalPattern::BurstTrain {
                background_amplitude, burst_amplitude, on_cycles, off_cycles,
            } => {
                let period = on_cycles + off_cycles;
                if period > 0 && cycle % period >= *off_cycles {
                    *burst_amplitude
                } else {
                    *background_amplitude
                }
            },

            SignalPattern::AmplitudeModulated { amplitude, depth, modulation_frequency } => {
                amplitude * (1.0 + depth * (2.0 * PI * modulation_frequency * time).sin())
            },
        }
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Stationary { .. } => "Stationary oscillation",
            SignalPattern::Bursts { .. } => "Single burst",
            SignalPattern::BurstTrain { .. } => "Burst train",
            SignalPattern::AmplitudeModulated { .. } => "Amplitude modulated",
        }
    }

    /// Create common preset patterns
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("Stationary", SignalPattern::Stationary { amplitude: 1.0 }),
            ("Single Burst", SignalPattern::Bursts {
                background_amplitude: 0.1, burst_amplitude: 1.0, burst_start_cycle: 10, burst_cycles: 5
            }),
            ("Burst Train", SignalPattern::BurstTrain {
                background_amplitude: 0.1, burst_amplitude: 1.0, on_cycles: 6, off_cycles: 8
            }),
            ("Slow Modulation", SignalPattern::AmplitudeModulated {
                amplitude: 1.0, depth: 0.5, modulation_frequency: 0.5
            }),
        ]
    }
}
