//! Cycle-Simulation: Synthetic oscillation generation
//!
//! Seeded oscillations with stationary, bursting or modulated amplitude for
//! testing and development.

pub mod signal_patterns;
pub mod oscillation_simulator;

pub use oscillation_simulator::*;
pub use signal_patterns::*;
