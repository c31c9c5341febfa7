//! Cycle-Core: Foundation types for cycle-by-cycle oscillation analysis
//!
//! Signal container, domain enums, cycle landmark table and the shared error type.

pub mod signal;
pub mod types;
pub mod cycle_points;
pub mod error;

pub use signal::*;
pub use types::*;
pub use cycle_points::{CyclePoint, CyclePoints};
pub use error::{CycleError, CycleResult};
