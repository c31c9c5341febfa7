//! Error handling for cycle analysis
//!
//! Two families of failure exist. Configuration errors are raised before any
//! computation starts. Upstream errors come from cycle extraction or amplitude
//! estimation and are propagated unchanged to the caller.

use core::fmt;

/// Result type alias for cycle analysis operations
pub type CycleResult<T> = Result<T, CycleError>;

/// Error type for all cycle analysis operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CycleError {
    /// Unknown burst detection method, inconsistent thresholds or unusable settings
    InvalidConfiguration {
        /// Description of the configuration problem
        message: String,
    },

    /// Input samples cannot be analysed
    InvalidSignal {
        /// Description of the signal problem
        reason: String,
    },

    /// Narrowband filter is longer than the signal it should be applied to
    FilterTooLong {
        /// Designed filter length in samples
        filter_len: usize,
        /// Signal length in samples
        signal_len: usize,
    },

    /// Too few extrema were found to delimit cycles
    InsufficientCycles {
        /// Number of usable extrema pairs found
        found: usize,
        /// Number of extrema pairs required
        required: usize,
    },

    /// Numeric routine failed (FFT planning or execution)
    ComputationFailed {
        /// Stage that failed
        stage: &'static str,
        /// Underlying error description
        message: String,
    },

    /// Two tables that must share a cycle index disagree on row count
    TableMisaligned {
        /// Name of the first table
        left: &'static str,
        /// Row count of the first table
        left_len: usize,
        /// Name of the second table
        right: &'static str,
        /// Row count of the second table
        right_len: usize,
    },
}

impl CycleError {
    /// Error raised before any computation took place
    pub fn is_configuration(&self) -> bool {
        matches!(self, CycleError::InvalidConfiguration { .. })
    }

    /// Error raised by cycle extraction or amplitude estimation
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            CycleError::InvalidSignal { .. }
                | CycleError::FilterTooLong { .. }
                | CycleError::InsufficientCycles { .. }
                | CycleError::ComputationFailed { .. }
        )
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::InvalidConfiguration { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            CycleError::InvalidSignal { reason } => {
                write!(f, "Invalid signal: {}", reason)
            }
            CycleError::FilterTooLong { filter_len, signal_len } => {
                write!(f, "The designed filter (length: {}) is longer than the signal (length: {})",
                       filter_len, signal_len)
            }
            CycleError::InsufficientCycles { found, required } => {
                write!(f, "Insufficient cycles: found {} extrema pairs, at least {} required",
                       found, required)
            }
            CycleError::ComputationFailed { stage, message } => {
                write!(f, "Computation failed during {}: {}", stage, message)
            }
            CycleError::TableMisaligned { left, left_len, right, right_len } => {
                write!(f, "Table misaligned: {} has {} rows, {} has {} rows",
                       left, left_len, right, right_len)
            }
        }
    }
}

impl std::error::Error for CycleError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::CycleError::InvalidConfiguration {
            message: format!($($arg)+)
        }
    };
}

/// Convenience macro for creating signal errors
#[macro_export]
macro_rules! signal_error {
    ($($arg:tt)+) => {
        $crate::error::CycleError::InvalidSignal {
            reason: format!($($arg)+)
        }
    };
}
