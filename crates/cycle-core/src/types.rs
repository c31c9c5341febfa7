//! Domain types shared across the cycle analysis crates

use crate::config_error;
use crate::error::{CycleError, CycleResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Which extremum sits at the center of each analysed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterExtrema {
    /// Cycles run trough to trough, centered on a peak
    #[default]
    Peak,
    /// Cycles run peak to peak, centered on a trough
    Trough,
}

impl CenterExtrema {
    pub fn as_str(&self) -> &'static str {
        match self {
            CenterExtrema::Peak => "peak",
            CenterExtrema::Trough => "trough",
        }
    }

    /// Samples oriented so the cycle center is a peak
    ///
    /// Trough-centered analysis runs on the inverted signal; peak-centered
    /// analysis borrows the input untouched.
    pub fn align<'a>(&self, samples: &'a [f64]) -> Cow<'a, [f64]> {
        match self {
            CenterExtrema::Peak => Cow::Borrowed(samples),
            CenterExtrema::Trough => Cow::Owned(samples.iter().map(|x| -x).collect()),
        }
    }
}

impl fmt::Display for CenterExtrema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CenterExtrema {
    type Err = CycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "peak" => Ok(CenterExtrema::Peak),
            "trough" => Ok(CenterExtrema::Trough),
            other => Err(config_error!(
                "center_extrema must be 'peak' or 'trough', got '{}'", other
            )),
        }
    }
}

/// Frequency band of the oscillation of interest, in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub low: f64,
    pub high: f64,
}

impl FrequencyRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Check the band against the sampling rate it will be used with
    pub fn validate(&self, sampling_rate: f64) -> CycleResult<()> {
        if !(self.low.is_finite() && self.high.is_finite()) {
            return Err(config_error!("frequency range must be finite"));
        }

        if self.low <= 0.0 {
            return Err(config_error!("frequency range low cutoff must be positive, got {}", self.low));
        }

        if self.low >= self.high {
            return Err(config_error!(
                "frequency range low cutoff ({}) must be below high cutoff ({})",
                self.low, self.high
            ));
        }

        let nyquist = sampling_rate / 2.0;
        if self.high >= nyquist {
            return Err(config_error!(
                "frequency range high cutoff ({}) must be below Nyquist ({})",
                self.high, nyquist
            ));
        }

        Ok(())
    }

    /// Center of the band
    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

impl From<(f64, f64)> for FrequencyRange {
    fn from((low, high): (f64, f64)) -> Self {
        Self::new(low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_extrema_parse() {
        assert_eq!("peak".parse::<CenterExtrema>().unwrap(), CenterExtrema::Peak);
        assert_eq!(" Trough ".parse::<CenterExtrema>().unwrap(), CenterExtrema::Trough);
        assert!("zerox".parse::<CenterExtrema>().unwrap_err().is_configuration());

        assert_eq!(CenterExtrema::Trough.to_string(), "trough");
    }

    #[test]
    fn test_align_inverts_only_for_troughs() {
        let samples = [1.0, -2.0, 0.5];

        let peak = CenterExtrema::Peak.align(&samples);
        assert!(matches!(peak, Cow::Borrowed(_)));
        assert_eq!(&*peak, &samples[..]);

        let trough = CenterExtrema::Trough.align(&samples);
        assert_eq!(&*trough, &[-1.0, 2.0, -0.5][..]);
    }

    #[test]
    fn test_center_extrema_serde() {
        let json = serde_json::to_string(&CenterExtrema::Trough).unwrap();
        assert_eq!(json, "\"trough\"");

        let parsed: CenterExtrema = serde_json::from_str("\"peak\"").unwrap();
        assert_eq!(parsed, CenterExtrema::Peak);
    }

    #[test]
    fn test_frequency_range_validation() {
        assert!(FrequencyRange::new(8.0, 12.0).validate(1000.0).is_ok());
        assert!(FrequencyRange::new(0.0, 12.0).validate(1000.0).is_err());
        assert!(FrequencyRange::new(12.0, 8.0).validate(1000.0).is_err());
        assert!(FrequencyRange::new(10.0, 10.0).validate(1000.0).is_err());
        assert!(FrequencyRange::new(8.0, 500.0).validate(1000.0).is_err());

        let band: FrequencyRange = (8.0, 12.0).into();
        assert_eq!(band.center(), 10.0);
    }
}
