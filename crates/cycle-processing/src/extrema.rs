//! Extrema and zero-crossing detection
//!
//! Zero-crossings of the narrowband-filtered signal delimit the search windows;
//! the extrema themselves are located on the raw signal. Flank zero-crossings are
//! then located on the raw signal between consecutive extrema.

use crate::filters::{filter_narrowband, NarrowbandFilterConfig};
use cycle_core::{CenterExtrema, CycleError, CyclePoint, CyclePoints, CycleResult, FrequencyRange};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Direction of a zero-crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flank {
    /// Crossing from non-positive to positive
    Rise,
    /// Crossing from positive to non-positive
    Decay,
}

/// Settings for the extrema finder
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremaConfig {
    /// Narrowband filter used to locate the search windows
    pub filter: NarrowbandFilterConfig,
    /// Extrema within this many samples of either edge are discarded
    pub boundary: usize,
}

impl ExtremaConfig {
    pub fn validate(&self) -> CycleResult<()> {
        self.filter.validate()
    }
}

/// Peak and trough samples, alternating and starting with a peak
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extrema {
    pub peaks: Vec<usize>,
    pub troughs: Vec<usize>,
}

/// Flank zero-crossing samples between consecutive extrema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroCrossings {
    /// Trough to next peak
    pub rises: Vec<usize>,
    /// Peak to next trough
    pub decays: Vec<usize>,
}

/// Indices `i` where the signal crosses zero between `i` and `i + 1`
pub fn find_flank_zerox(signal: &[f64], flank: Flank) -> Vec<usize> {
    signal.windows(2)
        .enumerate()
        .filter(|(_, pair)| match flank {
            Flank::Rise => pair[0] <= 0.0 && pair[1] > 0.0,
            Flank::Decay => pair[0] > 0.0 && pair[1] <= 0.0,
        })
        .map(|(i, _)| i)
        .collect()
}

/// Locate peaks and troughs of `signal`
///
/// The returned lists have equal length and alternate `p0 < t0 < p1 < t1 ...`.
pub fn find_extrema(
    signal: &[f64],
    sampling_rate: f64,
    band: FrequencyRange,
    config: &ExtremaConfig,
) -> CycleResult<Extrema> {
    let filtered = filter_narrowband(signal, sampling_rate, band, &config.filter)?;

    let rises = find_flank_zerox(&filtered, Flank::Rise);
    let decays = find_flank_zerox(&filtered, Flank::Decay);

    // Peaks lie between a rise and the following decay, troughs the other way round
    let mut peaks = search_windows(&rises, &decays)
        .map(|(start, end)| start + arg_extreme(&signal[start..end], |a, b| a > b))
        .collect::<Vec<_>>();
    let mut troughs = search_windows(&decays, &rises)
        .map(|(start, end)| start + arg_extreme(&signal[start..end], |a, b| a < b))
        .collect::<Vec<_>>();

    let upper = signal.len().saturating_sub(config.boundary);
    peaks.retain(|&p| p > config.boundary && p < upper);
    troughs.retain(|&t| t > config.boundary && t < upper);

    let first_peak = match peaks.first() {
        Some(&p) => p,
        None => return Err(CycleError::InsufficientCycles { found: 0, required: 2 }),
    };
    troughs.retain(|&t| t > first_peak);

    let n_pairs = peaks.len().min(troughs.len());
    peaks.truncate(n_pairs);
    troughs.truncate(n_pairs);

    debug!(peaks = peaks.len(), troughs = troughs.len(), "Located extrema");

    Ok(Extrema { peaks, troughs })
}

/// Locate the rise and decay zero-crossings between alternating extrema
///
/// Each flank is centered on the midpoint voltage of its bounding extrema and the
/// median crossing is taken. A flank with no crossing gets its halfway sample.
pub fn find_zerox(signal: &[f64], extrema: &Extrema) -> CycleResult<ZeroCrossings> {
    let Extrema { peaks, troughs } = extrema;

    if peaks.len() != troughs.len() || peaks.is_empty() {
        return Err(CycleError::InsufficientCycles {
            found: peaks.len().min(troughs.len()),
            required: 2,
        });
    }

    let decays = peaks.iter()
        .zip(troughs.iter())
        .map(|(&peak, &trough)| flank_midpoint(signal, peak, trough, Flank::Decay))
        .collect::<CycleResult<Vec<_>>>()?;

    let rises = troughs.iter()
        .zip(peaks.iter().skip(1))
        .map(|(&trough, &peak)| flank_midpoint(signal, trough, peak, Flank::Rise))
        .collect::<CycleResult<Vec<_>>>()?;

    Ok(ZeroCrossings { rises, decays })
}

/// Landmarks of every cycle, centered on `center_extrema`
///
/// Trough-centered cycles are found as peak-centered cycles of the inverted signal,
/// so the returned indices always refer to `signal` itself.
pub fn compute_cyclepoints(
    signal: &[f64],
    sampling_rate: f64,
    band: FrequencyRange,
    center_extrema: CenterExtrema,
    config: &ExtremaConfig,
) -> CycleResult<CyclePoints> {
    let aligned = center_extrema.align(signal);

    let extrema = find_extrema(&aligned, sampling_rate, band, config)?;
    if extrema.peaks.len() < 2 {
        return Err(CycleError::InsufficientCycles { found: extrema.peaks.len(), required: 2 });
    }

    let zerox = find_zerox(&aligned, &extrema)?;

    let points = (0..extrema.peaks.len() - 1)
        .map(|i| CyclePoint {
            sample_center: extrema.peaks[i + 1],
            sample_last_edge: extrema.troughs[i],
            sample_next_edge: extrema.troughs[i + 1],
            sample_zerox_lead: zerox.rises[i],
            sample_zerox_trail: zerox.decays[i + 1],
            sample_last_zerox_trail: zerox.decays[i],
        })
        .collect();

    CyclePoints::new(center_extrema, points)
}

/// Pair each start crossing with the first end crossing after it
fn search_windows<'a>(
    starts: &'a [usize],
    ends: &'a [usize],
) -> impl Iterator<Item = (usize, usize)> + 'a {
    starts.iter().filter_map(move |&start| {
        let position = ends.partition_point(|&end| end <= start);
        ends.get(position).map(|&end| (start, end))
    })
}

fn arg_extreme(window: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    window.iter()
        .enumerate()
        .fold((0, f64::NAN), |(best_index, best), (i, &value)| {
            if best.is_nan() || better(value, best) {
                (i, value)
            } else {
                (best_index, best)
            }
        })
        .0
}

fn flank_midpoint(signal: &[f64], start: usize, end: usize, flank: Flank) -> CycleResult<usize> {
    if end <= start || end >= signal.len() {
        return Err(CycleError::ComputationFailed {
            stage: "zero-crossings",
            message: format!(
                "flank bounds [{}, {}] are invalid for a signal of {} samples",
                start, end, signal.len()
            ),
        });
    }

    let window = &signal[start..=end];
    let offset = (window[0] + window[window.len() - 1]) / 2.0;
    let centered: Vec<f64> = window.iter().map(|x| x - offset).collect();

    if centered.iter().all(|x| *x == 0.0) {
        return Ok(start + window.len() / 2);
    }

    let crossings = find_flank_zerox(&centered, flank);
    let midpoint = if crossings.is_empty() {
        window.len() / 2
    } else {
        median_index(&crossings)
    };

    Ok(start + midpoint)
}

/// Median of sorted indices, truncated toward zero
fn median_index(sorted: &[usize]) -> usize {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2
    } else {
        sorted[mid]
    }
}
