//! CyclePoints: per-cycle landmark sample indices
//!
//! Landmarks are named by role rather than polarity. For peak-centered cycles the
//! center is a peak and the edges are troughs; for trough-centered cycles the roles
//! swap, so the same table serves both.

use crate::error::{CycleError, CycleResult};
use crate::types::CenterExtrema;
use serde::{Deserialize, Serialize};

/// Landmarks of a single cycle, as sample indices into the analysed signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePoint {
    /// Extremum at the center of the cycle
    pub sample_center: usize,
    /// Extremum opening the cycle
    pub sample_last_edge: usize,
    /// Extremum closing the cycle
    pub sample_next_edge: usize,
    /// Zero-crossing between the opening edge and the center
    pub sample_zerox_lead: usize,
    /// Zero-crossing between the center and the closing edge
    pub sample_zerox_trail: usize,
    /// Trailing zero-crossing of the previous cycle
    pub sample_last_zerox_trail: usize,
}

impl CyclePoint {
    /// Samples from the opening edge to the closing edge
    pub fn period(&self) -> usize {
        self.sample_next_edge - self.sample_last_edge
    }

    /// Check landmark ordering
    pub fn is_ordered(&self) -> bool {
        self.sample_last_zerox_trail <= self.sample_last_edge
            && self.sample_last_edge <= self.sample_zerox_lead
            && self.sample_zerox_lead <= self.sample_center
            && self.sample_center <= self.sample_zerox_trail
            && self.sample_zerox_trail <= self.sample_next_edge
            && self.sample_last_edge < self.sample_next_edge
    }
}

/// Cycle-indexed landmark table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyclePoints {
    center_extrema: CenterExtrema,
    points: Vec<CyclePoint>,
}

impl CyclePoints {
    /// Build a table, rejecting rows that break landmark ordering or chaining
    pub fn new(center_extrema: CenterExtrema, points: Vec<CyclePoint>) -> CycleResult<Self> {
        let table = Self { center_extrema, points };
        table.validate()?;
        Ok(table)
    }

    pub fn center_extrema(&self) -> CenterExtrema {
        self.center_extrema
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CyclePoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CyclePoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[CyclePoint] {
        &self.points
    }

    /// Center sample of every cycle
    pub fn centers(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.sample_center).collect()
    }

    pub fn validate(&self) -> CycleResult<()> {
        for (index, point) in self.points.iter().enumerate() {
            if !point.is_ordered() {
                return Err(CycleError::ComputationFailed {
                    stage: "cyclepoints",
                    message: format!("landmarks of cycle {} are out of order: {:?}", index, point),
                });
            }
        }

        for (index, pair) in self.points.windows(2).enumerate() {
            if pair[0].sample_next_edge != pair[1].sample_last_edge {
                return Err(CycleError::ComputationFailed {
                    stage: "cyclepoints",
                    message: format!(
                        "cycle {} closes at sample {} but cycle {} opens at sample {}",
                        index, pair[0].sample_next_edge, index + 1, pair[1].sample_last_edge
                    ),
                });
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a CyclePoints {
    type Item = &'a CyclePoint;
    type IntoIter = std::slice::Iter<'a, CyclePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(last_zerox_trail: usize, last_edge: usize, next_edge: usize) -> CyclePoint {
        let center = (last_edge + next_edge) / 2;
        CyclePoint {
            sample_center: center,
            sample_last_edge: last_edge,
            sample_next_edge: next_edge,
            sample_zerox_lead: (last_edge + center) / 2,
            sample_zerox_trail: (center + next_edge) / 2,
            sample_last_zerox_trail: last_zerox_trail,
        }
    }

    #[test]
    fn test_valid_table() {
        let table = CyclePoints::new(
            CenterExtrema::Peak,
            vec![point(75, 100, 200), point(175, 200, 300)],
        ).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.centers(), vec![150, 250]);
        assert!(table.iter().all(|p| p.period() == 100));
        assert_eq!(table.center_extrema(), CenterExtrema::Peak);
    }

    #[test]
    fn test_rejects_broken_chain() {
        let result = CyclePoints::new(
            CenterExtrema::Peak,
            vec![point(75, 100, 200), point(180, 210, 300)],
        );
        assert!(matches!(result, Err(CycleError::ComputationFailed { stage: "cyclepoints", .. })));
    }

    #[test]
    fn test_rejects_unordered_landmarks() {
        let mut bad = point(75, 100, 200);
        bad.sample_center = 250;
        assert!(!bad.is_ordered());
        assert!(CyclePoints::new(CenterExtrema::Trough, vec![bad]).is_err());
    }
}
