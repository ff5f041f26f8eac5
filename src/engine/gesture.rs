use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Pointer position relative to the gesture surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureSample {
    pub x: f64,
    pub y: f64,
}

impl GestureSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How much pointer movement resolves a gesture stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverageThreshold {
    /// Resolved once this many move events have arrived.
    Samples(usize),
    /// Resolved once samples have touched this many distinct grid cells.
    /// Approximates the area cleared by fixed-radius brushes.
    Cells { cell_size: f64, required: usize },
}

impl Default for CoverageThreshold {
    fn default() -> Self {
        CoverageThreshold::Samples(80)
    }
}

/// Collects pointer samples for a single gesture stage.
///
/// Resolution is sticky: once the threshold is crossed `is_resolved` stays true.
/// A zero requirement is resolved before any sample arrives.
#[derive(Debug, Clone)]
pub struct GestureAccumulator {
    threshold: CoverageThreshold,
    samples: Vec<GestureSample>,
    sample_count: usize,
    cells: HashSet<(i64, i64)>,
    resolved: bool,
}

impl GestureAccumulator {
    pub fn new(threshold: CoverageThreshold) -> Self {
        let mut acc = Self {
            threshold,
            samples: Vec::new(),
            sample_count: 0,
            cells: HashSet::new(),
            resolved: false,
        };
        acc.resolved = acc.threshold_met();
        acc
    }

    /// Records a sample. Returns true only for the sample that resolved the gesture.
    pub fn on_sample(&mut self, sample: GestureSample) -> bool {
        self.sample_count += 1;
        if self.resolved {
            return false;
        }

        // Positions are only kept until the gesture resolves.
        self.samples.push(sample);
        if let CoverageThreshold::Cells { cell_size, .. } = self.threshold {
            if cell_size > 0.0 && sample.x.is_finite() && sample.y.is_finite() {
                let cell = (
                    (sample.x / cell_size).floor() as i64,
                    (sample.y / cell_size).floor() as i64,
                );
                self.cells.insert(cell);
            }
        }

        self.resolved = self.threshold_met();
        self.resolved
    }

    fn threshold_met(&self) -> bool {
        match self.threshold {
            CoverageThreshold::Samples(required) => self.sample_count >= required,
            CoverageThreshold::Cells { required, .. } => self.cells.len() >= required,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Every sample seen, including those after resolution.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn covered_cells(&self) -> usize {
        self.cells.len()
    }

    /// Samples recorded up to and including the resolving one.
    pub fn samples(&self) -> &[GestureSample] {
        &self.samples
    }

    pub fn threshold(&self) -> CoverageThreshold {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(acc: &mut GestureAccumulator, n: usize) -> usize {
        (0..n)
            .filter(|i| acc.on_sample(GestureSample::new(*i as f64, 0.0)))
            .count()
    }

    #[test]
    fn below_threshold_stays_unresolved() {
        let mut acc = GestureAccumulator::new(CoverageThreshold::Samples(80));
        feed(&mut acc, 79);
        assert!(!acc.is_resolved());
        assert_eq!(acc.sample_count(), 79);
    }

    #[test]
    fn exact_threshold_resolves_once() {
        let mut acc = GestureAccumulator::new(CoverageThreshold::Samples(80));
        let flips = feed(&mut acc, 80);
        assert!(acc.is_resolved());
        assert_eq!(flips, 1);

        let flips = feed(&mut acc, 40);
        assert_eq!(flips, 0);
        assert!(acc.is_resolved());
        assert_eq!(acc.sample_count(), 120);
    }

    #[test]
    fn zero_threshold_is_resolved_without_samples() {
        let mut acc = GestureAccumulator::new(CoverageThreshold::Samples(0));
        assert!(acc.is_resolved());
        assert_eq!(acc.sample_count(), 0);
        assert!(!acc.on_sample(GestureSample::new(1.0, 1.0)));

        let acc = GestureAccumulator::new(CoverageThreshold::Cells {
            cell_size: 60.0,
            required: 0,
        });
        assert!(acc.is_resolved());
    }

    #[test]
    fn stops_recording_positions_once_resolved() {
        let mut acc = GestureAccumulator::new(CoverageThreshold::Samples(3));
        feed(&mut acc, 3);
        assert_eq!(acc.samples().len(), 3);

        feed(&mut acc, 500);
        assert_eq!(acc.samples().len(), 3);
        assert_eq!(acc.sample_count(), 503);
    }

    #[test]
    fn tight_loop_counts_towards_sample_threshold() {
        let mut acc = GestureAccumulator::new(CoverageThreshold::Samples(10));
        for _ in 0..10 {
            acc.on_sample(GestureSample::new(5.0, 5.0));
        }
        assert!(acc.is_resolved());
    }

    #[test]
    fn cell_coverage_ignores_repeated_positions() {
        let mut acc = GestureAccumulator::new(CoverageThreshold::Cells {
            cell_size: 60.0,
            required: 3,
        });
        for _ in 0..50 {
            acc.on_sample(GestureSample::new(10.0, 10.0));
        }
        assert_eq!(acc.covered_cells(), 1);
        assert!(!acc.is_resolved());

        acc.on_sample(GestureSample::new(70.0, 10.0));
        assert!(!acc.is_resolved());
        assert!(acc.on_sample(GestureSample::new(10.0, -70.0)));
        assert_eq!(acc.covered_cells(), 3);
    }

    #[test]
    fn non_finite_samples_do_not_cover_cells() {
        let mut acc = GestureAccumulator::new(CoverageThreshold::Cells {
            cell_size: 60.0,
            required: 1,
        });
        acc.on_sample(GestureSample::new(f64::NAN, 0.0));
        assert!(!acc.is_resolved());
        assert_eq!(acc.sample_count(), 1);
    }
}
