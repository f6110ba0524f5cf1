//! Per-frame statistics accumulator.

use super::prf::{calculate_precision_recall_f, PrecisionRecallF};

/// Obligatory counts of one frame (or one frame pair for tracking).
///
/// For tracking the candidates are the found links and the ground truth the real links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounts {
    pub n_candidates: usize,
    pub n_ground_truth: usize,
    pub n_correct: usize,
}

impl FrameCounts {
    pub fn metrics(&self) -> PrecisionRecallF {
        calculate_precision_recall_f(self.n_candidates, self.n_ground_truth, self.n_correct)
    }

    /// Candidate-to-ground-truth count ratio, 0 without ground truth.
    pub fn count_ratio(&self) -> f64 {
        if self.n_ground_truth == 0 {
            0.0
        } else {
            self.n_candidates as f64 / self.n_ground_truth as f64
        }
    }
}

impl std::ops::Add for FrameCounts {
    type Output = FrameCounts;

    fn add(self, other: FrameCounts) -> FrameCounts {
        FrameCounts {
            n_candidates: self.n_candidates + other.n_candidates,
            n_ground_truth: self.n_ground_truth + other.n_ground_truth,
            n_correct: self.n_correct + other.n_correct,
        }
    }
}

/// Collects frame-by-frame counts and computes sequence-level metrics.
///
/// Sequence metrics are derived from the summed counts, never by averaging per-frame ratios.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    frames: Vec<(usize, FrameCounts)>,
}

impl StatsAccumulator {
    /// Create a new accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the counts of one frame.
    pub fn update(&mut self, frame: usize, counts: FrameCounts) {
        self.frames.push((frame, counts));
    }

    /// Recorded frames in insertion order.
    pub fn frames(&self) -> &[(usize, FrameCounts)] {
        &self.frames
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sum of all recorded counts.
    pub fn totals(&self) -> FrameCounts {
        self.frames
            .iter()
            .fold(FrameCounts::default(), |acc, (_, counts)| acc + *counts)
    }

    /// Precision, recall and F over the whole sequence.
    pub fn summary(&self) -> PrecisionRecallF {
        self.totals().metrics()
    }

    /// Precision, recall and F of every recorded frame.
    pub fn per_frame_metrics(&self) -> Vec<(usize, PrecisionRecallF)> {
        self.frames
            .iter()
            .map(|(frame, counts)| (*frame, counts.metrics()))
            .collect()
    }
}
