//! Per-frame segmentation evaluation.

use super::accumulator::FrameCounts;
use super::outcome::SegmentationOutcome;
use crate::border::{border_correspondences, BorderFilter};
use crate::config::EvaluationConfig;
use crate::matching::{find_correspondence, unpaired_indices};
use crate::object::DetectedObject;

/// Segmentation outcome of one frame.
#[derive(Debug, Clone, Default)]
pub struct SegmentationDetails<'a> {
    /// Candidates that are neither border objects nor matched to one.
    pub n_obligatory_candidates: usize,
    /// Ground-truth objects that are neither border objects nor matched to one.
    pub n_obligatory_ground_truth: usize,
    pub correct: Vec<SegmentationOutcome<'a>>,
    pub false_positives: Vec<SegmentationOutcome<'a>>,
    pub false_negatives: Vec<SegmentationOutcome<'a>>,
}

impl<'a> SegmentationDetails<'a> {
    pub fn counts(&self) -> FrameCounts {
        FrameCounts {
            n_candidates: self.n_obligatory_candidates,
            n_ground_truth: self.n_obligatory_ground_truth,
            n_correct: self.correct.len(),
        }
    }

    /// All decisions: correct first, then false positives, then false negatives.
    pub fn into_outcomes(self) -> impl Iterator<Item = SegmentationOutcome<'a>> {
        self.correct
            .into_iter()
            .chain(self.false_positives)
            .chain(self.false_negatives)
    }
}

/// Evaluate the segmentation of one frame.
///
/// Matching runs over the full object sets. Border objects (near an image edge or
/// facultative) and everything matched to them are then left out of the obligatory counts;
/// unmatched border objects are neither false positives nor false negatives.
pub fn evaluate_segmentation<'a>(
    ground_truth: &[&'a DetectedObject],
    candidates: &[&'a DetectedObject],
    config: &EvaluationConfig,
) -> SegmentationDetails<'a> {
    let pairs = find_correspondence(ground_truth, candidates, config);

    let filter = BorderFilter::from_config(config);
    let gt_border = filter.flags(ground_truth);
    let cand_border = filter.flags(candidates);
    let pair_border = border_correspondences(&pairs, &gt_border, &cand_border);

    let mut gt_matched_border = vec![false; ground_truth.len()];
    let mut cand_matched_border = vec![false; candidates.len()];
    let mut correct = Vec::new();

    for (pair, &is_border) in pairs.iter().zip(&pair_border) {
        if is_border {
            gt_matched_border[pair.ground_truth] = true;
            cand_matched_border[pair.candidate] = true;
        } else {
            correct.push(SegmentationOutcome::correct(
                ground_truth[pair.ground_truth],
                candidates[pair.candidate],
            ));
        }
    }

    let n_obligatory_candidates = (0..candidates.len())
        .filter(|&i| !cand_border[i] && !cand_matched_border[i])
        .count();
    let n_obligatory_ground_truth = (0..ground_truth.len())
        .filter(|&i| !gt_border[i] && !gt_matched_border[i])
        .count();

    let (gt_unpaired, cand_unpaired) =
        unpaired_indices(&pairs, ground_truth.len(), candidates.len());
    let false_negatives = gt_unpaired
        .into_iter()
        .filter(|&i| !gt_border[i])
        .map(|i| SegmentationOutcome::false_negative(ground_truth[i]))
        .collect();
    let false_positives = cand_unpaired
        .into_iter()
        .filter(|&i| !cand_border[i])
        .map(|i| SegmentationOutcome::false_positive(candidates[i]))
        .collect();

    SegmentationDetails {
        n_obligatory_candidates,
        n_obligatory_ground_truth,
        correct,
        false_positives,
        false_negatives,
    }
}
