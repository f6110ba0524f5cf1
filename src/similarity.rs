//! Pairwise similarity between a ground-truth object and a candidate.

use crate::config::EvaluationConfig;
use crate::object::DetectedObject;

/// Similarity of one object pair.
///
/// Overlap is used when both objects carry a mask, position distance otherwise.
/// The two kinds are never compared with each other within one pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Similarity {
    /// Intersection over union of the two masks.
    Overlap(f64),
    /// Euclidean distance between the two positions.
    Distance(f64),
}

impl Similarity {
    /// Score two objects. Pairs where only one side has a mask fall back to distance.
    pub fn between(ground_truth: &DetectedObject, candidate: &DetectedObject) -> Self {
        match (&ground_truth.mask, &candidate.mask) {
            (Some(gt_mask), Some(cand_mask)) => Similarity::Overlap(gt_mask.iou(cand_mask)),
            _ => Similarity::Distance(ground_truth.distance(candidate)),
        }
    }

    /// Better-first ordering key: the IoU itself, or the negated distance.
    pub fn score(&self) -> f64 {
        match *self {
            Similarity::Overlap(iou) => iou,
            Similarity::Distance(distance) => -distance,
        }
    }

    /// Whether the pair passes the active cutoff (`iou > cutoff_iou`, `distance < cutoff_distance`).
    pub fn is_similar(&self, config: &EvaluationConfig) -> bool {
        match *self {
            Similarity::Overlap(iou) => iou > config.cutoff_iou,
            Similarity::Distance(distance) => distance < config.cutoff_distance,
        }
    }
}
