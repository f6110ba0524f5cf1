//! Greedy ground-truth-to-candidate correspondence.

use std::collections::HashSet;

use crate::config::EvaluationConfig;
use crate::object::DetectedObject;
use crate::similarity::Similarity;

/// One committed pair, as indices into the ground-truth and candidate slices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub ground_truth: usize,
    pub candidate: usize,
    pub similarity: Similarity,
}

/// Match ground-truth objects to candidates of the same frame.
///
/// Eligible edges (passing the active cutoff) are enumerated ground truth outer, candidate
/// inner, then stably sorted by score, best first. Walking them in order, an edge whose
/// candidate was already disposed of is skipped; otherwise the pair is committed when the
/// ground-truth object is still free, and the candidate is disposed of either way. A
/// candidate that loses its best edge is therefore never offered to a worse ground-truth
/// object. This is deliberately greedy, not a minimum-cost assignment.
///
/// # Returns
/// Committed pairs in commit order. Every index appears at most once on each side.
pub fn find_correspondence(
    ground_truth: &[&DetectedObject],
    candidates: &[&DetectedObject],
    config: &EvaluationConfig,
) -> Vec<Correspondence> {
    let n_ground_truth = ground_truth.len();
    let n_candidates = candidates.len();

    if n_ground_truth == 0 || n_candidates == 0 {
        return Vec::new();
    }

    let mut edges: Vec<Correspondence> = Vec::new();
    for (g, gt) in ground_truth.iter().enumerate() {
        for (r, candidate) in candidates.iter().enumerate() {
            let similarity = Similarity::between(gt, candidate);
            if similarity.is_similar(config) {
                edges.push(Correspondence {
                    ground_truth: g,
                    candidate: r,
                    similarity,
                });
            }
        }
    }

    // Stable: equal scores keep enumeration order
    edges.sort_by(|a, b| b.similarity.score().total_cmp(&a.similarity.score()));

    let mut committed_gt = vec![false; n_ground_truth];
    let mut disposed = vec![false; n_candidates];
    let mut pairs = Vec::new();

    for edge in edges {
        if disposed[edge.candidate] {
            continue;
        }
        if !committed_gt[edge.ground_truth] {
            committed_gt[edge.ground_truth] = true;
            pairs.push(edge);
        }
        disposed[edge.candidate] = true;
    }

    pairs
}

/// Indices absent from `pairs`, as `(ground_truth, candidates)`, each in ascending order.
pub fn unpaired_indices(
    pairs: &[Correspondence],
    n_ground_truth: usize,
    n_candidates: usize,
) -> (Vec<usize>, Vec<usize>) {
    let paired_gt: HashSet<usize> = pairs.iter().map(|p| p.ground_truth).collect();
    let paired_candidates: HashSet<usize> = pairs.iter().map(|p| p.candidate).collect();
    (
        (0..n_ground_truth).filter(|i| !paired_gt.contains(i)).collect(),
        (0..n_candidates).filter(|i| !paired_candidates.contains(i)).collect(),
    )
}
