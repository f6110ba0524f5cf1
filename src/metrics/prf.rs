//! Precision, recall and F from obligatory counts.

/// Precision, recall and F of one frame or of a whole sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionRecallF {
    pub precision: f64,
    pub recall: f64,
    pub f: f64,
}

/// Derive precision, recall and F.
///
/// # Arguments
/// * `n_candidates` - Obligatory candidates (objects or found links)
/// * `n_ground_truth` - Obligatory ground truth (objects or real links)
/// * `n_correct` - Correct pairs
///
/// Precision is 0 without candidates. Recall is 1 when every ground-truth item was found,
/// including the 0/0 case. F is `2 * correct / (ground_truth + candidates)`, and 1 when
/// both counts are zero.
pub fn calculate_precision_recall_f(
    n_candidates: usize,
    n_ground_truth: usize,
    n_correct: usize,
) -> PrecisionRecallF {
    let precision = if n_candidates == 0 {
        0.0
    } else {
        n_correct as f64 / n_candidates as f64
    };

    let recall = if n_ground_truth == n_correct {
        1.0
    } else {
        n_correct as f64 / n_ground_truth as f64
    };

    let total = n_ground_truth + n_candidates;
    let f = if total == 0 {
        1.0
    } else {
        2.0 * n_correct as f64 / total as f64
    };

    PrecisionRecallF { precision, recall, f }
}
