//! Sequence evaluation.

use std::collections::BTreeSet;

use log::{debug, info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::accumulator::StatsAccumulator;
use super::outcome::{SegmentationOutcome, TrackingOutcome};
use super::prf::{calculate_precision_recall_f, PrecisionRecallF};
use super::segmentation::{evaluate_segmentation, SegmentationDetails};
use super::tracking::{evaluate_tracking, FrameState};
use crate::config::EvaluationConfig;
use crate::object::{validate_frames, validate_unique_ids, DetectedObject, FrameObjects};
use crate::{Error, Result};

/// Which parts of a sequence to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// Segmentation, tracking and long-range tracking
    #[default]
    Full,
    /// Segmentation only
    SegmentationOnly,
}

/// Segmentation results of a sequence.
#[derive(Debug, Clone)]
pub struct SegmentationReport<'a> {
    /// Metrics over the summed counts of all frames.
    pub summary: PrecisionRecallF,
    /// Obligatory candidate count over obligatory ground-truth count.
    pub count_ratio: f64,
    /// Counts of every evaluated frame.
    pub stats: StatsAccumulator,
    /// Decisions of every frame, frame by frame.
    pub details: Vec<SegmentationOutcome<'a>>,
}

/// Tracking results of a sequence, or of its long-range comparison.
#[derive(Debug, Clone)]
pub struct TrackingReport<'a> {
    pub summary: PrecisionRecallF,
    /// Counts keyed by the later frame of each compared pair.
    pub stats: StatsAccumulator,
    pub details: Vec<TrackingOutcome<'a>>,
}

/// Everything computed for one algorithm on one sequence.
#[derive(Debug, Clone)]
pub struct EvaluationReport<'a> {
    pub segmentation: SegmentationReport<'a>,
    /// `None` when only segmentation was evaluated.
    pub tracking: Option<TrackingReport<'a>>,
    /// `None` when tracking was skipped or fewer than three tracking frames exist.
    pub long_tracking: Option<TrackingReport<'a>>,
}

/// Frames to evaluate: present in both inputs, or in either when `union` is set.
fn select_frames(ground_truth: &BTreeSet<usize>, results: &BTreeSet<usize>, union: bool) -> Vec<usize> {
    if union {
        ground_truth.union(results).copied().collect()
    } else {
        ground_truth.intersection(results).copied().collect()
    }
}

fn frame_objects(frames: &FrameObjects, frame: usize, tracking_only: bool) -> Vec<&DetectedObject> {
    frames
        .get(&frame)
        .map(|objects| {
            objects
                .iter()
                .filter(|o| !tracking_only || o.has_tracking_data())
                .collect()
        })
        .unwrap_or_default()
}

/// Evaluate an algorithm's results on a sequence against ground truth.
///
/// Result tags are taken as given; use [`crate::parsers::load_results`] or
/// [`crate::object::mark_all_obligatory`] to treat every result object as obligatory.
///
/// # Errors
/// * `InvalidConfig` when the configuration is invalid
/// * `InvalidObject` when a frame holds duplicate local ids
/// * `EmptyInput` when no frame is left to evaluate
pub fn evaluate_sequence<'a>(
    ground_truth: &'a FrameObjects,
    results: &'a FrameObjects,
    config: &EvaluationConfig,
    mode: EvaluationMode,
) -> Result<EvaluationReport<'a>> {
    evaluate_sequence_split(ground_truth, ground_truth, results, config, mode)
}

/// Like [`evaluate_sequence`], with separate ground truth for segmentation and tracking.
pub fn evaluate_sequence_split<'a>(
    segmentation_ground_truth: &'a FrameObjects,
    tracking_ground_truth: &'a FrameObjects,
    results: &'a FrameObjects,
    config: &EvaluationConfig,
    mode: EvaluationMode,
) -> Result<EvaluationReport<'a>> {
    config.validate()?;
    validate_frames(segmentation_ground_truth)?;
    validate_frames(tracking_ground_truth)?;
    validate_frames(results)?;

    let segmentation = evaluate_segmentation_sequence(segmentation_ground_truth, results, config)?;

    let (tracking, long_tracking) = match mode {
        EvaluationMode::SegmentationOnly => {
            info!("Skipping tracking evaluation");
            (None, None)
        }
        EvaluationMode::Full => {
            let (tracking, long_tracking) =
                evaluate_tracking_sequence(tracking_ground_truth, results, config)?;
            (Some(tracking), long_tracking)
        }
    };

    Ok(EvaluationReport {
        segmentation,
        tracking,
        long_tracking,
    })
}

fn evaluate_segmentation_sequence<'a>(
    ground_truth: &'a FrameObjects,
    results: &'a FrameObjects,
    config: &EvaluationConfig,
) -> Result<SegmentationReport<'a>> {
    let frames = select_frames(
        &ground_truth.keys().copied().collect(),
        &results.keys().copied().collect(),
        config.all_data_evaluated,
    );
    if frames.is_empty() {
        return Err(Error::EmptyInput(
            "intersection of ground truth and results is empty".to_string(),
        ));
    }

    info!("Evaluating segmentation on {} frames...", frames.len());

    let evaluate_frame = |frame: &usize| -> SegmentationDetails<'a> {
        evaluate_segmentation(
            &frame_objects(ground_truth, *frame, false),
            &frame_objects(results, *frame, false),
            config,
        )
    };

    #[cfg(feature = "parallel")]
    let per_frame: Vec<SegmentationDetails<'a>> = frames.par_iter().map(evaluate_frame).collect();
    #[cfg(not(feature = "parallel"))]
    let per_frame: Vec<SegmentationDetails<'a>> = frames.iter().map(evaluate_frame).collect();

    let mut stats = StatsAccumulator::new();
    let mut details = Vec::new();
    for (frame, frame_details) in frames.iter().zip(per_frame) {
        let counts = frame_details.counts();
        debug!(
            "Frame {}: {} obligatory results, {} obligatory ground truth, {} correct",
            frame, counts.n_candidates, counts.n_ground_truth, counts.n_correct
        );
        stats.update(*frame, counts);
        details.extend(frame_details.into_outcomes());
    }

    let totals = stats.totals();
    info!("Done evaluating segmentation...");

    Ok(SegmentationReport {
        summary: totals.metrics(),
        count_ratio: totals.count_ratio(),
        stats,
        details,
    })
}

fn evaluate_tracking_sequence<'a>(
    ground_truth: &'a FrameObjects,
    results: &'a FrameObjects,
    config: &EvaluationConfig,
) -> Result<(TrackingReport<'a>, Option<TrackingReport<'a>>)> {
    let tracked_frames: BTreeSet<usize> = ground_truth
        .iter()
        .filter(|(_, objects)| objects.iter().any(DetectedObject::has_tracking_data))
        .map(|(frame, _)| *frame)
        .collect();
    let frames = select_frames(
        &tracked_frames,
        &results.keys().copied().collect(),
        config.all_data_evaluated,
    );
    if frames.is_empty() {
        return Err(Error::EmptyInput(
            "no frame has both tracking ground truth and results".to_string(),
        ));
    }

    info!("Evaluating tracking on {} frames...", frames.len());
    if frames.len() == 1 {
        warn!("Tracking data covers a single frame, no links can be evaluated");
    }

    let states: Vec<FrameState<'a>> = frames
        .iter()
        .map(|&frame| {
            FrameState::new(
                frame,
                frame_objects(ground_truth, frame, true),
                frame_objects(results, frame, true),
                config,
            )
        })
        .collect();

    let mut stats = StatsAccumulator::new();
    let mut details = Vec::new();
    for pair in states.windows(2) {
        let frame_details = evaluate_tracking(&pair[0], &pair[1])?;
        let counts = frame_details.counts();
        debug!(
            "Frames {} -> {}: {} found links, {} real links, {} correct",
            pair[0].frame, pair[1].frame, counts.n_candidates, counts.n_ground_truth, counts.n_correct
        );
        stats.update(pair[1].frame, counts);
        details.extend(frame_details.into_outcomes());
    }

    let tracking = TrackingReport {
        summary: stats.summary(),
        stats,
        details,
    };
    info!("Done evaluating tracking...");

    let long_tracking = match (states.first(), states.last()) {
        (Some(first), Some(last)) if states.len() > 2 => {
            info!("Evaluating long-time tracking...");
            let long_details = evaluate_tracking(first, last)?;
            let mut long_stats = StatsAccumulator::new();
            long_stats.update(last.frame, long_details.counts());
            Some(TrackingReport {
                summary: long_stats.summary(),
                stats: long_stats,
                details: long_details.into_outcomes().collect(),
            })
        }
        _ => {
            info!("Skipping long-time tracking evaluation because there are too few frames");
            None
        }
    };

    Ok((tracking, long_tracking))
}

/// Evaluate the segmentation of two object lists as if they were one frame.
///
/// Frame numbers are ignored. Local ids must still be unique within each list.
pub fn evaluate_single_frame<'a>(
    ground_truth: &'a [DetectedObject],
    results: &'a [DetectedObject],
    config: &EvaluationConfig,
) -> Result<(PrecisionRecallF, SegmentationDetails<'a>)> {
    config.validate()?;
    validate_unique_ids(ground_truth)?;
    validate_unique_ids(results)?;

    let gt: Vec<&DetectedObject> = ground_truth.iter().collect();
    let res: Vec<&DetectedObject> = results.iter().collect();
    let details = evaluate_segmentation(&gt, &res, config);
    let metrics = calculate_precision_recall_f(
        details.n_obligatory_candidates,
        details.n_obligatory_ground_truth,
        details.correct.len(),
    );
    Ok((metrics, details))
}
