//! Segmentation and tracking metrics.
//!
//! This module derives evaluation outcomes and precision/recall/F from matched
//! object sets. It includes:
//!
//! - `evaluate_segmentation` - correct / false positive / false negative objects of one frame
//! - `evaluate_tracking` - real, found and correct identity links between two frames
//! - `StatsAccumulator` - per-frame counts summed into sequence metrics
//! - `evaluate_sequence` - segmentation, tracking and long-range tracking of a whole sequence

mod accumulator;
mod evaluation;
mod outcome;
mod prf;
mod segmentation;
mod tracking;

pub use accumulator::{FrameCounts, StatsAccumulator};
pub use evaluation::{
    evaluate_sequence, evaluate_sequence_split, evaluate_single_frame, EvaluationMode,
    EvaluationReport, SegmentationReport, TrackingReport,
};
pub use outcome::{EvaluationDetail, Outcome, SegmentationOutcome, TrackingOutcome};
pub use prf::{calculate_precision_recall_f, PrecisionRecallF};
pub use segmentation::{evaluate_segmentation, SegmentationDetails};
pub use tracking::{evaluate_tracking, FrameState, TrackingDetails};
