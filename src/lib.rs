//! # evalplatform - Segmentation and Tracking Evaluation
//!
//! Evaluates cell segmentation and cell tracking algorithms against ground truth.
//!
//! Detected objects of every frame are matched to reference objects with a greedy
//! one-pass assignment, objects near the image border or marked optional are kept out of
//! the obligatory counts, and the outcomes are aggregated into precision, recall and F.
//!
//! ## Features
//!
//! - Greedy correspondence under position distance or mask overlap (IoU)
//! - Border and facultative object exclusion
//! - Segmentation, tracking and long-range tracking metrics
//! - Parsers for the common CSV, link and label/mask image formats
//! - Plain-text summaries and CSV detail reports
//!
//! ## Example
//!
//! ```rust,ignore
//! use evalplatform_rs::{evaluate_sequence, parser_by_symbol, load_frames, EvaluationConfig, EvaluationMode};
//!
//! let gt = load_frames(parser_by_symbol("OLDGT")?.as_ref(), "ground_truth.csv")?;
//! let results = load_frames(parser_by_symbol("PLATFORM_DEF")?.as_ref(), "results.csv")?;
//!
//! let report = evaluate_sequence(&gt, &results, &EvaluationConfig::default(), EvaluationMode::Full)?;
//! println!("F = {}", report.segmentation.summary.f);
//! ```

pub mod border;
pub mod config;
pub mod mask;
pub mod matching;
pub mod metrics;
pub mod object;
pub mod parsers;
pub mod report;
pub mod similarity;

// Re-exports for convenience
pub use border::BorderFilter;
pub use config::{EvaluationConfig, ImageSize, IniFile};
pub use mask::{MaskBounds, ObjectMask};
pub use matching::{find_correspondence, Correspondence};
pub use metrics::{
    calculate_precision_recall_f, evaluate_segmentation, evaluate_sequence, evaluate_single_frame,
    evaluate_tracking, EvaluationMode, EvaluationReport, Outcome, PrecisionRecallF,
};
pub use object::{DetectedObject, FrameObjects, IdentityLink};
pub use parsers::{load_frames, parser_by_symbol, ObjectParser};
pub use report::{format_summary, ReportWriter};
pub use similarity::Similarity;

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while loading or evaluating data
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid object data: {0}")]
        InvalidObject(String),

        #[error("Nothing to evaluate: {0}")]
        EmptyInput(String),

        #[error("Parse error: {0}")]
        Parse(String),

        #[error("Unknown parser: {0}")]
        UnknownParser(String),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("CSV error: {0}")]
        Csv(#[from] csv::Error),

        #[error("Image error: {0}")]
        Image(#[from] image::ImageError),
    }

    /// Result type for evaluation operations
    pub type Result<T> = std::result::Result<T, Error>;
}
