//! Outcomes of single matching decisions.

use std::fmt;

use crate::object::{DetectedObject, IdentityLink};

/// Result of one matching decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Both ground truth and candidate present
    Correct,
    /// Only the candidate present
    FalsePositive,
    /// Only the ground truth present
    FalseNegative,
    /// Neither side present
    Unknown,
}

impl Outcome {
    /// Outcome implied by which sides of a decision are present.
    pub fn from_sides(has_ground_truth: bool, has_candidate: bool) -> Self {
        match (has_ground_truth, has_candidate) {
            (true, true) => Outcome::Correct,
            (true, false) => Outcome::FalseNegative,
            (false, true) => Outcome::FalsePositive,
            (false, false) => Outcome::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "CORRECT",
            Outcome::FalsePositive => "FALSE_POSITIVE",
            Outcome::FalseNegative => "FALSE_NEGATIVE",
            Outcome::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision that can be written as one row of a details file.
pub trait EvaluationDetail {
    /// Column names of the details file.
    fn csv_headers() -> &'static [&'static str]
    where
        Self: Sized;

    /// Frame the decision belongs to.
    fn frame(&self) -> usize;

    fn outcome(&self) -> Outcome;

    /// Row values, aligned with `csv_headers`.
    fn csv_record(&self) -> Vec<String>;
}

/// One segmentation decision: a matched pair, or a single unmatched object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentationOutcome<'a> {
    pub frame: usize,
    pub ground_truth: Option<&'a DetectedObject>,
    pub candidate: Option<&'a DetectedObject>,
}

impl<'a> SegmentationOutcome<'a> {
    pub fn correct(ground_truth: &'a DetectedObject, candidate: &'a DetectedObject) -> Self {
        Self {
            frame: ground_truth.frame_number,
            ground_truth: Some(ground_truth),
            candidate: Some(candidate),
        }
    }

    pub fn false_positive(candidate: &'a DetectedObject) -> Self {
        Self {
            frame: candidate.frame_number,
            ground_truth: None,
            candidate: Some(candidate),
        }
    }

    pub fn false_negative(ground_truth: &'a DetectedObject) -> Self {
        Self {
            frame: ground_truth.frame_number,
            ground_truth: Some(ground_truth),
            candidate: None,
        }
    }
}

fn object_columns(object: Option<&DetectedObject>, record: &mut Vec<String>) {
    match object {
        Some(o) => {
            record.push(o.local_id.to_string());
            record.push(o.position.x.to_string());
            record.push(o.position.y.to_string());
        }
        None => record.extend(std::iter::repeat(String::new()).take(3)),
    }
}

impl EvaluationDetail for SegmentationOutcome<'_> {
    fn csv_headers() -> &'static [&'static str] {
        &[
            "Frame",
            "Result",
            "GT_id",
            "GT_pos_x",
            "GT_pos_y",
            "Algo_id",
            "Algo_pos_x",
            "Algo_pos_y",
        ]
    }

    fn frame(&self) -> usize {
        self.frame
    }

    fn outcome(&self) -> Outcome {
        Outcome::from_sides(self.ground_truth.is_some(), self.candidate.is_some())
    }

    fn csv_record(&self) -> Vec<String> {
        let mut record = vec![self.frame.to_string(), self.outcome().to_string()];
        object_columns(self.ground_truth, &mut record);
        object_columns(self.candidate, &mut record);
        record
    }
}

/// One tracking decision: a credited link pair, or a single uncredited link.
///
/// `frame` is the later frame of the links, `prev_frame` the earlier one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingOutcome<'a> {
    pub frame: usize,
    pub prev_frame: usize,
    pub ground_truth: Option<IdentityLink<'a>>,
    pub candidate: Option<IdentityLink<'a>>,
}

impl<'a> TrackingOutcome<'a> {
    pub fn correct(ground_truth: IdentityLink<'a>, candidate: IdentityLink<'a>) -> Self {
        Self {
            frame: ground_truth.to.frame_number,
            prev_frame: ground_truth.from.frame_number,
            ground_truth: Some(ground_truth),
            candidate: Some(candidate),
        }
    }

    pub fn false_positive(candidate: IdentityLink<'a>) -> Self {
        Self {
            frame: candidate.to.frame_number,
            prev_frame: candidate.from.frame_number,
            ground_truth: None,
            candidate: Some(candidate),
        }
    }

    pub fn false_negative(ground_truth: IdentityLink<'a>) -> Self {
        Self {
            frame: ground_truth.to.frame_number,
            prev_frame: ground_truth.from.frame_number,
            ground_truth: Some(ground_truth),
            candidate: None,
        }
    }
}

fn link_columns(link: Option<&IdentityLink<'_>>, record: &mut Vec<String>) {
    match link {
        Some(l) => {
            record.push(l.from.effective_id().to_string());
            record.push(l.from.position.x.to_string());
            record.push(l.from.position.y.to_string());
            record.push(l.to.position.x.to_string());
            record.push(l.to.position.y.to_string());
        }
        None => record.extend(std::iter::repeat(String::new()).take(5)),
    }
}

impl EvaluationDetail for TrackingOutcome<'_> {
    fn csv_headers() -> &'static [&'static str] {
        &[
            "Frame",
            "Result",
            "Prev_frame",
            "GT_unique_id",
            "GT_pos0_x",
            "GT_pos0_y",
            "GT_pos1_x",
            "GT_pos1_y",
            "Algo_unique_id",
            "Algo_pos0_x",
            "Algo_pos0_y",
            "Algo_pos1_x",
            "Algo_pos1_y",
        ]
    }

    fn frame(&self) -> usize {
        self.frame
    }

    fn outcome(&self) -> Outcome {
        Outcome::from_sides(self.ground_truth.is_some(), self.candidate.is_some())
    }

    fn csv_record(&self) -> Vec<String> {
        let mut record = vec![
            self.frame.to_string(),
            self.outcome().to_string(),
            self.prev_frame.to_string(),
        ];
        link_columns(self.ground_truth.as_ref(), &mut record);
        link_columns(self.candidate.as_ref(), &mut record);
        record
    }
}
