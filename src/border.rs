//! Exclusion of border and facultative objects from obligatory counts.
//!
//! Border status is derived per evaluation call and returned as flags; objects are never
//! annotated in place, so the same object set can go through any number of evaluations.

use crate::config::{EvaluationConfig, ImageSize};
use crate::matching::Correspondence;
use crate::object::DetectedObject;

/// Classifies objects lying within a margin of the image edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderFilter {
    image_size: ImageSize,
    margin: f64,
}

impl BorderFilter {
    pub fn new(image_size: ImageSize, margin: f64) -> Self {
        Self { image_size, margin }
    }

    /// Filter for the configured image size and `ignored_frame_size`.
    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self::new(config.effective_image_size(), config.ignored_frame_size)
    }

    /// Whether the position lies inside the margin band. A point exactly at the margin is interior.
    pub fn is_near_edge(&self, object: &DetectedObject) -> bool {
        let x = object.position.x;
        let y = object.position.y;
        let m = self.margin;
        let inside = m <= x && x <= self.image_size.width - m && m <= y && y <= self.image_size.height - m;
        !inside
    }

    /// Near an edge, or facultative.
    pub fn is_border(&self, object: &DetectedObject) -> bool {
        object.is_optional() || self.is_near_edge(object)
    }

    /// Border flag of every object, index-aligned with the input.
    pub fn flags(&self, objects: &[&DetectedObject]) -> Vec<bool> {
        objects.iter().map(|o| self.is_border(o)).collect()
    }
}

/// Flags of the correspondences where either side is a border object.
pub fn border_correspondences(
    pairs: &[Correspondence],
    ground_truth_border: &[bool],
    candidate_border: &[bool],
) -> Vec<bool> {
    pairs
        .iter()
        .map(|p| ground_truth_border[p.ground_truth] || candidate_border[p.candidate])
        .collect()
}
