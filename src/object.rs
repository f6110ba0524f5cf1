//! Detected objects and identity links between them.

use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};

use nalgebra::Point2;

use crate::mask::ObjectMask;
use crate::{Error, Result};

/// Detected objects grouped by frame number, in ascending frame order.
pub type FrameObjects = BTreeMap<usize, Vec<DetectedObject>>;

/// A single object found in one frame, either by an annotator or by an algorithm.
///
/// Identity for equality and hashing is `(frame_number, effective_id, position)`,
/// so two parsers reading the same record produce equal objects.
#[derive(Debug, Clone)]
pub struct DetectedObject {
    /// Frame the object was found in.
    pub frame_number: usize,

    /// Identifier unique within the frame.
    pub local_id: i64,

    /// Identity persistent across frames, if the source provides one.
    pub track_id: Option<i64>,

    /// Position in image pixel space (x, y).
    pub position: Point2<f64>,

    /// Classification tag: `0` is obligatory, anything else is optional (facultative).
    pub tag: i32,

    /// Pixel mask with its bounding box, for objects read from label or mask images.
    pub mask: Option<ObjectMask>,
}

impl DetectedObject {
    /// Create an obligatory object without tracking data or mask.
    pub fn new(frame_number: usize, local_id: i64, x: f64, y: f64) -> Self {
        Self {
            frame_number,
            local_id,
            track_id: None,
            position: Point2::new(x, y),
            tag: 0,
            mask: None,
        }
    }

    /// Set the persistent identity.
    pub fn with_track_id(mut self, track_id: i64) -> Self {
        self.track_id = Some(track_id);
        self
    }

    /// Set the classification tag.
    pub fn with_tag(mut self, tag: i32) -> Self {
        self.tag = tag;
        self
    }

    /// Attach a pixel mask.
    pub fn with_mask(mut self, mask: ObjectMask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Track id when present, local id otherwise.
    pub fn effective_id(&self) -> i64 {
        self.track_id.unwrap_or(self.local_id)
    }

    /// Whether the object is optional: matched occurrences count, missing ones are not penalized.
    pub fn is_optional(&self) -> bool {
        self.tag != 0
    }

    pub fn has_tracking_data(&self) -> bool {
        self.track_id.is_some()
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// Euclidean distance between the two positions.
    pub fn distance(&self, other: &DetectedObject) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }

    /// Whether both objects carry the same persistent identity. Objects without one never do.
    pub fn same_track(&self, other: &DetectedObject) -> bool {
        matches!((self.track_id, other.track_id), (Some(a), Some(b)) if a == b)
    }

    fn key(&self) -> (usize, i64, u64, u64) {
        (
            self.frame_number,
            self.effective_id(),
            self.position.x.to_bits(),
            self.position.y.to_bits(),
        )
    }
}

impl PartialEq for DetectedObject {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DetectedObject {}

impl Hash for DetectedObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Claimed identity continuity between an object and a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityLink<'a> {
    pub from: &'a DetectedObject,
    pub to: &'a DetectedObject,
}

impl<'a> IdentityLink<'a> {
    /// Create a link; `from` must lie in a strictly earlier frame than `to`.
    pub fn new(from: &'a DetectedObject, to: &'a DetectedObject) -> Result<Self> {
        if from.frame_number >= to.frame_number {
            return Err(Error::InvalidObject(format!(
                "link must go forward in time, got frame {} -> frame {}",
                from.frame_number, to.frame_number
            )));
        }
        Ok(Self { from, to })
    }
}

/// Group a flat object list by frame, keeping the input order within each frame.
pub fn group_by_frame(objects: Vec<DetectedObject>) -> FrameObjects {
    let mut frames = FrameObjects::new();
    for object in objects {
        frames.entry(object.frame_number).or_default().push(object);
    }
    frames
}

/// Check that no two objects of one frame share a local id.
///
/// The slice is taken as a single frame whatever the objects' frame numbers say.
pub fn validate_unique_ids(objects: &[DetectedObject]) -> Result<()> {
    let mut seen = HashSet::with_capacity(objects.len());
    for object in objects {
        if !seen.insert(object.local_id) {
            return Err(Error::InvalidObject(format!(
                "duplicate local id {} in frame {}",
                object.local_id, object.frame_number
            )));
        }
    }
    Ok(())
}

/// Check that objects sit under their own frame key and local ids are unique per frame.
pub fn validate_frames(frames: &FrameObjects) -> Result<()> {
    for (&frame, objects) in frames {
        if let Some(object) = objects.iter().find(|o| o.frame_number != frame) {
            return Err(Error::InvalidObject(format!(
                "object {} has frame {} but is stored under frame {}",
                object.local_id, object.frame_number, frame
            )));
        }
        validate_unique_ids(objects)?;
    }
    Ok(())
}

/// Reset every tag to obligatory. Algorithm results cannot declare objects optional.
pub fn mark_all_obligatory(frames: &mut FrameObjects) {
    for object in frames.values_mut().flatten() {
        object.tag = 0;
    }
}
