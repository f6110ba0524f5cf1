//! Identity-continuity evaluation between two frames.

use std::collections::HashSet;

use super::accumulator::FrameCounts;
use super::outcome::TrackingOutcome;
use crate::config::EvaluationConfig;
use crate::matching::{find_correspondence, Correspondence};
use crate::object::{DetectedObject, IdentityLink};
use crate::Result;

/// Objects of one frame together with their correspondence.
#[derive(Debug, Clone)]
pub struct FrameState<'a> {
    pub frame: usize,
    pub ground_truth: Vec<&'a DetectedObject>,
    pub candidates: Vec<&'a DetectedObject>,
    pub correspondence: Vec<Correspondence>,
}

impl<'a> FrameState<'a> {
    /// Match the two object sets of `frame`.
    pub fn new(
        frame: usize,
        ground_truth: Vec<&'a DetectedObject>,
        candidates: Vec<&'a DetectedObject>,
        config: &EvaluationConfig,
    ) -> Self {
        let correspondence = find_correspondence(&ground_truth, &candidates, config);
        Self {
            frame,
            ground_truth,
            candidates,
            correspondence,
        }
    }

    /// Obligatory ground truth, and candidates that are unmatched or matched to obligatory ground truth.
    fn obligatory(&self) -> (Vec<bool>, Vec<bool>) {
        let gt_ok: Vec<bool> = self.ground_truth.iter().map(|g| !g.is_optional()).collect();
        let mut cand_ok = vec![true; self.candidates.len()];
        for pair in &self.correspondence {
            cand_ok[pair.candidate] = gt_ok[pair.ground_truth];
        }
        (gt_ok, cand_ok)
    }

    /// Correspondence entries whose ground-truth side is obligatory.
    fn obligatory_pairs(&self, gt_ok: &[bool]) -> Vec<&Correspondence> {
        self.correspondence
            .iter()
            .filter(|p| gt_ok[p.ground_truth])
            .collect()
    }
}

/// Tracking outcome of one frame pair.
#[derive(Debug, Clone, Default)]
pub struct TrackingDetails<'a> {
    /// Candidate pairs sharing a track id.
    pub found_links: Vec<IdentityLink<'a>>,
    /// Obligatory ground-truth pairs sharing a track id.
    pub real_links: Vec<IdentityLink<'a>>,
    pub correct: Vec<TrackingOutcome<'a>>,
    pub false_positives: Vec<TrackingOutcome<'a>>,
    pub false_negatives: Vec<TrackingOutcome<'a>>,
}

impl<'a> TrackingDetails<'a> {
    pub fn counts(&self) -> FrameCounts {
        FrameCounts {
            n_candidates: self.found_links.len(),
            n_ground_truth: self.real_links.len(),
            n_correct: self.correct.len(),
        }
    }

    /// All decisions: correct first, then false positives, then false negatives.
    pub fn into_outcomes(self) -> impl Iterator<Item = TrackingOutcome<'a>> {
        self.correct
            .into_iter()
            .chain(self.false_positives)
            .chain(self.false_negatives)
    }
}

/// Links between two object lists: every pair sharing a track id, earlier frame first.
fn same_track_links<'a>(
    last: &[&'a DetectedObject],
    last_ok: &[bool],
    new: &[&'a DetectedObject],
    new_ok: &[bool],
) -> Result<(Vec<IdentityLink<'a>>, Vec<(usize, usize)>)> {
    let mut links = Vec::new();
    let mut indices = Vec::new();
    for (i, from) in last.iter().enumerate().filter(|(i, _)| last_ok[*i]) {
        for (j, to) in new.iter().enumerate().filter(|(j, _)| new_ok[*j]) {
            if from.same_track(to) {
                links.push(IdentityLink::new(*from, *to)?);
                indices.push((i, j));
            }
        }
    }
    Ok((links, indices))
}

/// Evaluate identity continuity from `last` to `new`.
///
/// A found link is credited only when both of its candidates matched obligatory ground
/// truth and those ground-truth objects share a track id themselves. Real links without a
/// credited counterpart are false negatives, found links without one false positives.
///
/// Fails when `last` is not strictly earlier than `new`.
pub fn evaluate_tracking<'a>(
    last: &FrameState<'a>,
    new: &FrameState<'a>,
) -> Result<TrackingDetails<'a>> {
    let (last_gt_ok, last_cand_ok) = last.obligatory();
    let (new_gt_ok, new_cand_ok) = new.obligatory();

    let (real_links, real_indices) =
        same_track_links(&last.ground_truth, &last_gt_ok, &new.ground_truth, &new_gt_ok)?;
    let (found_links, found_indices) =
        same_track_links(&last.candidates, &last_cand_ok, &new.candidates, &new_cand_ok)?;

    let mut correct = Vec::new();
    let mut credited_gt: HashSet<(usize, usize)> = HashSet::new();
    let mut credited_cand: HashSet<(usize, usize)> = HashSet::new();

    for last_pair in last.obligatory_pairs(&last_gt_ok) {
        for new_pair in new.obligatory_pairs(&new_gt_ok) {
            let gt_from = last.ground_truth[last_pair.ground_truth];
            let gt_to = new.ground_truth[new_pair.ground_truth];
            let cand_from = last.candidates[last_pair.candidate];
            let cand_to = new.candidates[new_pair.candidate];

            if gt_from.same_track(gt_to) && cand_from.same_track(cand_to) {
                correct.push(TrackingOutcome::correct(
                    IdentityLink::new(gt_from, gt_to)?,
                    IdentityLink::new(cand_from, cand_to)?,
                ));
                credited_gt.insert((last_pair.ground_truth, new_pair.ground_truth));
                credited_cand.insert((last_pair.candidate, new_pair.candidate));
            }
        }
    }

    let false_negatives = real_links
        .iter()
        .zip(&real_indices)
        .filter(|(_, idx)| !credited_gt.contains(idx))
        .map(|(link, _)| TrackingOutcome::false_negative(*link))
        .collect();
    let false_positives = found_links
        .iter()
        .zip(&found_indices)
        .filter(|(_, idx)| !credited_cand.contains(idx))
        .map(|(link, _)| TrackingOutcome::false_positive(*link))
        .collect();

    Ok(TrackingDetails {
        found_links,
        real_links,
        correct,
        false_positives,
        false_negatives,
    })
}
