//! Integration tests for evalplatform-rs.
//!
//! These tests run complete evaluations across parsers, matching, metrics and reporting.

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use image::{GrayImage, Luma};
use tempfile::TempDir;

use evalplatform_rs::metrics::{evaluate_sequence_split, EvaluationDetail, Outcome};
use evalplatform_rs::object::group_by_frame;
use evalplatform_rs::parsers::load_results;
use evalplatform_rs::{
    evaluate_sequence, evaluate_single_frame, load_frames, parser_by_symbol, DetectedObject,
    EvaluationConfig, EvaluationMode, ImageSize, ReportWriter,
};

// =============================================================================
// Helpers
// =============================================================================

const PLATFORM_HEADER: &str = "Frame_number,Cell_number,Cell_colour,Position_X,Position_Y,Unique_cell_number";

fn platform_csv(objects: &[DetectedObject]) -> String {
    let mut content = format!("{}\n", PLATFORM_HEADER);
    for o in objects {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            o.frame_number,
            o.local_id,
            o.tag,
            o.position.x,
            o.position.y,
            o.track_id.unwrap_or(-1)
        ));
    }
    content
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Ground truth of one frame: cell 2 tagged `facultative_tag` and found exactly, two more exact
/// matches (3, 4) and two cells no result is close to (1, 5).
fn frame_ground_truth(facultative_tag: i32) -> Vec<DetectedObject> {
    vec![
        DetectedObject::new(3, 1, 100.0, 100.0),
        DetectedObject::new(3, 2, 210.0, 200.0).with_tag(facultative_tag),
        DetectedObject::new(3, 3, 300.0, 300.0),
        DetectedObject::new(3, 4, 10.0, 350.0),
        DetectedObject::new(3, 5, 490.0, 490.0),
    ]
}

fn frame_results() -> Vec<DetectedObject> {
    vec![
        DetectedObject::new(3, 1, 400.0, 100.0),
        DetectedObject::new(3, 2, 10.0, 150.0),
        DetectedObject::new(3, 3, 10.0, 160.0),
        DetectedObject::new(3, 4, 210.0, 210.0),
        DetectedObject::new(3, 5, 210.0, 200.0),
        DetectedObject::new(3, 6, 300.0, 300.0),
        DetectedObject::new(3, 7, 10.0, 350.0),
        DetectedObject::new(3, 8, 250.0, 500.0),
    ]
}

// =============================================================================
// Segmentation
// =============================================================================

#[test]
fn test_integration_single_missed_cell() {
    let gt = vec![DetectedObject::new(1, 1, 10.0, 10.0), DetectedObject::new(1, 2, 50.0, 50.0)];
    let res = vec![DetectedObject::new(1, 1, 11.0, 10.0)];
    let config = EvaluationConfig {
        cutoff_distance: 5.0,
        ..Default::default()
    };

    let (metrics, details) = evaluate_single_frame(&gt, &res, &config).unwrap();
    assert_eq!(details.correct.len(), 1);
    assert!(details.false_positives.is_empty());
    assert_eq!(details.false_negatives.len(), 1);
    assert_eq!(details.false_negatives[0].ground_truth.unwrap().local_id, 2);
    assert_relative_eq!(metrics.precision, 1.0);
    assert_relative_eq!(metrics.recall, 0.5);
    assert_relative_eq!(metrics.f, 2.0 / 3.0);

    // A facultative miss is not penalized
    let gt = vec![
        DetectedObject::new(1, 1, 10.0, 10.0),
        DetectedObject::new(1, 2, 50.0, 50.0).with_tag(3),
    ];
    let (metrics, details) = evaluate_single_frame(&gt, &res, &config).unwrap();
    assert!(details.false_negatives.is_empty());
    assert_relative_eq!(metrics.recall, 1.0);
    assert_relative_eq!(metrics.f, 1.0);
}

#[test]
fn test_integration_frame_with_facultative_match() {
    let gt = frame_ground_truth(1);
    let res = frame_results();
    let (metrics, details) = evaluate_single_frame(&gt, &res, &EvaluationConfig::default()).unwrap();

    assert_relative_eq!(metrics.precision, 2.0 / 7.0);
    assert_relative_eq!(metrics.recall, 2.0 / 4.0);
    assert_relative_eq!(metrics.f, 4.0 / 11.0);

    let correct: Vec<(i64, i64)> = details
        .correct
        .iter()
        .map(|d| (d.ground_truth.unwrap().local_id, d.candidate.unwrap().local_id))
        .collect();
    assert_eq!(correct.len(), 2);
    assert!(correct.contains(&(3, 6)));
    assert!(correct.contains(&(4, 7)));

    let mut false_positives: Vec<i64> = details.false_positives.iter().map(|d| d.candidate.unwrap().local_id).collect();
    false_positives.sort_unstable();
    assert_eq!(false_positives, vec![1, 2, 3, 4, 8]);

    let mut false_negatives: Vec<i64> = details.false_negatives.iter().map(|d| d.ground_truth.unwrap().local_id).collect();
    false_negatives.sort_unstable();
    assert_eq!(false_negatives, vec![1, 5]);
}

#[test]
fn test_integration_frame_with_obligatory_match() {
    let gt = frame_ground_truth(0);
    let res = frame_results();
    let (metrics, details) = evaluate_single_frame(&gt, &res, &EvaluationConfig::default()).unwrap();

    assert_relative_eq!(metrics.precision, 3.0 / 8.0);
    assert_relative_eq!(metrics.recall, 3.0 / 5.0);
    assert_relative_eq!(metrics.f, 6.0 / 13.0);
    assert!(details
        .correct
        .iter()
        .any(|d| d.ground_truth.unwrap().local_id == 2 && d.candidate.unwrap().local_id == 5));
    assert_eq!(details.false_positives.len(), 5);
    assert_eq!(details.false_negatives.len(), 2);
}

#[test]
fn test_integration_border_margin() {
    let gt = group_by_frame(vec![
        DetectedObject::new(1, 1, 50.0, 50.0),
        DetectedObject::new(1, 2, 3.0, 50.0),
    ]);
    let res = group_by_frame(vec![DetectedObject::new(1, 1, 50.0, 51.0)]);
    let config = EvaluationConfig {
        ignored_frame_size: 5.0,
        image_size: Some(ImageSize::new(100.0, 100.0).unwrap()),
        ..Default::default()
    };

    let report = evaluate_sequence(&gt, &res, &config, EvaluationMode::SegmentationOnly).unwrap();
    // The missed cell at the border is neither counted nor reported
    assert_relative_eq!(report.segmentation.summary.recall, 1.0);
    assert!(report
        .segmentation
        .details
        .iter()
        .all(|d| d.outcome() == Outcome::Correct));
}

// =============================================================================
// Tracking
// =============================================================================

#[test]
fn test_integration_tracking_links() {
    let gt = group_by_frame(vec![
        DetectedObject::new(1, 1, 10.0, 10.0).with_track_id(5),
        DetectedObject::new(2, 1, 14.0, 10.0).with_track_id(5),
        DetectedObject::new(1, 2, 100.0, 100.0).with_track_id(6),
        DetectedObject::new(2, 2, 100.0, 104.0).with_track_id(6),
    ]);
    let res = group_by_frame(vec![
        DetectedObject::new(1, 1, 11.0, 10.0).with_track_id(9),
        DetectedObject::new(2, 1, 15.0, 10.0).with_track_id(9),
        DetectedObject::new(1, 2, 100.0, 101.0).with_track_id(3),
        DetectedObject::new(2, 2, 100.0, 105.0).with_track_id(4),
    ]);

    let report = evaluate_sequence(&gt, &res, &EvaluationConfig::default(), EvaluationMode::Full).unwrap();
    assert_relative_eq!(report.segmentation.summary.f, 1.0);

    let tracking = report.tracking.unwrap();
    let counts = tracking.stats.totals();
    assert_eq!(counts.n_candidates, 1);
    assert_eq!(counts.n_ground_truth, 2);
    assert_eq!(counts.n_correct, 1);
    assert_relative_eq!(tracking.summary.precision, 1.0);
    assert_relative_eq!(tracking.summary.recall, 0.5);

    let outcomes: Vec<Outcome> = tracking.details.iter().map(|d| d.outcome()).collect();
    assert_eq!(outcomes.iter().filter(|o| **o == Outcome::Correct).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| **o == Outcome::FalseNegative).count(), 1);
    assert!(report.long_tracking.is_none());
}

#[test]
fn test_integration_long_tracking_across_sequence() {
    let mut gt = Vec::new();
    let mut res = Vec::new();
    for frame in 1..=4 {
        let x = 10.0 * frame as f64;
        gt.push(DetectedObject::new(frame, 1, x, 10.0).with_track_id(1));
        // Identity switch in frame 3
        let track = if frame < 3 { 7 } else { 8 };
        res.push(DetectedObject::new(frame, 1, x + 1.0, 10.0).with_track_id(track));
    }
    let gt = group_by_frame(gt);
    let res = group_by_frame(res);

    let report = evaluate_sequence(&gt, &res, &EvaluationConfig::default(), EvaluationMode::Full).unwrap();
    let tracking = report.tracking.unwrap();
    let totals = tracking.stats.totals();
    assert_eq!((totals.n_candidates, totals.n_ground_truth, totals.n_correct), (2, 3, 2));

    let long = report.long_tracking.unwrap();
    let totals = long.stats.totals();
    assert_eq!((totals.n_candidates, totals.n_ground_truth, totals.n_correct), (0, 1, 0));
    assert_relative_eq!(long.summary.recall, 0.0);
}

// =============================================================================
// Files end to end
// =============================================================================

#[test]
fn test_integration_csv_files_and_reports() {
    let dir = TempDir::new().unwrap();
    let gt_objects = vec![
        DetectedObject::new(1, 1, 10.0, 10.0).with_track_id(1),
        DetectedObject::new(2, 1, 12.0, 10.0).with_track_id(1),
        DetectedObject::new(1, 2, 80.0, 80.0).with_track_id(2),
        DetectedObject::new(2, 2, 80.0, 82.0).with_track_id(2),
    ];
    let res_objects = vec![
        DetectedObject::new(1, 1, 10.0, 11.0).with_track_id(4),
        DetectedObject::new(2, 1, 12.0, 11.0).with_track_id(4),
        DetectedObject::new(2, 2, 81.0, 82.0).with_track_id(5).with_tag(2),
    ];
    let gt_path = write_file(dir.path(), "gt.csv", &platform_csv(&gt_objects));
    let res_path = write_file(dir.path(), "res.csv", &platform_csv(&res_objects));

    let parser = parser_by_symbol("PLATFORM_DEF").unwrap();
    let gt = load_frames(parser.as_ref(), &gt_path).unwrap();
    let res = load_results(parser.as_ref(), &res_path).unwrap();
    assert!(res.values().flatten().all(|o| o.tag == 0));

    let report = evaluate_sequence_split(&gt, &gt, &res, &EvaluationConfig::default(), EvaluationMode::Full).unwrap();
    let seg = report.segmentation.stats.totals();
    assert_eq!((seg.n_candidates, seg.n_ground_truth, seg.n_correct), (3, 4, 3));

    let writer = ReportWriter::new(&res_path, "Test Algo");
    writer.write(&report).unwrap();

    let summary = fs::read_to_string(dir.path().join("res.csv.TestAlgo.eval.summary.txt")).unwrap();
    assert!(summary.starts_with("Algorithm: Test Algo\nSegmentation:\nPrecision: 1.0\nRecall: 0.75\n"));
    assert!(summary.contains("Tracking:"));

    let seg_details = fs::read_to_string(dir.path().join("res.csv.TestAlgo.eval.segdetails.txt")).unwrap();
    let mut lines = seg_details.lines();
    assert_eq!(lines.next().unwrap(), "Frame,Result,GT_id,GT_pos_x,GT_pos_y,Algo_id,Algo_pos_x,Algo_pos_y");
    assert_eq!(lines.count(), 4);

    let plot = fs::read_to_string(dir.path().join("res.csv.TestAlgo.eval.segplot.txt")).unwrap();
    assert_eq!(plot.split("\n\n\n").count(), 4);
    assert!(plot.starts_with("\"1\" 0.5\n\"2\" 1.0"));
}

#[test]
fn test_integration_mask_images() {
    let dir = TempDir::new().unwrap();

    // Ground truth: two 4x4 squares, one facultative
    let mut gt = GrayImage::new(20, 10);
    let mut res = GrayImage::new(20, 10);
    for y in 2..6 {
        for x in 2..6 {
            gt.put_pixel(x, y, Luma([1]));
            res.put_pixel(x + 1, y, Luma([1]));
        }
        for x in 12..16 {
            gt.put_pixel(x, y, Luma([3]));
        }
    }
    let gt_path = dir.path().join("gt.png");
    let res_path = dir.path().join("res.png");
    gt.save(&gt_path).unwrap();
    res.save(&res_path).unwrap();

    let gt = load_frames(parser_by_symbol("MASK").unwrap().as_ref(), &gt_path).unwrap();
    let res = load_results(parser_by_symbol("LABEL").unwrap().as_ref(), &res_path).unwrap();
    assert_eq!(gt[&1].len(), 2);
    assert!(gt[&1].iter().all(|o| o.has_mask()));

    // Overlap of the squares: 12 / 20
    let config = EvaluationConfig {
        cutoff_iou: 0.5,
        ..Default::default()
    };
    let report = evaluate_sequence(&gt, &res, &config, EvaluationMode::SegmentationOnly).unwrap();
    assert_relative_eq!(report.segmentation.summary.f, 1.0);

    let config = EvaluationConfig {
        cutoff_iou: 0.7,
        ..Default::default()
    };
    let report = evaluate_sequence(&gt, &res, &config, EvaluationMode::SegmentationOnly).unwrap();
    let totals = report.segmentation.stats.totals();
    assert_eq!((totals.n_candidates, totals.n_ground_truth, totals.n_correct), (1, 1, 0));
}

#[test]
fn test_integration_detail_records_follow_outcomes() {
    let gt = group_by_frame(frame_ground_truth(1));
    let res = group_by_frame(frame_results());
    let report = evaluate_sequence(&gt, &res, &EvaluationConfig::default(), EvaluationMode::SegmentationOnly).unwrap();

    for detail in &report.segmentation.details {
        let record = detail.csv_record();
        assert_eq!(record.len(), 8);
        assert_eq!(record[0], "3");
        assert_eq!(record[1], detail.outcome().as_str());
    }
    assert_eq!(report.segmentation.details.len(), 9);
}
