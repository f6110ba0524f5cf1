//! Report files written next to the evaluated results.
//!
//! For results `res.csv` evaluated as algorithm `My Algo` the files are:
//!
//! - `res.csv.MyAlgo.eval.summary.txt` - the text of [`format_summary`]
//! - `res.csv.MyAlgo.eval.segplot.txt` / `.eval.trackplot.txt` - per-frame metric series
//! - `res.csv.MyAlgo.eval.segdetails.txt` / `.eval.trackdetails.txt` / `.eval.longtrackdetails.txt`
//!   - one CSV row per evaluation outcome

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::metrics::{EvaluationDetail, EvaluationReport, PrecisionRecallF, StatsAccumulator};
use crate::Result;

pub const SUMMARY_SUFFIX: &str = ".eval.summary.txt";
pub const SEGPLOT_SUFFIX: &str = ".eval.segplot.txt";
pub const SEGDETAILS_SUFFIX: &str = ".eval.segdetails.txt";
pub const TRACKPLOT_SUFFIX: &str = ".eval.trackplot.txt";
pub const TRACKDETAILS_SUFFIX: &str = ".eval.trackdetails.txt";
pub const LONGTRACKDETAILS_SUFFIX: &str = ".eval.longtrackdetails.txt";

/// Frame labels in plot data are cut to this many characters.
const FRAME_LABEL_WIDTH: usize = 20;

// Values keep their decimal point (`1.0`, not `1`).
fn format_metrics(title: &str, metrics: &PrecisionRecallF, lines: &mut Vec<String>) {
    lines.push(title.to_string());
    lines.push(format!("Precision: {:?}", metrics.precision));
    lines.push(format!("Recall: {:?}", metrics.recall));
    lines.push(format!("F: {:?}", metrics.f));
}

/// Plain-text summary of a report.
///
/// Tracking blocks are only present when tracking was evaluated.
pub fn format_summary(algorithm: &str, report: &EvaluationReport) -> String {
    let mut lines = vec![format!("Algorithm: {}", algorithm)];
    format_metrics("Segmentation:", &report.segmentation.summary, &mut lines);
    if let Some(tracking) = &report.tracking {
        format_metrics("Tracking:", &tracking.summary, &mut lines);
    }
    if let Some(long_tracking) = &report.long_tracking {
        format_metrics("Long-time tracking:", &long_tracking.summary, &mut lines);
    }
    lines.join("\n")
}

/// Gnuplot-style data: rows of `"frame" value`, data sets separated by two blank lines.
fn format_plot_data(data_sets: &[Vec<(String, f64)>]) -> String {
    data_sets
        .iter()
        .map(|set| {
            set.iter()
                .map(|(frame, value)| format!("\"{}\" {:?}", frame, value))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n\n")
}

fn frame_label(frame: usize) -> String {
    frame.to_string().chars().take(FRAME_LABEL_WIDTH).collect()
}

/// Data sets: count ratio, precision, recall, F.
fn segmentation_plot_sets(stats: &StatsAccumulator) -> Vec<Vec<(String, f64)>> {
    let mut sets = vec![Vec::new(); 4];
    for (frame, counts) in stats.frames() {
        let label = frame_label(*frame);
        let metrics = counts.metrics();
        sets[0].push((label.clone(), counts.count_ratio()));
        sets[1].push((label.clone(), metrics.precision));
        sets[2].push((label.clone(), metrics.recall));
        sets[3].push((label, metrics.f));
    }
    sets
}

/// Data sets: precision, recall, F.
fn tracking_plot_sets(stats: &StatsAccumulator) -> Vec<Vec<(String, f64)>> {
    let mut sets = vec![Vec::new(); 3];
    for (frame, metrics) in stats.per_frame_metrics() {
        let label = frame_label(frame);
        sets[0].push((label.clone(), metrics.precision));
        sets[1].push((label.clone(), metrics.recall));
        sets[2].push((label, metrics.f));
    }
    sets
}

/// Write evaluation outcomes as CSV, or the single header `No details!` when there are none.
pub fn write_details<D: EvaluationDetail, W: Write>(details: &[D], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if details.is_empty() {
        csv_writer.write_record(["No details!"])?;
    } else {
        csv_writer.write_record(D::csv_headers())?;
        for detail in details {
            csv_writer.write_record(detail.csv_record())?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the report files of one algorithm.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    results_path: PathBuf,
    algorithm: String,
    output_details: bool,
}

impl ReportWriter {
    /// Create a writer for the results at `results_path`.
    ///
    /// # Arguments
    /// * `results_path` - Evaluated results file; report files are named after it
    /// * `algorithm` - Algorithm name; only its alphanumeric characters are used in file names
    pub fn new<P: AsRef<Path>>(results_path: P, algorithm: &str) -> Self {
        Self {
            results_path: results_path.as_ref().to_path_buf(),
            algorithm: algorithm.to_string(),
            output_details: true,
        }
    }

    /// Whether the `*details.txt` files are written. On by default.
    pub fn with_details(mut self, output_details: bool) -> Self {
        self.output_details = output_details;
        self
    }

    /// Path of the report file with the given suffix.
    pub fn path_for(&self, suffix: &str) -> PathBuf {
        let filtered: String = self.algorithm.chars().filter(|c| c.is_alphanumeric()).collect();
        let mut name = self.results_path.as_os_str().to_os_string();
        name.push(format!(".{}{}", filtered, suffix));
        PathBuf::from(name)
    }

    /// Write every report file for `report`, returning the written paths.
    pub fn write(&self, report: &EvaluationReport) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let segmentation = &report.segmentation;
        written.push(self.write_text(
            SEGPLOT_SUFFIX,
            &format_plot_data(&segmentation_plot_sets(&segmentation.stats)),
        )?);
        if self.output_details {
            written.push(self.write_detail_file(SEGDETAILS_SUFFIX, &segmentation.details)?);
        }

        if let Some(tracking) = &report.tracking {
            written.push(self.write_text(
                TRACKPLOT_SUFFIX,
                &format_plot_data(&tracking_plot_sets(&tracking.stats)),
            )?);
            if self.output_details {
                written.push(self.write_detail_file(TRACKDETAILS_SUFFIX, &tracking.details)?);
            }
        }

        if let Some(long_tracking) = &report.long_tracking {
            if self.output_details {
                written.push(self.write_detail_file(LONGTRACKDETAILS_SUFFIX, &long_tracking.details)?);
            }
        }

        written.push(self.write_text(SUMMARY_SUFFIX, &format_summary(&self.algorithm, report))?);

        info!("Wrote {} report files for {}", written.len(), self.algorithm);
        Ok(written)
    }

    fn write_text(&self, suffix: &str, content: &str) -> Result<PathBuf> {
        let path = self.path_for(suffix);
        debug!("Writing {}", path.display());
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        Ok(path)
    }

    fn write_detail_file<D: EvaluationDetail>(&self, suffix: &str, details: &[D]) -> Result<PathBuf> {
        let path = self.path_for(suffix);
        debug!("Writing {} ({} rows)", path.display(), details.len());
        write_details(details, BufWriter::new(File::create(&path)?))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;
    use crate::metrics::{evaluate_sequence, EvaluationMode, FrameCounts, SegmentationOutcome};
    use crate::object::{group_by_frame, DetectedObject, FrameObjects};
    use tempfile::TempDir;

    fn sequence() -> FrameObjects {
        group_by_frame(vec![
            DetectedObject::new(1, 1, 100.0, 100.0).with_track_id(1),
            DetectedObject::new(2, 1, 102.0, 100.0).with_track_id(1),
        ])
    }

    #[test]
    fn test_format_summary_segmentation_only() {
        let seq = sequence();
        let report = evaluate_sequence(&seq, &seq, &EvaluationConfig::default(), EvaluationMode::SegmentationOnly)
            .unwrap();
        assert_eq!(
            format_summary("Algo", &report),
            "Algorithm: Algo\nSegmentation:\nPrecision: 1.0\nRecall: 1.0\nF: 1.0"
        );
    }

    #[test]
    fn test_format_summary_with_tracking() {
        let seq = sequence();
        let report = evaluate_sequence(&seq, &seq, &EvaluationConfig::default(), EvaluationMode::Full).unwrap();
        let summary = format_summary("Algo", &report);
        assert!(summary.contains("\nTracking:\nPrecision: 1.0\nRecall: 1.0\nF: 1.0"));
        assert!(!summary.contains("Long-time tracking:"));
    }

    #[test]
    fn test_format_summary_keeps_decimal_point() {
        let ground_truth = group_by_frame(vec![
            DetectedObject::new(1, 1, 100.0, 100.0),
            DetectedObject::new(1, 2, 300.0, 300.0),
        ]);
        let results = group_by_frame(vec![DetectedObject::new(1, 1, 101.0, 100.0)]);
        let report = evaluate_sequence(
            &ground_truth,
            &results,
            &EvaluationConfig::default(),
            EvaluationMode::SegmentationOnly,
        )
        .unwrap();
        let summary = format_summary("Algo", &report);
        assert!(summary.ends_with("Precision: 1.0\nRecall: 0.5\nF: 0.6666666666666666"));
    }

    #[test]
    fn test_plot_data_layout() {
        let mut stats = StatsAccumulator::new();
        stats.update(
            1,
            FrameCounts {
                n_candidates: 2,
                n_ground_truth: 1,
                n_correct: 1,
            },
        );
        stats.update(3, FrameCounts::default());

        let data = format_plot_data(&tracking_plot_sets(&stats));
        assert_eq!(data, "\"1\" 0.5\n\"3\" 0.0\n\n\n\"1\" 1.0\n\"3\" 1.0\n\n\n\"1\" 0.6666666666666666\n\"3\" 1.0");

        let sets = segmentation_plot_sets(&stats);
        assert_eq!(sets.len(), 4);
        assert_eq!(sets[0][0], ("1".to_string(), 2.0));
    }

    #[test]
    fn test_write_details() {
        let object = DetectedObject::new(4, 7, 1.5, 2.0);
        let details = vec![SegmentationOutcome::false_negative(&object)];
        let mut buffer = Vec::new();
        write_details(&details, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Frame,Result,GT_id,GT_pos_x,GT_pos_y,Algo_id,Algo_pos_x,Algo_pos_y\n4,FALSE_NEGATIVE,7,1.5,2,,,\n"
        );

        let mut buffer = Vec::new();
        write_details::<SegmentationOutcome, _>(&[], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "No details!\n");
    }

    #[test]
    fn test_path_for_filters_algorithm_name() {
        let writer = ReportWriter::new("/data/res.csv", "My Algo-2!");
        assert_eq!(
            writer.path_for(SUMMARY_SUFFIX),
            PathBuf::from("/data/res.csv.MyAlgo2.eval.summary.txt")
        );
    }

    #[test]
    fn test_write_report_files() {
        let dir = TempDir::new().unwrap();
        let results_path = dir.path().join("res.csv");
        let seq = sequence();
        let report = evaluate_sequence(&seq, &seq, &EvaluationConfig::default(), EvaluationMode::Full).unwrap();

        let written = ReportWriter::new(&results_path, "Algo").write(&report).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| p.exists()));

        let written = ReportWriter::new(&results_path, "Algo")
            .with_details(false)
            .write(&report)
            .unwrap();
        assert_eq!(written.len(), 3);
    }
}
