//! Command line evaluation of one algorithm's results against ground truth.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use evalplatform_rs::config::CONFIG_FILENAME;
use evalplatform_rs::metrics::evaluate_sequence_split;
use evalplatform_rs::parsers::{load_frames, load_results, parser_by_symbol};
use evalplatform_rs::{EvaluationConfig, EvaluationMode, ImageSize, IniFile, ReportWriter};

/// Evaluate cell segmentation and tracking results against ground truth
#[derive(Debug, Parser)]
#[command(name = "evalplatform", version, about)]
struct Cli {
    /// Ground truth file
    #[arg(long, value_name = "FILE")]
    ground_truth: PathBuf,

    /// Format of the ground truth file
    #[arg(long, value_name = "SYMBOL", default_value = "OLDGT")]
    ground_truth_parser: String,

    /// Algorithm results file; report files are written next to it
    #[arg(long, value_name = "FILE")]
    results: PathBuf,

    /// Format of the results file
    #[arg(long, value_name = "SYMBOL", default_value = "PLATFORM_DEF")]
    results_parser: String,

    /// Algorithm name used in the summary and report file names
    #[arg(long, value_name = "ALGORITHM", default_value = "Algorithm")]
    name: String,

    /// Separate ground truth for segmentation, read with the ground truth parser
    #[arg(long, value_name = "FILE")]
    ground_truth_segmentation: Option<PathBuf>,

    /// Evaluate segmentation only
    #[arg(long)]
    seg_only: bool,

    /// Configuration file (default: evaluation.ini if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum centre distance of a position match
    #[arg(long)]
    cutoff_distance: Option<f64>,

    /// Minimum mask overlap of a mask match
    #[arg(long)]
    cutoff_iou: Option<f64>,

    /// Width of the image margin excluded from obligatory counts
    #[arg(long)]
    ignored_frame_size: Option<f64>,

    /// Image size as WIDTHxHEIGHT
    #[arg(long, value_name = "WxH")]
    image_size: Option<ImageSize>,

    /// Print the summary to stdout
    #[arg(long)]
    stdout: bool,

    /// Suppress log output
    #[arg(short, long)]
    quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config_file(&self) -> Result<Option<IniFile>> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None if Path::new(CONFIG_FILENAME).exists() => PathBuf::from(CONFIG_FILENAME),
            None => return Ok(None),
        };
        let ini = IniFile::new(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Ok(Some(ini))
    }

    /// Config file values overridden by command line flags.
    fn evaluation_config(&self, ini: Option<&IniFile>) -> Result<EvaluationConfig> {
        let mut config = match ini {
            Some(ini) => EvaluationConfig::from_ini(ini)?,
            None => EvaluationConfig::default(),
        };
        if let Some(v) = self.cutoff_distance {
            config.cutoff_distance = v;
        }
        if let Some(v) = self.cutoff_iou {
            config.cutoff_iou = v;
        }
        if let Some(v) = self.ignored_frame_size {
            config.ignored_frame_size = v;
        }
        if let Some(size) = self.image_size {
            config.image_size = Some(size);
        }
        config.validate()?;
        Ok(config)
    }

    fn init_logging(&self, ini: Option<&IniFile>) -> Result<()> {
        let configured = match ini.and_then(|ini| ini.get("debug", "verbosity")) {
            Some(v) => v
                .trim()
                .parse::<u8>()
                .with_context(|| format!("invalid [debug] verbosity '{}'", v))?,
            None => 0,
        };
        let log_level = match self.verbose.max(configured) {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        if !self.quiet {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
        }
        Ok(())
    }

    fn run(&self) -> Result<()> {
        let ini = self.config_file()?;
        self.init_logging(ini.as_ref())?;
        debug!("Arguments: {:?}", self);

        let config = self.evaluation_config(ini.as_ref())?;
        debug!("Configuration: {:?}", config);

        let gt_parser = parser_by_symbol(&self.ground_truth_parser)?;
        let results_parser = parser_by_symbol(&self.results_parser)?;

        let ground_truth = load_frames(gt_parser.as_ref(), &self.ground_truth)
            .with_context(|| format!("failed to read ground truth {}", self.ground_truth.display()))?;
        let segmentation_ground_truth = match &self.ground_truth_segmentation {
            Some(path) => Some(
                load_frames(gt_parser.as_ref(), path)
                    .with_context(|| format!("failed to read segmentation ground truth {}", path.display()))?,
            ),
            None => None,
        };
        let results = load_results(results_parser.as_ref(), &self.results)
            .with_context(|| format!("failed to read results {}", self.results.display()))?;

        let mode = if self.seg_only {
            EvaluationMode::SegmentationOnly
        } else {
            EvaluationMode::Full
        };
        let report = evaluate_sequence_split(
            segmentation_ground_truth.as_ref().unwrap_or(&ground_truth),
            &ground_truth,
            &results,
            &config,
            mode,
        )?;

        let writer = ReportWriter::new(&self.results, &self.name).with_details(config.output_evaluation_details);
        writer.write(&report)?;
        info!("Evaluation of {} finished", self.name);

        if self.stdout {
            println!("{}", evalplatform_rs::format_summary(&self.name, &report));
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    Cli::parse().run()
}
