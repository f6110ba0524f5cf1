//! Evaluation configuration.
//!
//! - `EvaluationConfig` - immutable settings passed into every engine entry point
//! - `ImageSize` - image dimensions used by the border filter
//! - `IniFile` - reader for `evaluation.ini` files

mod ini_file;

pub use ini_file::IniFile;

use crate::{Error, Result};

/// Default name of the configuration file looked up by the command line tool.
pub const CONFIG_FILENAME: &str = "evaluation.ini";

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    /// Size used when the real image size is unknown; large enough that only the
    /// low edges can ever be near.
    pub const UNBOUNDED: ImageSize = ImageSize {
        width: 100_000.0,
        height: 100_000.0,
    };

    /// Create a validated image size.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        let size = Self { width, height };
        size.validate()?;
        Ok(size)
    }

    fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(Error::InvalidConfig(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl std::str::FromStr for ImageSize {
    type Err = Error;

    /// Parse `WIDTHxHEIGHT`, e.g. `1024x768`.
    fn from_str(s: &str) -> Result<Self> {
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::InvalidConfig(format!("image size '{}' is not WIDTHxHEIGHT", s)))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| Error::InvalidConfig(format!("image size '{}': {}", s, e)))
        };
        ImageSize::new(parse(width)?, parse(height)?)
    }
}

/// Settings of one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Maximum centre distance (pixels) for position-based matches. Matches need `distance < cutoff`.
    pub cutoff_distance: f64,

    /// Minimum mask overlap for mask-based matches. Matches need `iou > cutoff`.
    pub cutoff_iou: f64,

    /// Width (pixels) of the image margin whose objects are excluded from obligatory counts.
    pub ignored_frame_size: f64,

    /// Image size for the border filter; `None` uses `ImageSize::UNBOUNDED`.
    pub image_size: Option<ImageSize>,

    /// Evaluate the union of frames present in either input instead of the intersection.
    pub all_data_evaluated: bool,

    /// Write per-outcome detail files.
    pub output_evaluation_details: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            cutoff_distance: 30.0,
            cutoff_iou: 0.3,
            ignored_frame_size: 0.0,
            image_size: None,
            all_data_evaluated: false,
            output_evaluation_details: true,
        }
    }
}

impl EvaluationConfig {
    /// Start from defaults and override the values present in `[evaluation]`.
    pub fn from_ini(ini: &IniFile) -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = ini.get_f64("evaluation", "maxmatchdistance")? {
            config.cutoff_distance = v;
        }
        if let Some(v) = ini.get_f64("evaluation", "miniousimilarity")? {
            config.cutoff_iou = v;
        }
        if let Some(v) = ini.get_f64("evaluation", "ignoredframesize")? {
            config.ignored_frame_size = v;
        }
        if let Some(v) = ini.get_bool("evaluation", "alldataevaluated")? {
            config.all_data_evaluated = v;
        }
        if let Some(v) = ini.get_bool("evaluation", "outputevaluationdetails")? {
            config.output_evaluation_details = v;
        }

        let width = ini.get_f64("evaluation", "imagewidth")?;
        let height = ini.get_f64("evaluation", "imageheight")?;
        config.image_size = match (width, height) {
            (Some(w), Some(h)) => Some(ImageSize::new(w, h)?),
            (None, None) => None,
            _ => {
                return Err(Error::InvalidConfig(
                    "imagewidth and imageheight must be given together".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on settings that would make every evaluation meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.cutoff_distance.is_finite() && self.cutoff_distance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "cutoff_distance must be positive, got {}",
                self.cutoff_distance
            )));
        }
        if !(self.cutoff_iou.is_finite() && self.cutoff_iou > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "cutoff_iou must be positive, got {}",
                self.cutoff_iou
            )));
        }
        if !(self.ignored_frame_size.is_finite() && self.ignored_frame_size >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "ignored_frame_size must be non-negative, got {}",
                self.ignored_frame_size
            )));
        }
        if let Some(size) = &self.image_size {
            size.validate()?;
        }
        Ok(())
    }

    /// Image size used by the border filter.
    pub fn effective_image_size(&self) -> ImageSize {
        self.image_size.unwrap_or(ImageSize::UNBOUNDED)
    }
}
