//! Readers turning third-party segmentation and tracking outputs into detected objects.
//!
//! - `CsvObjectParser` - one object per CSV row (`PLATFORM_DEF`, `OLDGT`, `CP`, `TR`, `CPTS2`, `CID`, `CS`)
//! - `LinkObjectParser` - rows naming their parent in the previous frame (`CT`, `CSTAR`, `CPT`)
//! - `ImageObjectParser` - label or mask images (`LABEL`, `MASK`)

mod csv_parser;
mod image_parser;
mod link_parser;

pub use csv_parser::{CsvFormat, CsvObjectParser};
pub use image_parser::{ImageFormat, ImageObjectParser};
pub use link_parser::{LinkFormat, LinkObjectParser};

use std::path::Path;

use log::{debug, info};

use crate::object::{group_by_frame, mark_all_obligatory, validate_frames, DetectedObject, FrameObjects};
use crate::{Error, Result};

/// Facultative values recognised by the `MASK` parser.
pub const DEFAULT_FACULTATIVE_VALUES: [u32; 2] = [2, 3];

/// Symbols of every supported input format.
pub const PARSER_SYMBOLS: [&str; 12] = [
    "PLATFORM_DEF",
    "OLDGT",
    "CP",
    "CPT",
    "CT",
    "CID",
    "TR",
    "CS",
    "CSTAR",
    "CPTS2",
    "LABEL",
    "MASK",
];

/// A reader for one input format.
pub trait ObjectParser: Send + Sync {
    /// Short name the format is selected by.
    fn symbol(&self) -> &'static str;

    /// Read every object stored at `path`.
    fn load_from_file(&self, path: &Path) -> Result<Vec<DetectedObject>>;
}

/// Parser for a format symbol, e.g. `PLATFORM_DEF` or `MASK`.
pub fn parser_by_symbol(symbol: &str) -> Result<Box<dyn ObjectParser>> {
    let parser: Box<dyn ObjectParser> = match symbol {
        "PLATFORM_DEF" => Box::new(CsvObjectParser::new(CsvFormat::PlatformDefault)),
        "OLDGT" => Box::new(CsvObjectParser::new(CsvFormat::OldGroundTruth)),
        "CP" => Box::new(CsvObjectParser::new(CsvFormat::CellProfiler)),
        "TR" => Box::new(CsvObjectParser::new(CsvFormat::Tracker)),
        "CPTS2" => Box::new(CsvObjectParser::new(CsvFormat::CellProfilerTrackingTs2)),
        "CID" => Box::new(CsvObjectParser::new(CsvFormat::CellId)),
        "CS" => Box::new(CsvObjectParser::new(CsvFormat::CellSerpent)),
        "CT" => Box::new(LinkObjectParser::new(LinkFormat::CellTracer)),
        "CSTAR" => Box::new(LinkObjectParser::new(LinkFormat::CellStar)),
        "CPT" => Box::new(LinkObjectParser::new(LinkFormat::CellProfilerTracking)),
        "LABEL" => Box::new(ImageObjectParser::new(ImageFormat::Label)),
        "MASK" => Box::new(ImageObjectParser::new(ImageFormat::Mask {
            facultative: DEFAULT_FACULTATIVE_VALUES.to_vec(),
        })),
        other => {
            return Err(Error::UnknownParser(format!(
                "'{}', supported: {}",
                other,
                PARSER_SYMBOLS.join(", ")
            )))
        }
    };
    Ok(parser)
}

/// Read a file and group its objects by frame.
///
/// Fails with `InvalidObject` when a frame holds the same local id twice.
pub fn load_frames<P: AsRef<Path>>(parser: &dyn ObjectParser, path: P) -> Result<FrameObjects> {
    let path = path.as_ref();
    info!("Reading {}...", path.display());
    debug!("Uses {} parser", parser.symbol());

    let frames = group_by_frame(parser.load_from_file(path)?);
    validate_frames(&frames)?;

    debug!(
        "Read {} objects in {} frames",
        frames.values().map(Vec::len).sum::<usize>(),
        frames.len()
    );
    Ok(frames)
}

/// Read algorithm results. Every object is treated as obligatory.
pub fn load_results<P: AsRef<Path>>(parser: &dyn ObjectParser, path: P) -> Result<FrameObjects> {
    let mut frames = load_frames(parser, path)?;
    mark_all_obligatory(&mut frames);
    Ok(frames)
}

/// Integer column value; accepts float notation such as `3.0` but no fractional part.
pub(crate) fn parse_integer(value: &str, column: &str, line: usize) -> Result<i64> {
    let value = value.trim();
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    let not_an_integer =
        || Error::Parse(format!("line {}: {} '{}' is not an integer", line, column, value));
    let float = value.parse::<f64>().map_err(|_| not_an_integer())?;
    // i64::MAX as f64 rounds up to 2^63, hence the exclusive upper bound
    if float.fract() != 0.0 || !(float >= i64::MIN as f64 && float < i64::MAX as f64) {
        return Err(not_an_integer());
    }
    Ok(float as i64)
}

/// Integer column value that must fit an `i32`, such as a colour tag.
pub(crate) fn parse_i32(value: &str, column: &str, line: usize) -> Result<i32> {
    let wide = parse_integer(value, column, line)?;
    i32::try_from(wide).map_err(|_| {
        Error::Parse(format!("line {}: {} {} is out of range", line, column, wide))
    })
}

/// Float column value; decimal commas are accepted.
pub(crate) fn parse_float(value: &str, column: &str, line: usize) -> Result<f64> {
    let value = value.trim();
    value.replace(',', ".").parse::<f64>().map_err(|_| {
        Error::Parse(format!("line {}: {} '{}' is not a number", line, column, value))
    })
}

pub(crate) fn parse_frame(value: &str, line: usize) -> Result<usize> {
    let frame = parse_integer(value, "frame", line)?;
    usize::try_from(frame)
        .map_err(|_| Error::Parse(format!("line {}: negative frame number {}", line, frame)))
}
