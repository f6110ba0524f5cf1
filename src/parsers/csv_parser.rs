//! Parsers reading one object per CSV row.

use std::collections::HashMap;
use std::path::Path;

use log::warn;

use super::{parse_float, parse_frame, parse_i32, parse_integer, ObjectParser};
use crate::object::DetectedObject;
use crate::{Error, Result};

/// Supported row layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFormat {
    /// `PLATFORM_DEF`: header-driven, `Frame_number, Cell_number, Position_X, Position_Y`
    /// plus optional `Cell_colour` and `Unique_cell_number`.
    PlatformDefault,
    /// `OLDGT`: frame, cell, [colour], x, y; with a header the cell number is the track id.
    OldGroundTruth,
    /// `CP`: frame, cell, [colour], x, y.
    CellProfiler,
    /// `TR`: frame, cell, x, y; the cell number is the track id.
    Tracker,
    /// `CPTS2`: frame, cell, x, y; the cell number is the track id.
    CellProfilerTrackingTs2,
    /// `CID`: tab separated cell, frame (0-based), _, x, y; the cell number is the track id.
    CellId,
    /// `CS`: frame name, cell, x, y; frame names are numbered in order of appearance.
    CellSerpent,
}

impl CsvFormat {
    pub fn symbol(&self) -> &'static str {
        match self {
            CsvFormat::PlatformDefault => "PLATFORM_DEF",
            CsvFormat::OldGroundTruth => "OLDGT",
            CsvFormat::CellProfiler => "CP",
            CsvFormat::Tracker => "TR",
            CsvFormat::CellProfilerTrackingTs2 => "CPTS2",
            CsvFormat::CellId => "CID",
            CsvFormat::CellSerpent => "CS",
        }
    }
}

/// Column positions of one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub frame: usize,
    pub cell: usize,
    pub x: usize,
    pub y: usize,
    pub colour: Option<usize>,
    pub unique_id: Option<usize>,
}

impl ColumnMap {
    const fn plain(unique_id: Option<usize>) -> Self {
        Self {
            frame: 0,
            cell: 1,
            x: 2,
            y: 3,
            colour: None,
            unique_id,
        }
    }

    const fn coloured(unique_id: Option<usize>) -> Self {
        Self {
            frame: 0,
            cell: 1,
            x: 3,
            y: 4,
            colour: Some(2),
            unique_id,
        }
    }

    fn width(&self) -> usize {
        [self.frame, self.cell, self.x, self.y]
            .into_iter()
            .chain(self.colour)
            .chain(self.unique_id)
            .max()
            .unwrap_or(0)
            + 1
    }
}

const PLATFORM_REQUIRED: [&str; 4] = ["frame_number", "cell_number", "position_x", "position_y"];
const PLATFORM_OPTIONAL: [&str; 2] = ["cell_colour", "unique_cell_number"];

/// Parser for the CSV row layouts.
#[derive(Debug, Clone)]
pub struct CsvObjectParser {
    format: CsvFormat,
}

impl CsvObjectParser {
    pub fn new(format: CsvFormat) -> Self {
        Self { format }
    }

    /// Parse CSV content held in memory.
    pub fn parse_str(&self, content: &str) -> Result<Vec<DetectedObject>> {
        let Some(first_line) = content.lines().find(|l| !l.trim().is_empty()) else {
            return Ok(Vec::new());
        };

        let delimiter = match self.format {
            CsvFormat::CellId => b'\t',
            _ => sniff_delimiter(first_line),
        };
        let mut records = read_records(content, delimiter)?;

        let has_header = records.first().map_or(false, |first| is_header(first));
        let header = if has_header { Some(records.remove(0)) } else { None };
        // Headerless files are always comma separated
        if header.is_none() && delimiter != b',' && self.format != CsvFormat::CellId {
            records = read_records(content, b',')?;
        }

        let map = self.column_map(header.as_deref(), first_line);
        let mut frame_names: HashMap<String, usize> = HashMap::new();
        let line_offset = if header.is_some() { 2 } else { 1 };

        records
            .iter()
            .enumerate()
            .map(|(i, record)| self.parse_record(record, &map, &mut frame_names, i + line_offset))
            .collect()
    }

    fn column_map(&self, header: Option<&[String]>, raw_header: &str) -> ColumnMap {
        let has_colour = header.is_some()
            && (raw_header.contains("Cell_colour") || raw_header.contains("Features_Colour"));
        match self.format {
            CsvFormat::PlatformDefault => match header {
                Some(columns) => platform_column_map(columns, raw_header),
                None => ColumnMap::plain(None),
            },
            // Without a header the cell number is not a track id
            CsvFormat::OldGroundTruth if header.is_none() => ColumnMap::plain(None),
            CsvFormat::OldGroundTruth if has_colour => ColumnMap::coloured(Some(1)),
            CsvFormat::OldGroundTruth => ColumnMap::plain(Some(1)),
            CsvFormat::CellProfiler if has_colour => ColumnMap::coloured(None),
            CsvFormat::CellProfiler | CsvFormat::CellSerpent => ColumnMap::plain(None),
            CsvFormat::Tracker | CsvFormat::CellProfilerTrackingTs2 => ColumnMap::plain(Some(1)),
            CsvFormat::CellId => ColumnMap {
                frame: 1,
                cell: 0,
                x: 3,
                y: 4,
                colour: None,
                unique_id: Some(0),
            },
        }
    }

    fn parse_record(
        &self,
        record: &[String],
        map: &ColumnMap,
        frame_names: &mut HashMap<String, usize>,
        line: usize,
    ) -> Result<DetectedObject> {
        if record.len() < map.width() {
            return Err(Error::Parse(format!(
                "line {}: expected at least {} columns, got {}",
                line,
                map.width(),
                record.len()
            )));
        }

        let frame = match self.format {
            CsvFormat::CellSerpent => {
                let next = frame_names.len() + 1;
                *frame_names.entry(record[map.frame].clone()).or_insert(next)
            }
            CsvFormat::CellId => parse_frame(&record[map.frame], line)? + 1,
            _ => parse_frame(&record[map.frame], line)?,
        };
        let cell = parse_integer(&record[map.cell], "cell number", line)?;
        let x = parse_float(&record[map.x], "x position", line)?;
        let y = parse_float(&record[map.y], "y position", line)?;

        let mut object = DetectedObject::new(frame, cell, x, y);
        if let Some(column) = map.colour {
            object.tag = parse_i32(&record[column], "colour", line)?;
        }
        if let Some(column) = map.unique_id {
            let unique_id = parse_integer(&record[column], "unique id", line)?;
            if unique_id != -1 {
                object.track_id = Some(unique_id);
            }
        }
        Ok(object)
    }
}

impl ObjectParser for CsvObjectParser {
    fn symbol(&self) -> &'static str {
        self.format.symbol()
    }

    fn load_from_file(&self, path: &Path) -> Result<Vec<DetectedObject>> {
        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content)
    }
}

/// `;` when the line holds more semicolons than commas, `,` otherwise.
pub(crate) fn sniff_delimiter(line: &str) -> u8 {
    if line.matches(';').count() > line.matches(',').count() {
        b';'
    } else {
        b','
    }
}

/// All records with trimmed fields. Blank lines are skipped.
pub(crate) fn read_records(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}

/// A row is a header when none of its fields is a number.
pub(crate) fn is_header(record: &[String]) -> bool {
    record
        .iter()
        .all(|field| field.replace(',', ".").parse::<f64>().is_err())
}

fn platform_column_map(columns: &[String], raw_header: &str) -> ColumnMap {
    let names: Vec<String> = columns.iter().map(|c| c.trim().to_lowercase()).collect();
    let known = |name: &String| {
        PLATFORM_REQUIRED.contains(&name.as_str()) || PLATFORM_OPTIONAL.contains(&name.as_str())
    };
    let position = |name: &str| names.iter().position(|n| n == name);

    let conforming = names.iter().all(known) && PLATFORM_REQUIRED.iter().all(|r| position(r).is_some());
    if let (true, Some(frame), Some(cell), Some(x), Some(y)) = (
        conforming,
        position("frame_number"),
        position("cell_number"),
        position("position_x"),
        position("position_y"),
    ) {
        return ColumnMap {
            frame,
            cell,
            x,
            y,
            colour: position("cell_colour"),
            unique_id: position("unique_cell_number"),
        };
    }

    let map = if raw_header.contains("Cell_colour") {
        if raw_header.contains("Unique_cell_number") {
            ColumnMap::coloured(Some(5))
        } else {
            ColumnMap::coloured(None)
        }
    } else if raw_header.contains("Unique_cell_number") || names.len() == 5 {
        ColumnMap::plain(Some(4))
    } else {
        ColumnMap::plain(None)
    };
    warn!(
        "File header {:?} does not comply with the expected headers list, using default mapping {:?}",
        names, map
    );
    map
}
