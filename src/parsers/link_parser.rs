//! Parsers for outputs that link each object to its parent in the previous frame.
//!
//! Rows hold frame, cell number, x, y and the parent's cell number (`0` for a new object).
//! Track ids are assigned by following the parent chain; a parent that already passed its
//! identity on starts a new track for every further child.

use std::collections::HashMap;
use std::path::Path;

use log::warn;

use super::csv_parser::{is_header, read_records};
use super::{parse_float, parse_frame, parse_integer, ObjectParser};
use crate::object::DetectedObject;
use crate::{Error, Result};

/// Supported link layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFormat {
    /// `CT`: parent in column 4
    CellTracer,
    /// `CSTAR`: parent in column 4
    CellStar,
    /// `CPT`: parent in column 12
    CellProfilerTracking,
}

impl LinkFormat {
    pub fn symbol(&self) -> &'static str {
        match self {
            LinkFormat::CellTracer => "CT",
            LinkFormat::CellStar => "CSTAR",
            LinkFormat::CellProfilerTracking => "CPT",
        }
    }

    fn parent_column(&self) -> usize {
        match self {
            LinkFormat::CellTracer | LinkFormat::CellStar => 4,
            LinkFormat::CellProfilerTracking => 12,
        }
    }
}

struct LinkRow {
    frame: usize,
    cell: i64,
    x: f64,
    y: f64,
    parent: i64,
}

/// Parser for the link layouts.
#[derive(Debug, Clone)]
pub struct LinkObjectParser {
    format: LinkFormat,
}

impl LinkObjectParser {
    pub fn new(format: LinkFormat) -> Self {
        Self { format }
    }

    /// Parse link CSV content held in memory.
    pub fn parse_str(&self, content: &str) -> Result<Vec<DetectedObject>> {
        let mut records = read_records(content, b',')?;
        let line_offset = if records.first().map_or(false, |r| is_header(r)) {
            records.remove(0);
            2
        } else {
            1
        };

        let rows = records
            .iter()
            .enumerate()
            .map(|(i, record)| self.parse_row(record, i + line_offset))
            .collect::<Result<Vec<_>>>()?;

        Ok(assign_track_ids(&rows))
    }

    fn parse_row(&self, record: &[String], line: usize) -> Result<LinkRow> {
        let parent_column = self.format.parent_column();
        if record.len() <= parent_column {
            return Err(Error::Parse(format!(
                "line {}: expected at least {} columns, got {}",
                line,
                parent_column + 1,
                record.len()
            )));
        }
        Ok(LinkRow {
            frame: parse_frame(&record[0], line)?,
            cell: parse_integer(&record[1], "cell number", line)?,
            x: parse_float(&record[2], "x position", line)?,
            y: parse_float(&record[3], "y position", line)?,
            parent: parse_integer(&record[parent_column], "parent cell number", line)?,
        })
    }
}

/// Follow parent links through consecutive frame groups, numbering tracks from 1.
fn assign_track_ids(rows: &[LinkRow]) -> Vec<DetectedObject> {
    let mut objects = Vec::with_capacity(rows.len());
    let mut next_id = 1;
    let mut splits = 0;

    // cell number -> track id, for the previous and the current frame group
    let mut last_cells: HashMap<i64, i64> = HashMap::new();
    let mut new_cells: HashMap<i64, i64> = HashMap::new();
    let mut current_frame = None;

    for row in rows {
        if current_frame != Some(row.frame) {
            last_cells = std::mem::take(&mut new_cells);
            current_frame = Some(row.frame);
        }

        let track_id = if row.parent == 0 {
            next_id += 1;
            next_id - 1
        } else if let Some(&parent_track) = last_cells.get(&row.parent) {
            if new_cells.values().any(|&t| t == parent_track) {
                splits += 1;
                next_id += 1;
                next_id - 1
            } else {
                parent_track
            }
        } else {
            warn!(
                "Cell {} in frame {} names parent {} missing from the previous frame, skipping",
                row.cell, row.frame, row.parent
            );
            continue;
        };

        new_cells.insert(row.cell, track_id);
        objects.push(DetectedObject::new(row.frame, track_id, row.x, row.y).with_track_id(track_id));
    }

    if splits > 0 {
        warn!("Number of splits (each starting a new track): {}", splits);
    }
    objects
}

impl ObjectParser for LinkObjectParser {
    fn symbol(&self) -> &'static str {
        self.format.symbol()
    }

    fn load_from_file(&self, path: &Path) -> Result<Vec<DetectedObject>> {
        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content)
    }
}
