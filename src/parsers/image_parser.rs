//! Parsers for label and mask images.

use std::collections::BTreeSet;
use std::path::Path;

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use nalgebra::DMatrix;

use super::ObjectParser;
use crate::mask::{MaskBounds, ObjectMask};
use crate::object::DetectedObject;
use crate::{Error, Result};

/// Supported image encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageFormat {
    /// Every distinct non-zero pixel value is one object.
    Label,
    /// Pixels of value `1` (obligatory) or one of `facultative` are split into 8-connected
    /// objects; facultative objects are tagged with their value. Other values are background.
    Mask { facultative: Vec<u32> },
}

/// Pixel values of a single-channel image, row by row.
struct LabelGrid {
    width: usize,
    height: usize,
    values: Vec<u32>,
}

impl LabelGrid {
    fn from_image(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let values = match image {
            DynamicImage::ImageLuma8(buffer) => buffer.into_raw().into_iter().map(u32::from).collect(),
            DynamicImage::ImageLuma16(buffer) => buffer.into_raw().into_iter().map(u32::from).collect(),
            other => other.to_luma8().into_raw().into_iter().map(u32::from).collect(),
        };
        Self {
            width: width as usize,
            height: height as usize,
            values,
        }
    }

    fn distinct_values(&self) -> BTreeSet<u32> {
        self.values.iter().copied().collect()
    }
}

/// Parser for label and mask images, or for list files naming one image per frame.
#[derive(Debug, Clone)]
pub struct ImageObjectParser {
    format: ImageFormat,
}

impl ImageObjectParser {
    pub fn new(format: ImageFormat) -> Self {
        Self { format }
    }

    /// Objects of a single image, assigned to `frame`.
    pub fn load_image(&self, frame: usize, path: &Path) -> Result<Vec<DetectedObject>> {
        let grid = LabelGrid::from_image(image::open(path)?);
        let (labels, tags) = match &self.format {
            ImageFormat::Label => relabel_values(&grid),
            ImageFormat::Mask { facultative } => mask_components(&grid, facultative),
        };
        objects_from_labels(frame, &grid, &labels, &tags)
    }

    /// Objects of every image named in a list file.
    ///
    /// The first line is a header; the n-th following line names the image of frame n in its
    /// second comma-separated field. Relative paths are resolved against the list file's directory.
    pub fn load_from_list(&self, path: &Path) -> Result<Vec<DetectedObject>> {
        let content = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let mut objects = Vec::new();
        for (frame, line) in content.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let image_path = line.split(',').nth(1).map(str::trim).ok_or_else(|| {
                Error::Parse(format!(
                    "line {} of {}: expected 'frame,image_path'",
                    frame + 1,
                    path.display()
                ))
            })?;
            objects.extend(self.load_image(frame, &base.join(image_path))?);
        }
        Ok(objects)
    }
}

impl ObjectParser for ImageObjectParser {
    fn symbol(&self) -> &'static str {
        match self.format {
            ImageFormat::Label => "LABEL",
            ImageFormat::Mask { .. } => "MASK",
        }
    }

    fn load_from_file(&self, path: &Path) -> Result<Vec<DetectedObject>> {
        let is_image = image::io::Reader::open(path)?
            .with_guessed_format()?
            .format()
            .is_some();
        if is_image {
            self.load_image(1, path)
        } else {
            self.load_from_list(path)
        }
    }
}

/// Map the sorted distinct non-zero values to labels `1..=n`. Every tag is 0.
fn relabel_values(grid: &LabelGrid) -> (Vec<u32>, Vec<i32>) {
    let values: Vec<u32> = grid.distinct_values().into_iter().filter(|&v| v != 0).collect();
    let labels = grid
        .values
        .iter()
        .map(|v| match values.binary_search(v) {
            Ok(index) => index as u32 + 1,
            Err(_) => 0,
        })
        .collect();
    (labels, vec![0; values.len()])
}

/// Label the 8-connected components of every relevant value, numbering consecutively.
fn mask_components(grid: &LabelGrid, facultative: &[u32]) -> (Vec<u32>, Vec<i32>) {
    let relevant = grid
        .distinct_values()
        .into_iter()
        .filter(|&v| v != 0 && (v == 1 || facultative.contains(&v)));

    let mut labels = vec![0u32; grid.values.len()];
    let mut tags = Vec::new();
    for value in relevant {
        let binary = GrayImage::from_fn(grid.width as u32, grid.height as u32, |x, y| {
            let pixel = grid.values[y as usize * grid.width + x as usize];
            Luma([if pixel == value { 255 } else { 0 }])
        });
        let components = connected_components(&binary, Connectivity::Eight, Luma([0u8]));

        let offset = tags.len() as u32;
        let mut count = 0;
        for (label, component) in labels.iter_mut().zip(components.pixels()) {
            let c = component.0[0];
            if c != 0 {
                *label = offset + c;
                count = count.max(c);
            }
        }
        let tag = if value > 1 { value as i32 } else { 0 };
        tags.extend(std::iter::repeat(tag).take(count as usize));
    }
    (labels, tags)
}

/// One object per label: centroid, bounding box and mask. `tags[l - 1]` is the tag of label `l`.
fn objects_from_labels(
    frame: usize,
    grid: &LabelGrid,
    labels: &[u32],
    tags: &[i32],
) -> Result<Vec<DetectedObject>> {
    let mut pixels_by_label: Vec<Vec<(usize, usize)>> = vec![Vec::new(); tags.len()];
    for (index, &label) in labels.iter().enumerate() {
        if label > 0 {
            pixels_by_label[label as usize - 1].push((index / grid.width, index % grid.width));
        }
    }

    let mut objects = Vec::new();
    for (i, pixels) in pixels_by_label.iter().enumerate() {
        if pixels.is_empty() {
            continue;
        }

        let n = pixels.len() as f64;
        let cx = pixels.iter().map(|&(_, col)| col as f64).sum::<f64>() / n;
        let cy = pixels.iter().map(|&(row, _)| row as f64).sum::<f64>() / n;

        let top = pixels.iter().map(|&(row, _)| row).min().unwrap_or(0);
        let bottom = pixels.iter().map(|&(row, _)| row).max().unwrap_or(0);
        let left = pixels.iter().map(|&(_, col)| col).min().unwrap_or(0);
        let right = pixels.iter().map(|&(_, col)| col).max().unwrap_or(0);
        let bounds = MaskBounds::new(top, left, bottom - top + 1, right - left + 1);

        let mut raster = DMatrix::from_element(bounds.height, bounds.width, false);
        for &(row, col) in pixels {
            raster[(row - top, col - left)] = true;
        }

        let object = DetectedObject::new(frame, i as i64 + 1, cx, cy)
            .with_tag(tags[i])
            .with_mask(ObjectMask::new(bounds, raster)?);
        objects.push(object);
    }
    Ok(objects)
}
