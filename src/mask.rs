//! Pixel masks of objects read from label or mask images.

use nalgebra::DMatrix;

use crate::{Error, Result};

/// Axis-aligned bounding box of a mask, in pixel rows and columns.
///
/// Covers rows `top..top + height` and columns `left..left + width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskBounds {
    pub top: usize,
    pub left: usize,
    pub height: usize,
    pub width: usize,
}

impl MaskBounds {
    pub fn new(top: usize, left: usize, height: usize, width: usize) -> Self {
        Self {
            top,
            left,
            height,
            width,
        }
    }

    pub fn bottom(&self) -> usize {
        self.top + self.height
    }

    pub fn right(&self) -> usize {
        self.left + self.width
    }

    /// Overlapping region of two boxes, `None` when they do not intersect.
    pub fn intersection(&self, other: &MaskBounds) -> Option<MaskBounds> {
        let top = self.top.max(other.top);
        let left = self.left.max(other.left);
        let bottom = self.bottom().min(other.bottom());
        let right = self.right().min(other.right());

        if top >= bottom || left >= right {
            return None;
        }
        Some(MaskBounds::new(top, left, bottom - top, right - left))
    }
}

/// Boolean raster of an object together with its placement in the image.
///
/// `pixels` has `bounds.height` rows and `bounds.width` columns; pixel `(r, c)`
/// corresponds to image pixel `(bounds.top + r, bounds.left + c)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMask {
    bounds: MaskBounds,
    pixels: DMatrix<bool>,
    area: usize,
}

impl ObjectMask {
    /// Create a mask, rejecting pixel grids that do not match the bounds.
    pub fn new(bounds: MaskBounds, pixels: DMatrix<bool>) -> Result<Self> {
        if pixels.nrows() != bounds.height || pixels.ncols() != bounds.width {
            return Err(Error::InvalidObject(format!(
                "mask of shape ({}, {}) does not match bounds {}x{}",
                pixels.nrows(),
                pixels.ncols(),
                bounds.height,
                bounds.width
            )));
        }
        let area = pixels.iter().filter(|&&p| p).count();
        Ok(Self {
            bounds,
            pixels,
            area,
        })
    }

    /// Build the mask of every pixel for which `inside(row, col)` holds within `bounds`.
    pub fn from_fn<F>(bounds: MaskBounds, mut inside: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        let pixels = DMatrix::from_fn(bounds.height, bounds.width, |r, c| {
            inside(bounds.top + r, bounds.left + c)
        });
        let area = pixels.iter().filter(|&&p| p).count();
        Self {
            bounds,
            pixels,
            area,
        }
    }

    pub fn bounds(&self) -> &MaskBounds {
        &self.bounds
    }

    pub fn pixels(&self) -> &DMatrix<bool> {
        &self.pixels
    }

    /// Number of set pixels.
    pub fn area(&self) -> usize {
        self.area
    }

    /// Whether the image pixel at `(row, col)` belongs to the mask.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        if row < self.bounds.top
            || col < self.bounds.left
            || row >= self.bounds.bottom()
            || col >= self.bounds.right()
        {
            return false;
        }
        self.pixels[(row - self.bounds.top, col - self.bounds.left)]
    }

    /// Number of image pixels set in both masks.
    pub fn intersection(&self, other: &ObjectMask) -> usize {
        let Some(overlap) = self.bounds.intersection(&other.bounds) else {
            return 0;
        };

        let mut count = 0;
        for row in overlap.top..overlap.bottom() {
            for col in overlap.left..overlap.right() {
                if self.contains(row, col) && other.contains(row, col) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Intersection over union; zero when the bounding boxes are disjoint or both masks are empty.
    pub fn iou(&self, other: &ObjectMask) -> f64 {
        let intersection = self.intersection(other);
        let union = self.area + other.area - intersection;
        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }
}
