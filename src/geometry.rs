//! Canvas geometry: uniform scale and centering of a measured box

use crate::{Error, Result};

/// Rendered element box in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct BoundingBox {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self { x: 0.0, y: 0.0, width, height }
    }
}

/// Screen region to capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Clip {
    /// The square `size x size` region anchored at the page origin.
    pub fn square(size: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: f64::from(size),
            height: f64::from(size),
        }
    }
}

/// Where and how large a staged element is drawn on the canvas
///
/// `offset_x`/`offset_y` position the unscaled element's top-left corner; with
/// a top-left transform origin the scaled box then sits centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scaled_width: f64,
    pub scaled_height: f64,
}

/// Fit `bbox` into a `canvas x canvas` square so its longer side covers
/// `occupancy` of the canvas, preserving aspect ratio, centered on both axes.
///
/// A zero, negative or non-finite dimension yields
/// [`Error::DegenerateGraphic`].
pub fn compute_placement(bbox: BoundingBox, canvas: u32, occupancy: f64) -> Result<Placement> {
    let (w, h) = (bbox.width, bbox.height);
    if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
        return Err(Error::DegenerateGraphic { width: w, height: h });
    }

    let canvas = f64::from(canvas);
    let scale = (canvas * occupancy) / w.max(h);
    let scaled_width = w * scale;
    let scaled_height = h * scale;

    Ok(Placement {
        scale,
        offset_x: (canvas - scaled_width) / 2.0,
        offset_y: (canvas - scaled_height) / 2.0,
        scaled_width,
        scaled_height,
    })
}
