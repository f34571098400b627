//! Icon rasterization: stage, measure, fit and capture
//!
//! A graphic is dropped into an otherwise empty `V x V` transparent page,
//! measured as the browser actually lays it out (filters, strokes and
//! transforms included), scaled uniformly so its longer side spans
//! `V * occupancy`, centered, and captured.

use crate::geometry::{compute_placement, Clip};
use crate::viewbox::ensure_view_box;
use crate::{Error, HarvestConfig, RasterImage, RawGraphic, RenderOracle, Result};
use log::debug;

/// Selector of the staged graphic inside [`stage_document`].
pub const STAGED_SELECTOR: &str = "#stage > svg";

/// Build the page a graphic is measured and captured in.
pub fn stage_document(markup: &str, canvas: u32) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
html, body {{ margin: 0; padding: 0; width: {v}px; height: {v}px; overflow: hidden; background: transparent; }}
#stage {{ position: relative; width: {v}px; height: {v}px; }}
#stage > svg {{ position: absolute; left: 0; top: 0; display: block; transform-origin: 0 0; }}
</style>
</head>
<body><div id="stage">{markup}</div></body>
</html>"#,
        v = canvas,
        markup = markup
    )
}

/// Render `graphic` to a `canvas_size x canvas_size` transparent PNG.
pub fn rasterize<O: RenderOracle>(oracle: &mut O, config: &HarvestConfig, graphic: &RawGraphic) -> Result<RasterImage> {
    let canvas = config.canvas_size;
    let markup = ensure_view_box(&graphic.markup, config.default_view_box)?;

    oracle.set_viewport(config.canvas_viewport())?;
    oracle.set_content(&stage_document(&markup, canvas))?;
    oracle.wait_for_layout()?;

    let bbox = oracle.measure(STAGED_SELECTOR)?;
    let placement = compute_placement(bbox, canvas, config.occupancy)?;
    debug!(
        "{}: measured {:.2}x{:.2}, scale {:.4}, offset ({:.2}, {:.2})",
        graphic.slug, bbox.width, bbox.height, placement.scale, placement.offset_x, placement.offset_y
    );

    oracle.apply_placement(STAGED_SELECTOR, &placement)?;
    oracle.wait_for_layout()?;

    let png_data = oracle.screenshot(Clip::square(canvas), true)?;
    let (width, height) = png_dimensions(&png_data)?;
    if width != canvas || height != canvas {
        return Err(Error::RenderError(format!(
            "capture is {}x{}, expected {}x{}",
            width, height, canvas, canvas
        )));
    }

    Ok(RasterImage {
        slug: graphic.slug.clone(),
        width,
        height,
        png_data,
    })
}

fn png_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if data.is_empty() {
        return Err(Error::RenderError("capture returned no data".into()));
    }
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| Error::RenderError(format!("capture is not a valid PNG: {}", e)))?;
    Ok((decoded.width(), decoded.height()))
}
