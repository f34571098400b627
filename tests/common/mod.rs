//! In-memory rendering oracle shared by the integration tests

#![allow(dead_code)]

use iconharvest::{
    BoundingBox, Clip, Error, GraphicCandidate, Placement, RenderOracle, Result, Viewport,
};
use scraper::{Html, Selector};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

pub const BASE: &str = "http://catalogue.test/";

/// A page the fake browser can navigate to
#[derive(Debug, Clone)]
pub enum FakePage {
    /// Listing page: raw html
    Listing(String),
    /// Item page: the rendered svgs on it, in document order
    Item(Vec<GraphicCandidate>),
}

/// Oracle that "renders" staged svgs at their `width`/`height` attributes and
/// captures a real PNG with the placed box filled opaque.
#[derive(Default)]
pub struct FakeOracle {
    pages: HashMap<String, FakePage>,
    current: Option<FakePage>,
    staged: Option<String>,
    placement: Option<Placement>,
    pub viewports: Vec<Viewport>,
    pub staged_documents: Vec<String>,
    closed: Rc<Cell<bool>>,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays readable after the oracle is consumed by `close`.
    pub fn closed_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.closed)
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn with_listing(self, html: &str) -> Self {
        self.with_page(BASE, FakePage::Listing(html.to_string()))
    }

    pub fn with_item(self, slug: &str, graphics: Vec<GraphicCandidate>) -> Self {
        self.with_page(&format!("{}{}", BASE, slug), FakePage::Item(graphics))
    }

    fn staged_svg_size(&self) -> Option<(f64, f64)> {
        let doc = Html::parse_document(self.staged.as_deref()?);
        let sel = Selector::parse("#stage > svg").ok()?;
        let svg = doc.select(&sel).next()?;
        let dim = |name: &str| svg.value().attr(name).and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
        Some((dim("width"), dim("height")))
    }
}

pub fn svg(width: f64, height: f64) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}"><rect width="10" height="10"/></svg>"#,
        width, height
    )
}

pub fn candidate(width: f64, height: f64) -> GraphicCandidate {
    GraphicCandidate {
        width,
        height,
        markup: svg(width, height),
    }
}

impl RenderOracle for FakeOracle {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.staged = None;
        match self.pages.get(url) {
            Some(page) => {
                self.current = Some(page.clone());
                Ok(())
            }
            None => Err(Error::LoadError(format!("Navigation to {} failed: 404", url))),
        }
    }

    fn page_html(&mut self) -> Result<String> {
        match &self.current {
            Some(FakePage::Listing(html)) => Ok(html.clone()),
            Some(FakePage::Item(_)) => Ok("<html><body></body></html>".into()),
            None => Err(Error::RenderError("No document loaded".into())),
        }
    }

    fn wait_for_selector(&mut self, _selector: &str, timeout: Duration) -> Result<()> {
        match &self.current {
            Some(FakePage::Item(graphics)) if !graphics.is_empty() => Ok(()),
            _ => Err(Error::Timeout(timeout.as_millis() as u64)),
        }
    }

    fn query_graphics(&mut self, _selector: &str) -> Result<Vec<GraphicCandidate>> {
        match &self.current {
            Some(FakePage::Item(graphics)) => Ok(graphics.clone()),
            _ => Ok(Vec::new()),
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.viewports.push(viewport);
        Ok(())
    }

    fn set_content(&mut self, html: &str) -> Result<()> {
        self.current = None;
        self.placement = None;
        self.staged = Some(html.to_string());
        self.staged_documents.push(html.to_string());
        Ok(())
    }

    fn wait_for_layout(&mut self) -> Result<()> {
        Ok(())
    }

    fn measure(&mut self, selector: &str) -> Result<BoundingBox> {
        let (width, height) = self
            .staged_svg_size()
            .ok_or_else(|| Error::RenderError(format!("No element matches '{}'", selector)))?;
        Ok(BoundingBox::new(width, height))
    }

    fn apply_placement(&mut self, _selector: &str, placement: &Placement) -> Result<()> {
        self.placement = Some(*placement);
        Ok(())
    }

    fn screenshot(&mut self, clip: Clip, transparent: bool) -> Result<Vec<u8>> {
        let (w, h) = (clip.width as u32, clip.height as u32);
        let background = if transparent { [0, 0, 0, 0] } else { [255, 255, 255, 255] };
        let mut img = image::RgbaImage::from_pixel(w, h, image::Rgba(background));

        if let Some(p) = self.placement {
            let x0 = p.offset_x.round() as u32;
            let y0 = p.offset_y.round() as u32;
            let x1 = ((p.offset_x + p.scaled_width).round() as u32).min(w);
            let y1 = ((p.offset_y + p.scaled_height).round() as u32).min(h);
            for y in y0..y1 {
                for x in x0..x1 {
                    img.put_pixel(x, y, image::Rgba([20, 20, 20, 255]));
                }
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageOutputFormat::Png)
            .map_err(|e| Error::RenderError(format!("encode failed: {}", e)))?;
        Ok(buf.into_inner())
    }

    fn close(self) -> Result<()> {
        self.closed.set(true);
        Ok(())
    }
}
