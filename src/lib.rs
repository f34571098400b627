//! Icon harvester
//!
//! Crawls an icon catalogue with a headless browser, pulls the inline SVG
//! from every item page and rasterizes it to a fixed-size transparent PNG in
//! which the icon is scaled uniformly and centered.
//!
//! # Pipeline
//!
//! - **Collector** ([`collector`]): listing page -> set of [`Slug`]s
//! - **Extractor** ([`extractor`]): slug -> largest rendered `<svg>` on its page
//! - **Rasterizer** ([`rasterizer`]): raw markup -> `V x V` PNG
//!
//! Every stage talks to the browser through the [`RenderOracle`] trait so the
//! pipeline can be driven by headless Chrome (feature `cdp`, default) or by an
//! in-memory fake in tests.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "cdp")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use iconharvest::{GraphicStore, HarvestConfig, RenderOracle};
//!
//! let config = HarvestConfig {
//!     canvas_size: 512,
//!     occupancy: 0.85,
//!     ..Default::default()
//! };
//!
//! let mut oracle = iconharvest::cdp::CdpOracle::launch(&config)?;
//! let store = GraphicStore::new(&config.raw_dir, &config.png_dir);
//! let report = iconharvest::pipeline::run(&mut oracle, &config, &store);
//! oracle.close()?;
//! println!("rendered {} icons", report?.rendered.len());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "cdp"))]
//! # fn main() {}
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod collector;
pub mod extractor;
pub mod geometry;
pub mod pipeline;
pub mod rasterizer;
pub mod store;
pub mod viewbox;

// Chrome DevTools Protocol backend
#[cfg(feature = "cdp")]
pub mod cdp;

pub use collector::Slug;
pub use geometry::{BoundingBox, Clip, Placement};
pub use pipeline::{RunReport, SkippedItem, Stage};
pub use store::GraphicStore;
pub use viewbox::ViewBox;

/// Catalogue listing page crawled when no start URL is given.
pub const DEFAULT_START_URL: &str = "https://icons.example.com/";

/// Configuration for a harvest run
///
/// The defaults are the compiled-in constants used when the binary is run
/// without flags. `validate` is called by [`pipeline::run`] before any
/// browser work happens.
///
/// # Examples
///
/// ```
/// let cfg = iconharvest::HarvestConfig::default();
/// assert_eq!(cfg.canvas_size, 1024);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Listing page; item pages are resolved relative to it
    pub start_url: String,
    /// Directory receiving `{slug}.svg`
    pub raw_dir: PathBuf,
    /// Directory receiving `{slug}.png` and the run manifest
    pub png_dir: PathBuf,
    /// Side of the square output canvas in pixels (`V`)
    pub canvas_size: u32,
    /// Fraction of the canvas the longer icon axis fills (`O`, 0 < O <= 1)
    pub occupancy: f64,
    /// Rendered svgs narrower than this are ignored by the extractor
    pub min_width: f64,
    /// Frame injected into markup that carries no `viewBox`
    pub default_view_box: ViewBox,
    /// Viewport used while crawling listing and item pages
    pub listing_viewport: Viewport,
    /// Bound on waiting for an svg to appear on an item page
    pub element_timeout_ms: u64,
    /// Bound on a single page navigation
    pub navigation_timeout_ms: u64,
    /// User agent sent by the browser
    pub user_agent: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            raw_dir: PathBuf::from("svgs"),
            png_dir: PathBuf::from("pngs"),
            canvas_size: 1024,
            occupancy: 0.9,
            min_width: 100.0,
            default_view_box: ViewBox::default(),
            listing_viewport: Viewport::default(),
            element_timeout_ms: 15000,
            navigation_timeout_ms: 30000,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
        }
    }
}

impl HarvestConfig {
    /// Check the numeric invariants the rasterizer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.canvas_size == 0 {
            return Err(Error::ConfigError("canvas size must be positive".into()));
        }
        if !(self.occupancy > 0.0 && self.occupancy <= 1.0) {
            return Err(Error::ConfigError(format!(
                "occupancy must be in (0, 1], got {}",
                self.occupancy
            )));
        }
        if !self.min_width.is_finite() || self.min_width < 0.0 {
            return Err(Error::ConfigError(format!("invalid minimum width {}", self.min_width)));
        }
        if !(self.default_view_box.width > 0.0 && self.default_view_box.height > 0.0) {
            return Err(Error::ConfigError(format!(
                "default view box must be positive, got {}",
                self.default_view_box
            )));
        }
        url::Url::parse(&self.start_url)
            .map_err(|e| Error::ConfigError(format!("invalid start URL '{}': {}", self.start_url, e)))?;
        Ok(())
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Viewport used while staging and capturing one icon.
    pub fn canvas_viewport(&self) -> Viewport {
        Viewport {
            width: self.canvas_size,
            height: self.canvas_size,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// One rendered `<svg>` element observed on a page
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct GraphicCandidate {
    /// Rendered width in CSS pixels
    pub width: f64,
    /// Rendered height in CSS pixels
    pub height: f64,
    /// Serialized outer markup
    pub markup: String,
}

impl GraphicCandidate {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// The markup of one icon, keyed by its slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGraphic {
    pub slug: Slug,
    pub markup: String,
}

/// A captured `width x height` transparent PNG
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub slug: Slug,
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// Capabilities the pipeline needs from a browser
///
/// One value of this trait is the single rendering session of a run. It is
/// passed by `&mut` to each stage and reconfigured between phases (listing
/// viewport while crawling, `V x V` while rasterizing).
pub trait RenderOracle {
    /// Navigate to `url` and wait until the page has loaded
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Serialized DOM of the current page
    fn page_html(&mut self) -> Result<String>;

    /// Wait until at least one element matches `selector`, or fail with
    /// [`Error::Timeout`]
    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Rendered geometry and outer markup of every match, in document order
    fn query_graphics(&mut self, selector: &str) -> Result<Vec<GraphicCandidate>>;

    /// Resize the layout viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Replace the current document with `html`
    fn set_content(&mut self, html: &str) -> Result<()>;

    /// Block until pending layout and paint for the current document settled
    fn wait_for_layout(&mut self) -> Result<()>;

    /// Rendered bounding box of the first element matching `selector`
    fn measure(&mut self, selector: &str) -> Result<BoundingBox>;

    /// Position and scale the element matching `selector`
    fn apply_placement(&mut self, selector: &str, placement: &Placement) -> Result<()>;

    /// Capture `clip` as PNG bytes, optionally without a background fill
    fn screenshot(&mut self, clip: Clip, transparent: bool) -> Result<Vec<u8>>;

    /// Release the browser session
    fn close(self) -> Result<()>
    where
        Self: Sized;
}
