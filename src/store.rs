//! On-disk layout of harvested graphics and rendered images

use crate::{RasterImage, RawGraphic, Result, RunReport, Slug};
use std::fs;
use std::path::{Path, PathBuf};

pub const RAW_EXTENSION: &str = "svg";
pub const IMAGE_EXTENSION: &str = "png";
pub const MANIFEST_FILE: &str = "manifest.json";

/// `{raw_dir}/{slug}.svg` and `{png_dir}/{slug}.png`
#[derive(Debug, Clone)]
pub struct GraphicStore {
    raw_dir: PathBuf,
    png_dir: PathBuf,
}

impl GraphicStore {
    pub fn new(raw_dir: impl Into<PathBuf>, png_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            png_dir: png_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn png_dir(&self) -> &Path {
        &self.png_dir
    }

    /// Create both output directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.raw_dir)?;
        fs::create_dir_all(&self.png_dir)?;
        Ok(())
    }

    pub fn graphic_path(&self, slug: &Slug) -> PathBuf {
        self.raw_dir.join(format!("{}.{}", slug, RAW_EXTENSION))
    }

    pub fn image_path(&self, slug: &Slug) -> PathBuf {
        self.png_dir.join(format!("{}.{}", slug, IMAGE_EXTENSION))
    }

    /// Write the markup verbatim.
    pub fn save_graphic(&self, graphic: &RawGraphic) -> Result<PathBuf> {
        let path = self.graphic_path(&graphic.slug);
        fs::write(&path, graphic.markup.as_bytes())?;
        Ok(path)
    }

    /// Read back the markup saved for `slug`.
    pub fn load_graphic(&self, slug: &Slug) -> Result<RawGraphic> {
        let markup = fs::read_to_string(self.graphic_path(slug))?;
        Ok(RawGraphic {
            slug: slug.clone(),
            markup,
        })
    }

    pub fn save_image(&self, image: &RasterImage) -> Result<PathBuf> {
        let path = self.image_path(&image.slug);
        fs::write(&path, &image.png_data)?;
        Ok(path)
    }

    /// Write the run report as pretty JSON next to the images.
    pub fn write_manifest(&self, report: &RunReport) -> Result<PathBuf> {
        let path = self.png_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| crate::Error::Other(format!("Failed to serialize manifest: {}", e)))?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
