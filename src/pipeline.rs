//! Sequential collect -> extract -> rasterize run

use crate::collector::collect_slugs;
use crate::extractor::extract_graphic;
use crate::rasterizer::rasterize;
use crate::{Error, GraphicStore, HarvestConfig, RenderOracle, Result, Slug};
use log::{info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Pipeline stage an item was dropped in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Rasterize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedItem {
    pub slug: Slug,
    pub stage: Stage,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedImage {
    pub slug: Slug,
    pub path: PathBuf,
    /// Hex SHA-256 of the PNG bytes
    pub sha256: String,
}

/// Outcome of a run that got past collection
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Number of slugs found on the listing page
    pub collected: usize,
    /// Number of graphics extracted and written this run
    pub saved: usize,
    pub rendered: Vec<RenderedImage>,
    pub skipped: Vec<SkippedItem>,
}

impl RunReport {
    fn skip(&mut self, slug: &Slug, stage: Stage, err: &Error) {
        warn!("{} [{:?}] skipped: {}", slug, stage, err);
        self.skipped.push(SkippedItem {
            slug: slug.clone(),
            stage,
            reason: err.to_string(),
        });
    }
}

/// Run the whole batch against one oracle session.
///
/// Only configuration problems, an unusable output directory and an empty
/// listing abort the run; every per-item failure lands in
/// [`RunReport::skipped`]. Only graphics extracted by this run are
/// rasterized, whatever else `raw_dir` already holds.
pub fn run<O: RenderOracle>(oracle: &mut O, config: &HarvestConfig, store: &GraphicStore) -> Result<RunReport> {
    config.validate()?;
    store.ensure_dirs()?;

    let slugs = collect_slugs(oracle, config)?;
    let mut report = RunReport {
        collected: slugs.len(),
        ..Default::default()
    };

    let saved = extract_all(oracle, config, store, &slugs, &mut report)?;
    rasterize_all(oracle, config, store, &saved, &mut report)?;

    info!(
        "Done: {} slugs collected, {} graphics saved, {} images rendered, {} skipped",
        report.collected,
        report.saved,
        report.rendered.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Take ownership of a freshly acquired session, [`run`] it and release it.
///
/// The oracle is closed whether the run succeeds or aborts; a close failure
/// is only logged so it never masks the run outcome.
pub fn run_session<O: RenderOracle>(mut oracle: O, config: &HarvestConfig, store: &GraphicStore) -> Result<RunReport> {
    let outcome = run(&mut oracle, config, store);
    if let Err(e) = oracle.close() {
        warn!("Failed to close browser session: {}", e);
    }
    outcome
}

/// Extract and persist the graphic of every slug, recording skips.
///
/// Returns the slugs whose markup was written this run. A fatal error
/// (see [`Error::is_fatal`]) stops the loop and is returned.
pub fn extract_all<O: RenderOracle>(
    oracle: &mut O,
    config: &HarvestConfig,
    store: &GraphicStore,
    slugs: &BTreeSet<Slug>,
    report: &mut RunReport,
) -> Result<Vec<Slug>> {
    let mut saved = Vec::new();
    for slug in slugs {
        let written = extract_graphic(oracle, config, slug).and_then(|graphic| store.save_graphic(&graphic));
        match written {
            Ok(path) => {
                info!("{} saved to {}", slug, path.display());
                report.saved += 1;
                saved.push(slug.clone());
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => report.skip(slug, Stage::Extract, &e),
        }
    }
    Ok(saved)
}

/// Read back, rasterize and persist the graphic of every slug, recording
/// skips. An unreadable `{slug}.svg` is a skip like any other render failure.
pub fn rasterize_all<O: RenderOracle>(
    oracle: &mut O,
    config: &HarvestConfig,
    store: &GraphicStore,
    slugs: &[Slug],
    report: &mut RunReport,
) -> Result<()> {
    for slug in slugs {
        let rendered = store
            .load_graphic(slug)
            .and_then(|graphic| rasterize(oracle, config, &graphic))
            .and_then(|image| {
                let path = store.save_image(&image)?;
                Ok(RenderedImage {
                    slug: image.slug,
                    path,
                    sha256: hex::encode(Sha256::digest(&image.png_data)),
                })
            });
        match rendered {
            Ok(entry) => {
                info!("{} rendered to {}", entry.slug, entry.path.display());
                report.rendered.push(entry);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => report.skip(slug, Stage::Rasterize, &e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_for_manifest() {
        let slug = Slug::parse("npm").unwrap();
        let mut report = RunReport { collected: 2, saved: 1, ..Default::default() };
        report.skip(&slug, Stage::Rasterize, &Error::DegenerateGraphic { width: 0.0, height: 0.0 });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["collected"], 2);
        assert_eq!(json["skipped"][0]["slug"], "npm");
        assert_eq!(json["skipped"][0]["stage"], "rasterize");
        assert_eq!(json["skipped"][0]["reason"], "Degenerate bounding box 0x0");
    }
}
