//! Item-page svg extraction

use crate::{Error, GraphicCandidate, HarvestConfig, RawGraphic, RenderOracle, Result, Slug};
use log::debug;

/// Elements considered when looking for an item's icon.
pub const GRAPHIC_SELECTOR: &str = "svg";

/// Resolve the detail page of `slug` against the listing URL.
pub fn item_url(start_url: &str, slug: &Slug) -> Result<String> {
    let base = url::Url::parse(start_url)
        .map_err(|e| Error::ConfigError(format!("invalid start URL '{}': {}", start_url, e)))?;
    let joined = base
        .join(&format!("/{}", slug))
        .map_err(|e| Error::LoadError(format!("cannot build item URL for '{}': {}", slug, e)))?;
    Ok(joined.into())
}

/// Pick the candidate with the largest rendered area among those at least
/// `min_width` wide. On equal areas the earlier candidate is kept.
pub fn select_largest(candidates: &[GraphicCandidate], min_width: f64) -> Option<&GraphicCandidate> {
    let mut best: Option<&GraphicCandidate> = None;
    for candidate in candidates.iter().filter(|c| c.width >= min_width) {
        match best {
            Some(current) if candidate.area() > current.area() => best = Some(candidate),
            None => best = Some(candidate),
            _ => {}
        }
    }
    best
}

/// Load the detail page of `slug` and return its icon markup.
///
/// Navigation failures, the element wait timing out and pages without a
/// qualifying svg are all returned as errors for the caller to skip.
pub fn extract_graphic<O: RenderOracle>(oracle: &mut O, config: &HarvestConfig, slug: &Slug) -> Result<RawGraphic> {
    let url = item_url(&config.start_url, slug)?;
    oracle.navigate(&url)?;
    oracle.wait_for_selector(GRAPHIC_SELECTOR, config.element_timeout())?;

    let candidates = oracle.query_graphics(GRAPHIC_SELECTOR)?;
    debug!(
        "{}: {} svg candidates [{}]",
        slug,
        candidates.len(),
        candidates
            .iter()
            .map(|c| format!("{:.0}x{:.0}", c.width, c.height))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let chosen = select_largest(&candidates, config.min_width).ok_or(Error::NoSuitableGraphic {
        min_width: config.min_width,
        candidates: candidates.len(),
    })?;

    Ok(RawGraphic {
        slug: slug.clone(),
        markup: chosen.markup.clone(),
    })
}
