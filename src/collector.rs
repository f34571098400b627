//! Listing-page link harvesting
//!
//! The collector loads the catalogue listing page, takes every same-origin
//! relative link whose path is a single segment and turns it into a [`Slug`].

use crate::{Error, HarvestConfig, RenderOracle, Result};
use log::{debug, info};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of one catalogue item, taken from a one-segment URL path.
///
/// Only ASCII letters, digits, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Validate `s` as a slug
    ///
    /// ```
    /// use iconharvest::Slug;
    /// assert!(Slug::parse("github-mark_2").is_some());
    /// assert!(Slug::parse("a/b").is_none());
    /// assert!(Slug::parse("").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Slug> {
        let valid = !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Slug(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Map a raw `href` attribute to a slug when it is a relative link of
/// exactly one path segment (`/name` or `/name/`).
pub fn slug_from_href(href: &str) -> Option<Slug> {
    let href = href.trim();
    let path = href.strip_prefix('/')?;
    // protocol-relative links point off-site
    if path.starts_with('/') {
        return None;
    }
    let segment = path.strip_suffix('/').unwrap_or(path);
    Slug::parse(segment)
}

/// Extract the deduplicated slug set from a serialized listing page.
pub fn slugs_from_html(html: &str) -> BTreeSet<Slug> {
    let document = Html::parse_document(html);
    let Ok(link_sel) = Selector::parse("a[href]") else {
        return BTreeSet::new();
    };

    document
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(slug_from_href)
        .collect()
}

/// Load the listing page and harvest its item slugs.
///
/// An empty result is fatal for the run and reported as [`Error::NoSlugs`].
pub fn collect_slugs<O: RenderOracle>(oracle: &mut O, config: &HarvestConfig) -> Result<BTreeSet<Slug>> {
    oracle.set_viewport(config.listing_viewport)?;
    oracle.navigate(&config.start_url)?;
    let html = oracle.page_html()?;
    debug!("Listing page {} serialized to {} bytes", config.start_url, html.len());

    let slugs = slugs_from_html(&html);
    if slugs.is_empty() {
        return Err(Error::NoSlugs(config.start_url.clone()));
    }

    info!("Collected {} slugs from {}", slugs.len(), config.start_url);
    Ok(slugs)
}
