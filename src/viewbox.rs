//! Viewport-mapping (`viewBox`) normalization for raw svg markup

use crate::{Error, Result};
use scraper::{ElementRef, Html};
use std::borrow::Cow;
use std::fmt;

/// Internal coordinate frame `0 0 width height` of an svg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewBox {
    /// Frame of the catalogue's icon set; other sources should override it.
    fn default() -> Self {
        Self {
            width: 173.0,
            height: 174.0,
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0 0 {} {}", self.width, self.height)
    }
}

impl std::str::FromStr for ViewBox {
    type Err = Error;

    /// Accepts `WxH` or `W H`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s
            .split(|c: char| c == 'x' || c == 'X' || c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty());
        let mut next = || -> Result<f64> {
            parts
                .next()
                .ok_or_else(|| Error::ConfigError(format!("view box '{}' needs a width and a height", s)))?
                .parse::<f64>()
                .map_err(|e| Error::ConfigError(format!("view box '{}': {}", s, e)))
        };
        let width = next()?;
        let height = next()?;
        if parts.next().is_some() {
            return Err(Error::ConfigError(format!("view box '{}' has too many components", s)));
        }
        Ok(ViewBox { width, height })
    }
}

/// Whether the root `<svg>` element of `markup` declares a `viewBox`.
///
/// The markup is parsed as an HTML fragment, the way the browser serialized
/// it, so attribute names keep their SVG casing.
pub fn has_view_box(markup: &str) -> Result<bool> {
    let fragment = Html::parse_fragment(markup);
    let root = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() != "html")
        .ok_or_else(|| Error::InvalidGraphic("markup contains no element".into()))?;

    if !root.value().name().eq_ignore_ascii_case("svg") {
        return Err(Error::InvalidGraphic(format!(
            "root element is <{}>, expected <svg>",
            root.value().name()
        )));
    }

    Ok(root
        .value()
        .attrs()
        .any(|(name, _)| name.eq_ignore_ascii_case("viewbox")))
}

/// Return `markup` with a `viewBox` on its root element.
///
/// Markup that already declares one is returned untouched (borrowed);
/// otherwise exactly one `viewBox="0 0 W H"` of `default` is inserted right
/// after the root tag name.
pub fn ensure_view_box(markup: &str, default: ViewBox) -> Result<Cow<'_, str>> {
    if has_view_box(markup)? {
        return Ok(Cow::Borrowed(markup));
    }

    let at = root_tag_name_end(markup)
        .ok_or_else(|| Error::InvalidGraphic("cannot locate root <svg> start tag".into()))?;

    let declaration = format!(" viewBox=\"{}\"", default);
    let mut patched = String::with_capacity(markup.len() + declaration.len());
    patched.push_str(&markup[..at]);
    patched.push_str(&declaration);
    patched.push_str(&markup[at..]);
    Ok(Cow::Owned(patched))
}

/// Byte offset just past the tag name of the first start tag, skipping
/// leading whitespace, comments, processing instructions and doctypes.
fn root_tag_name_end(markup: &str) -> Option<usize> {
    let mut pos = 0;
    loop {
        let rest = &markup[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();

        if trimmed.starts_with("<!--") {
            pos += trimmed.find("-->")? + 3;
        } else if trimmed.starts_with("<?") || trimmed.starts_with("<!") {
            pos += trimmed.find('>')? + 1;
        } else if let Some(tag) = trimmed.strip_prefix('<') {
            let name_len = tag
                .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                .unwrap_or(tag.len());
            let name = &tag[..name_len];
            let local = name.rsplit(':').next().unwrap_or(name);
            if name_len == 0 || !local.eq_ignore_ascii_case("svg") {
                return None;
            }
            return Some(pos + 1 + name_len);
        } else {
            return None;
        }
    }
}
